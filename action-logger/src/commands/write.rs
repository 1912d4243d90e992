use std::time::Duration;

use action_logger_pipeline::errors::{SyncError, WriteError};
use action_logger_pipeline::feed::EventFeed;
use alloy::primitives::TxHash;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use crate::config::Dependencies;
use crate::errors::AppError;

/// How long a one-shot `log` waits for its row to be mirrored.
const MIRROR_GRACE: Duration = Duration::from_secs(15);

/// Connects, submits one action and waits until it shows up in the feed.
pub async fn log(deps: &Dependencies, action: &str) -> Result<(), AppError> {
    if action.trim().is_empty() {
        return Err(WriteError::EmptyAction.into());
    }
    if !deps.writer.is_enabled() {
        return Err(WriteError::ContractNotConfigured.into());
    }

    deps.session.connect().await?;
    if let Some(listener) = &deps.listener {
        match listener.start().await {
            Ok(_) => {}
            Err(SyncError::ContractNotConfigured) => {}
            Err(e) => warn!(error = %e, "Listener unavailable, the action will not be mirrored"),
        }
    }

    let receipt = deps.writer.submit(action).await?;
    println!("Confirmed: {}", receipt.tx_hash);

    if deps.feed.is_configured() {
        if wait_for_row(&deps.feed, receipt.tx_hash).await {
            println!("Stored in the feed");
        } else {
            println!("Not yet visible in the feed");
        }
    }

    if let Some(listener) = &deps.listener {
        listener.stop().await;
    }
    Ok(())
}

async fn wait_for_row(feed: &EventFeed, tx_hash: TxHash) -> bool {
    let needle = tx_hash.to_string();
    let found = timeout(MIRROR_GRACE, async {
        loop {
            if feed.refresh().await.is_ok()
                && feed
                    .snapshot()
                    .events
                    .iter()
                    .any(|event| event.tx_hash.as_deref() == Some(needle.as_str()))
            {
                return;
            }
            sleep(feed.config().poll_interval).await;
        }
    })
    .await
    .is_ok();

    info!(tx_hash = %tx_hash, found, "Waited for mirrored row");
    found
}
