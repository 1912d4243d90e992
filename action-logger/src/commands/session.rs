use action_logger_pipeline::status::StatusReport;
use action_logger_shared::types::encode_address;
use tracing::warn;

use crate::config::Dependencies;
use crate::errors::AppError;

/// Requests account authorization and prints the adopted account and network.
pub async fn connect(deps: &Dependencies) -> Result<(), AppError> {
    let account = deps.session.connect().await?;

    println!("Connected: {}", encode_address(&account));
    if !deps.session.is_on_required_network() {
        println!(
            "Wallet is on chain {}, expected {} ({})",
            deps.session
                .chain_id()
                .map_or_else(|| "unknown".to_string(), |id| id.to_string()),
            deps.session.network().chain_id,
            deps.session.network().chain_name,
        );
    }
    Ok(())
}

/// Prints the network and database status without prompting the wallet.
pub async fn status(deps: &Dependencies) -> Result<(), AppError> {
    if let Err(e) = deps.session.reconcile().await {
        warn!(error = %e, "Failed to read wallet accounts");
    }
    // The outcome is carried by the feed state.
    let _ = deps.feed.refresh().await;

    let report = StatusReport::collect(&deps.session, &deps.feed.snapshot());
    println!("{report}");
    if let Some(account) = deps.session.account() {
        println!("Account: {}", encode_address(&account));
    }
    if !deps.writer.is_enabled() {
        println!("Contract: not configured (set CONTRACT_ADDRESS or run `deploy`)");
    }
    Ok(())
}
