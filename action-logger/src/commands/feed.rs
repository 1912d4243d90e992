use chrono::Utc;
use tracing::info;

use super::render::{format_event, FeedPrinter};
use crate::config::Dependencies;
use crate::errors::AppError;

/// Prints the most recent actions, newest first. With `follow`, keeps polling
/// and prints new actions until interrupted.
pub async fn feed(deps: &Dependencies, follow: bool) -> Result<(), AppError> {
    if !follow {
        deps.feed.refresh().await?;
        let now = Utc::now();
        let events = deps.feed.snapshot().events;
        if events.is_empty() {
            println!("No actions logged yet");
        }
        for event in &events {
            println!("{}", format_event(event, now));
        }
        return Ok(());
    }

    let mut printer = FeedPrinter::new(deps.config.feed.limit as usize);
    let mut state_rx = deps.feed.subscribe();
    let mut poller = deps.feed.spawn_polling();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                for line in printer.render(&state, Utc::now()) {
                    println!("{line}");
                }
            }
        }
    }

    poller.stop();
    Ok(())
}
