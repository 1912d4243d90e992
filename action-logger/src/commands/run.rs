//! Interactive mode: every stdin line is submitted as an action while the feed
//! refreshes in the background.
use std::sync::Arc;

use action_logger_pipeline::errors::SyncError;
use action_logger_pipeline::feed::FeedState;
use action_logger_pipeline::status::StatusReport;
use action_logger_pipeline::wallet::WalletSession;
use action_logger_pipeline::writer::{ActionWriter, WriteNotice};
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use super::render::FeedPrinter;
use crate::config::Dependencies;
use crate::errors::AppError;

/// Entries printed when the feed first loads.
const INITIAL_FEED_LINES: usize = 10;

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Action(String),
    Connect,
    Status,
    Quit,
    Blank,
}

impl Input {
    fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Self::Blank,
            "/connect" => Self::Connect,
            "/status" => Self::Status,
            "/quit" | "/exit" => Self::Quit,
            _ => Self::Action(line.to_string()),
        }
    }
}

pub async fn run(deps: Dependencies) -> Result<(), AppError> {
    let Dependencies {
        config,
        wallet,
        session,
        feed,
        writer,
        listener,
        ..
    } = deps;

    if let Some(wallet) = &wallet {
        wallet.start_watcher(config.wallet_poll_interval);
    }
    let session_events = session.spawn_event_loop();

    if let Some(hint) = restore_session(&session).await {
        println!("{hint}");
    }

    if let Some(listener) = &listener {
        match listener.start().await {
            Ok(_) => {}
            Err(SyncError::ContractNotConfigured) => info!("Contract not configured, not listening"),
            Err(e) => warn!(error = %e, "Failed to start listener"),
        }
    }
    if !writer.is_enabled() {
        println!("Contract not configured, set CONTRACT_ADDRESS or run `deploy`");
    }

    let mut poller = feed.spawn_polling();
    let printer = tokio::spawn(print_feed(feed.subscribe()));
    let notices = tokio::spawn(print_notices(writer.subscribe()));

    println!("Type an action and press enter. Commands: /connect, /status, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    info!("Input closed, press Ctrl-C to stop");
                    stdin_open = false;
                    continue;
                };
                match Input::parse(&line) {
                    Input::Quit => break,
                    Input::Blank => {}
                    Input::Connect => {
                        if let Err(e) = session.connect().await {
                            println!("Connection failed: {e}");
                        }
                    }
                    Input::Status => {
                        println!("{}", StatusReport::collect(&session, &feed.snapshot()));
                    }
                    Input::Action(action) => submit(Arc::clone(&writer), action),
                }
            }
        }
    }

    poller.stop();
    if let Some(listener) = &listener {
        listener.stop().await;
    }
    if let Some(wallet) = &wallet {
        wallet.stop_watcher();
    }
    if let Some(handle) = session_events {
        handle.abort();
    }
    printer.abort();
    notices.abort();

    info!("Action logger stopped");
    Ok(())
}

/// Adopts an account the wallet already authorized, without prompting.
///
/// Returns a hint for the user when no account was restored; prompting is
/// left to `/connect`.
async fn restore_session(session: &WalletSession) -> Option<String> {
    match session.reconcile().await {
        Ok(Some(_)) => None,
        Ok(None) if session.has_provider() => {
            Some("No authorized account, type /connect to connect your wallet".to_string())
        }
        Ok(None) => Some("No wallet configured, set WALLET_RPC_URL to log actions".to_string()),
        Err(e) => {
            warn!(error = %e, "Failed to restore wallet session");
            Some(format!("Wallet not reachable: {e} (type /connect to retry)"))
        }
    }
}

/// Submits in the background so input stays responsive; a second action
/// while one is pending is refused by the writer.
fn submit(writer: Arc<ActionWriter>, action: String) {
    tokio::spawn(async move {
        if let Err(e) = writer.submit(&action).await {
            println!("! {e}");
        }
    });
}

async fn print_feed(mut state_rx: watch::Receiver<FeedState>) {
    let mut printer = FeedPrinter::new(INITIAL_FEED_LINES);
    while state_rx.changed().await.is_ok() {
        let state = state_rx.borrow_and_update().clone();
        for line in printer.render(&state, Utc::now()) {
            println!("{line}");
        }
    }
}

async fn print_notices(mut notices: broadcast::Receiver<WriteNotice>) {
    loop {
        match notices.recv().await {
            Ok(WriteNotice::PendingChanged(true)) => println!("Confirm the transaction in your wallet..."),
            Ok(WriteNotice::Sent(tx_hash)) => println!("Sent {tx_hash}, waiting for confirmation"),
            Ok(WriteNotice::Confirmed(receipt)) => println!("Action logged in {}", receipt.tx_hash),
            Ok(WriteNotice::SyncFailed(reason)) => println!("! Could not store the action: {reason}"),
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Dropped write notices");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
