//! Network and database status summary.
use std::fmt;

use crate::feed::FeedState;
use crate::wallet::WalletSession;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusLine {
    pub label: &'static str,
    pub value: String,
    pub is_ready: bool,
    pub error: Option<String>,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let badge = if self.is_ready { "Online" } else { "Offline" };
        write!(f, "{:<20} {:<24} [{badge}]", self.label, self.value)?;
        if let Some(error) = &self.error {
            write!(f, " {error}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusReport {
    pub network: StatusLine,
    pub database: StatusLine,
}

impl StatusReport {
    pub fn collect(session: &WalletSession, feed: &FeedState) -> Self {
        Self {
            network: network_line(session),
            database: database_line(feed),
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.network)?;
        write!(f, "{}", self.database)
    }
}

fn network_line(session: &WalletSession) -> StatusLine {
    let on_required = session.is_on_required_network();
    let (value, error) = match session.chain_id() {
        Some(_) if on_required => (short_chain_name(&session.network().chain_name), None),
        Some(chain_id) => (format!("Chain ID: {chain_id}"), Some("Wrong Network".to_string())),
        None => ("Disconnected".to_string(), None),
    };

    StatusLine {
        label: "Blockchain Network",
        value,
        is_ready: on_required,
        error,
    }
}

fn database_line(feed: &FeedState) -> StatusLine {
    StatusLine {
        label: "Database Connection",
        value: "Postgres".to_string(),
        is_ready: feed.is_connected,
        error: feed.db_error.clone(),
    }
}

/// "Polygon Amoy Testnet" reads as "Polygon Amoy".
fn short_chain_name(chain_name: &str) -> String {
    chain_name
        .strip_suffix(" Testnet")
        .unwrap_or(chain_name)
        .to_string()
}
