use alloy::primitives::{Address, TxHash};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A logged action as stored in the `events` table.
///
/// `id` and `created_at` are assigned by the database. `block_timestamp`,
/// `tx_hash` and `log_index` are present only when the row was produced from a
/// confirmed chain log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEvent {
    pub id: i64,
    pub user_address: String,
    pub action: String,
    pub created_at: DateTime<Utc>,
    pub block_timestamp: Option<DateTime<Utc>>,
    pub tx_hash: Option<String>,
    pub log_index: Option<i64>,
}

impl ActionEvent {
    /// Timestamp the feed is ordered by: the chain timestamp when known,
    /// otherwise the insertion timestamp.
    pub fn ordering_timestamp(&self) -> DateTime<Utc> {
        self.block_timestamp.unwrap_or(self.created_at)
    }
}

/// A row to be appended to the `events` table.
///
/// When both `tx_hash` and `log_index` are set they form the natural key of the
/// chain log, and inserting the same key twice writes a single row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewActionEvent {
    pub user: Address,
    pub action: String,
    pub block_timestamp: Option<DateTime<Utc>>,
    pub tx_hash: Option<TxHash>,
    pub log_index: Option<u64>,
}

impl NewActionEvent {
    pub fn new(user: Address, action: impl Into<String>) -> Self {
        Self {
            user,
            action: action.into(),
            block_timestamp: None,
            tx_hash: None,
            log_index: None,
        }
    }

    pub fn with_block_timestamp(mut self, block_timestamp: Option<DateTime<Utc>>) -> Self {
        self.block_timestamp = block_timestamp;
        self
    }

    /// Attaches the `(tx_hash, log_index)` natural key of the originating log.
    pub fn with_log_key(mut self, tx_hash: TxHash, log_index: Option<u64>) -> Self {
        self.tx_hash = Some(tx_hash);
        self.log_index = log_index;
        self
    }

    /// Returns true when the row can be deduplicated against other writers.
    pub fn has_natural_key(&self) -> bool {
        self.tx_hash.is_some() && self.log_index.is_some()
    }
}

/// Converts a chain timestamp in unix seconds into a UTC datetime.
pub fn timestamp_from_unix(seconds: u64) -> Option<DateTime<Utc>> {
    i64::try_from(seconds)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}
