//! Sync path: mirrors confirmed `ActionLogged` events into the events table.
//!
//! Exactly one authoritative writer runs per process, picked by
//! [`SyncStrategy`]. Either the [`ActionListener`] follows contract logs, or the
//! writer inserts its own confirmed actions. Rows carry the log's
//! `(tx_hash, log_index)` so writers in different processes collapse onto a
//! single row.
mod listener;
mod source;

pub use listener::ActionListener;
pub use source::AlloyEventSource;

use std::fmt;
use std::str::FromStr;

use action_logger_shared::contract::ActionLogged;
use action_logger_shared::types::{timestamp_from_unix, NewActionEvent};
use alloy::primitives::{Address, TxHash};
use alloy::rpc::types::Log;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::errors::{ChainError, SyncError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Follow contract logs with an [`ActionListener`].
    #[default]
    Listener,
    /// Let the writer insert its own confirmed actions.
    DirectInsert,
}

impl FromStr for SyncStrategy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "listener" => Ok(Self::Listener),
            "direct" | "direct-insert" => Ok(Self::DirectInsert),
            _ => Err(SyncError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listener => write!(f, "listener"),
            Self::DirectInsert => write!(f, "direct"),
        }
    }
}

/// One decoded `ActionLogged` log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservedAction {
    pub user: Address,
    pub action: String,
    pub tx_hash: Option<TxHash>,
    pub log_index: Option<u64>,
    pub block_timestamp: Option<DateTime<Utc>>,
}

impl ObservedAction {
    pub fn from_log(event: ActionLogged, log: &Log) -> Self {
        Self {
            user: event.user,
            action: event.action,
            tx_hash: log.transaction_hash,
            log_index: log.log_index,
            block_timestamp: log.block_timestamp.and_then(timestamp_from_unix),
        }
    }

    pub fn into_new_event(self) -> NewActionEvent {
        let event =
            NewActionEvent::new(self.user, self.action).with_block_timestamp(self.block_timestamp);
        match self.tx_hash {
            Some(tx_hash) => event.with_log_key(tx_hash, self.log_index),
            None => event,
        }
    }
}

/// A stream of contract logs.
#[async_trait]
pub trait ActionEventSource: Send + Sync {
    /// Opens a new subscription. Each call is an independent stream.
    async fn subscribe(
        &self,
    ) -> Result<BoxStream<'static, Result<ObservedAction, ChainError>>, ChainError>;
}
