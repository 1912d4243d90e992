//! Error types for the sync path.
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Contract address is not configured")]
    ContractNotConfigured,
    #[error("Failed to subscribe to contract events: {0}")]
    Subscribe(String),
    #[error("Unknown sync strategy `{0}`, expected `listener` or `direct`")]
    UnknownStrategy(String),
}
