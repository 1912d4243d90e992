//! Error types for the write path.
use thiserror::Error;

use super::ChainError;

/// Represents the outcomes of `ActionWriter::submit` that did not confirm a transaction.
///
/// The first four variants are raised before anything is sent and leave the
/// pending flag untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WriteError {
    #[error("Action text is empty")]
    EmptyAction,
    #[error("Contract address is not configured")]
    ContractNotConfigured,
    #[error("No wallet account is connected")]
    NotConnected,
    #[error("A transaction is already pending")]
    AlreadyPending,
    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),
    #[error("Transaction failed: {0}")]
    TransactionReverted(String),
}

impl From<ChainError> for WriteError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Rejected(reason) => Self::TransactionRejected(reason),
            ChainError::Reverted(reason)
            | ChainError::Transport(reason)
            | ChainError::Artifact(reason) => Self::TransactionReverted(reason),
        }
    }
}
