//! Error types for contract calls and transaction confirmation.
use alloy::providers::PendingTransactionError;
use alloy::transports::TransportError;
use thiserror::Error;

use super::rpc::{rpc_error_code, USER_REJECTED_CODE};

/// Represents errors that can occur while talking to the `EventLogger` contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Request rejected by the wallet: {0}")]
    Rejected(String),
    #[error("Transaction reverted: {0}")]
    Reverted(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Invalid contract artifact: {0}")]
    Artifact(String),
}

impl ChainError {
    /// The provider's reason string, without the variant prefix.
    pub fn reason(&self) -> &str {
        match self {
            Self::Rejected(reason)
            | Self::Reverted(reason)
            | Self::Transport(reason)
            | Self::Artifact(reason) => reason,
        }
    }
}

impl From<&TransportError> for ChainError {
    fn from(err: &TransportError) -> Self {
        match rpc_error_code(err) {
            Some(USER_REJECTED_CODE) => Self::Rejected(err.to_string()),
            Some(_) => Self::Reverted(err.to_string()),
            None => Self::Transport(err.to_string()),
        }
    }
}

impl From<TransportError> for ChainError {
    fn from(err: TransportError) -> Self {
        Self::from(&err)
    }
}

impl From<alloy::contract::Error> for ChainError {
    fn from(err: alloy::contract::Error) -> Self {
        match &err {
            alloy::contract::Error::TransportError(transport) => Self::from(transport),
            _ => Self::Reverted(err.to_string()),
        }
    }
}

impl From<PendingTransactionError> for ChainError {
    fn from(err: PendingTransactionError) -> Self {
        match &err {
            PendingTransactionError::TransportError(transport) => Self::from(transport),
            _ => Self::Transport(err.to_string()),
        }
    }
}
