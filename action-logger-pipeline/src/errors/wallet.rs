//! Error types for the wallet session.
use alloy::transports::TransportError;
use thiserror::Error;

use super::rpc::{rpc_error_code, UNRECOGNIZED_CHAIN_CODE, USER_REJECTED_CODE};

/// Represents errors raised by the wallet provider or the session manager.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("No wallet provider is configured")]
    ProviderMissing,
    #[error("User rejected the request: {0}")]
    UserRejected(String),
    #[error("Chain {0} is not known to the wallet")]
    UnknownChain(u64),
    #[error("Wallet RPC error: {0}")]
    Rpc(String),
}

impl WalletError {
    /// Classifies a transport error returned by a wallet request that targeted `chain_id`.
    pub(crate) fn from_transport(err: &TransportError, chain_id: Option<u64>) -> Self {
        match (rpc_error_code(err), chain_id) {
            (Some(USER_REJECTED_CODE), _) => Self::UserRejected(err.to_string()),
            (Some(UNRECOGNIZED_CHAIN_CODE), Some(chain_id)) => Self::UnknownChain(chain_id),
            _ => Self::Rpc(err.to_string()),
        }
    }
}
