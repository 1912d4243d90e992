//! Error types for contract deployment.
use thiserror::Error;

use super::ChainError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeployError {
    #[error("No wallet account is connected")]
    NotConnected,
    #[error("Wrong network: expected chain {expected}, wallet is on {actual:?}")]
    WrongNetwork { expected: u64, actual: Option<u64> },
    #[error("Deployment receipt carries no contract address")]
    MissingContractAddress,
    #[error(transparent)]
    Chain(#[from] ChainError),
}
