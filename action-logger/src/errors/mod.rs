//! Error types for the Action Logger application.
//! Consolidates the errors of every pipeline component so commands can use `?`.
use action_logger_pipeline::errors::{
    ChainError, DeployError, FeedError, SyncError, WalletError, WriteError,
};
use action_logger_repository::EventsRepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),
    #[error("Write error: {0}")]
    Write(#[from] WriteError),
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
    #[error("Deploy error: {0}")]
    Deploy(#[from] DeployError),
    #[error("Repository error: {0}")]
    Repository(#[from] EventsRepositoryError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
