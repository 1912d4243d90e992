//! Error types for the read path.
use thiserror::Error;

/// Represents errors surfaced by the event feed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// The database connection string is not configured. Not retried.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The database could not be reached or the query failed.
    #[error("Connection error: {0}")]
    Connection(String),
}
