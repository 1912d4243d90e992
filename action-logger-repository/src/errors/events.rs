//! Error types for the events repository.
//! Defines specific errors that can occur during database operations on logged actions.
use thiserror::Error;

/// Represents errors that can occur within the events repository.
#[derive(Debug, Error)]
pub enum EventsRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Invalid log index: {0}")]
    InvalidLogIndex(u64),
}
