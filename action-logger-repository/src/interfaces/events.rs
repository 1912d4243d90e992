//! This module defines the `EventsRepository` trait, the interface between the
//! read/sync paths and the table that mirrors `ActionLogged` events.
use action_logger_shared::types::{ActionEvent, NewActionEvent};
use crate::errors::EventsRepositoryError;

/// A column of the `events` table as reported by `information_schema`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnInfo {
    pub column_name: String,
    pub data_type: String,
}

/// A trait that defines the interface for interacting with the events data store.
#[async_trait::async_trait]
pub trait EventsRepository: Send + Sync {
    /// Returns the most recent `limit` events, newest first.
    ///
    /// Events are ordered by their chain timestamp when present, falling back to
    /// the insertion timestamp.
    async fn recent_events(&self, limit: i64) -> Result<Vec<ActionEvent>, EventsRepositoryError>;

    /// Appends a single event.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - A row was written
    /// * `Ok(false)` - A row with the same `(tx_hash, log_index)` already exists
    /// * `Err(EventsRepositoryError)` - Database failure
    async fn insert_event(&self, event: &NewActionEvent) -> Result<bool, EventsRepositoryError>;

    /// Creates the table and adds any missing columns. Safe to call repeatedly.
    async fn ensure_schema(&self) -> Result<(), EventsRepositoryError>;

    /// Deletes events that carry no chain timestamp and returns how many were removed.
    async fn prune_events_without_block_timestamp(&self) -> Result<u64, EventsRepositoryError>;

    /// Lists the columns of the `events` table in ordinal order.
    async fn describe_columns(&self) -> Result<Vec<ColumnInfo>, EventsRepositoryError>;
}
