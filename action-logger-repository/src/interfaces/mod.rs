//! This module defines and re-exports the interfaces for the events repository.
mod events;

pub use events::{ColumnInfo, EventsRepository};
