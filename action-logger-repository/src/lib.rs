//! # Action Logger Repository
//! This crate provides the trait and PostgreSQL implementation used to persist and
//! read back logged actions from the `events` table.
pub mod errors;
pub mod interfaces;
pub mod postgres;

pub use errors::EventsRepositoryError;
pub use interfaces::{ColumnInfo, EventsRepository};
pub use postgres::PostgresEventsRepository;
