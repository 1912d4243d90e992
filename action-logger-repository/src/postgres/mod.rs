//! PostgreSQL implementation of the events repository.
mod events_repository;

pub use events_repository::PostgresEventsRepository;
