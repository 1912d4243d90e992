//! Error types for the events repository.
mod events;

pub use events::EventsRepositoryError;
