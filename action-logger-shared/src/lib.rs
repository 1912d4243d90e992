//! # Action Logger Shared
//! This crate defines the data structures shared across the action logger workspace:
//! persisted action events, network metadata for the wallet session, and the
//! `EventLogger` contract bindings.
pub mod contract;
pub mod types;
