//! # Action Logger
//!
//! Command-line front end for the action logger: connects a wallet, submits
//! text actions to the `EventLogger` contract and shows the most recent logged
//! actions mirrored in Postgres.
//!
//! ## Modules
//!
//! - [`config`]: environment configuration and dependency wiring
//! - [`commands`]: one handler per CLI subcommand
//! - [`errors`]: application error type

pub mod commands;
pub mod config;
pub mod errors;

pub use config::{AppConfig, Dependencies};
pub use errors::AppError;
