//! # Action Logger Pipeline
//! This crate holds the coordination core of the action logger: the wallet
//! session, the on-chain write path, the event sync path and the polling read
//! path that keeps a render-ready feed of recent actions.
//!
//! ## Modules
//!
//! - [`wallet`]: wallet provider surface and session state machine
//! - [`writer`]: submits actions to the `EventLogger` contract
//! - [`sync`]: mirrors confirmed actions into the events table
//! - [`feed`]: polls the events table and publishes the feed state
//! - [`deployer`]: deploys a fresh `EventLogger` contract
//! - [`status`]: network and database status summary
//! - [`errors`]: error types for every component
mod block_time;
pub mod deployer;
pub mod errors;
pub mod feed;
pub mod status;
pub mod sync;
pub mod wallet;
pub mod writer;

#[cfg(test)]
mod testing;
