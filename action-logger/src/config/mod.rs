//! Configuration module for the Action Logger.
//! Reads settings from the environment and wires the pipeline components.
mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::{AppConfig, CONTRACT_ADDRESS_PLACEHOLDER};
