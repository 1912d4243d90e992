//! Error types for every pipeline component.
mod chain;
mod deployer;
mod feed;
mod rpc;
mod sync;
mod wallet;
mod writer;

pub use chain::ChainError;
pub use deployer::DeployError;
pub use feed::FeedError;
pub use sync::SyncError;
pub use wallet::WalletError;
pub use writer::WriteError;

pub(crate) use rpc::{rpc_error_code, METHOD_NOT_FOUND_CODE};
