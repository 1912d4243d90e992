//! Wallet session management.
//!
//! The [`WalletProvider`] trait is the wallet surface the session needs: account
//! authorization, network queries, network switching and change notifications.
//! [`RpcWalletProvider`] implements it against a JSON-RPC wallet endpoint or a
//! local signing key, and [`WalletSession`] tracks the connection state machine
//! on top of any provider.
mod provider;
mod session;

pub use provider::RpcWalletProvider;
pub use session::{ConnectionStatus, SessionChange, SessionState, WalletSession};

use action_logger_shared::types::NetworkConfig;
use alloy::primitives::Address;
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::errors::WalletError;

/// Asynchronous notifications pushed by a wallet provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletEvent {
    /// The set of authorized accounts changed. An empty list means the wallet disconnected.
    AccountsChanged(Vec<Address>),
    /// The wallet moved to another chain.
    ChainChanged(u64),
}

/// The wallet surface used by [`WalletSession`].
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Requests account authorization, prompting the user when needed.
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Lists already-authorized accounts without prompting.
    async fn list_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Returns the chain the wallet is currently attached to.
    async fn chain_id(&self) -> Result<u64, WalletError>;

    /// Asks the wallet to move to `chain_id`.
    ///
    /// Fails with [`WalletError::UnknownChain`] when the wallet has never seen the chain.
    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError>;

    /// Registers a network with the wallet.
    async fn add_chain(&self, network: &NetworkConfig) -> Result<(), WalletError>;

    /// Subscribes to account and chain change notifications.
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}
