//! JSON-RPC implementation of the wallet provider.
//!
//! Two modes are supported:
//!
//! - a wallet endpoint that manages its own accounts (`eth_requestAccounts`,
//!   `wallet_switchEthereumChain`, `wallet_addEthereumChain`)
//! - a local private key, where the only account is the signer's and the
//!   network is fixed by the RPC URL
//!
//! HTTP endpoints cannot push `accountsChanged`/`chainChanged`, so a background
//! watcher polls accounts and chain id and broadcasts the differences.
use std::sync::Mutex;
use std::time::Duration;

use action_logger_shared::types::NetworkConfig;
use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{WalletEvent, WalletProvider};
use crate::errors::{rpc_error_code, WalletError, METHOD_NOT_FOUND_CODE};

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// `wallet_addEthereumChain` parameters (EIP-3085).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddChainParams {
    chain_id: String,
    chain_name: String,
    rpc_urls: Vec<String>,
    native_currency: NativeCurrencyParams,
    block_explorer_urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct NativeCurrencyParams {
    name: String,
    symbol: String,
    decimals: u8,
}

impl From<&NetworkConfig> for AddChainParams {
    fn from(network: &NetworkConfig) -> Self {
        Self {
            chain_id: network.chain_id_hex(),
            chain_name: network.chain_name.clone(),
            rpc_urls: network.rpc_urls.clone(),
            native_currency: NativeCurrencyParams {
                name: network.native_currency.name.clone(),
                symbol: network.native_currency.symbol.clone(),
                decimals: network.native_currency.decimals,
            },
            block_explorer_urls: network.block_explorer_urls.clone(),
        }
    }
}

/// The request half of the provider, cloneable into the watcher task.
#[derive(Clone)]
struct WalletRpc {
    provider: DynProvider,
    local_account: Option<Address>,
}

impl WalletRpc {
    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        if let Some(account) = self.local_account {
            return Ok(vec![account]);
        }
        self.provider
            .get_accounts()
            .await
            .map_err(|e| WalletError::from_transport(&e, None))
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| WalletError::from_transport(&e, None))
    }
}

/// Wallet provider backed by an alloy JSON-RPC provider.
pub struct RpcWalletProvider {
    rpc: WalletRpc,
    events: broadcast::Sender<WalletEvent>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl RpcWalletProvider {
    /// Wraps an existing provider. `local_account` is the signer address when the
    /// provider signs with a local key.
    pub fn new(provider: DynProvider, local_account: Option<Address>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            rpc: WalletRpc {
                provider,
                local_account,
            },
            events,
            watcher: Mutex::new(None),
        }
    }

    /// Connects to a wallet endpoint, optionally signing with a local key.
    pub async fn connect(url: &str, signer: Option<PrivateKeySigner>) -> Result<Self, WalletError> {
        match signer {
            Some(signer) => {
                let address = signer.address();
                let provider = ProviderBuilder::new()
                    .wallet(signer)
                    .connect(url)
                    .await
                    .map_err(|e| WalletError::Rpc(e.to_string()))?
                    .erased();
                info!(account = %address, "Wallet provider using local signer");
                Ok(Self::new(provider, Some(address)))
            }
            None => {
                let provider = ProviderBuilder::new()
                    .connect(url)
                    .await
                    .map_err(|e| WalletError::Rpc(e.to_string()))?
                    .erased();
                info!("Wallet provider using endpoint-managed accounts");
                Ok(Self::new(provider, None))
            }
        }
    }

    /// The underlying provider, shared with the contract and event source.
    pub fn provider(&self) -> &DynProvider {
        &self.rpc.provider
    }

    /// Starts polling the endpoint for account and chain changes.
    ///
    /// Calling it again replaces the previous watcher.
    pub fn start_watcher(&self, poll_interval: Duration) {
        let rpc = self.rpc.clone();
        let events = self.events.clone();
        let handle = tokio::spawn(watch_wallet(rpc, events, poll_interval));

        if let Ok(mut watcher) = self.watcher.lock() {
            if let Some(previous) = watcher.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Stops the change watcher, if running.
    pub fn stop_watcher(&self) {
        if let Ok(mut watcher) = self.watcher.lock() {
            if let Some(handle) = watcher.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for RpcWalletProvider {
    fn drop(&mut self) {
        self.stop_watcher();
    }
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        if let Some(account) = self.rpc.local_account {
            return Ok(vec![account]);
        }

        let requested: Result<Vec<Address>, _> = self
            .rpc
            .provider
            .raw_request("eth_requestAccounts".into(), Vec::<Value>::new())
            .await;

        match requested {
            Ok(accounts) => Ok(accounts),
            // Nodes with unlocked accounts do not implement the EIP-1102 method.
            Err(e) if rpc_error_code(&e) == Some(METHOD_NOT_FOUND_CODE) => {
                debug!("eth_requestAccounts not supported, falling back to eth_accounts");
                self.rpc.accounts().await
            }
            Err(e) => Err(WalletError::from_transport(&e, None)),
        }
    }

    async fn list_accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.rpc.accounts().await
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        self.rpc.chain_id().await
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        if self.rpc.local_account.is_some() {
            let current = self.rpc.chain_id().await?;
            if current == chain_id {
                return Ok(());
            }
            return Err(WalletError::Rpc(format!(
                "local signer is bound to chain {current}; point the RPC URL at chain {chain_id}"
            )));
        }

        let params = vec![json!({ "chainId": format!("{chain_id:#x}") })];
        self.rpc
            .provider
            .raw_request::<_, Value>("wallet_switchEthereumChain".into(), params)
            .await
            .map_err(|e| WalletError::from_transport(&e, Some(chain_id)))?;
        Ok(())
    }

    async fn add_chain(&self, network: &NetworkConfig) -> Result<(), WalletError> {
        if self.rpc.local_account.is_some() {
            return Err(WalletError::Rpc(
                "local signer cannot register networks".to_string(),
            ));
        }

        let params = vec![AddChainParams::from(network)];
        self.rpc
            .provider
            .raw_request::<_, Value>("wallet_addEthereumChain".into(), params)
            .await
            .map_err(|e| WalletError::from_transport(&e, None))?;
        info!(chain_id = network.chain_id, chain_name = %network.chain_name, "Network registered with wallet");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

/// Polls the wallet and broadcasts account and chain changes.
///
/// The first successful poll only records the baseline.
async fn watch_wallet(
    rpc: WalletRpc,
    events: broadcast::Sender<WalletEvent>,
    poll_interval: Duration,
) {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut last_accounts: Option<Vec<Address>> = None;
    let mut last_chain: Option<u64> = None;

    loop {
        ticker.tick().await;

        match rpc.accounts().await {
            Ok(accounts) => {
                if let Some(previous) = &last_accounts {
                    if *previous != accounts {
                        debug!(count = accounts.len(), "Wallet accounts changed");
                        let _ = events.send(WalletEvent::AccountsChanged(accounts.clone()));
                    }
                }
                last_accounts = Some(accounts);
            }
            Err(e) => warn!(error = %e, "Failed to poll wallet accounts"),
        }

        match rpc.chain_id().await {
            Ok(chain_id) => {
                if let Some(previous) = last_chain {
                    if previous != chain_id {
                        debug!(from = previous, to = chain_id, "Wallet chain changed");
                        let _ = events.send(WalletEvent::ChainChanged(chain_id));
                    }
                }
                last_chain = Some(chain_id);
            }
            Err(e) => warn!(error = %e, "Failed to poll wallet chain id"),
        }
    }
}
