//! Wallet session state machine.
//!
//! `Disconnected → Connecting → Connected`, back to `Disconnected` when the
//! wallet reports an empty account list. A failed connection attempt returns to
//! the previous status and holds the error message.
use std::sync::Arc;

use action_logger_shared::types::NetworkConfig;
use alloy::primitives::Address;
use tokio::sync::{broadcast::error::RecvError, watch};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use super::{WalletEvent, WalletProvider};
use crate::errors::WalletError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Snapshot of the session published to observers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub status: ConnectionStatus,
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
    pub error: Option<String>,
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected && self.account.is_some()
    }
}

/// What a provider notification did to the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionChange {
    AccountChanged(Address),
    Disconnected,
    /// The chain changed and the session was rebuilt from scratch.
    Reloaded,
}

/// Tracks wallet presence, the authorized account and the attached network.
///
/// This is the only place account and network identity are read from.
pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    network: NetworkConfig,
    state: watch::Sender<SessionState>,
}

impl WalletSession {
    /// Creates a disconnected session. `provider` is `None` when no wallet is available.
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, network: NetworkConfig) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            provider,
            network,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn account(&self) -> Option<Address> {
        let state = self.state.borrow();
        state.is_connected().then_some(state.account).flatten()
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.state.borrow().chain_id
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn is_on_required_network(&self) -> bool {
        self.chain_id() == Some(self.network.chain_id)
    }

    /// Requests account authorization from the wallet.
    ///
    /// On success the first account and the current chain are adopted. When the
    /// wallet sits on another chain a network switch is attempted; a failed
    /// switch is logged and does not fail the connection.
    #[instrument(skip(self))]
    pub async fn connect(&self) -> Result<Address, WalletError> {
        let Some(provider) = self.provider.as_ref() else {
            self.state
                .send_modify(|s| s.error = Some(WalletError::ProviderMissing.to_string()));
            return Err(WalletError::ProviderMissing);
        };

        let previous_status = self.state.borrow().status;
        self.state.send_modify(|s| {
            s.status = ConnectionStatus::Connecting;
            s.error = None;
        });

        let result: Result<(Address, u64), WalletError> = async {
            let accounts = provider.request_accounts().await?;
            let account = accounts
                .first()
                .copied()
                .ok_or_else(|| WalletError::Rpc("wallet returned no accounts".to_string()))?;
            let chain_id = provider.chain_id().await?;
            Ok((account, chain_id))
        }
        .await;

        match result {
            Ok((account, chain_id)) => {
                self.state.send_modify(|s| {
                    s.status = ConnectionStatus::Connected;
                    s.account = Some(account);
                    s.chain_id = Some(chain_id);
                });
                info!(account = %account, chain_id, "Wallet connected");

                if chain_id != self.network.chain_id {
                    if let Err(e) = self.switch_network().await {
                        warn!(error = %e, required_chain = self.network.chain_id, "Failed to switch network");
                    }
                }
                Ok(account)
            }
            Err(e) => {
                warn!(error = %e, "Failed to connect wallet");
                self.state.send_modify(|s| {
                    s.status = previous_status;
                    s.error = Some(e.to_string());
                });
                Err(e)
            }
        }
    }

    /// Moves the wallet to the required network, registering it first when the
    /// wallet does not know it.
    #[instrument(skip(self), fields(chain_id = self.network.chain_id))]
    pub async fn switch_network(&self) -> Result<(), WalletError> {
        let provider = self.provider.as_ref().ok_or(WalletError::ProviderMissing)?;
        let target = self.network.chain_id;

        match provider.switch_chain(target).await {
            Ok(()) => {}
            Err(WalletError::UnknownChain(_)) => {
                info!(chain_name = %self.network.chain_name, "Network unknown to wallet, registering it");
                provider.add_chain(&self.network).await?;
                provider.switch_chain(target).await?;
            }
            Err(e) => return Err(e),
        }

        self.state.send_modify(|s| s.chain_id = Some(target));
        info!("Switched to required network");
        Ok(())
    }

    /// Adopts an already-authorized account without prompting.
    ///
    /// Returns the adopted account, or `None` when the wallet has not authorized
    /// any account (or no wallet is present).
    pub async fn reconcile(&self) -> Result<Option<Address>, WalletError> {
        let Some(provider) = self.provider.as_ref() else {
            return Ok(None);
        };

        let accounts = provider.list_accounts().await?;
        let Some(account) = accounts.first().copied() else {
            return Ok(None);
        };
        let chain_id = provider.chain_id().await?;

        self.state.send_modify(|s| {
            s.status = ConnectionStatus::Connected;
            s.account = Some(account);
            s.chain_id = Some(chain_id);
            s.error = None;
        });
        info!(account = %account, chain_id, "Restored wallet session");
        Ok(Some(account))
    }

    /// Applies a provider notification.
    ///
    /// A chain change discards the whole session state and rebuilds it with a
    /// passive reconcile.
    pub async fn handle_event(&self, event: WalletEvent) -> SessionChange {
        match event {
            WalletEvent::AccountsChanged(accounts) => match accounts.first().copied() {
                None => {
                    self.state.send_modify(|s| {
                        s.status = ConnectionStatus::Disconnected;
                        s.account = None;
                    });
                    info!("Wallet disconnected");
                    SessionChange::Disconnected
                }
                Some(account) => {
                    self.state.send_modify(|s| {
                        s.status = ConnectionStatus::Connected;
                        s.account = Some(account);
                        s.error = None;
                    });
                    info!(account = %account, "Wallet account changed");
                    SessionChange::AccountChanged(account)
                }
            },
            WalletEvent::ChainChanged(chain_id) => {
                info!(chain_id, "Wallet network changed, reloading session");
                self.state.send_replace(SessionState::default());
                if let Err(e) = self.reconcile().await {
                    warn!(error = %e, "Failed to restore session after network change");
                    self.state.send_modify(|s| s.error = Some(e.to_string()));
                }
                SessionChange::Reloaded
            }
        }
    }

    /// Feeds provider notifications into [`WalletSession::handle_event`] until
    /// the provider goes away. Returns `None` without a provider.
    pub fn spawn_event_loop(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let mut events = self.provider.as_ref()?.subscribe();
        let session = Arc::clone(self);

        Some(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        session.handle_event(event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Wallet events lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::hex::FromHex;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::broadcast;

    struct MockWalletProvider {
        accounts: Mutex<Vec<Address>>,
        authorized: bool,
        reject: bool,
        chain_id: Mutex<u64>,
        known_chains: Mutex<Vec<u64>>,
        calls: Mutex<Vec<String>>,
        events: broadcast::Sender<WalletEvent>,
    }

    impl MockWalletProvider {
        fn new(accounts: Vec<Address>, chain_id: u64) -> Self {
            let (events, _) = broadcast::channel(8);
            Self {
                accounts: Mutex::new(accounts),
                authorized: true,
                reject: false,
                chain_id: Mutex::new(chain_id),
                known_chains: Mutex::new(vec![chain_id, 80002]),
                calls: Mutex::new(Vec::new()),
                events,
            }
        }

        fn unauthorized(mut self) -> Self {
            self.authorized = false;
            self
        }

        fn rejecting(mut self) -> Self {
            self.reject = true;
            self
        }

        fn without_known_chain(self, chain_id: u64) -> Self {
            self.known_chains.lock().unwrap().retain(|c| *c != chain_id);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }
    }

    #[async_trait]
    impl WalletProvider for MockWalletProvider {
        async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
            self.record("request_accounts");
            if self.reject {
                return Err(WalletError::UserRejected("User denied account authorization".to_string()));
            }
            Ok(self.accounts.lock().unwrap().clone())
        }

        async fn list_accounts(&self) -> Result<Vec<Address>, WalletError> {
            self.record("list_accounts");
            if !self.authorized {
                return Ok(Vec::new());
            }
            Ok(self.accounts.lock().unwrap().clone())
        }

        async fn chain_id(&self) -> Result<u64, WalletError> {
            Ok(*self.chain_id.lock().unwrap())
        }

        async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
            self.record("switch_chain");
            if !self.known_chains.lock().unwrap().contains(&chain_id) {
                return Err(WalletError::UnknownChain(chain_id));
            }
            *self.chain_id.lock().unwrap() = chain_id;
            Ok(())
        }

        async fn add_chain(&self, network: &NetworkConfig) -> Result<(), WalletError> {
            self.record("add_chain");
            self.known_chains.lock().unwrap().push(network.chain_id);
            Ok(())
        }

        fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
            self.events.subscribe()
        }
    }

    fn account_a() -> Address {
        Address::from_hex("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045").unwrap()
    }

    fn account_b() -> Address {
        Address::from_hex("0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA").unwrap()
    }

    fn session_with(provider: Arc<MockWalletProvider>) -> Arc<WalletSession> {
        let provider: Arc<dyn WalletProvider> = provider;
        Arc::new(WalletSession::new(Some(provider), NetworkConfig::default()))
    }

    #[tokio::test]
    async fn test_connect_without_provider() {
        let session = WalletSession::new(None, NetworkConfig::default());
        let result = session.connect().await;

        assert_eq!(result, Err(WalletError::ProviderMissing));
        let state = session.state();
        assert_eq!(state.status, ConnectionStatus::Disconnected);
        assert!(state.error.is_some());
    }

    #[tokio::test]
    async fn test_connect_rejected_holds_error() {
        let provider = Arc::new(MockWalletProvider::new(vec![account_a()], 80002).rejecting());
        let session = session_with(provider);

        let result = session.connect().await;

        assert!(matches!(result, Err(WalletError::UserRejected(_))));
        let state = session.state();
        assert_eq!(state.status, ConnectionStatus::Disconnected);
        assert!(state.account.is_none());
        assert!(state.error.unwrap().contains("User denied"));
    }

    #[tokio::test]
    async fn test_connect_on_required_network() {
        let provider = Arc::new(MockWalletProvider::new(vec![account_a(), account_b()], 80002));
        let session = session_with(provider.clone());

        let account = session.connect().await.unwrap();

        assert_eq!(account, account_a());
        assert_eq!(session.account(), Some(account_a()));
        assert!(session.is_on_required_network());
        assert_eq!(provider.calls(), vec!["request_accounts"]);
    }

    #[tokio::test]
    async fn test_connect_switches_known_network() {
        let provider = Arc::new(MockWalletProvider::new(vec![account_a()], 1));
        let session = session_with(provider.clone());

        session.connect().await.unwrap();

        assert_eq!(provider.calls(), vec!["request_accounts", "switch_chain"]);
        assert_eq!(session.chain_id(), Some(80002));
    }

    #[tokio::test]
    async fn test_connect_registers_unknown_network_then_retries_switch() {
        let provider =
            Arc::new(MockWalletProvider::new(vec![account_a()], 1).without_known_chain(80002));
        let session = session_with(provider.clone());

        session.connect().await.unwrap();

        assert_eq!(
            provider.calls(),
            vec!["request_accounts", "switch_chain", "add_chain", "switch_chain"]
        );
        assert!(session.is_on_required_network());
        assert_eq!(session.state().status, ConnectionStatus::Connected);
    }

    #[tokio::test]
    async fn test_reconcile_adopts_authorized_account_without_prompt() {
        let provider = Arc::new(MockWalletProvider::new(vec![account_b(), account_a()], 80002));
        let session = session_with(provider.clone());

        let adopted = session.reconcile().await.unwrap();

        assert_eq!(adopted, Some(account_b()));
        assert_eq!(session.state().status, ConnectionStatus::Connected);
        assert_eq!(provider.calls(), vec!["list_accounts"]);
    }

    #[tokio::test]
    async fn test_reconcile_without_authorization_stays_disconnected() {
        let provider =
            Arc::new(MockWalletProvider::new(vec![account_a()], 80002).unauthorized());
        let session = session_with(provider);

        assert_eq!(session.reconcile().await.unwrap(), None);
        assert_eq!(session.state().status, ConnectionStatus::Disconnected);
        assert!(session.account().is_none());
    }

    #[tokio::test]
    async fn test_empty_accounts_event_disconnects() {
        let provider = Arc::new(MockWalletProvider::new(vec![account_a()], 80002));
        let session = session_with(provider);
        session.connect().await.unwrap();

        let change = session.handle_event(WalletEvent::AccountsChanged(vec![])).await;

        assert_eq!(change, SessionChange::Disconnected);
        assert_eq!(session.state().status, ConnectionStatus::Disconnected);
        assert!(session.account().is_none());
    }

    #[tokio::test]
    async fn test_accounts_event_adopts_new_account() {
        let provider = Arc::new(MockWalletProvider::new(vec![account_a()], 80002));
        let session = session_with(provider);
        session.connect().await.unwrap();

        let change = session
            .handle_event(WalletEvent::AccountsChanged(vec![account_b()]))
            .await;

        assert_eq!(change, SessionChange::AccountChanged(account_b()));
        assert_eq!(session.account(), Some(account_b()));
    }

    #[tokio::test]
    async fn test_chain_event_reloads_session() {
        let provider = Arc::new(MockWalletProvider::new(vec![account_a()], 80002));
        let session = session_with(provider.clone());
        session.connect().await.unwrap();

        *provider.chain_id.lock().unwrap() = 137;
        let change = session.handle_event(WalletEvent::ChainChanged(137)).await;

        assert_eq!(change, SessionChange::Reloaded);
        let state = session.state();
        assert_eq!(state.status, ConnectionStatus::Connected);
        assert_eq!(state.chain_id, Some(137));
        assert!(!session.is_on_required_network());
    }

    #[tokio::test]
    async fn test_event_loop_applies_provider_events() {
        let provider = Arc::new(MockWalletProvider::new(vec![account_a()], 80002));
        let session = session_with(provider.clone());
        session.connect().await.unwrap();

        let mut state_rx = session.subscribe();
        state_rx.borrow_and_update();
        let handle = session.spawn_event_loop().unwrap();

        provider
            .events
            .send(WalletEvent::AccountsChanged(vec![]))
            .unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(1), state_rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state_rx.borrow().status, ConnectionStatus::Disconnected);

        handle.abort();
    }

    #[test]
    fn test_spawn_event_loop_without_provider() {
        let session = Arc::new(WalletSession::new(None, NetworkConfig::default()));
        assert!(session.spawn_event_loop().is_none());
    }
}
