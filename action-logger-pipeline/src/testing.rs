//! In-memory doubles shared by unit tests.
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use action_logger_repository::{ColumnInfo, EventsRepository, EventsRepositoryError};
use action_logger_shared::types::{encode_address, ActionEvent, NetworkConfig, NewActionEvent};
use alloy::primitives::{address, Address};
use alloy::providers::mock::Asserter;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::json_rpc::ErrorPayload;
use alloy::rpc::types::Block;
use async_trait::async_trait;
use chrono::{DateTime, Duration};
use tokio::sync::broadcast;

use crate::errors::WalletError;
use crate::wallet::{WalletEvent, WalletProvider, WalletSession};

pub(crate) fn user() -> Address {
    address!("0xd8da6bf26964af9d7eed9e03e53415d37aa96045")
}

/// A provider answering from the asserter's queue, in push order.
pub(crate) fn mocked_provider() -> (Asserter, DynProvider) {
    let asserter = Asserter::new();
    let provider = ProviderBuilder::new()
        .connect_mocked_client(asserter.clone())
        .erased();
    (asserter, provider)
}

/// A JSON-RPC error object with the given code.
pub(crate) fn rpc_failure(code: i64, message: &'static str) -> ErrorPayload {
    ErrorPayload {
        code,
        message: message.into(),
        data: None,
    }
}

pub(crate) fn block_at(number: u64, timestamp: u64) -> Block {
    let mut block: Block = Block::default();
    block.header.inner.number = number;
    block.header.inner.timestamp = timestamp;
    block
}

/// Keeps rows in a vector and mirrors the ordering and dedup rules of the table.
#[derive(Default)]
pub(crate) struct InMemoryEventsRepository {
    rows: Mutex<Vec<ActionEvent>>,
    failing: AtomicBool,
    reads: AtomicUsize,
}

impl InMemoryEventsRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn rows(&self) -> Vec<ActionEvent> {
        self.rows.lock().unwrap().clone()
    }

    /// Inserts bypassing the failure toggle.
    pub(crate) fn seed(&self, event: NewActionEvent) -> bool {
        self.store(&event)
    }

    fn store(&self, event: &NewActionEvent) -> bool {
        let mut rows = self.rows.lock().unwrap();
        let tx_hash = event.tx_hash.map(|hash| hash.to_string());
        let log_index = event.log_index.map(|index| index as i64);

        if event.has_natural_key()
            && rows
                .iter()
                .any(|row| row.tx_hash == tx_hash && row.log_index == log_index)
        {
            return false;
        }

        let id = rows.len() as i64 + 1;
        let base = DateTime::from_timestamp(1_755_000_000, 0).unwrap();
        rows.push(ActionEvent {
            id,
            user_address: encode_address(&event.user),
            action: event.action.clone(),
            created_at: base + Duration::seconds(id),
            block_timestamp: event.block_timestamp,
            tx_hash,
            log_index,
        });
        true
    }

    fn check(&self) -> Result<(), EventsRepositoryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EventsRepositoryError::DatabaseError(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl EventsRepository for InMemoryEventsRepository {
    async fn recent_events(&self, limit: i64) -> Result<Vec<ActionEvent>, EventsRepositoryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut rows = self.rows();
        rows.sort_by(|a, b| {
            b.ordering_timestamp()
                .cmp(&a.ordering_timestamp())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn insert_event(&self, event: &NewActionEvent) -> Result<bool, EventsRepositoryError> {
        self.check()?;
        Ok(self.store(event))
    }

    async fn ensure_schema(&self) -> Result<(), EventsRepositoryError> {
        self.check()
    }

    async fn prune_events_without_block_timestamp(&self) -> Result<u64, EventsRepositoryError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|row| row.block_timestamp.is_some());
        Ok((before - rows.len()) as u64)
    }

    async fn describe_columns(&self) -> Result<Vec<ColumnInfo>, EventsRepositoryError> {
        self.check()?;
        Ok(Vec::new())
    }
}

/// A wallet that already authorized `account` and sits on `chain_id`.
pub(crate) struct FixedWallet {
    account: Address,
    chain_id: u64,
    events: broadcast::Sender<WalletEvent>,
}

impl FixedWallet {
    pub(crate) fn new(account: Address, chain_id: u64) -> Self {
        let (events, _) = broadcast::channel(8);
        Self {
            account,
            chain_id,
            events,
        }
    }
}

#[async_trait]
impl WalletProvider for FixedWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(vec![self.account])
    }

    async fn list_accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(vec![self.account])
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(self.chain_id)
    }

    async fn switch_chain(&self, _chain_id: u64) -> Result<(), WalletError> {
        Err(WalletError::Rpc("fixed wallet cannot switch".to_string()))
    }

    async fn add_chain(&self, _network: &NetworkConfig) -> Result<(), WalletError> {
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

/// A session connected through [`FixedWallet`] on the default network.
pub(crate) async fn connected_session() -> Arc<WalletSession> {
    let network = NetworkConfig::default();
    let provider: Arc<dyn WalletProvider> = Arc::new(FixedWallet::new(user(), network.chain_id));
    let session = Arc::new(WalletSession::new(Some(provider), network));
    session.connect().await.unwrap();
    session
}

/// A session with a wallet present but never connected.
pub(crate) fn disconnected_session() -> Arc<WalletSession> {
    let network = NetworkConfig::default();
    let provider: Arc<dyn WalletProvider> = Arc::new(FixedWallet::new(user(), network.chain_id));
    Arc::new(WalletSession::new(Some(provider), network))
}
