//! Write path: submits a text action to the `EventLogger` contract.
//!
//! [`ActionWriter`] gates submissions behind a pending flag so a single writer
//! never has two transactions in flight, and reports progress as
//! [`WriteNotice`]s on a broadcast channel.
mod contract;

pub use contract::AlloyActionContract;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use action_logger_shared::types::NewActionEvent;
use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{error, info, instrument, warn};

use crate::errors::{ChainError, WriteError};
use crate::feed::EventFeed;
use crate::wallet::WalletSession;

const NOTICE_CAPACITY: usize = 64;

/// What the chain reported for a confirmed `log` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    /// Index of the `ActionLogged` log within its block, when found in the receipt.
    pub log_index: Option<u64>,
    pub block_timestamp: Option<DateTime<Utc>>,
}

/// The contract surface the writer needs.
#[async_trait]
pub trait ActionContract: Send + Sync {
    /// Sends `log(action)` from `from` and returns the transaction hash.
    async fn send_action(&self, from: Address, action: &str) -> Result<TxHash, ChainError>;

    /// Waits for the transaction to be included.
    ///
    /// Fails with [`ChainError::Reverted`] when the receipt reports a failed status.
    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<ActionReceipt, ChainError>;
}

/// Progress of a submission, in emission order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteNotice {
    PendingChanged(bool),
    Sent(TxHash),
    Confirmed(ActionReceipt),
    Failed(String),
    /// The confirmed action was written to the events table by this writer.
    Synced { inserted: bool },
    SyncFailed(String),
}

pub struct ActionWriter {
    contract: Option<Arc<dyn ActionContract>>,
    session: Arc<WalletSession>,
    direct_insert: Option<Arc<EventFeed>>,
    pending: AtomicBool,
    notices: broadcast::Sender<WriteNotice>,
}

impl ActionWriter {
    /// Creates a writer. `contract` is `None` when no contract address is configured,
    /// in which case every submission is refused.
    pub fn new(contract: Option<Arc<dyn ActionContract>>, session: Arc<WalletSession>) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            contract,
            session,
            direct_insert: None,
            pending: AtomicBool::new(false),
            notices,
        }
    }

    /// Makes this writer the authoritative table writer: confirmed actions are
    /// inserted through `feed` instead of waiting for a listener.
    pub fn with_direct_insert(mut self, feed: Arc<EventFeed>) -> Self {
        self.direct_insert = Some(feed);
        self
    }

    /// Returns true when a contract address is configured.
    pub fn is_enabled(&self) -> bool {
        self.contract.is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WriteNotice> {
        self.notices.subscribe()
    }

    /// Sends `action` to the contract and waits for it to be included.
    ///
    /// # Arguments
    ///
    /// * `action` - Free text; rejected when empty after trimming
    ///
    /// # Returns
    ///
    /// * `Ok(ActionReceipt)` - The transaction was confirmed
    /// * `Err(WriteError)` - The submission was refused or the transaction failed
    #[instrument(skip(self, action), fields(len = action.len()))]
    pub async fn submit(&self, action: &str) -> Result<ActionReceipt, WriteError> {
        if action.trim().is_empty() {
            return Err(WriteError::EmptyAction);
        }
        let contract = self
            .contract
            .as_ref()
            .ok_or(WriteError::ContractNotConfigured)?;
        let from = self.session.account().ok_or(WriteError::NotConnected)?;
        let _pending = PendingGuard::acquire(self).ok_or(WriteError::AlreadyPending)?;

        let receipt = match self.send_and_confirm(contract.as_ref(), from, action).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(error = %e, "Action submission failed");
                self.notify(WriteNotice::Failed(e.reason().to_string()));
                return Err(e.into());
            }
        };

        if let Some(feed) = self.direct_insert.as_ref() {
            self.insert_confirmed(feed, from, action, &receipt).await;
        }
        Ok(receipt)
    }

    async fn send_and_confirm(
        &self,
        contract: &dyn ActionContract,
        from: Address,
        action: &str,
    ) -> Result<ActionReceipt, ChainError> {
        let tx_hash = contract.send_action(from, action).await?;
        info!(tx_hash = %tx_hash, "Action transaction sent");
        self.notify(WriteNotice::Sent(tx_hash));

        let receipt = contract.wait_for_confirmation(tx_hash).await?;
        info!(tx_hash = %tx_hash, block_number = ?receipt.block_number, "Action confirmed");
        self.notify(WriteNotice::Confirmed(receipt.clone()));
        Ok(receipt)
    }

    async fn insert_confirmed(
        &self,
        feed: &EventFeed,
        from: Address,
        action: &str,
        receipt: &ActionReceipt,
    ) {
        let event = NewActionEvent::new(from, action)
            .with_block_timestamp(receipt.block_timestamp)
            .with_log_key(receipt.tx_hash, receipt.log_index);

        match feed.insert(event).await {
            Ok(inserted) => self.notify(WriteNotice::Synced { inserted }),
            Err(e) => {
                error!(error = %e, tx_hash = %receipt.tx_hash, "Failed to store confirmed action");
                self.notify(WriteNotice::SyncFailed(e.to_string()));
            }
        }
    }

    fn notify(&self, notice: WriteNotice) {
        // No subscribers is fine.
        let _ = self.notices.send(notice);
    }
}

/// Holds the pending flag for the lifetime of one submission.
struct PendingGuard<'a> {
    writer: &'a ActionWriter,
}

impl<'a> PendingGuard<'a> {
    fn acquire(writer: &'a ActionWriter) -> Option<Self> {
        writer
            .pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        writer.notify(WriteNotice::PendingChanged(true));
        Some(Self { writer })
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.writer.pending.store(false, Ordering::Release);
        self.writer.notify(WriteNotice::PendingChanged(false));
    }
}
