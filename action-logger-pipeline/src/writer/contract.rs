//! `ActionContract` implementation backed by the `EventLogger` bindings.
use action_logger_shared::contract::{ActionLogged, EventLogger, EventLoggerInstance};
use alloy::primitives::{Address, TxHash};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;

use super::{ActionContract, ActionReceipt};
use crate::block_time::block_timestamp;
use crate::errors::ChainError;

/// Calls `log(string)` on a deployed `EventLogger` through an alloy provider.
#[derive(Clone)]
pub struct AlloyActionContract {
    provider: DynProvider,
    address: Address,
}

impl AlloyActionContract {
    pub fn new(provider: DynProvider, address: Address) -> Self {
        Self { provider, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn instance(&self) -> EventLoggerInstance<DynProvider> {
        EventLogger::new(self.address, self.provider.clone())
    }

    /// Builds the receipt of a mined transaction from its logs.
    async fn action_receipt(
        &self,
        tx_hash: TxHash,
        block_number: Option<u64>,
        logs: &[Log],
    ) -> ActionReceipt {
        let logged = logs.iter().find(|log| {
            log.address() == self.address && log.topic0() == Some(&ActionLogged::SIGNATURE_HASH)
        });
        let carried = logged.and_then(|log| log.block_timestamp);

        ActionReceipt {
            tx_hash,
            block_number,
            log_index: logged.and_then(|log| log.log_index),
            block_timestamp: block_timestamp(&self.provider, carried, block_number).await,
        }
    }
}

#[async_trait]
impl ActionContract for AlloyActionContract {
    async fn send_action(&self, from: Address, action: &str) -> Result<TxHash, ChainError> {
        let pending = self
            .instance()
            .log(action.to_string())
            .from(from)
            .send()
            .await?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<ActionReceipt, ChainError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .get_receipt()
            .await?;

        if !receipt.status() {
            return Err(ChainError::Reverted(format!("transaction {tx_hash} reverted")));
        }

        Ok(self
            .action_receipt(tx_hash, receipt.block_number, receipt.inner.logs())
            .await)
    }
}
