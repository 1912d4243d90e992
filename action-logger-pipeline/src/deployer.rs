//! Deploys a fresh `EventLogger` from a precompiled artifact.
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use alloy::network::{ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, Bytes};
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::errors::{ChainError, DeployError};
use crate::wallet::WalletSession;

/// Creation bytecode as emitted by different toolchains: either a bare hex
/// string or an object holding it.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
enum Bytecode {
    Hex(String),
    Object { object: String },
}

/// A compiled contract: `{ "abi": [...], "bytecode": "0x..." }`.
#[derive(Clone, Debug, Deserialize)]
pub struct ContractArtifact {
    pub abi: serde_json::Value,
    bytecode: Bytecode,
}

impl ContractArtifact {
    pub fn from_json(json: &str) -> Result<Self, ChainError> {
        serde_json::from_str(json).map_err(|e| ChainError::Artifact(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ChainError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ChainError::Artifact(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Decodes the creation bytecode.
    pub fn creation_code(&self) -> Result<Bytes, ChainError> {
        let hex = match &self.bytecode {
            Bytecode::Hex(hex) | Bytecode::Object { object: hex } => hex,
        };
        let code = Bytes::from_str(hex.trim()).map_err(|e| ChainError::Artifact(e.to_string()))?;
        if code.is_empty() {
            return Err(ChainError::Artifact("bytecode is empty".to_string()));
        }
        Ok(code)
    }
}

/// Sends a contract creation transaction and waits for its receipt.
#[async_trait]
pub trait DeploymentSender: Send + Sync {
    /// Returns the created contract address reported by the receipt, if any.
    async fn deploy_code(&self, from: Address, code: Bytes) -> Result<Option<Address>, ChainError>;
}

#[derive(Clone)]
pub struct AlloyDeploymentSender {
    provider: DynProvider,
}

impl AlloyDeploymentSender {
    pub fn new(provider: DynProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl DeploymentSender for AlloyDeploymentSender {
    async fn deploy_code(&self, from: Address, code: Bytes) -> Result<Option<Address>, ChainError> {
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_deploy_code(code);
        let pending = self.provider.send_transaction(tx).await?;
        let tx_hash = *pending.tx_hash();
        info!(tx_hash = %tx_hash, "Deployment transaction sent");

        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            return Err(ChainError::Reverted(format!("deployment {tx_hash} reverted")));
        }
        Ok(receipt.contract_address())
    }
}

pub struct ContractDeployer {
    sender: Arc<dyn DeploymentSender>,
    session: Arc<WalletSession>,
}

impl ContractDeployer {
    pub fn new(sender: Arc<dyn DeploymentSender>, session: Arc<WalletSession>) -> Self {
        Self { sender, session }
    }

    /// Deploys `artifact` from the session account.
    ///
    /// # Returns
    ///
    /// * `Ok(Address)` - Address of the new contract
    /// * `Err(DeployError)` - Not connected, wrong network, bad artifact or failed transaction
    #[instrument(skip(self, artifact))]
    pub async fn deploy(&self, artifact: &ContractArtifact) -> Result<Address, DeployError> {
        let account = self.session.account().ok_or(DeployError::NotConnected)?;
        if !self.session.is_on_required_network() {
            return Err(DeployError::WrongNetwork {
                expected: self.session.network().chain_id,
                actual: self.session.chain_id(),
            });
        }

        let code = artifact.creation_code()?;
        let address = self
            .sender
            .deploy_code(account, code)
            .await?
            .ok_or(DeployError::MissingContractAddress)?;

        info!(address = %address, "EventLogger deployed");
        Ok(address)
    }
}
