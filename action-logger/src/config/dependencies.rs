//! Dependency initialization and wiring for the action logger.
use std::str::FromStr;
use std::sync::Arc;

use action_logger_pipeline::deployer::{AlloyDeploymentSender, ContractDeployer};
use action_logger_pipeline::errors::WalletError;
use action_logger_pipeline::feed::EventFeed;
use action_logger_pipeline::sync::{
    ActionEventSource, ActionListener, AlloyEventSource, SyncStrategy,
};
use action_logger_pipeline::wallet::{RpcWalletProvider, WalletProvider, WalletSession};
use action_logger_pipeline::writer::{ActionContract, ActionWriter, AlloyActionContract};
use action_logger_repository::{EventsRepository, PostgresEventsRepository};
use action_logger_shared::types::NetworkConfig;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use super::AppConfig;
use crate::errors::AppError;

/// Maximum number of pooled database connections.
const DB_MAX_CONNECTIONS: u32 = 5;

/// Container for all initialized components.
pub struct Dependencies {
    pub config: AppConfig,
    pub wallet: Option<Arc<RpcWalletProvider>>,
    pub session: Arc<WalletSession>,
    pub repository: Option<Arc<dyn EventsRepository>>,
    pub feed: Arc<EventFeed>,
    pub writer: Arc<ActionWriter>,
    /// Present only with the listener sync strategy.
    pub listener: Option<ActionListener>,
}

impl Dependencies {
    /// Wires every component from `config`.
    ///
    /// Nothing here talks to the database: the pool connects lazily on first
    /// use, so a wrong `DATABASE_URL` surfaces through the feed state instead
    /// of aborting startup.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized components
    /// * `Err(AppError)` - Malformed connection string, key or RPC URL
    pub async fn new(config: AppConfig) -> Result<Self, AppError> {
        info!(
            chain_id = config.network.chain_id,
            contract_configured = config.is_contract_configured(),
            database_configured = config.database_url.is_some(),
            wallet_configured = config.wallet_rpc_url.is_some(),
            sync_strategy = %config.sync_strategy,
            "Initializing dependencies"
        );

        let repository = Self::connect_repository(config.database_url.as_deref()).await?;
        let wallet = Self::connect_wallet(&config).await?;

        let provider = wallet.as_ref().map(|w| {
            let provider: Arc<dyn WalletProvider> = w.clone();
            provider
        });
        let session = Arc::new(WalletSession::new(provider, config.network.clone()));
        let feed = Arc::new(EventFeed::new(repository.clone(), config.feed.clone()));

        let chain = match (&wallet, config.contract_address) {
            (Some(wallet), _) => Some(wallet.provider().clone()),
            (None, Some(_)) => Some(read_only_provider(&config.network).await?),
            (None, None) => None,
        };

        let contract = config.contract_address.zip(chain.clone()).map(|(address, chain)| {
            let contract: Arc<dyn ActionContract> = Arc::new(AlloyActionContract::new(chain, address));
            contract
        });
        let mut writer = ActionWriter::new(contract, Arc::clone(&session));

        let listener = match config.sync_strategy {
            SyncStrategy::Listener => {
                let source = config.contract_address.zip(chain).map(|(address, chain)| {
                    let source: Arc<dyn ActionEventSource> =
                        Arc::new(AlloyEventSource::new(chain, address));
                    source
                });
                Some(ActionListener::new(source, Arc::clone(&feed)))
            }
            SyncStrategy::DirectInsert => {
                writer = writer.with_direct_insert(Arc::clone(&feed));
                None
            }
        };

        Ok(Self {
            config,
            wallet,
            session,
            repository,
            feed,
            writer: Arc::new(writer),
            listener,
        })
    }

    /// Builds a deployer that signs through the configured wallet.
    pub fn deployer(&self) -> Result<ContractDeployer, AppError> {
        let wallet = self.wallet.as_ref().ok_or(WalletError::ProviderMissing)?;
        let sender = Arc::new(AlloyDeploymentSender::new(wallet.provider().clone()));
        Ok(ContractDeployer::new(sender, Arc::clone(&self.session)))
    }

    async fn connect_repository(
        database_url: Option<&str>,
    ) -> Result<Option<Arc<dyn EventsRepository>>, AppError> {
        let Some(database_url) = database_url else {
            warn!("DATABASE_URL is not set, the feed stays empty");
            return Ok(None);
        };

        let pool = PgPoolOptions::new()
            .max_connections(DB_MAX_CONNECTIONS)
            .connect_lazy(database_url)?;
        let repository: Arc<dyn EventsRepository> =
            Arc::new(PostgresEventsRepository::new(pool).await?);
        Ok(Some(repository))
    }

    async fn connect_wallet(config: &AppConfig) -> Result<Option<Arc<RpcWalletProvider>>, AppError> {
        let Some(url) = config.wallet_rpc_url.as_deref() else {
            warn!("WALLET_RPC_URL is not set, no wallet is available");
            return Ok(None);
        };

        let signer = config
            .wallet_private_key
            .as_deref()
            .map(PrivateKeySigner::from_str)
            .transpose()
            .map_err(|e| AppError::config(format!("WALLET_PRIVATE_KEY is invalid: {e}")))?;

        let wallet = RpcWalletProvider::connect(url, signer).await?;
        Ok(Some(Arc::new(wallet)))
    }
}

/// A provider for reading contract logs when no wallet is configured.
async fn read_only_provider(network: &NetworkConfig) -> Result<DynProvider, AppError> {
    let url = network
        .rpc_urls
        .first()
        .ok_or_else(|| AppError::config("CHAIN_RPC_URL is not set"))?;
    let provider = ProviderBuilder::new()
        .connect(url)
        .await
        .map_err(|e| AppError::config(format!("CHAIN_RPC_URL is unreachable: {e}")))?;
    Ok(provider.erased())
}
