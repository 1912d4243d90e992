//! Environment-backed application settings.
use std::env;
use std::time::Duration;

use action_logger_pipeline::feed::FeedConfig;
use action_logger_pipeline::sync::SyncStrategy;
use action_logger_shared::types::{NativeCurrency, NetworkConfig};
use alloy::primitives::Address;
use tracing::warn;

use crate::errors::AppError;

/// Value shipped in sample configuration before a contract is deployed.
pub const CONTRACT_ADDRESS_PLACEHOLDER: &str = "<SET_ME>";

/// Default interval of the wallet change watcher, in milliseconds.
const DEFAULT_WALLET_POLL_MS: u64 = 1_000;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// `None` leaves the read path reporting a missing connection string.
    pub database_url: Option<String>,
    /// `None` gates the write and listen paths.
    pub contract_address: Option<Address>,
    /// `None` means no wallet is available.
    pub wallet_rpc_url: Option<String>,
    pub wallet_private_key: Option<String>,
    pub wallet_poll_interval: Duration,
    pub network: NetworkConfig,
    pub sync_strategy: SyncStrategy,
    pub feed: FeedConfig,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DATABASE_URL`: Postgres connection string
    /// - `CONTRACT_ADDRESS`: deployed `EventLogger` address (`<SET_ME>` when not deployed)
    /// - `WALLET_RPC_URL`: wallet JSON-RPC endpoint
    /// - `WALLET_PRIVATE_KEY`: optional local signing key used with `WALLET_RPC_URL`
    /// - `WALLET_POLL_INTERVAL_MS`: wallet change watcher interval (default: 1000)
    /// - `CHAIN_ID`, `CHAIN_NAME`, `CHAIN_RPC_URL`, `CHAIN_EXPLORER_URL`,
    ///   `CHAIN_CURRENCY_NAME`, `CHAIN_CURRENCY_SYMBOL`: required network (default: Polygon Amoy)
    /// - `SYNC_STRATEGY`: `listener` (default) or `direct`
    /// - `FEED_LIMIT`: rows per refresh (default: 50)
    /// - `FEED_POLL_INTERVAL_MS`: refresh interval (default: 2000)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = NetworkConfig::default();
        let network = NetworkConfig {
            chain_id: parse_or(get("CHAIN_ID"), "CHAIN_ID", defaults.chain_id)?,
            chain_name: get("CHAIN_NAME").unwrap_or(defaults.chain_name),
            rpc_urls: get("CHAIN_RPC_URL").map(|url| vec![url]).unwrap_or(defaults.rpc_urls),
            block_explorer_urls: get("CHAIN_EXPLORER_URL")
                .map(|url| vec![url])
                .unwrap_or(defaults.block_explorer_urls),
            native_currency: NativeCurrency {
                name: get("CHAIN_CURRENCY_NAME").unwrap_or(defaults.native_currency.name),
                symbol: get("CHAIN_CURRENCY_SYMBOL").unwrap_or(defaults.native_currency.symbol),
                decimals: defaults.native_currency.decimals,
            },
        };

        let sync_strategy = match get("SYNC_STRATEGY") {
            Some(raw) => raw
                .parse::<SyncStrategy>()
                .map_err(|e| AppError::config(e.to_string()))?,
            None => SyncStrategy::default(),
        };

        let feed_defaults = FeedConfig::default();
        let feed = FeedConfig {
            limit: parse_or(get("FEED_LIMIT"), "FEED_LIMIT", feed_defaults.limit)?,
            poll_interval: get("FEED_POLL_INTERVAL_MS")
                .map(|raw| parse_millis(&raw, "FEED_POLL_INTERVAL_MS"))
                .transpose()?
                .unwrap_or(feed_defaults.poll_interval),
        };
        if feed.limit <= 0 {
            return Err(AppError::config("FEED_LIMIT must be positive"));
        }

        let wallet_poll_interval = get("WALLET_POLL_INTERVAL_MS")
            .map(|raw| parse_millis(&raw, "WALLET_POLL_INTERVAL_MS"))
            .transpose()?
            .unwrap_or(Duration::from_millis(DEFAULT_WALLET_POLL_MS));

        Ok(Self {
            database_url: get("DATABASE_URL"),
            contract_address: parse_contract_address(get("CONTRACT_ADDRESS")),
            wallet_rpc_url: get("WALLET_RPC_URL"),
            wallet_private_key: get("WALLET_PRIVATE_KEY"),
            wallet_poll_interval,
            network,
            sync_strategy,
            feed,
        })
    }

    pub fn is_contract_configured(&self) -> bool {
        self.contract_address.is_some()
    }
}

/// An unset, placeholder or malformed address leaves the contract unconfigured.
fn parse_contract_address(raw: Option<String>) -> Option<Address> {
    let Some(raw) = raw else {
        warn!("CONTRACT_ADDRESS is not set, writes are disabled");
        return None;
    };
    if raw == CONTRACT_ADDRESS_PLACEHOLDER {
        warn!("CONTRACT_ADDRESS is still the placeholder, writes are disabled");
        return None;
    }

    match raw.parse::<Address>() {
        Ok(address) => Some(address),
        Err(e) => {
            warn!(value = %raw, error = %e, "CONTRACT_ADDRESS is not a valid address, writes are disabled");
            None
        }
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T, AppError> {
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::config(format!("{key} has an invalid value `{raw}`"))),
        None => Ok(default),
    }
}

fn parse_millis(raw: &str, key: &str) -> Result<Duration, AppError> {
    let millis: u64 = parse_or(Some(raw.to_string()), key, 0)?;
    if millis == 0 {
        return Err(AppError::config(format!("{key} must be positive")));
    }
    Ok(Duration::from_millis(millis))
}
