/// Native currency metadata announced when registering a network with a wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// The network the session is required to be attached to.
///
/// Carries everything a wallet needs to register the chain when it does not
/// know it yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
    pub native_currency: NativeCurrency,
}

impl NetworkConfig {
    /// Chain id as the `0x`-prefixed hex quantity used by wallet RPC methods.
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }
}

impl Default for NetworkConfig {
    /// Polygon Amoy testnet.
    fn default() -> Self {
        Self {
            chain_id: 80002,
            chain_name: "Polygon Amoy Testnet".to_string(),
            rpc_urls: vec!["https://rpc-amoy.polygon.technology".to_string()],
            block_explorer_urls: vec!["https://amoy.polygonscan.com".to_string()],
            native_currency: NativeCurrency {
                name: "MATIC".to_string(),
                symbol: "MATIC".to_string(),
                decimals: 18,
            },
        }
    }
}
