use crate::contract;
use anyhow::{anyhow, Result};
use ethers::providers::{Http, Provider};
use ethers::types::Address;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A supported EVM network with label, chain ID, native token, and default RPC.
#[derive(Clone, Debug)]
pub struct EvmNetwork {
    pub label: &'static str,
    pub chain_id: u64,
    pub native_token: &'static str,
    pub default_rpc: &'static str,
    pub testnet: bool,
}

impl EvmNetwork {
    pub const fn new(
        label: &'static str,
        chain_id: u64,
        native_token: &'static str,
        default_rpc: &'static str,
        testnet: bool,
    ) -> Self {
        Self {
            label,
            chain_id,
            native_token,
            default_rpc,
            testnet,
        }
    }

    /// Chain ID in the `0x`-prefixed hex form wallets and indexers use
    pub fn hex_chain_id(&self) -> String {
        format!("0x{:x}", self.chain_id)
    }
}

/// Networks the multisender can switch to.
pub const NETWORKS: &[EvmNetwork] = &[
    EvmNetwork::new("Ethereum Mainnet", 1, "ETH", "https://ethereum-rpc.publicnode.com", false),
    EvmNetwork::new("BNB Smart Chain", 56, "BNB", "https://bsc-dataseed.binance.org", false),
    EvmNetwork::new("Polygon (MATIC)", 137, "POL", "https://polygon-rpc.com", false),
    EvmNetwork::new("Sepolia", 11155111, "ETH", "https://ethereum-sepolia-rpc.publicnode.com", true),
    EvmNetwork::new("Holesky", 17000, "ETH", "https://ethereum-holesky-rpc.publicnode.com", true),
    EvmNetwork::new("Polygon Amoy", 80002, "POL", "https://rpc-amoy.polygon.technology", true),
    EvmNetwork::new("Polygon Mumbai", 80001, "MATIC", "https://rpc-mumbai.maticvigil.com", true),
    EvmNetwork::new("Gnosis Chiado", 10200, "xDAI", "https://rpc.chiadochain.net", true),
];

/// Find a network by chain ID
pub fn find_network_by_chain_id(chain_id: u64) -> Option<&'static EvmNetwork> {
    NETWORKS.iter().find(|n| n.chain_id == chain_id)
}

/// Parse a chain ID given either as decimal ("137") or hex ("0x89")
pub fn parse_chain_id(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse(),
    };
    parsed.map_err(|_| anyhow!("Invalid chain id: {}", input))
}

/// Get the block explorer URL for a given chain ID
pub fn get_block_explorer_url(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        1 => Some("https://etherscan.io"),
        56 => Some("https://bscscan.com"),
        137 => Some("https://polygonscan.com"),
        11155111 => Some("https://sepolia.etherscan.io"),
        17000 => Some("https://holesky.etherscan.io"),
        80002 => Some("https://amoy.polygonscan.com"),
        10200 => Some("https://gnosis-chiado.blockscout.com"),
        _ => None,
    }
}

/// Get the full URL to view a transaction on the block explorer
pub fn get_tx_explorer_url(chain_id: u64, tx_hash: &str) -> Option<String> {
    get_block_explorer_url(chain_id).map(|base| format!("{}/tx/{}", base, tx_hash))
}

/// Default token indexer endpoint
pub const DEFAULT_INDEXER_BASE_URL: &str = "https://deep-index.moralis.io/api/v2.2";

/// Default bound for a gas estimate
pub const DEFAULT_ESTIMATE_TIMEOUT_SECS: u64 = 30;

/// Default bound for signing + broadcasting + inclusion of a submission
pub const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 180;

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct Config {
    pub rpc_url: String,
    pub chain_id: u64,
    pub multisender_override: Option<String>,
    pub private_key: Option<String>,
    pub indexer_api_key: Option<String>,
    pub indexer_base_url: String,
    pub estimate_timeout: Duration,
    pub submit_timeout: Duration,
    pub max_estimate_retries: u32,
    pub export_directory: String,
}

impl Config {
    pub fn new(rpc_url: String, chain_id: u64) -> Self {
        // Default export directory to user's documents or current directory
        let export_directory = dirs::document_dir()
            .map(|dir| dir.join("Multisender").to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());

        Self {
            rpc_url,
            chain_id,
            multisender_override: None,
            private_key: None,
            indexer_api_key: None,
            indexer_base_url: DEFAULT_INDEXER_BASE_URL.to_string(),
            estimate_timeout: Duration::from_secs(DEFAULT_ESTIMATE_TIMEOUT_SECS),
            submit_timeout: Duration::from_secs(DEFAULT_SUBMIT_TIMEOUT_SECS),
            max_estimate_retries: 2,
            export_directory,
        }
    }

    pub fn from_network(network: &EvmNetwork) -> Self {
        Self::new(network.default_rpc.to_string(), network.chain_id)
    }

    /// Build a config from environment variables (call `dotenvy::dotenv()` first)
    ///
    /// `CHAIN_ID` selects a network (default Ethereum Mainnet); `RPC_URL`
    /// overrides its RPC. Secrets come only from the environment.
    pub fn from_env() -> Result<Self> {
        let chain_id = match env_string("CHAIN_ID") {
            Some(id) => parse_chain_id(&id)?,
            None => 1,
        };

        let mut config = match find_network_by_chain_id(chain_id) {
            Some(network) => Self::from_network(network),
            None => {
                let rpc = env_string("RPC_URL")
                    .ok_or_else(|| anyhow!("RPC_URL is required for unknown chain {}", chain_id))?;
                Self::new(rpc, chain_id)
            }
        };

        if let Some(rpc) = env_string("RPC_URL") {
            config.rpc_url = rpc;
        }
        config.multisender_override = env_string("MULTISENDER_CONTRACT");
        config.private_key = env_string("PRIVATE_KEY");
        config.indexer_api_key = env_string("MORALIS_API_KEY");
        if let Some(url) = env_string("INDEXER_BASE_URL") {
            config.indexer_base_url = url;
        }
        if let Some(secs) = env_u64("ESTIMATE_TIMEOUT_SECS") {
            config.estimate_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("SUBMIT_TIMEOUT_SECS") {
            config.submit_timeout = Duration::from_secs(secs);
        }
        if let Some(dir) = env_string("EXPORT_DIR") {
            config.export_directory = dir;
        }

        Ok(config)
    }

    /// Switch to another supported network, keeping wallet and indexer settings
    pub fn switch_network(&mut self, chain_id: u64) -> Result<&'static EvmNetwork> {
        let network = find_network_by_chain_id(chain_id)
            .ok_or_else(|| anyhow!("Unsupported network: chain id {}", chain_id))?;
        self.chain_id = network.chain_id;
        self.rpc_url = network.default_rpc.to_string();
        Ok(network)
    }

    /// The multisender contract to call: the override if set, else the deployed default
    pub fn multisender_address(&self) -> Result<Address> {
        match &self.multisender_override {
            Some(addr) => addr
                .parse()
                .map_err(|_| anyhow!("Invalid multisender contract address: {}", addr)),
            None => contract::default_multisender_address()
                .ok_or_else(|| anyhow!("Built-in multisender address is invalid")),
        }
    }

    pub fn native_token(&self) -> &str {
        find_network_by_chain_id(self.chain_id)
            .map(|n| n.native_token)
            .unwrap_or("ETH")
    }

    pub fn network_label(&self) -> &str {
        find_network_by_chain_id(self.chain_id)
            .map(|n| n.label)
            .unwrap_or("Unknown")
    }

    pub async fn get_provider(&self) -> Result<Arc<Provider<Http>>> {
        let url = Url::parse(&self.rpc_url)?;
        let provider = Provider::<Http>::try_from(url.as_str())?;
        Ok(Arc::new(provider))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(NETWORKS[0].default_rpc.to_string(), NETWORKS[0].chain_id)
    }
}
