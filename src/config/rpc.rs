//! RPC endpoint configuration
//!
//! Resolution order, following Ethereum ecosystem conventions:
//! 1. Per-network env vars (ETH_RPC_URL, SEPOLIA_RPC_URL, etc.) - highest priority
//! 2. Provider API keys (ALCHEMY_API_KEY, INFURA_API_KEY) - builds URLs automatically
//! 3. Public RPC fallbacks - for testing only
//!
//! # Examples
//!
//! ```bash
//! # Option 1: Per-network URLs (recommended for production)
//! export ETH_RPC_URL="https://eth-mainnet.g.alchemy.com/v2/YOUR_KEY"
//! export SEPOLIA_RPC_URL="https://eth-sepolia.g.alchemy.com/v2/YOUR_KEY"
//!
//! # Option 2: Single provider API key
//! export ALCHEMY_API_KEY="YOUR_KEY"
//!
//! # Option 3: No env vars - uses public RPCs (rate limited, for testing only)
//! ```

use super::Network;
use std::collections::HashMap;

/// RPC configuration for multiple networks
#[derive(Debug, Clone)]
pub struct RpcConfig {
    urls: HashMap<Network, String>,
}

/// Environment variable names
mod env_vars {
    // Per-network URLs (highest priority)
    pub const ETH_RPC_URL: &str = "ETH_RPC_URL";
    pub const GOERLI_RPC_URL: &str = "GOERLI_RPC_URL";
    pub const SEPOLIA_RPC_URL: &str = "SEPOLIA_RPC_URL";
    pub const HOLESKY_RPC_URL: &str = "HOLESKY_RPC_URL";

    // Provider API keys
    pub const ALCHEMY_API_KEY: &str = "ALCHEMY_API_KEY";
    pub const INFURA_API_KEY: &str = "INFURA_API_KEY";
}

/// Public RPC endpoints (rate limited, for testing only)
mod public_rpcs {
    pub const MAINNET: &str = "https://eth.llamarpc.com";
    pub const GOERLI: &str = "https://rpc.ankr.com/eth_goerli";
    pub const SEPOLIA: &str = "https://ethereum-sepolia-rpc.publicnode.com";
    pub const HOLESKY: &str = "https://ethereum-holesky-rpc.publicnode.com";
}

fn env_var_for(network: Network) -> &'static str {
    match network {
        Network::Mainnet => env_vars::ETH_RPC_URL,
        Network::Goerli => env_vars::GOERLI_RPC_URL,
        Network::Sepolia => env_vars::SEPOLIA_RPC_URL,
        Network::Holesky => env_vars::HOLESKY_RPC_URL,
    }
}

fn public_rpc_for(network: Network) -> &'static str {
    match network {
        Network::Mainnet => public_rpcs::MAINNET,
        Network::Goerli => public_rpcs::GOERLI,
        Network::Sepolia => public_rpcs::SEPOLIA,
        Network::Holesky => public_rpcs::HOLESKY,
    }
}

fn alchemy_url(network: Network, key: &str) -> String {
    let subdomain = match network {
        Network::Mainnet => "eth-mainnet",
        Network::Goerli => "eth-goerli",
        Network::Sepolia => "eth-sepolia",
        Network::Holesky => "eth-holesky",
    };
    format!("https://{}.g.alchemy.com/v2/{}", subdomain, key)
}

fn infura_url(network: Network, key: &str) -> String {
    let subdomain = match network {
        Network::Mainnet => "mainnet",
        Network::Goerli => "goerli",
        Network::Sepolia => "sepolia",
        Network::Holesky => "holesky",
    };
    format!("https://{}.infura.io/v3/{}", subdomain, key)
}

impl RpcConfig {
    /// Create RPC config from environment variables
    ///
    /// Priority:
    /// 1. Per-network env vars (ETH_RPC_URL, SEPOLIA_RPC_URL, etc.)
    /// 2. ALCHEMY_API_KEY - builds URLs for all networks
    /// 3. INFURA_API_KEY - builds URLs for all networks
    /// 4. Public RPC fallbacks (for testing only)
    pub fn from_env() -> Self {
        let mut urls = HashMap::new();

        for network in Network::ALL {
            let var = env_var_for(network);
            if let Ok(url) = std::env::var(var) {
                tracing::debug!(%network, "Using {} for RPC", var);
                urls.insert(network, url);
            }
        }

        if urls.is_empty() {
            if let Ok(key) = std::env::var(env_vars::ALCHEMY_API_KEY) {
                tracing::info!("Building RPC URLs from ALCHEMY_API_KEY");
                for network in Network::ALL {
                    urls.insert(network, alchemy_url(network, &key));
                }
            }
        }

        if urls.is_empty() {
            if let Ok(key) = std::env::var(env_vars::INFURA_API_KEY) {
                tracing::info!("Building RPC URLs from INFURA_API_KEY");
                for network in Network::ALL {
                    urls.insert(network, infura_url(network, &key));
                }
            }
        }

        if !urls.contains_key(&Network::Mainnet) {
            tracing::warn!("No RPC configured for mainnet, using public RPC (rate limited)");
        }
        for network in Network::ALL {
            urls.entry(network)
                .or_insert_with(|| public_rpc_for(network).to_string());
        }

        Self { urls }
    }

    /// Create with explicit RPC URLs
    pub fn with_urls(urls: HashMap<Network, String>) -> Self {
        Self { urls }
    }

    /// Get RPC URL for a network
    pub fn get(&self, network: Network) -> Option<&str> {
        self.urls.get(&network).map(|s| s.as_str())
    }

    /// Check if a network is configured
    pub fn has_network(&self, network: Network) -> bool {
        self.urls.contains_key(&network)
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
