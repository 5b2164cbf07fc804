//! Configuration for the wallet session

pub mod rpc;

use crate::gas::{GAS_ORACLE_TIMEOUT, GAS_ORACLE_URL};
use crate::wallet::KdfParams;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// Re-export RPC config
pub use rpc::RpcConfig;

/// Etherscan API key environment variable name
pub const ETHERSCAN_API_KEY_ENV: &str = "ETHERSCAN_API_KEY";

/// Supported Ethereum networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[serde(alias = "homestead")]
    Mainnet,
    Goerli,
    Sepolia,
    Holesky,
}

impl Network {
    pub const ALL: [Network; 4] = [
        Network::Mainnet,
        Network::Goerli,
        Network::Sepolia,
        Network::Holesky,
    ];

    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Goerli => 5,
            Network::Sepolia => 11155111,
            Network::Holesky => 17000,
        }
    }

    /// Network name as reported by the session (mainnet is "homestead")
    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "homestead",
            Network::Goerli => "goerli",
            Network::Sepolia => "sepolia",
            Network::Holesky => "holesky",
        }
    }

    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.chain_id() == chain_id)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "homestead" | "mainnet" | "ethereum" => Ok(Network::Mainnet),
            "goerli" => Ok(Network::Goerli),
            "sepolia" => Ok(Network::Sepolia),
            "holesky" => Ok(Network::Holesky),
            other => other
                .parse::<u64>()
                .ok()
                .and_then(Network::from_chain_id)
                .ok_or_else(|| Error::Validation(format!("Unknown network: {}", s))),
        }
    }
}

/// Gas price oracle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GasOracleConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for GasOracleConfig {
    fn default() -> Self {
        Self {
            url: GAS_ORACLE_URL.to_string(),
            timeout_secs: GAS_ORACLE_TIMEOUT.as_secs(),
        }
    }
}

/// Block explorer (Etherscan-compatible) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// API key; read from ETHERSCAN_API_KEY when absent from the file
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Overrides the per-network Etherscan endpoint
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl ExplorerConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(ETHERSCAN_API_KEY_ENV).ok(),
            ..Self::default()
        }
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout_secs: 30,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Network used when a command does not name one
    #[serde(default = "default_network")]
    pub network: Network,
    #[serde(default)]
    pub gas_oracle: GasOracleConfig,
    #[serde(default = "ExplorerConfig::from_env")]
    pub explorer: ExplorerConfig,
    /// Work factor for encrypted backups
    #[serde(default)]
    pub kdf: KdfParams,
}

fn default_network() -> Network {
    Network::Mainnet
}

impl Config {
    /// Load a JSON config file; missing sections take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!("{}: {}", path.as_ref().display(), e))
        })?;
        let mut config: Config =
            serde_json::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        if config.explorer.api_key.is_none() {
            config.explorer.api_key = std::env::var(ETHERSCAN_API_KEY_ENV).ok();
        }
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: default_network(),
            gas_oracle: GasOracleConfig::default(),
            explorer: ExplorerConfig::from_env(),
            kdf: KdfParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn network_parses_aliases() {
        assert_eq!("homestead".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("Mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("sepolia".parse::<Network>().unwrap(), Network::Sepolia);
        assert_eq!("5".parse::<Network>().unwrap(), Network::Goerli);
        assert!(matches!(
            "ropsten".parse::<Network>(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn mainnet_is_reported_as_homestead() {
        assert_eq!(Network::Mainnet.name(), "homestead");
        assert_eq!(Network::Mainnet.to_string(), "homestead");
        assert_eq!(Network::Holesky.chain_id(), 17000);
    }

    #[test]
    fn config_deserialize_defaults() {
        let value = serde_json::json!({ "network": "homestead" });
        let parsed: Config = serde_json::from_value(value).expect("parse config");
        assert_eq!(parsed.network, Network::Mainnet);
        assert_eq!(parsed.gas_oracle.url, GAS_ORACLE_URL);
        assert_eq!(parsed.gas_oracle.timeout_secs, 10);
        assert_eq!(parsed.kdf, KdfParams::default());
    }

    #[test]
    fn config_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "network": "sepolia",
                "gas_oracle": {{ "url": "http://localhost:9000/gas", "timeout_secs": 3 }},
                "explorer": {{ "api_key": "abc", "timeout_secs": 5 }},
                "kdf": {{ "m_cost": 1024, "t_cost": 2, "p_cost": 1 }}
            }}"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.network, Network::Sepolia);
        assert_eq!(config.gas_oracle.url, "http://localhost:9000/gas");
        assert_eq!(config.explorer.api_key.as_deref(), Some("abc"));
        assert_eq!(config.explorer.timeout_secs, 5);
        assert_eq!(config.kdf.m_cost, 1024);
    }

    #[test]
    fn config_load_missing_file_is_config_error() {
        let result = Config::load("/nonexistent/wallet-config.json");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn api_key_is_not_serialized() {
        let config = Config {
            explorer: ExplorerConfig {
                api_key: Some("secret".to_string()),
                ..ExplorerConfig::default()
            },
            ..Config::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
