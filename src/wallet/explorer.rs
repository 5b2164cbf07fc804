//! Block explorer capability
//!
//! Native-currency history is not derivable from JSON-RPC alone, so the
//! session asks an Etherscan-compatible API (`module=account&action=txlist`).

use crate::config::{ExplorerConfig, Network};
use crate::{Error, Result};
use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound Etherscan accepts for `endblock`
const LATEST_BLOCK: u64 = 99_999_999;

/// One native-currency transaction as reported by the explorer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerTransaction {
    pub hash: TxHash,
    pub block_number: u64,
    pub timestamp: Option<DateTime<Utc>>,
    pub from: Address,
    /// `None` for contract creations
    pub to: Option<Address>,
    pub value: U256,
}

#[async_trait]
pub trait Explorer: Send + Sync {
    /// Transactions involving `address` in `[start_block, end_block]`,
    /// oldest first. `end_block: None` means the chain head.
    async fn transactions(
        &self,
        network: Network,
        address: Address,
        start_block: u64,
        end_block: Option<u64>,
    ) -> Result<Vec<ExplorerTransaction>>;
}

#[derive(Debug, Deserialize)]
struct TxListResponse {
    status: String,
    message: String,
    result: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransaction {
    hash: String,
    block_number: String,
    time_stamp: String,
    from: String,
    to: String,
    value: String,
}

impl RawTransaction {
    fn parse(self) -> Result<ExplorerTransaction> {
        let bad = |field: &str, value: &str| {
            Error::Network(format!("Explorer returned invalid {}: {}", field, value))
        };

        let to = if self.to.is_empty() {
            None
        } else {
            Some(Address::from_str(&self.to).map_err(|_| bad("to", &self.to))?)
        };
        let timestamp = self
            .time_stamp
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0));

        Ok(ExplorerTransaction {
            hash: TxHash::from_str(&self.hash).map_err(|_| bad("hash", &self.hash))?,
            block_number: self
                .block_number
                .parse()
                .map_err(|_| bad("blockNumber", &self.block_number))?,
            timestamp,
            from: Address::from_str(&self.from).map_err(|_| bad("from", &self.from))?,
            to,
            value: U256::from_str(&self.value).map_err(|_| bad("value", &self.value))?,
        })
    }
}

/// Etherscan API client
#[derive(Debug, Clone)]
pub struct EtherscanExplorer {
    client: Client,
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Duration,
}

impl EtherscanExplorer {
    pub fn new(config: &ExplorerConfig) -> Self {
        if config.api_key.is_none() {
            tracing::warn!("No ETHERSCAN_API_KEY set, explorer requests will be rate limited");
        }
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Etherscan API endpoint for a network
    pub fn endpoint(network: Network) -> &'static str {
        match network {
            Network::Mainnet => "https://api.etherscan.io/api",
            Network::Goerli => "https://api-goerli.etherscan.io/api",
            Network::Sepolia => "https://api-sepolia.etherscan.io/api",
            Network::Holesky => "https://api-holesky.etherscan.io/api",
        }
    }

    fn url_for(&self, network: Network) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| Self::endpoint(network).to_string())
    }
}

#[async_trait]
impl Explorer for EtherscanExplorer {
    async fn transactions(
        &self,
        network: Network,
        address: Address,
        start_block: u64,
        end_block: Option<u64>,
    ) -> Result<Vec<ExplorerTransaction>> {
        let url = self.url_for(network);
        let address_param = address.to_string();
        let start_param = start_block.to_string();
        let end_param = end_block.unwrap_or(LATEST_BLOCK).to_string();

        let mut query = vec![
            ("module", "account"),
            ("action", "txlist"),
            ("address", address_param.as_str()),
            ("startblock", start_param.as_str()),
            ("endblock", end_param.as_str()),
            ("sort", "asc"),
        ];
        if let Some(key) = &self.api_key {
            query.push(("apikey", key.as_str()));
        }

        tracing::debug!(%network, %address, start_block, ?end_block, "Querying explorer history");

        let response: TxListResponse = self
            .client
            .get(&url)
            .query(&query)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match response.result {
            Value::Array(items) => items
                .into_iter()
                .map(|item| {
                    let raw: RawTransaction = serde_json::from_value(item)?;
                    raw.parse()
                })
                .collect(),
            // Etherscan reports an empty history as status 0 with a message
            _ if response.message.starts_with("No transactions found") => Ok(Vec::new()),
            other => Err(Error::Network(format!(
                "Explorer error (status {}): {} {}",
                response.status, response.message, other
            ))),
        }
    }
}
