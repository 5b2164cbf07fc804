//! Gas price oracle client
//!
//! Fetches recommended gas prices (at several confirmation speeds) from a
//! third-party JSON endpoint. The payload is returned as-is; callers pick the
//! field they want and pass it to the send operations in gwei.

use crate::config::GasOracleConfig;
use crate::Result;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Fixed gas price oracle endpoint
pub const GAS_ORACLE_URL: &str = "https://ethgasstation.info/json/ethgasAPI.json";

/// Request deadline for the oracle
pub const GAS_ORACLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the gas price oracle. No retry, no caching.
#[derive(Debug, Clone)]
pub struct GasPriceClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl GasPriceClient {
    pub fn new() -> Self {
        Self::with_endpoint(GAS_ORACLE_URL, GAS_ORACLE_TIMEOUT)
    }

    /// Point the client at another oracle with its own deadline
    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn from_config(config: &GasOracleConfig) -> Self {
        Self::with_endpoint(config.url.clone(), Duration::from_secs(config.timeout_secs))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issue one GET and return the parsed JSON body unmodified
    ///
    /// Fails with `Error::Timeout` when the deadline passes and
    /// `Error::Network` when the host is unreachable or answers with an
    /// error status.
    pub async fn fetch_gas_price(&self) -> Result<Value> {
        tracing::debug!(endpoint = %self.endpoint, "Fetching gas price");

        let response = self
            .client
            .get(&self.endpoint)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl Default for GasPriceClient {
    fn default() -> Self {
        Self::new()
    }
}
