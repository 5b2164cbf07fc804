//! Network provider capability
//!
//! The session never talks JSON-RPC itself. A [`ProviderConnector`] binds a
//! [`ChainProvider`] to one network and one signer; everything the session
//! reads from or submits to the chain goes through that provider.
//!
//! [`RpcConnector`] is the production implementation on top of alloy's HTTP
//! provider with a wallet filler, so submitted requests are signed locally.

use crate::config::{Network, RpcConfig};
use crate::tokens::IERC20;
use crate::{Error, Result};
use alloy::eips::BlockNumberOrTag;
use alloy::network::EthereumWallet;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// One decoded ERC-20 `Transfer` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferLog {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub transaction_hash: Option<TxHash>,
    pub block_number: Option<u64>,
}

/// Chain access for a connected session
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// Native balance in wei
    async fn balance(&self, owner: Address) -> Result<U256>;

    /// Number of transactions sent from `owner`
    async fn transaction_count(&self, owner: Address) -> Result<u64>;

    /// ERC-20 `decimals()`
    async fn token_decimals(&self, token: Address) -> Result<u8>;

    /// ERC-20 `balanceOf(owner)` in base units
    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256>;

    /// Every `Transfer` event the token contract has emitted
    async fn token_transfers(&self, token: Address) -> Result<Vec<TransferLog>>;

    /// Sign and submit; returns the transaction hash once accepted by the node
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash>;
}

/// Binds providers to networks
pub trait ProviderConnector: Send + Sync {
    fn connect(
        &self,
        network: Network,
        signer: &PrivateKeySigner,
    ) -> Result<Arc<dyn ChainProvider>>;
}

fn rpc_error(context: &str, e: impl std::fmt::Display) -> Error {
    Error::Network(format!("{}: {}", context, e))
}

/// Connector backed by JSON-RPC endpoints from [`RpcConfig`]
#[derive(Debug, Clone)]
pub struct RpcConnector {
    rpc: RpcConfig,
}

impl RpcConnector {
    pub fn new(rpc: RpcConfig) -> Self {
        Self { rpc }
    }
}

impl ProviderConnector for RpcConnector {
    fn connect(
        &self,
        network: Network,
        signer: &PrivateKeySigner,
    ) -> Result<Arc<dyn ChainProvider>> {
        let rpc_url = self
            .rpc
            .get(network)
            .ok_or_else(|| Error::Config(format!("No RPC URL configured for {}", network)))?;

        let url: url::Url = rpc_url
            .parse()
            .map_err(|e| Error::Config(format!("Invalid RPC URL: {}", e)))?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http(url)
            .erased();

        tracing::debug!(%network, "Bound RPC provider");
        Ok(Arc::new(RpcChainProvider { provider }))
    }
}

/// alloy-backed [`ChainProvider`]
pub struct RpcChainProvider {
    provider: DynProvider,
}

#[async_trait]
impl ChainProvider for RpcChainProvider {
    async fn balance(&self, owner: Address) -> Result<U256> {
        self.provider
            .get_balance(owner)
            .await
            .map_err(|e| rpc_error("Failed to get balance", e))
    }

    async fn transaction_count(&self, owner: Address) -> Result<u64> {
        self.provider
            .get_transaction_count(owner)
            .await
            .map_err(|e| rpc_error("Failed to get transaction count", e))
    }

    async fn token_decimals(&self, token: Address) -> Result<u8> {
        IERC20::new(token, self.provider.clone())
            .decimals()
            .call()
            .await
            .map_err(|e| rpc_error("Failed to get token decimals", e))
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        IERC20::new(token, self.provider.clone())
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| rpc_error("Failed to get token balance", e))
    }

    async fn token_transfers(&self, token: Address) -> Result<Vec<TransferLog>> {
        let filter = Filter::new()
            .address(token)
            .event_signature(IERC20::Transfer::SIGNATURE_HASH)
            .from_block(BlockNumberOrTag::Earliest)
            .to_block(BlockNumberOrTag::Latest);

        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(|e| rpc_error("Failed to get transfer logs", e))?;

        let mut transfers = Vec::with_capacity(logs.len());
        for log in logs {
            match log.log_decode::<IERC20::Transfer>() {
                Ok(decoded) => {
                    let event = &decoded.inner.data;
                    transfers.push(TransferLog {
                        from: event.from,
                        to: event.to,
                        value: event.value,
                        transaction_hash: log.transaction_hash,
                        block_number: log.block_number,
                    });
                }
                Err(e) => {
                    tracing::warn!(%token, error = %e, "Skipping undecodable Transfer log");
                }
            }
        }
        Ok(transfers)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| rpc_error("Failed to send transaction", e))?;
        Ok(*pending.tx_hash())
    }
}
