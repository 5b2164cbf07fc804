//! In-memory capabilities for unit tests

use super::explorer::{Explorer, ExplorerTransaction};
use super::provider::{ChainProvider, ProviderConnector, TransferLog};
use crate::config::Network;
use crate::{Error, Result};
use alloy::primitives::{Address, TxHash, B256, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct ChainState {
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    decimals: HashMap<Address, u8>,
    token_balances: HashMap<(Address, Address), U256>,
    transfers: HashMap<Address, Vec<TransferLog>>,
    sent: Vec<TransactionRequest>,
    decimals_calls: usize,
    calls: usize,
    fail_sends: bool,
}

/// Scriptable chain
#[derive(Default)]
pub(crate) struct MockChain {
    state: Mutex<ChainState>,
}

impl MockChain {
    pub fn set_balance(&self, owner: Address, wei: U256) {
        self.state.lock().unwrap().balances.insert(owner, wei);
    }

    pub fn set_nonce(&self, owner: Address, nonce: u64) {
        self.state.lock().unwrap().nonces.insert(owner, nonce);
    }

    pub fn set_decimals(&self, token: Address, decimals: u8) {
        self.state.lock().unwrap().decimals.insert(token, decimals);
    }

    pub fn set_token_balance(&self, token: Address, owner: Address, raw: U256) {
        self.state
            .lock()
            .unwrap()
            .token_balances
            .insert((token, owner), raw);
    }

    pub fn push_transfer(&self, token: Address, log: TransferLog) {
        self.state
            .lock()
            .unwrap()
            .transfers
            .entry(token)
            .or_default()
            .push(log);
    }

    pub fn fail_sends(&self) {
        self.state.lock().unwrap().fail_sends = true;
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn decimals_calls(&self) -> usize {
        self.state.lock().unwrap().decimals_calls
    }

    /// Total number of provider calls of any kind
    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }
}

#[async_trait]
impl ChainProvider for MockChain {
    async fn balance(&self, owner: Address) -> Result<U256> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        Ok(state.balances.get(&owner).copied().unwrap_or_default())
    }

    async fn transaction_count(&self, owner: Address) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        Ok(state.nonces.get(&owner).copied().unwrap_or_default())
    }

    async fn token_decimals(&self, token: Address) -> Result<u8> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.decimals_calls += 1;
        state
            .decimals
            .get(&token)
            .copied()
            .ok_or_else(|| Error::Network(format!("execution reverted: {}", token)))
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        Ok(state
            .token_balances
            .get(&(token, owner))
            .copied()
            .unwrap_or_default())
    }

    async fn token_transfers(&self, token: Address) -> Result<Vec<TransferLog>> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        Ok(state.transfers.get(&token).cloned().unwrap_or_default())
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.fail_sends {
            return Err(Error::Network("insufficient funds for gas".to_string()));
        }
        state.sent.push(tx);
        Ok(B256::with_last_byte(state.sent.len() as u8))
    }
}

/// Connector that always hands out the same [`MockChain`]
pub(crate) struct MockConnector {
    pub chain: Arc<MockChain>,
    connects: Mutex<Vec<(Network, Address)>>,
}

impl MockConnector {
    pub fn new(chain: Arc<MockChain>) -> Self {
        Self {
            chain,
            connects: Mutex::new(Vec::new()),
        }
    }

    pub fn connects(&self) -> Vec<(Network, Address)> {
        self.connects.lock().unwrap().clone()
    }
}

impl ProviderConnector for MockConnector {
    fn connect(
        &self,
        network: Network,
        signer: &PrivateKeySigner,
    ) -> Result<Arc<dyn ChainProvider>> {
        self.connects
            .lock()
            .unwrap()
            .push((network, signer.address()));
        let provider: Arc<dyn ChainProvider> = self.chain.clone();
        Ok(provider)
    }
}

/// Explorer returning a fixed list and recording queries
#[derive(Default)]
pub(crate) struct MockExplorer {
    transactions: Mutex<Vec<ExplorerTransaction>>,
    queries: Mutex<Vec<(Network, Address, u64, Option<u64>)>>,
}

impl MockExplorer {
    pub fn push(&self, tx: ExplorerTransaction) {
        self.transactions.lock().unwrap().push(tx);
    }

    pub fn queries(&self) -> Vec<(Network, Address, u64, Option<u64>)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Explorer for MockExplorer {
    async fn transactions(
        &self,
        network: Network,
        address: Address,
        start_block: u64,
        end_block: Option<u64>,
    ) -> Result<Vec<ExplorerTransaction>> {
        self.queries
            .lock()
            .unwrap()
            .push((network, address, start_block, end_block));
        Ok(self.transactions.lock().unwrap().clone())
    }
}
