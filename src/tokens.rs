//! Session token registry
//!
//! Tracks the ERC-20 contracts a session has registered, in registration
//! order and unique by contract address. Each entry carries its decimals,
//! the derived scale factor and a contract handle bound to the provider the
//! session was connected through.

use crate::units::{scale_factor, whole_units};
use crate::wallet::{ChainProvider, TransferLog};
use crate::Result;
use alloy::network::TransactionBuilder;
use alloy::primitives::{address, Address, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol;
use alloy::sol_types::SolCall;
use std::sync::Arc;

sol! {
    #[sol(rpc)]
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);

        function decimals() external view returns (uint8);
        function balanceOf(address owner) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

/// Well-known token addresses (Ethereum mainnet)
pub mod addresses {
    use super::*;

    pub const USDC: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    pub const USDT: Address = address!("dac17f958d2ee523a2206206994597c13d831ec7");
    pub const DAI: Address = address!("6b175474e89094c44da98b954eedeac495271d0f");
    pub const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
}

/// ERC-20 contract bound to a provider
#[derive(Clone)]
pub struct TokenContract {
    address: Address,
    provider: Arc<dyn ChainProvider>,
}

impl TokenContract {
    pub fn new(address: Address, provider: Arc<dyn ChainProvider>) -> Self {
        Self { address, provider }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn decimals(&self) -> Result<u8> {
        self.provider.token_decimals(self.address).await
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256> {
        self.provider.token_balance(self.address, owner).await
    }

    pub async fn transfers(&self) -> Result<Vec<TransferLog>> {
        self.provider.token_transfers(self.address).await
    }

    /// Unsigned `transfer(to, amount)` call; nonce and gas are left to the caller
    pub fn transfer_request(&self, to: Address, amount: U256) -> TransactionRequest {
        let call = IERC20::transferCall { to, amount };
        TransactionRequest::default()
            .with_to(self.address)
            .with_input(call.abi_encode())
    }

    pub(crate) fn rebind(&mut self, provider: Arc<dyn ChainProvider>) {
        self.provider = provider;
    }
}

impl std::fmt::Debug for TokenContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenContract")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// A registered token
#[derive(Debug, Clone)]
pub struct TokenEntry {
    pub symbol: String,
    pub decimals: u8,
    /// `10^decimals`; `None` when that exceeds U256
    pub scale: Option<U256>,
    pub contract: TokenContract,
}

impl TokenEntry {
    pub fn new(symbol: impl Into<String>, decimals: u8, contract: TokenContract) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
            scale: scale_factor(decimals),
            contract,
        }
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }

    /// Whole tokens in a raw base-unit amount, rounded down
    pub fn whole_units(&self, raw: U256) -> U256 {
        whole_units(raw, self.scale)
    }
}

/// Ordered set of registered tokens, keyed by contract address
#[derive(Debug, Default)]
pub struct TokenRegistry {
    entries: Vec<TokenEntry>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &Address) -> Option<&TokenEntry> {
        self.entries.iter().find(|e| e.address() == *address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.get(address).is_some()
    }

    /// Append unless the address is already registered; returns whether it was added
    pub fn insert(&mut self, entry: TokenEntry) -> bool {
        if self.contains(&entry.address()) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Remove the entry for `address`, if any
    pub fn remove(&mut self, address: &Address) -> Option<TokenEntry> {
        let index = self.entries.iter().position(|e| e.address() == *address)?;
        Some(self.entries.remove(index))
    }

    /// Point every contract handle at a new provider
    pub fn rebind(&mut self, provider: &Arc<dyn ChainProvider>) {
        for entry in &mut self.entries {
            entry.contract.rebind(provider.clone());
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenEntry> {
        self.entries.iter()
    }
}
