//! Wallet session
//!
//! A session owns one signing handle and mediates every chain interaction
//! through injected capabilities: a [`ProviderConnector`] for JSON-RPC
//! access and an [`Explorer`] for native-currency history.
//!
//! State machine:
//! - `Unlocked` after any constructor; `lock` moves to `Locked`, `unlock`
//!   back. Connected / disconnected is orthogonal while unlocked.
//! - Locking drops the key, provider, network, tokens and pending nonce.
//!   Only the encrypted backup survives, and it is reused by later locks.
//!
//! SECURITY NOTE: key material is never logged. `private_key` and
//! `mnemonic` hand out `SecretString`s.

use super::backup::{self, KdfParams};
use super::explorer::{EtherscanExplorer, Explorer};
use super::history::{self, HistoryEntry};
use super::provider::{ChainProvider, ProviderConnector, RpcConnector};
use super::signer::{parse_address, KeyHandle};
use crate::config::{Config, Network, RpcConfig};
use crate::tokens::{TokenContract, TokenEntry, TokenRegistry};
use crate::units::{format_ether, parse_amount, parse_ether, parse_gwei, ETHER_DECIMALS};
use crate::{Error, Result};
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Requested confirmation speed for a send
///
/// Accepted and recorded on the submitted transaction; gas pricing is taken
/// from the caller-supplied gas price regardless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionSpeed {
    Slow,
    #[default]
    Average,
    Fast,
}

/// Handle for a transaction accepted by the node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedTransaction {
    pub hash: TxHash,
    pub from: Address,
    /// Recipient of the transfer (the token holder for ERC-20 sends)
    pub to: Address,
    /// Contract called, for ERC-20 sends
    pub token: Option<Address>,
    /// Amount in base units
    pub amount: U256,
    pub nonce: u64,
    pub gas_price: u128,
    pub speed: TransactionSpeed,
}

/// Parameters for [`WalletSession::ether_history`]; every field is optional
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    /// Defaults to the connected network
    pub network: Option<Network>,
    /// Defaults to the session's own address
    pub address: Option<Address>,
    /// Defaults to block 0
    pub start_block: Option<u64>,
    /// Defaults to the chain head
    pub end_block: Option<u64>,
}

/// External collaborators a session is built with
#[derive(Clone)]
pub struct Backends {
    pub connector: Arc<dyn ProviderConnector>,
    pub explorer: Arc<dyn Explorer>,
    /// Work factor for the encrypted backup produced by `lock`
    pub kdf: KdfParams,
}

impl Backends {
    pub fn new(connector: Arc<dyn ProviderConnector>, explorer: Arc<dyn Explorer>) -> Self {
        Self {
            connector,
            explorer,
            kdf: KdfParams::default(),
        }
    }

    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    /// JSON-RPC from the environment, Etherscan from the config
    pub fn from_config(config: &Config) -> Self {
        Self {
            connector: Arc::new(RpcConnector::new(RpcConfig::from_env())),
            explorer: Arc::new(EtherscanExplorer::new(&config.explorer)),
            kdf: config.kdf,
        }
    }
}

/// One wallet's working session
pub struct WalletSession {
    key: Option<KeyHandle>,
    locked: bool,
    tokens: TokenRegistry,
    provider: Option<Arc<dyn ChainProvider>>,
    network: Option<Network>,
    pending_nonce: Option<u64>,
    encrypted_backup: Option<String>,
    backends: Backends,
}

impl WalletSession {
    fn with_key(key: KeyHandle, backends: Backends) -> Self {
        tracing::info!(address = %key.address(), "Wallet session created");
        Self {
            key: Some(key),
            locked: false,
            tokens: TokenRegistry::new(),
            provider: None,
            network: None,
            pending_nonce: None,
            encrypted_backup: None,
            backends,
        }
    }

    /// Fresh key derived from a newly generated 12-word phrase
    pub fn random(backends: Backends) -> Result<Self> {
        Ok(Self::with_key(KeyHandle::random()?, backends))
    }

    pub fn from_private_key(private_key: &str, backends: Backends) -> Result<Self> {
        Ok(Self::with_key(KeyHandle::from_private_key(private_key)?, backends))
    }

    pub fn from_mnemonic(phrase: &str, backends: Backends) -> Result<Self> {
        Ok(Self::with_key(KeyHandle::from_mnemonic(phrase)?, backends))
    }

    /// Restore from a backup produced by [`lock`](Self::lock). The backup is
    /// kept, so a later `lock` returns it unchanged.
    pub async fn from_encrypted_backup(
        backup: &str,
        passphrase: &SecretString,
        backends: Backends,
    ) -> Result<Self> {
        let key = backup::decrypt_blocking(backup, passphrase).await?;
        let mut session = Self::with_key(key, backends);
        session.encrypted_backup = Some(backup.to_owned());
        Ok(session)
    }

    // ---- state ---------------------------------------------------------

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_connected(&self) -> bool {
        self.provider.is_some()
    }

    /// Name of the connected network; empty when disconnected
    pub fn network_name(&self) -> &str {
        self.network.map(|n| n.name()).unwrap_or("")
    }

    pub fn network(&self) -> Option<Network> {
        self.network
    }

    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    pub fn pending_nonce(&self) -> Option<u64> {
        self.pending_nonce
    }

    pub fn encrypted_backup(&self) -> Option<&str> {
        self.encrypted_backup.as_deref()
    }

    fn key(&self) -> Result<&KeyHandle> {
        self.key
            .as_ref()
            .ok_or_else(|| Error::Precondition("wallet is locked".to_string()))
    }

    fn provider(&self) -> Result<Arc<dyn ChainProvider>> {
        self.key()?;
        self.provider
            .clone()
            .ok_or_else(|| Error::Precondition("wallet is not connected to a network".to_string()))
    }

    fn token(&self, address: &Address) -> Result<&TokenEntry> {
        self.key()?;
        self.tokens
            .get(address)
            .ok_or_else(|| Error::NotFound(format!("token {} is not registered", address)))
    }

    // ---- lifecycle -----------------------------------------------------

    /// Connect by network name ("homestead", "sepolia", ...) or chain id
    pub fn connect(&mut self, network: &str) -> Result<()> {
        self.key()?;
        self.connect_network(network.parse()?)
    }

    /// Bind a provider for `network` and re-associate the signer with it
    pub fn connect_network(&mut self, network: Network) -> Result<()> {
        let key = self.key()?;
        let provider = self.backends.connector.connect(network, key.signer())?;

        self.tokens.rebind(&provider);
        self.provider = Some(provider);
        self.network = Some(network);

        tracing::info!(%network, "Wallet connected");
        Ok(())
    }

    /// Lock the wallet and return its encrypted backup
    ///
    /// The first lock encrypts the key with `passphrase` (slow, runs on the
    /// blocking pool). Later locks return the stored backup as is.
    pub async fn lock(&mut self, passphrase: &SecretString) -> Result<String> {
        let backup = match self.encrypted_backup.clone() {
            Some(existing) => existing,
            None => {
                let key = self.key()?;
                let created = backup::encrypt_blocking(key, passphrase, self.backends.kdf).await?;
                self.encrypted_backup = Some(created.clone());
                created
            }
        };

        self.key = None;
        self.locked = true;
        self.provider = None;
        self.network = None;
        self.tokens.clear();
        self.pending_nonce = None;

        tracing::info!("Wallet locked");
        Ok(backup)
    }

    /// Decrypt the stored backup and reinstall the key
    pub async fn unlock(&mut self, passphrase: &SecretString) -> Result<()> {
        if !self.locked {
            return Err(Error::Precondition("wallet is already unlocked".to_string()));
        }
        let backup = self
            .encrypted_backup
            .as_deref()
            .ok_or_else(|| Error::Precondition("no encrypted backup to unlock".to_string()))?;

        let key = backup::decrypt_blocking(backup, passphrase).await?;

        tracing::info!(address = %key.address(), "Wallet unlocked");
        self.key = Some(key);
        self.locked = false;
        Ok(())
    }

    // ---- tokens --------------------------------------------------------

    /// Register an ERC-20 contract; a no-op if the address is already known
    pub async fn add_token(&mut self, symbol: &str, address: &str) -> Result<()> {
        self.key()?;
        let address = parse_address(address)?;
        if self.tokens.contains(&address) {
            return Ok(());
        }

        let contract = TokenContract::new(address, self.provider()?);
        let decimals = contract.decimals().await?;

        tracing::info!(symbol, %address, decimals, "Token registered");
        self.tokens.insert(TokenEntry::new(symbol, decimals, contract));
        Ok(())
    }

    /// Unregister a token; a no-op if the address is unknown
    pub fn remove_token(&mut self, address: &str) -> Result<()> {
        self.key()?;
        let address = parse_address(address)?;
        if let Some(entry) = self.tokens.remove(&address) {
            tracing::info!(symbol = %entry.symbol, %address, "Token removed");
        }
        Ok(())
    }

    /// Load the signer's transaction count as the next nonce to use
    pub async fn set_nonce(&mut self) -> Result<()> {
        let address = self.key()?.address();
        let nonce = self.provider()?.transaction_count(address).await?;

        tracing::debug!(nonce, "Pending nonce synced");
        self.pending_nonce = Some(nonce);
        Ok(())
    }

    // ---- queries -------------------------------------------------------

    pub fn address(&self) -> Result<Address> {
        Ok(self.key()?.address())
    }

    pub fn private_key(&self) -> Result<SecretString> {
        Ok(self.key()?.private_key())
    }

    /// Recovery phrase; `None` for wallets restored from a raw key
    pub fn mnemonic(&self) -> Result<Option<SecretString>> {
        Ok(self.key()?.mnemonic())
    }

    /// Native balance formatted in ether
    pub async fn ether_balance(&self) -> Result<String> {
        let address = self.address()?;
        let wei = self.provider()?.balance(address).await?;
        Ok(format_ether(wei))
    }

    /// Whole-token balance: `floor(raw / 10^decimals)`
    pub async fn token_balance(&self, token: &str) -> Result<U256> {
        let address = self.address()?;
        let token = parse_address(token)?;
        let entry = self.token(&token)?;

        let raw = entry.contract.balance_of(address).await?;
        Ok(entry.whole_units(raw))
    }

    /// Native-currency history from the block explorer
    pub async fn ether_history(&self, query: HistoryQuery) -> Result<Vec<HistoryEntry>> {
        let own = self.address()?;
        let network = query.network.or(self.network).ok_or_else(|| {
            Error::Precondition("no network given and wallet is not connected".to_string())
        })?;
        let address = query.address.unwrap_or(own);

        let transactions = self
            .backends
            .explorer
            .transactions(
                network,
                address,
                query.start_block.unwrap_or(0),
                query.end_block,
            )
            .await?;

        Ok(transactions
            .into_iter()
            .map(|tx| HistoryEntry::from_explorer(address, tx, ETHER_DECIMALS))
            .collect())
    }

    /// Transfers of a registered token that involve this wallet
    pub async fn token_history(&self, token: &str) -> Result<Vec<HistoryEntry>> {
        let address = self.address()?;
        let token = parse_address(token)?;
        let entry = self.token(&token)?;

        let transfers = entry.contract.transfers().await?;
        Ok(transfers
            .into_iter()
            .filter(|log| history::involves(address, log))
            .map(|log| HistoryEntry::from_transfer(address, log, entry.decimals))
            .collect())
    }

    // ---- sends ---------------------------------------------------------

    /// Take the pending nonce and advance it
    ///
    /// The increment is not rolled back if the submission later fails.
    fn next_nonce(&mut self) -> Result<u64> {
        let nonce = self.pending_nonce.ok_or_else(|| {
            Error::Precondition("nonce not synced; call set_nonce first".to_string())
        })?;
        self.pending_nonce = Some(nonce + 1);
        Ok(nonce)
    }

    /// Send `amount` ether to `to` at `gas_price_gwei`
    pub async fn send_ether(
        &mut self,
        to: &str,
        amount: &str,
        gas_price_gwei: &str,
        speed: TransactionSpeed,
    ) -> Result<SubmittedTransaction> {
        self.key()?;
        let to = parse_address(to)?;
        let value = parse_ether(amount)?;
        let gas_price = parse_gwei(gas_price_gwei)?;
        let from = self.address()?;
        let provider = self.provider()?;
        let nonce = self.next_nonce()?;

        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_value(value)
            .with_nonce(nonce)
            .with_gas_price(gas_price);

        tracing::info!(%to, amount, nonce, ?speed, "Sending ether");
        let hash = provider.send_transaction(tx).await?;

        Ok(SubmittedTransaction {
            hash,
            from,
            to,
            token: None,
            amount: value,
            nonce,
            gas_price,
            speed,
        })
    }

    /// Send `amount` whole-unit tokens of a registered ERC-20 to `to`
    pub async fn send_token(
        &mut self,
        token: &str,
        to: &str,
        amount: &str,
        gas_price_gwei: &str,
        speed: TransactionSpeed,
    ) -> Result<SubmittedTransaction> {
        self.key()?;
        let token = parse_address(token)?;
        let entry = self.token(&token)?;
        let to = parse_address(to)?;
        let value = parse_amount(amount, entry.decimals)?;
        let gas_price = parse_gwei(gas_price_gwei)?;
        let symbol = entry.symbol.clone();
        let request = entry.contract.transfer_request(to, value);
        let from = self.address()?;
        let provider = self.provider()?;
        let nonce = self.next_nonce()?;

        let tx = request
            .with_from(from)
            .with_nonce(nonce)
            .with_gas_price(gas_price);

        tracing::info!(%symbol, %to, amount, nonce, ?speed, "Sending token");
        let hash = provider.send_transaction(tx).await?;

        Ok(SubmittedTransaction {
            hash,
            from,
            to,
            token: Some(token),
            amount: value,
            nonce,
            gas_price,
            speed,
        })
    }
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("key", &self.key)
            .field("locked", &self.locked)
            .field("network", &self.network)
            .field("tokens", &self.tokens.len())
            .field("pending_nonce", &self.pending_nonce)
            .finish_non_exhaustive()
    }
}
