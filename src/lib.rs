//! Ethereum wallet session
//!
//! A thin, typed layer over `alloy` for a single wallet:
//! - Create or restore a signing key (random, private key, mnemonic,
//!   encrypted backup)
//! - Lock / unlock with a passphrase-encrypted backup
//! - Register ERC-20 tokens and query balances and history
//! - Send ether and tokens with a locally tracked nonce
//! - Fetch the current gas price report from a public oracle
//!
//! # Security Model
//!
//! - Key material never appears in logs or `Debug` output
//! - Accessors hand out `SecretString`s
//! - A locked session holds only the encrypted backup

pub mod config;
pub mod gas;
pub mod tokens;
pub mod units;
pub mod wallet;

mod error;

// Re-export commonly used types
pub use config::{Config, Network, RpcConfig};
pub use error::{Error, Result};
pub use gas::GasPriceClient;
pub use wallet::{Backends, HistoryQuery, TransactionSpeed, WalletSession};
