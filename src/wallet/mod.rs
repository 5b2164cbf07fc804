//! Wallet session and its collaborators
//!
//! Key material lives in [`KeyHandle`] and only leaves it as
//! `SecretString`s or inside an encrypted backup. Chain access goes through
//! the [`ChainProvider`] / [`ProviderConnector`] capabilities; history
//! through [`Explorer`].

mod backup;
mod explorer;
mod history;
mod provider;
mod session;
mod signer;

#[cfg(test)]
pub(crate) mod testing;

pub use backup::{backup_address, KdfParams};
pub use explorer::{EtherscanExplorer, Explorer, ExplorerTransaction};
pub use history::{Direction, HistoryEntry};
pub use provider::{ChainProvider, ProviderConnector, RpcChainProvider, RpcConnector, TransferLog};
pub use session::{Backends, HistoryQuery, SubmittedTransaction, TransactionSpeed, WalletSession};
pub use signer::{parse_address, KeyHandle};
