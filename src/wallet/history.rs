//! Transaction history entries

use super::explorer::ExplorerTransaction;
use super::provider::TransferLog;
use crate::units::format_units;
use alloy::primitives::{Address, TxHash};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Direction of a transfer relative to the wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    /// from == to == wallet
    #[serde(rename = "SELF")]
    SelfTransfer,
    #[serde(rename = "OUT")]
    Out,
    #[serde(rename = "IN")]
    In,
}

impl Direction {
    pub fn classify(wallet: Address, from: Address, to: Option<Address>) -> Self {
        if from == wallet && to == Some(wallet) {
            Direction::SelfTransfer
        } else if from == wallet {
            Direction::Out
        } else {
            Direction::In
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::SelfTransfer => "SELF",
            Direction::Out => "OUT",
            Direction::In => "IN",
        }
    }
}

/// One history line, amount already formatted in whole units
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub direction: Direction,
    pub hash: Option<TxHash>,
    pub block_number: Option<u64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub from: Address,
    pub to: Option<Address>,
    pub amount: String,
}

impl HistoryEntry {
    pub fn from_explorer(wallet: Address, tx: ExplorerTransaction, decimals: u8) -> Self {
        Self {
            direction: Direction::classify(wallet, tx.from, tx.to),
            hash: Some(tx.hash),
            block_number: Some(tx.block_number),
            timestamp: tx.timestamp,
            from: tx.from,
            to: tx.to,
            amount: format_units(tx.value, decimals),
        }
    }

    pub fn from_transfer(wallet: Address, log: TransferLog, decimals: u8) -> Self {
        Self {
            direction: Direction::classify(wallet, log.from, Some(log.to)),
            hash: log.transaction_hash,
            block_number: log.block_number,
            timestamp: None,
            from: log.from,
            to: Some(log.to),
            amount: format_units(log.value, decimals),
        }
    }
}

/// Whether a transfer touches the wallet at all
pub fn involves(wallet: Address, log: &TransferLog) -> bool {
    log.from == wallet || log.to == wallet
}
