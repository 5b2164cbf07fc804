//! Unit conversion helpers
//!
//! Parsing goes through alloy's unit parser; formatting trims trailing
//! zeros so `1500000000000000000` wei reads as `1.5`.

use crate::{Error, Result};
use alloy::primitives::utils::parse_units;
use alloy::primitives::U256;

/// Decimals of the native currency
pub const ETHER_DECIMALS: u8 = 18;

/// Format a U256 value with decimals
///
/// Works on the digit string, so any `decimals` up to 255 is exact even
/// where `10^decimals` does not fit in a U256.
pub fn format_units(value: U256, decimals: u8) -> String {
    if value.is_zero() {
        return "0".to_string();
    }

    let digits = value.to_string();
    let decimals = decimals as usize;
    let (whole, fraction) = if digits.len() > decimals {
        let (whole, fraction) = digits.split_at(digits.len() - decimals);
        (whole.to_string(), fraction.to_string())
    } else {
        ("0".to_string(), format!("{:0>width$}", digits, width = decimals))
    };

    let trimmed = fraction.trim_end_matches('0');
    if trimmed.is_empty() {
        whole
    } else {
        format!("{}.{}", whole, trimmed)
    }
}

/// Format wei as ether
pub fn format_ether(wei: U256) -> String {
    format_units(wei, ETHER_DECIMALS)
}

/// `10^decimals`, or `None` past 77 decimals where it exceeds U256
pub fn scale_factor(decimals: u8) -> Option<U256> {
    U256::from(10).checked_pow(U256::from(decimals))
}

/// `floor(raw / 10^decimals)`; zero whenever the scale exceeds U256
pub fn whole_units(raw: U256, scale: Option<U256>) -> U256 {
    scale.map(|scale| raw / scale).unwrap_or(U256::ZERO)
}

/// Parse a decimal amount into base units
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256> {
    let amount = amount.trim();
    if amount.starts_with('-') {
        return Err(Error::Validation(format!("Negative amount: {}", amount)));
    }
    parse_units(amount, decimals)
        .map(|units| units.get_absolute())
        .map_err(|e| Error::Validation(format!("Invalid amount '{}': {}", amount, e)))
}

/// Parse an ether amount into wei
pub fn parse_ether(amount: &str) -> Result<U256> {
    parse_amount(amount, ETHER_DECIMALS)
}

/// Parse a gwei gas price into wei
pub fn parse_gwei(gas_price: &str) -> Result<u128> {
    let wei = parse_amount(gas_price, 9)?;
    u128::try_from(wei)
        .map_err(|_| Error::Validation(format!("Gas price out of range: {}", gas_price)))
}
