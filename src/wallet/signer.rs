//! Signing handle
//!
//! SECURITY: This is the only place raw key material lives.
//! - Keys are held in alloy's PrivateKeySigner
//! - Keys are never logged and Debug output is redacted
//! - Exposure goes through `SecretString`, so callers opt in explicitly

use crate::{Error, Result};
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use alloy::hex;
use alloy::primitives::{Address, B256};
use alloy::signers::local::coins_bip39::English;
use alloy::signers::local::{MnemonicBuilder, PrivateKeySigner};
use bip39::Mnemonic;
use secrecy::{ExposeSecret, SecretString};
use std::str::FromStr;

/// Entropy for freshly generated phrases (12 words)
const MNEMONIC_ENTROPY_BYTES: usize = 16;

/// Parse a caller-supplied address
///
/// Mixed-case input must carry a valid EIP-55 checksum; all-lowercase or
/// all-uppercase input is accepted as is.
pub fn parse_address(input: &str) -> Result<Address> {
    let input = input.trim();
    let digits = input.strip_prefix("0x").unwrap_or(input);
    let mixed_case = digits.chars().any(|c| c.is_ascii_uppercase())
        && digits.chars().any(|c| c.is_ascii_lowercase());

    let parsed = if mixed_case {
        Address::parse_checksummed(input, None).map_err(|e| e.to_string())
    } else {
        Address::from_str(input).map_err(|e| e.to_string())
    };

    parsed.map_err(|e| Error::Validation(format!("Invalid address '{}': {}", input, e)))
}

/// The key a session signs with, plus the phrase it came from (if any)
pub struct KeyHandle {
    signer: PrivateKeySigner,
    mnemonic: Option<SecretString>,
}

impl KeyHandle {
    /// Generate a fresh 12-word phrase and derive the first account from it
    pub fn random() -> Result<Self> {
        let mut entropy = [0u8; MNEMONIC_ENTROPY_BYTES];
        OsRng.fill_bytes(&mut entropy);
        let mnemonic = Mnemonic::from_entropy(&entropy)
            .map_err(|e| Error::Wallet(format!("Failed to generate mnemonic: {}", e)))?;

        Self::from_mnemonic(&mnemonic.to_string())
    }

    /// Restore from a hex-encoded private key (with or without 0x)
    pub fn from_private_key(key_hex: &str) -> Result<Self> {
        let key_hex = key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| Error::Wallet(format!("Invalid private key: {}", e)))?;

        Ok(Self {
            signer,
            mnemonic: None,
        })
    }

    /// Restore from a BIP-39 phrase using the default path m/44'/60'/0'/0/0
    pub fn from_mnemonic(phrase: &str) -> Result<Self> {
        let normalized = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
        Mnemonic::parse(&normalized)
            .map_err(|e| Error::Wallet(format!("Invalid mnemonic: {}", e)))?;

        let signer = MnemonicBuilder::<English>::default()
            .phrase(normalized.as_str())
            .index(0u32)
            .map_err(|e| Error::Wallet(format!("Invalid derivation path: {}", e)))?
            .build()
            .map_err(|e| Error::Wallet(format!("Key derivation failed: {}", e)))?;

        Ok(Self {
            signer,
            mnemonic: Some(SecretString::from(normalized)),
        })
    }

    /// Rebuild a handle from decrypted backup material
    pub(crate) fn from_parts(key: B256, mnemonic: Option<String>) -> Result<Self> {
        let signer = PrivateKeySigner::from_bytes(&key)
            .map_err(|e| Error::Wallet(format!("Invalid private key: {}", e)))?;
        Ok(Self {
            signer,
            mnemonic: mnemonic.map(SecretString::from),
        })
    }

    /// Public address (safe to share)
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Underlying alloy signer, for binding to providers
    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    /// Private key as 0x-prefixed hex
    pub fn private_key(&self) -> SecretString {
        SecretString::from(format!("0x{}", hex::encode(self.signer.to_bytes())))
    }

    pub fn mnemonic(&self) -> Option<SecretString> {
        self.mnemonic
            .as_ref()
            .map(|m| SecretString::from(m.expose_secret().to_owned()))
    }

    /// Raw key bytes and phrase, for encrypting a backup
    pub(crate) fn backup_material(&self) -> (B256, Option<String>) {
        (
            self.signer.to_bytes(),
            self.mnemonic.as_ref().map(|m| m.expose_secret().to_owned()),
        )
    }
}

// Implement Debug manually to avoid exposing the signer
impl std::fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyHandle")
            .field("address", &self.address())
            .field("signer", &"[REDACTED]")
            .field("has_mnemonic", &self.mnemonic.is_some())
            .finish()
    }
}
