//! Encrypted wallet backup
//!
//! A backup is a JSON envelope holding the key (and phrase, when the wallet
//! has one) sealed with AES-256-GCM under an Argon2id-derived key. The
//! envelope is opaque to callers: it is produced by `lock` and consumed by
//! `unlock` / `from_encrypted_backup`.

use super::signer::KeyHandle;
use crate::{Error, Result};
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use alloy::hex;
use alloy::primitives::{Address, B256};
use argon2::{Algorithm, Argon2, Params, Version};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

const BACKUP_VERSION: u32 = 1;
const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Argon2id work factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub m_cost: u32,
    /// Time cost (iterations)
    pub t_cost: u32,
    /// Parallelism
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: 65536, // 64 MiB
            t_cost: 3,
            p_cost: 1,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct BackupEnvelope {
    version: u32,
    address: Address,
    kdf: KdfParams,
    salt: String,
    nonce: String,
    ciphertext: String,
}

#[derive(Serialize, Deserialize)]
struct BackupPlaintext {
    private_key: B256,
    mnemonic: Option<String>,
}

fn derive_key(passphrase: &SecretString, salt: &[u8], kdf: &KdfParams) -> Result<[u8; KEY_LEN]> {
    let params = Params::new(kdf.m_cost, kdf.t_cost, kdf.p_cost, Some(KEY_LEN))
        .map_err(|e| Error::Wallet(format!("Invalid KDF parameters: {}", e)))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(passphrase.expose_secret().as_bytes(), salt, &mut key)
        .map_err(|e| Error::Wallet(format!("Key derivation failed: {}", e)))?;
    Ok(key)
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value).map_err(|e| Error::Wallet(format!("Corrupt backup {}: {}", name, e)))
}

/// Address and secret payload of a key handle, ready to seal
fn backup_parts(key: &KeyHandle) -> (Address, BackupPlaintext) {
    let (private_key, mnemonic) = key.backup_material();
    (
        key.address(),
        BackupPlaintext {
            private_key,
            mnemonic,
        },
    )
}

#[cfg(test)]
fn encrypt(key: &KeyHandle, passphrase: &SecretString, kdf: KdfParams) -> Result<String> {
    let (address, plaintext) = backup_parts(key);
    seal(address, plaintext, passphrase, kdf)
}

fn seal(
    address: Address,
    plaintext: BackupPlaintext,
    passphrase: &SecretString,
    kdf: KdfParams,
) -> Result<String> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut nonce);

    let derived = derive_key(passphrase, &salt, &kdf)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&derived));

    let plaintext = serde_json::to_vec(&plaintext)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
        .map_err(|e| Error::Wallet(format!("Encryption failed: {}", e)))?;

    let envelope = BackupEnvelope {
        version: BACKUP_VERSION,
        address,
        kdf,
        salt: hex::encode(salt),
        nonce: hex::encode(nonce),
        ciphertext: hex::encode(ciphertext),
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Open a backup. A wrong passphrase yields `Error::Authentication`.
pub fn decrypt(backup: &str, passphrase: &SecretString) -> Result<KeyHandle> {
    let envelope: BackupEnvelope = serde_json::from_str(backup)
        .map_err(|e| Error::Wallet(format!("Unreadable backup: {}", e)))?;
    if envelope.version != BACKUP_VERSION {
        return Err(Error::Wallet(format!(
            "Unsupported backup version: {}",
            envelope.version
        )));
    }

    let salt = decode_field("salt", &envelope.salt)?;
    let nonce = decode_field("nonce", &envelope.nonce)?;
    let ciphertext = decode_field("ciphertext", &envelope.ciphertext)?;
    if nonce.len() != NONCE_LEN {
        return Err(Error::Wallet("Corrupt backup nonce".to_string()));
    }

    let derived = derive_key(passphrase, &salt, &envelope.kdf)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&derived));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
        .map_err(|_| Error::Authentication("incorrect passphrase".to_string()))?;

    let plaintext: BackupPlaintext = serde_json::from_slice(&plaintext)
        .map_err(|e| Error::Wallet(format!("Corrupt backup payload: {}", e)))?;
    let key = KeyHandle::from_parts(plaintext.private_key, plaintext.mnemonic)?;

    if key.address() != envelope.address {
        return Err(Error::Wallet(
            "Backup address does not match its key".to_string(),
        ));
    }
    Ok(key)
}

/// Address recorded in a backup, readable without the passphrase
pub fn backup_address(backup: &str) -> Result<Address> {
    let envelope: BackupEnvelope = serde_json::from_str(backup)
        .map_err(|e| Error::Wallet(format!("Unreadable backup: {}", e)))?;
    Ok(envelope.address)
}

fn join_error(e: tokio::task::JoinError) -> Error {
    Error::Wallet(format!("Backup task failed: {}", e))
}

/// Seal a key handle on the blocking pool (Argon2id is slow by construction)
pub async fn encrypt_blocking(
    key: &KeyHandle,
    passphrase: &SecretString,
    kdf: KdfParams,
) -> Result<String> {
    let (address, plaintext) = backup_parts(key);
    let passphrase = SecretString::from(passphrase.expose_secret().to_owned());

    tokio::task::spawn_blocking(move || seal(address, plaintext, &passphrase, kdf))
        .await
        .map_err(join_error)?
}

/// [`decrypt`] on the blocking pool
pub async fn decrypt_blocking(backup: &str, passphrase: &SecretString) -> Result<KeyHandle> {
    let backup = backup.to_owned();
    let passphrase = SecretString::from(passphrase.expose_secret().to_owned());

    tokio::task::spawn_blocking(move || decrypt(&backup, &passphrase))
        .await
        .map_err(join_error)?
}

#[cfg(test)]
pub(crate) fn fast_kdf() -> KdfParams {
    KdfParams {
        m_cost: 64,
        t_cost: 1,
        p_cost: 1,
    }
}
