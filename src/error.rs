//! Error types for the wallet session

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed caller input (addresses, amounts)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation attempted in the wrong lock or connection state
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Operation on a token that is not registered
    #[error("Not found: {0}")]
    NotFound(String),

    /// Wrong passphrase for an encrypted backup
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Key material or backup could not be parsed or produced
    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
