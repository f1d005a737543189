//! Storage error types.

use teamvault_crypto::CryptoError;
use thiserror::Error;

/// Result type for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("encryption error: {0}")]
    Encryption(String),

    #[error("decryption error: {0}")]
    Decryption(String),
}

impl From<CryptoError> for StorageError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Decryption(msg) => StorageError::Decryption(msg),
            CryptoError::UnsupportedVersion(v) => {
                StorageError::Decryption(format!("unsupported format version: {v}"))
            }
            other => StorageError::Encryption(other.to_string()),
        }
    }
}
