//! Vault error taxonomy.
//!
//! Every error surfaced to a caller carries a stable kind. Internal store
//! failures collapse into [`VaultError::Internal`] so "storage unavailable"
//! can never be mistaken for "not authorized".

use teamvault_crypto::TokenError;
use teamvault_model::PatchError;
use teamvault_storage::StorageError;
use thiserror::Error;

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid credential")]
    InvalidCredential,

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("invalid property: {0}")]
    InvalidProperty(String),

    #[error("no content")]
    EmptyUpdate,

    #[error("invalid file type: {0}")]
    InvalidFileType(String),

    #[error("token bound to a different file")]
    TokenMismatch,

    #[error("token expired")]
    TokenExpired,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for VaultError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Decryption(_) => VaultError::DecryptionFailed,
            other => VaultError::Internal(other.to_string()),
        }
    }
}

impl From<PatchError> for VaultError {
    fn from(err: PatchError) -> Self {
        match err {
            PatchError::InvalidProperty(msg) => VaultError::InvalidProperty(msg),
            PatchError::EmptyUpdate => VaultError::EmptyUpdate,
        }
    }
}

impl From<TokenError> for VaultError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Mismatch => VaultError::TokenMismatch,
            TokenError::Expired => VaultError::TokenExpired,
            TokenError::Invalid(msg) => VaultError::Unauthorized(msg),
        }
    }
}
