//! HMAC-signed download tokens.
//!
//! An entry attachment can be fetched without an authenticated session by
//! presenting a token handed out at upload time. The token binds a file ID
//! and an expiry, and carries the file's decryption key sealed under a key
//! derived from the server-held signing secret — the working key never
//! appears in the clear in a URL.
//!
//! Signing secrets are injected at construction and carry a version tag, so
//! rotation keeps previously issued tokens verifiable.

use crate::cipher::{decrypt, encrypt, EncryptedData};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_scoped_key, DerivedKey, KEY_SIZE};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Token verification errors.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("token bound to a different file")]
    Mismatch,

    #[error("token expired")]
    Expired,
}

/// Versioned signing secrets plus the version used for new tokens.
#[derive(Clone)]
pub struct TokenConfig {
    keys: BTreeMap<u32, [u8; KEY_SIZE]>,
    active: u32,
}

impl TokenConfig {
    pub fn new(keys: BTreeMap<u32, [u8; KEY_SIZE]>, active: u32) -> CryptoResult<Self> {
        if !keys.contains_key(&active) {
            return Err(CryptoError::KeyDerivation(format!(
                "active token key version {active} not present"
            )));
        }
        Ok(Self { keys, active })
    }

    /// Single-secret config (version 1).
    pub fn single(secret: [u8; KEY_SIZE]) -> Self {
        let mut keys = BTreeMap::new();
        keys.insert(1, secret);
        Self { keys, active: 1 }
    }
}

#[derive(Serialize, Deserialize)]
struct TokenPayload {
    /// Signing-key version.
    kv: u32,
    file_id: String,
    expires_at: i64,
    /// File decryption key, sealed under the signing secret.
    key: EncryptedData,
}

/// Produces and verifies signed download tokens.
pub struct TokenSigner {
    config: TokenConfig,
}

impl TokenSigner {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    fn seal_key(secret: &[u8; KEY_SIZE]) -> DerivedKey {
        derive_scoped_key(secret, &["token-seal"])
    }

    /// Signs a token granting decryption of `file_id` until `expires_at`
    /// (unix seconds).
    pub fn sign(
        &self,
        file_id: &str,
        decryption_key: &DerivedKey,
        expires_at: i64,
    ) -> CryptoResult<String> {
        let secret = &self.config.keys[&self.config.active];

        let sealed = encrypt(&Self::seal_key(secret), decryption_key.as_bytes())?;
        let payload = TokenPayload {
            kv: self.config.active,
            file_id: file_id.to_string(),
            expires_at,
            key: sealed,
        };

        let payload_b64 = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&payload)
                .map_err(|e| CryptoError::Encryption(e.to_string()))?,
        );

        let mut mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;
        mac.update(payload_b64.as_bytes());
        let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload_b64}.{sig}"))
    }

    /// Verifies a token against `file_id` at the current time.
    pub fn verify(&self, file_id: &str, token: &str) -> Result<DerivedKey, TokenError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        self.verify_at(file_id, token, now)
    }

    /// Verifies a token at an explicit point in time (unix seconds).
    pub fn verify_at(&self, file_id: &str, token: &str, now: i64) -> Result<DerivedKey, TokenError> {
        let (payload_b64, sig_b64) = token
            .split_once('.')
            .ok_or_else(|| TokenError::Invalid("malformed token".to_string()))?;

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| TokenError::Invalid("malformed payload".to_string()))?;
        let sig = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| TokenError::Invalid("malformed signature".to_string()))?;

        let payload: TokenPayload = serde_json::from_slice(&payload_bytes)
            .map_err(|_| TokenError::Invalid("malformed payload".to_string()))?;

        let secret = self
            .config
            .keys
            .get(&payload.kv)
            .ok_or_else(|| TokenError::Invalid(format!("unknown key version {}", payload.kv)))?;

        // Constant-time MAC check before anything else is trusted
        let mut mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&sig)
            .map_err(|_| TokenError::Invalid("bad signature".to_string()))?;

        if payload.file_id != file_id {
            return Err(TokenError::Mismatch);
        }
        if payload.expires_at < now {
            return Err(TokenError::Expired);
        }

        let key_bytes = decrypt(&Self::seal_key(secret), &payload.key)
            .map_err(|_| TokenError::Invalid("unreadable sealed key".to_string()))?;
        if key_bytes.len() != KEY_SIZE {
            return Err(TokenError::Invalid("sealed key has wrong length".to_string()));
        }

        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&key_bytes);
        Ok(DerivedKey::from_bytes(bytes))
    }
}
