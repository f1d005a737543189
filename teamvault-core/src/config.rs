//! Vault configuration.
//!
//! Both secrets are server-held and must be durable across restarts —
//! tokens signed before a restart stay verifiable, and avatar/logo blobs
//! stay decryptable. Nothing here is generated per process.

use teamvault_crypto::{TokenConfig, KEY_SIZE};

/// Default lifetime of signed download tokens (seconds).
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

pub struct VaultConfig {
    /// Versioned HMAC secrets for signed download tokens.
    pub token: TokenConfig,
    /// Secret behind the scoped keys for avatar/logo blobs.
    pub surface_secret: [u8; KEY_SIZE],
    /// Lifetime of newly signed download tokens.
    pub token_ttl_secs: i64,
}

impl VaultConfig {
    pub fn new(token: TokenConfig, surface_secret: [u8; KEY_SIZE]) -> Self {
        Self {
            token,
            surface_secret,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }

    pub fn with_token_ttl(mut self, secs: i64) -> Self {
        self.token_ttl_secs = secs;
        self
    }
}
