//! Key derivation (Argon2id) and key material types.

use crate::error::{CryptoError, CryptoResult};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of derived keys in bytes (256-bit).
pub const KEY_SIZE: usize = 32;

/// Size of KDF salts in bytes.
pub const SALT_SIZE: usize = 16;

/// A random salt for Argon2id derivation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    /// Generates a fresh random salt.
    pub fn random() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

/// Argon2id parameters.
///
/// Defaults follow the OWASP interactive-login recommendation
/// (19 MiB memory, 2 iterations, 1 lane).
#[derive(Clone, Debug)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// A 256-bit symmetric key. Zeroized on drop.
///
/// This is the only key type accepted by the cipher and stream modules,
/// so raw byte slices never flow into encryption calls directly.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    // Never print key material
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Derives a 256-bit key from a credential string using Argon2id.
pub fn derive_key(credential: &str, salt: &Salt, params: &KdfParams) -> CryptoResult<DerivedKey> {
    let argon_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut out = [0u8; KEY_SIZE];
    argon
        .hash_password_into(credential.as_bytes(), salt.as_bytes(), &mut out)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    Ok(DerivedKey(out))
}

/// Generates a fresh random 256-bit key (e.g. a new team key).
pub fn generate_random_key() -> DerivedKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    DerivedKey(bytes)
}

/// Derives a scope-bound key from a server-held secret.
///
/// Used for avatar/logo blobs, which must be decryptable on the anonymous
/// download path: the key depends only on the server secret and the
/// (ref-type, ref-id) pair the blob was uploaded under. Context strings are
/// length-prefixed so distinct scopes can never collide.
pub fn derive_scoped_key(secret: &[u8; KEY_SIZE], context: &[&str]) -> DerivedKey {
    let mut hasher = Sha256::new();
    hasher.update(b"teamvault-scoped-key-v1");
    hasher.update(secret);
    for part in context {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part.as_bytes());
    }
    let digest = hasher.finalize();

    let mut bytes = [0u8; KEY_SIZE];
    bytes.copy_from_slice(&digest);
    DerivedKey(bytes)
}
