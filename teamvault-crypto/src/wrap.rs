//! Per-member wrapping of the team key.
//!
//! The team's random key is sealed, for each member, under a key derived
//! (Argon2id) from that member's presented credential. The salt is bundled
//! with the ciphertext so the credential is the only input needed to
//! unwrap. A failed unwrap (Poly1305 tag mismatch) means the credential is
//! wrong — unwrapping doubles as credential verification.

use crate::cipher::{decrypt, encrypt, EncryptedData};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_key, DerivedKey, KdfParams, Salt, KEY_SIZE, SALT_SIZE};

/// A team key sealed under one member's credential-derived key.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct WrappedKey {
    pub salt: [u8; SALT_SIZE],
    pub encrypted: EncryptedData,
}

/// Wraps `team_key` for a member identified by `credential`.
pub fn wrap_key(team_key: &DerivedKey, credential: &str) -> CryptoResult<WrappedKey> {
    let salt = Salt::random();
    let kek = derive_key(credential, &salt, &KdfParams::default())?;
    let encrypted = encrypt(&kek, team_key.as_bytes())?;

    Ok(WrappedKey {
        salt: *salt.as_bytes(),
        encrypted,
    })
}

/// Unwraps a member's copy of the team key.
///
/// Fails with [`CryptoError::Decryption`] when the credential does not
/// match the one the key was wrapped under.
pub fn unwrap_key(wrapped: &WrappedKey, credential: &str) -> CryptoResult<DerivedKey> {
    let salt = Salt::from_bytes(wrapped.salt);
    let kek = derive_key(credential, &salt, &KdfParams::default())?;
    let plaintext = decrypt(&kek, &wrapped.encrypted)?;

    if plaintext.len() != KEY_SIZE {
        return Err(CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: plaintext.len(),
        });
    }

    let mut bytes = [0u8; KEY_SIZE];
    bytes.copy_from_slice(&plaintext);
    Ok(DerivedKey::from_bytes(bytes))
}
