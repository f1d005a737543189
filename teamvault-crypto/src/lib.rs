//! Key derivation and encryption layer for Teamvault.
//!
//! Provides the confidentiality primitives for team-scoped secret storage:
//! - Argon2id key derivation from member credentials
//! - ChaCha20-Poly1305 for authenticated encryption
//! - Per-member wrapping of the random team key
//! - Chunked stream encryption for file blobs
//! - HMAC-signed, expiring download tokens
//!
//! # Architecture
//!
//! Each team owns a random 32-byte key. That key is never stored in the
//! clear: for every member it is sealed under a key derived (Argon2id) from
//! that member's presented credential. Unsealing doubles as credential
//! verification — a wrong credential fails the Poly1305 tag check.
//!
//! Working keys are derived per request and zeroized on drop; nothing in
//! this crate caches key material.

mod cipher;
mod error;
mod key;
mod stream;
mod token;
mod wrap;

pub use cipher::{decrypt, encrypt, EncryptedData, FORMAT_VERSION, NONCE_SIZE, TAG_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    derive_key, derive_scoped_key, generate_random_key, DerivedKey, KdfParams, Salt, KEY_SIZE,
    SALT_SIZE,
};
pub use stream::{decrypt_stream, encrypt_stream, CHUNK_SIZE, STREAM_ID_SIZE};
pub use token::{TokenConfig, TokenError, TokenSigner};
pub use wrap::{unwrap_key, wrap_key, WrappedKey};
