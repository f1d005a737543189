//! Access-control and key-derivation orchestrator for Teamvault.
//!
//! Teams hold entries; entries aggregate secrets, files, and shares.
//! Reading or writing secret content requires the per-team working key,
//! derived on every call from a member's presented credential; entry
//! attachments can additionally be fetched anonymously through a signed,
//! expiring download token.
//!
//! Nothing is cached across calls: no derived key, no plaintext, no
//! membership decision. The stores are the only shared mutable state.

mod access;
mod config;
mod error;
mod upload;

pub use access::{DownloadRef, EntryAccess};
pub use config::{VaultConfig, DEFAULT_TOKEN_TTL_SECS};
pub use error::{VaultError, VaultResult};
pub use upload::{check_file_name, UploadPart, UploadPayload};
