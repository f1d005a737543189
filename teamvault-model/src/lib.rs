//! Records, result projections and patch types for Teamvault.
//!
//! Persisted records (`Team`, `User`, `Entry`) are plain serde structs; the
//! confidential parts of secrets and files are never part of a record —
//! they exist only as [`teamvault_crypto::EncryptedData`] at rest and as
//! desensitized `*Result` projections on the way out. Projections are
//! read-only API shapes, never written back to a store.

mod patch;
mod record;
mod result;

pub use patch::{EntryPatch, PatchError, SecretPatch};
pub use record::{Entry, SecretFields, Team, User};
pub use result::{EntryResult, EntrySum, FileMeta, SecretResult, ShareResult};

/// Generates a fresh opaque object ID.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current time as millisecond unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
