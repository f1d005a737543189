//! Desensitized result projections.
//!
//! Built by the orchestrator after membership and key checks pass; never
//! persisted or written back to a store.

use crate::record::Entry;
use serde::Serialize;

/// Entry summary — no resolved children.
#[derive(Clone, Debug, Serialize)]
pub struct EntrySum {
    pub id: String,
    pub team_id: String,
    pub name: String,
    pub category: String,
    pub priority: i32,
    pub created: i64,
    pub updated: i64,
}

/// Full entry view with resolved, decrypted children.
#[derive(Clone, Debug, Serialize)]
pub struct EntryResult {
    pub id: String,
    pub team_id: String,
    pub name: String,
    pub category: String,
    pub priority: i32,
    pub secrets: Vec<SecretResult>,
    pub files: Vec<FileMeta>,
    pub shares: Vec<ShareResult>,
    pub created: i64,
    pub updated: i64,
}

/// A decrypted secret.
#[derive(Clone, Debug, Serialize)]
pub struct SecretResult {
    pub id: String,
    pub name: String,
    pub url: String,
    pub password: String,
    pub note: String,
    pub created: i64,
    pub updated: i64,
}

/// File metadata. `download_url` is filled for entry attachments on upload,
/// embedding the signed token.
#[derive(Clone, Debug, Serialize)]
pub struct FileMeta {
    pub id: String,
    pub name: String,
    pub content_type: String,
    pub size: i64,
    pub updated: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

/// Share resolution is external; entries expose share IDs only.
#[derive(Clone, Debug, Serialize)]
pub struct ShareResult {
    pub id: String,
}

impl Entry {
    /// Projects the entry plus resolved children into an [`EntryResult`].
    pub fn result(
        &self,
        secrets: Vec<SecretResult>,
        files: Vec<FileMeta>,
        shares: Vec<ShareResult>,
    ) -> EntryResult {
        EntryResult {
            id: self.id.clone(),
            team_id: self.team_id.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            priority: self.priority,
            secrets,
            files,
            shares,
            created: self.created,
            updated: self.updated,
        }
    }

    /// Projects the entry into an [`EntrySum`].
    pub fn summary(&self) -> EntrySum {
        EntrySum {
            id: self.id.clone(),
            team_id: self.team_id.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            priority: self.priority,
            created: self.created,
            updated: self.updated,
        }
    }
}
