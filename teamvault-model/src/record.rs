//! Persisted records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use teamvault_crypto::{decrypt, encrypt, CryptoResult, DerivedKey, EncryptedData, WrappedKey};

/// A team: one owner, a member set, and the team key wrapped per member.
///
/// The owner is always a member. The clear team key never appears here —
/// only per-member wrapped copies.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub members: Vec<String>,
    pub wrapped_keys: BTreeMap<String, WrappedKey>,
    pub logo: Option<String>,
    pub created: i64,
    pub updated: i64,
}

impl Team {
    pub fn new(name: &str, owner_id: &str, owner_wrapped: WrappedKey) -> Self {
        let now = crate::now_ms();
        let mut wrapped_keys = BTreeMap::new();
        wrapped_keys.insert(owner_id.to_string(), owner_wrapped);
        Self {
            id: crate::new_id(),
            name: name.to_string(),
            owner_id: owner_id.to_string(),
            members: vec![owner_id.to_string()],
            wrapped_keys,
            logo: None,
            created: now,
            updated: now,
        }
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m == user_id)
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    /// Adds a member with their wrapped copy of the team key.
    /// Returns false if already a member.
    pub fn add_member(&mut self, user_id: &str, wrapped: WrappedKey) -> bool {
        if self.is_member(user_id) {
            return false;
        }
        self.members.push(user_id.to_string());
        self.wrapped_keys.insert(user_id.to_string(), wrapped);
        true
    }
}

/// A user. Credential-derived keys are computed per request, so the record
/// only carries the avatar reference.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub avatar: Option<String>,
    pub created: i64,
    pub updated: i64,
}

impl User {
    pub fn new(id: &str) -> Self {
        let now = crate::now_ms();
        Self {
            id: id.to_string(),
            avatar: None,
            created: now,
            updated: now,
        }
    }
}

/// An entry: a named container of secret/file/share IDs inside a team.
///
/// Child ID sets are duplicate-free; all mutation goes through the add/
/// remove helpers which preserve that.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub team_id: String,
    pub name: String,
    pub category: String,
    pub priority: i32,
    pub is_deleted: bool,
    pub secrets: Vec<String>,
    pub files: Vec<String>,
    pub shares: Vec<String>,
    pub created: i64,
    pub updated: i64,
}

fn add_unique(list: &mut Vec<String>, id: &str) -> bool {
    if list.iter().any(|x| x == id) {
        return false;
    }
    list.push(id.to_string());
    true
}

fn remove_item(list: &mut Vec<String>, id: &str) -> bool {
    let before = list.len();
    list.retain(|x| x != id);
    list.len() != before
}

impl Entry {
    pub fn new(team_id: &str, name: &str, category: &str, priority: i32) -> Self {
        let now = crate::now_ms();
        Self {
            id: crate::new_id(),
            team_id: team_id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            priority,
            is_deleted: false,
            secrets: Vec::new(),
            files: Vec::new(),
            shares: Vec::new(),
            created: now,
            updated: now,
        }
    }

    pub fn has_secret(&self, secret_id: &str) -> bool {
        self.secrets.iter().any(|x| x == secret_id)
    }

    pub fn add_secret(&mut self, secret_id: &str) -> bool {
        add_unique(&mut self.secrets, secret_id)
    }

    pub fn remove_secret(&mut self, secret_id: &str) -> bool {
        remove_item(&mut self.secrets, secret_id)
    }

    pub fn has_file(&self, file_id: &str) -> bool {
        self.files.iter().any(|x| x == file_id)
    }

    pub fn add_file(&mut self, file_id: &str) -> bool {
        add_unique(&mut self.files, file_id)
    }

    pub fn remove_file(&mut self, file_id: &str) -> bool {
        remove_item(&mut self.files, file_id)
    }
}

/// The confidential payload of a secret, in the clear.
///
/// Exists only inside a request: sealed before persistence, reconstructed
/// on a successful decrypting read, never logged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretFields {
    pub name: String,
    pub url: String,
    pub password: String,
    pub note: String,
}

impl SecretFields {
    /// True when every field is empty — such a secret is rejected at the
    /// boundary.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.url.is_empty() && self.password.is_empty() && self.note.is_empty()
    }

    /// Seals the fields under the team working key.
    pub fn seal(&self, key: &DerivedKey) -> CryptoResult<EncryptedData> {
        let plaintext = serde_json::to_vec(self)
            .map_err(|e| teamvault_crypto::CryptoError::Encryption(e.to_string()))?;
        encrypt(key, &plaintext)
    }

    /// Opens sealed fields. Fails on a wrong key or tampered record.
    pub fn open(key: &DerivedKey, sealed: &EncryptedData) -> CryptoResult<Self> {
        let plaintext = decrypt(key, sealed)?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| teamvault_crypto::CryptoError::Decryption(e.to_string()))
    }
}
