//! Typed update requests.
//!
//! Updates arrive as JSON objects naming only the fields to change. Each
//! entity gets a patch type listing its legal optional fields; unknown
//! keys and wrong value types are rejected at the boundary, before the
//! orchestrator runs, so no dynamic type assertions survive past parsing.

use crate::record::{Entry, SecretFields};
use serde::Deserialize;
use thiserror::Error;

/// Patch validation errors.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("invalid property: {0}")]
    InvalidProperty(String),

    #[error("no content")]
    EmptyUpdate,
}

/// Mutable entry fields.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub priority: Option<i32>,
}

impl EntryPatch {
    /// Parses and validates a JSON update payload.
    pub fn from_json(value: serde_json::Value) -> Result<Self, PatchError> {
        let patch: EntryPatch = serde_json::from_value(value)
            .map_err(|e| PatchError::InvalidProperty(e.to_string()))?;
        if patch.name.is_none() && patch.category.is_none() && patch.priority.is_none() {
            return Err(PatchError::EmptyUpdate);
        }
        Ok(patch)
    }

    /// Applies the patch. Returns true if any field actually changed value.
    pub fn apply(&self, entry: &mut Entry) -> bool {
        let mut changed = false;
        if let Some(name) = &self.name {
            if *name != entry.name {
                entry.name = name.clone();
                changed = true;
            }
        }
        if let Some(category) = &self.category {
            if *category != entry.category {
                entry.category = category.clone();
                changed = true;
            }
        }
        if let Some(priority) = self.priority {
            if priority != entry.priority {
                entry.priority = priority;
                changed = true;
            }
        }
        changed
    }
}

/// Mutable secret fields.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecretPatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub password: Option<String>,
    pub note: Option<String>,
}

impl SecretPatch {
    /// Parses and validates a JSON update payload.
    pub fn from_json(value: serde_json::Value) -> Result<Self, PatchError> {
        let patch: SecretPatch = serde_json::from_value(value)
            .map_err(|e| PatchError::InvalidProperty(e.to_string()))?;
        if patch.name.is_none()
            && patch.url.is_none()
            && patch.password.is_none()
            && patch.note.is_none()
        {
            return Err(PatchError::EmptyUpdate);
        }
        Ok(patch)
    }

    /// Applies the patch. Returns true if any field actually changed value.
    pub fn apply(&self, fields: &mut SecretFields) -> bool {
        let mut changed = false;
        if let Some(name) = &self.name {
            if *name != fields.name {
                fields.name = name.clone();
                changed = true;
            }
        }
        if let Some(url) = &self.url {
            if *url != fields.url {
                fields.url = url.clone();
                changed = true;
            }
        }
        if let Some(password) = &self.password {
            if *password != fields.password {
                fields.password = password.clone();
                changed = true;
            }
        }
        if let Some(note) = &self.note {
            if *note != fields.note {
                fields.note = note.clone();
                changed = true;
            }
        }
        changed
    }
}
