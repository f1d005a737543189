//! Sealed secret records.
//!
//! A secret row is an opaque envelope plus timestamps; the store never
//! sees plaintext except transiently inside `create`/`update`/`find_*`,
//! against the caller's working key.

use crate::error::{StorageError, StorageResult};
use crate::team_store::ignore_no_rows;
use duckdb::{params, Connection};
use std::sync::{Arc, Mutex};
use teamvault_crypto::{DerivedKey, EncryptedData};
use teamvault_model::{new_id, now_ms, SecretFields, SecretResult};

#[derive(Clone)]
pub struct SecretStore {
    conn: Arc<Mutex<Connection>>,
}

impl SecretStore {
    pub(crate) fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Seals and persists a new secret, returning its decrypted projection.
    pub fn create(&self, key: &DerivedKey, fields: &SecretFields) -> StorageResult<SecretResult> {
        let id = new_id();
        let now = now_ms();
        let envelope = serde_json::to_string(&fields.seal(key)?)?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO secrets (id, envelope, created, updated) VALUES (?, ?, ?, ?)",
            params![id, envelope, now, now],
        )?;

        Ok(result(&id, fields, now, now))
    }

    /// Opens one secret.
    ///
    /// `Ok(None)` when the row is absent; a row that exists but does not
    /// open against `key` is an error, never a partial answer.
    pub fn find_secret(
        &self,
        key: &DerivedKey,
        secret_id: &str,
    ) -> StorageResult<Option<SecretResult>> {
        let row = self.load_row(secret_id)?;
        row.map(|(envelope, created, updated)| {
            let fields = open_envelope(key, &envelope)?;
            Ok(result(secret_id, &fields, created, updated))
        })
        .transpose()
    }

    /// Opens a batch of secrets, fail-closed: one undecryptable record
    /// fails the whole batch. Absent IDs are skipped.
    pub fn find_secrets(
        &self,
        key: &DerivedKey,
        ids: &[String],
    ) -> StorageResult<Vec<SecretResult>> {
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(sec) = self.find_secret(key, id)? {
                results.push(sec);
            }
        }
        Ok(results)
    }

    /// Re-seals a secret with new fields in one statement.
    pub fn update(
        &self,
        key: &DerivedKey,
        secret_id: &str,
        fields: &SecretFields,
        created: i64,
    ) -> StorageResult<SecretResult> {
        let now = now_ms();
        let envelope = serde_json::to_string(&fields.seal(key)?)?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE secrets SET envelope = ?, updated = ? WHERE id = ?",
            params![envelope, now, secret_id],
        )?;

        Ok(result(secret_id, fields, created, now))
    }

    pub fn delete(&self, secret_id: &str) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM secrets WHERE id = ?", params![secret_id])?;
        Ok(())
    }

    fn load_row(&self, secret_id: &str) -> StorageResult<Option<(String, i64, i64)>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT envelope, created, updated FROM secrets WHERE id = ?",
            params![secret_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .map(Some)
        .or_else(ignore_no_rows)
        .map_err(StorageError::from)
    }
}

fn open_envelope(key: &DerivedKey, envelope: &str) -> StorageResult<SecretFields> {
    let sealed: EncryptedData = serde_json::from_str(envelope)?;
    Ok(SecretFields::open(key, &sealed)?)
}

fn result(id: &str, fields: &SecretFields, created: i64, updated: i64) -> SecretResult {
    SecretResult {
        id: id.to_string(),
        name: fields.name.clone(),
        url: fields.url.clone(),
        password: fields.password.clone(),
        note: fields.note.clone(),
        created,
        updated,
    }
}
