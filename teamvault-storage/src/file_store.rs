//! Encrypted file blobs plus metadata.
//!
//! Blob contents are run through the chunked stream cipher as they are
//! read from the caller, and reversed symmetrically on download. Only the
//! ciphertext touches the table.

use crate::error::{StorageError, StorageResult};
use crate::team_store::ignore_no_rows;
use duckdb::{params, Connection};
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};
use teamvault_crypto::{decrypt_stream, encrypt_stream, DerivedKey};
use teamvault_model::{new_id, now_ms, FileMeta};

#[derive(Clone)]
pub struct FileStore {
    conn: Arc<Mutex<Connection>>,
}

impl FileStore {
    pub(crate) fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Encrypts `content` under `key` and persists it.
    pub fn create(
        &self,
        key: &DerivedKey,
        name: &str,
        content_type: &str,
        content: &mut dyn Read,
    ) -> StorageResult<FileMeta> {
        let id = new_id();
        let now = now_ms();

        let mut sealed = Vec::new();
        let size = encrypt_stream(key, content, &mut sealed)? as i64;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO files (id, name, content_type, size, updated, blob) VALUES (?, ?, ?, ?, ?, ?)",
            params![id, name, content_type, size, now, sealed],
        )?;

        Ok(FileMeta {
            id,
            name: name.to_string(),
            content_type: content_type.to_string(),
            size,
            updated: now,
            download_url: None,
        })
    }

    pub fn meta(&self, file_id: &str) -> StorageResult<Option<FileMeta>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT name, content_type, size, updated FROM files WHERE id = ?",
            params![file_id],
            |row| {
                Ok(FileMeta {
                    id: file_id.to_string(),
                    name: row.get(0)?,
                    content_type: row.get(1)?,
                    size: row.get(2)?,
                    updated: row.get(3)?,
                    download_url: None,
                })
            },
        )
        .map(Some)
        .or_else(ignore_no_rows)
        .map_err(StorageError::from)
    }

    /// Decrypts a blob into `out`. `Ok(None)` when the file is absent; a
    /// blob that does not open against `key` is a decryption error.
    pub fn read_to(
        &self,
        key: &DerivedKey,
        file_id: &str,
        out: &mut dyn Write,
    ) -> StorageResult<Option<FileMeta>> {
        let Some(meta) = self.meta(file_id)? else {
            return Ok(None);
        };

        let sealed: Vec<u8> = {
            let conn = self.conn.lock().unwrap();
            conn.query_row(
                "SELECT blob FROM files WHERE id = ?",
                params![file_id],
                |row| row.get(0),
            )?
        };

        decrypt_stream(key, &mut sealed.as_slice(), out)?;
        Ok(Some(meta))
    }

    /// Removes the blob and metadata. Returns false if nothing was stored
    /// under `file_id`.
    pub fn delete(&self, file_id: &str) -> StorageResult<bool> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute("DELETE FROM files WHERE id = ?", params![file_id])?;
        Ok(affected > 0)
    }
}
