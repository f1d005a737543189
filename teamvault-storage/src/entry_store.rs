//! Entry records.

use crate::error::StorageResult;
use crate::team_store::ignore_no_rows;
use duckdb::{params, Connection};
use std::sync::{Arc, Mutex};
use teamvault_model::Entry;

#[derive(Clone)]
pub struct EntryStore {
    conn: Arc<Mutex<Connection>>,
}

impl EntryStore {
    pub(crate) fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn create(&self, entry: &Entry) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO entries (id, team_id, is_deleted, data_json) VALUES (?, ?, ?, ?)",
            params![
                entry.id,
                entry.team_id,
                entry.is_deleted,
                serde_json::to_string(entry)?
            ],
        )?;
        Ok(())
    }

    pub fn find(&self, entry_id: &str) -> StorageResult<Option<Entry>> {
        let conn = self.conn.lock().unwrap();
        let row: Option<String> = conn
            .query_row(
                "SELECT data_json FROM entries WHERE id = ?",
                params![entry_id],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(ignore_no_rows)?;
        row.map(|json| Ok(serde_json::from_str(&json)?)).transpose()
    }

    /// Replaces the whole record in one statement, keeping the indexed
    /// columns in step with the JSON.
    pub fn update(&self, entry: &Entry) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE entries SET team_id = ?, is_deleted = ?, data_json = ? WHERE id = ?",
            params![
                entry.team_id,
                entry.is_deleted,
                serde_json::to_string(entry)?,
                entry.id
            ],
        )?;
        Ok(())
    }

    /// Lists a team's entries, newest first.
    pub fn find_by_team(&self, team_id: &str, include_deleted: bool) -> StorageResult<Vec<Entry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT data_json FROM entries WHERE team_id = ? AND (is_deleted = FALSE OR ?) ",
        )?;
        let rows: Vec<String> = stmt
            .query_map(params![team_id, include_deleted], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        let mut entries: Vec<Entry> = rows
            .iter()
            .map(|json| serde_json::from_str(json))
            .collect::<Result<_, _>>()?;
        entries.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(entries)
    }
}
