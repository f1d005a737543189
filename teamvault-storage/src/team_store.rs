//! Team records.

use crate::error::StorageResult;
use duckdb::{params, Connection};
use std::sync::{Arc, Mutex};
use teamvault_model::Team;

#[derive(Clone)]
pub struct TeamStore {
    conn: Arc<Mutex<Connection>>,
}

impl TeamStore {
    pub(crate) fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn create(&self, team: &Team) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO teams (id, data_json) VALUES (?, ?)",
            params![team.id, serde_json::to_string(team)?],
        )?;
        Ok(())
    }

    pub fn find(&self, team_id: &str) -> StorageResult<Option<Team>> {
        let conn = self.conn.lock().unwrap();
        let row: Option<String> = conn
            .query_row(
                "SELECT data_json FROM teams WHERE id = ?",
                params![team_id],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(ignore_no_rows)?;
        row.map(|json| Ok(serde_json::from_str(&json)?)).transpose()
    }

    /// Replaces the whole record in one statement.
    pub fn update(&self, team: &Team) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE teams SET data_json = ? WHERE id = ?",
            params![serde_json::to_string(team)?, team.id],
        )?;
        Ok(())
    }
}

pub(crate) fn ignore_no_rows<T>(err: duckdb::Error) -> Result<Option<T>, duckdb::Error> {
    match err {
        duckdb::Error::QueryReturnedNoRows => Ok(None),
        other => Err(other),
    }
}
