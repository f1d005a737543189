//! User records.

use crate::error::StorageResult;
use crate::team_store::ignore_no_rows;
use duckdb::{params, Connection};
use std::sync::{Arc, Mutex};
use teamvault_model::User;

#[derive(Clone)]
pub struct UserStore {
    conn: Arc<Mutex<Connection>>,
}

impl UserStore {
    pub(crate) fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn create(&self, user: &User) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO users (id, data_json) VALUES (?, ?)",
            params![user.id, serde_json::to_string(user)?],
        )?;
        Ok(())
    }

    pub fn find(&self, user_id: &str) -> StorageResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let row: Option<String> = conn
            .query_row(
                "SELECT data_json FROM users WHERE id = ?",
                params![user_id],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(ignore_no_rows)?;
        row.map(|json| Ok(serde_json::from_str(&json)?)).transpose()
    }

    pub fn update(&self, user: &User) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE users SET data_json = ? WHERE id = ?",
            params![serde_json::to_string(user)?, user.id],
        )?;
        Ok(())
    }
}
