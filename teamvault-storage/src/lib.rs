//! DuckDB storage layer for Teamvault.
//!
//! One connection, shared by five narrow stores (teams, users, entries,
//! secrets, files). Records are stored as JSON blobs; the columns pulled
//! out of `entries` (`team_id`, `is_deleted`) exist only to serve the
//! team-listing query without parsing every row.
//!
//! Secrets and file blobs are stored as ciphertext only — sealing and
//! opening happen at the store boundary, against a caller-supplied working
//! key, so no plaintext ever reaches a table. Every write is a single SQL
//! statement; concurrent writers to the same row are last-write-wins.

mod entry_store;
mod error;
mod file_store;
mod secret_store;
mod team_store;
mod user_store;

pub use entry_store::EntryStore;
pub use error::{StorageError, StorageResult};
pub use file_store::FileStore;
pub use secret_store::SecretStore;
pub use team_store::TeamStore;
pub use user_store::UserStore;

use duckdb::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// All stores, sharing one DuckDB connection. Cloning yields handles onto
/// the same database.
#[derive(Clone)]
pub struct Stores {
    pub teams: TeamStore,
    pub users: UserStore,
    pub entries: EntryStore,
    pub secrets: SecretStore,
    pub files: FileStore,
}

impl Stores {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        // Cap memory/threads — DuckDB defaults to ~80% RAM per connection
        conn.execute_batch("PRAGMA memory_limit='128MB'; PRAGMA threads=1;")?;
        Self::from_conn(conn)
    }

    /// Opens an in-memory database (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::from_conn(Connection::open_in_memory()?)
    }

    fn from_conn(conn: Connection) -> StorageResult<Self> {
        initialize_schema(&conn)?;
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self {
            teams: TeamStore::new(conn.clone()),
            users: UserStore::new(conn.clone()),
            entries: EntryStore::new(conn.clone()),
            secrets: SecretStore::new(conn.clone()),
            files: FileStore::new(conn),
        })
    }
}

fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS teams (
            id VARCHAR PRIMARY KEY,
            data_json VARCHAR NOT NULL
        );
        CREATE TABLE IF NOT EXISTS users (
            id VARCHAR PRIMARY KEY,
            data_json VARCHAR NOT NULL
        );
        CREATE TABLE IF NOT EXISTS entries (
            id VARCHAR PRIMARY KEY,
            team_id VARCHAR NOT NULL,
            is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
            data_json VARCHAR NOT NULL
        );
        CREATE TABLE IF NOT EXISTS secrets (
            id VARCHAR PRIMARY KEY,
            envelope VARCHAR NOT NULL,
            created BIGINT NOT NULL,
            updated BIGINT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS files (
            id VARCHAR PRIMARY KEY,
            name VARCHAR NOT NULL,
            content_type VARCHAR NOT NULL,
            size BIGINT NOT NULL,
            updated BIGINT NOT NULL,
            blob BLOB NOT NULL
        );",
    )?;
    Ok(())
}
