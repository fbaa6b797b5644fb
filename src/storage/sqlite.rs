//! SQLite-backed key-value store
//!
//! Manages the stepdex database (by default `~/.stepdex/stepdex.db`) with
//! automatic schema setup.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use super::{KeyValueStore, StorageError};

/// Durable store with one row per key
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create the store at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create store dir: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open store: {}", path.display()))?;

        // WAL keeps a crash from losing more than the last uncommitted write
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Open a private in-memory database (same schema, nothing on disk)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory store")?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("Store lock poisoned")
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    /// Current schema version recorded in the database
    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.conn();
        let version = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )?;
        Ok(version)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn();
        conn.query_row("SELECT value FROM kv WHERE key = ?1", [key], |r| r.get(0))
            .optional()
            .map_err(|e| StorageError::Read {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let now = Utc::now().timestamp_millis();
        let conn = self.conn();
        conn.execute(
            r#"INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
               ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3"#,
            rusqlite::params![key, value, now],
        )
        .map_err(|e| StorageError::Write {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let conn = self.conn();
        conn.execute("DELETE FROM kv WHERE key = ?1", [key])
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let read_err = |e: rusqlite::Error| StorageError::Read {
            key: "*".to_string(),
            reason: e.to_string(),
        };

        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT key FROM kv").map_err(read_err)?;
        let keys = stmt
            .query_map([], |row| row.get(0))
            .map_err(read_err)?
            .collect::<Result<Vec<String>, _>>()
            .map_err(read_err)?;
        Ok(keys)
    }

    fn clear(&self) -> Result<(), StorageError> {
        let conn = self.conn();
        conn.execute("DELETE FROM kv", [])
            .map_err(|e| StorageError::Write {
                key: "*".to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

/// SQL schema for the store
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);

-- Schema version
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO schema_version VALUES (1);
"#;
