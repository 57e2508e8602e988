use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use crate::app_dirs::AppDirs;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw JSON key-value persistence. Callers normally go through [`load`] and
/// [`save`], which never fail.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn put(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Reads `key`, falling back when it is missing, unreadable or malformed.
pub fn load<T: DeserializeOwned>(store: &dyn KvStore, key: &str, fallback: T) -> T {
    match store.get(key) {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(key, %err, "malformed stored value, using fallback");
                fallback
            }
        },
        Ok(None) => fallback,
        Err(err) => {
            tracing::warn!(key, %err, "store unavailable, using fallback");
            fallback
        }
    }
}

/// Writes `value` under `key`; failures are logged and dropped.
pub fn save<T: Serialize>(store: &dyn KvStore, key: &str, value: &T) {
    let result = serde_json::to_value(value)
        .map_err(StoreError::from)
        .and_then(|v| store.put(key, v));
    if let Err(err) = result {
        tracing::warn!(key, %err, "failed to persist value");
    }
}

/// Process-local store; used in tests and for `--in-memory` runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<Value> {
        self.values.borrow().get(key).cloned()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.values.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }
}

/// SQLite-backed store: one row per key, JSON text values.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens the store under the application state directory.
    pub fn open_default() -> Result<Self, StoreError> {
        let path = AppDirs::db_path().unwrap_or_else(|| "mindtick.db".into());
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let text = serde_json::to_string(&value)?;
        self.conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
            params![key, text],
        )?;
        Ok(())
    }
}
