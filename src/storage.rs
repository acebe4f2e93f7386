//! Durable key-value storage backed by SQLite.
//!
//! The quote store keeps a handful of string entries (the serialized quote
//! list, the last selected filter, the last sync time). Each entry is a row in
//! a single `kv_store` table and every write replaces the whole value.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::QuoteResult;

/// Key holding the JSON-serialized quote list
pub const QUOTES_KEY: &str = "quotes";

/// Key holding the last selected category filter
pub const FILTER_KEY: &str = "selectedCategory";

/// Key holding the RFC 3339 time of the last successful sync
pub const LAST_SYNC_KEY: &str = "lastSyncTime";

/// String key-value storage.
pub trait KeyValueStore: Send {
    /// Read an entry, `None` when the key was never written or was removed
    fn get(&self, key: &str) -> QuoteResult<Option<String>>;

    /// Write an entry, replacing any previous value
    fn set(&self, key: &str, value: &str) -> QuoteResult<()>;

    /// Remove an entry, returning whether it existed
    fn remove(&self, key: &str) -> QuoteResult<bool>;
}

/// SQLite implementation of [`KeyValueStore`]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a store at the given path
    pub fn new<P: AsRef<Path>>(db_path: P) -> QuoteResult<Self> {
        let conn = Connection::open(db_path)?;

        // WAL keeps readers in other processes from blocking on writes
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn new_in_memory() -> QuoteResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> QuoteResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> QuoteResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> QuoteResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().timestamp()],
        )?;
        tracing::trace!("kv_store set {} ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> QuoteResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?", params![key])?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_key_is_none() {
        let store = SqliteStore::new_in_memory().unwrap();
        assert!(store.get(QUOTES_KEY).unwrap().is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let store = SqliteStore::new_in_memory().unwrap();
        store.set(FILTER_KEY, "Life").unwrap();
        store.set(FILTER_KEY, "Dreams").unwrap();
        assert_eq!(store.get(FILTER_KEY).unwrap().as_deref(), Some("Dreams"));
    }

    #[test]
    fn test_remove() {
        let store = SqliteStore::new_in_memory().unwrap();
        store.set(LAST_SYNC_KEY, "2025-01-01T00:00:00Z").unwrap();
        assert!(store.remove(LAST_SYNC_KEY).unwrap());
        assert!(!store.remove(LAST_SYNC_KEY).unwrap());
        assert!(store.get(LAST_SYNC_KEY).unwrap().is_none());
    }

    #[test]
    fn test_entries_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("quotes.db");

        {
            let store = SqliteStore::new(&path).unwrap();
            store.set(QUOTES_KEY, "[]").unwrap();
        }

        let store = SqliteStore::new(&path).unwrap();
        assert_eq!(store.get(QUOTES_KEY).unwrap().as_deref(), Some("[]"));
    }
}
