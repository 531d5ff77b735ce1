//! Local durable key-value storage.
//!
//! Every persisted slot and migration flag lives in one global keyed store
//! shared by all reconcilers in the process. Values are JSON text. Reads and
//! writes are synchronous.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::error::WellkeepError;

/// Keyed string store backing persisted slots.
pub trait LocalStore: Send + Sync {
    /// Read a slot. `Ok(None)` when the key was never written.
    ///
    /// # Errors
    ///
    /// Returns `WellkeepError::Storage` if the backing store is unavailable.
    fn read(&self, key: &str) -> Result<Option<String>, WellkeepError>;

    /// Overwrite a slot.
    ///
    /// # Errors
    ///
    /// Returns `WellkeepError::Storage` if the value cannot be stored.
    fn write(&self, key: &str, value: &str) -> Result<(), WellkeepError>;

    /// Remove a slot. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `WellkeepError::Storage` if the backing store is unavailable.
    fn remove(&self, key: &str) -> Result<(), WellkeepError>;

    /// All keys currently present, sorted.
    ///
    /// # Errors
    ///
    /// Returns `WellkeepError::Storage` if the backing store is unavailable.
    fn keys(&self) -> Result<Vec<String>, WellkeepError>;
}

/// `SQLite`-backed store, durable across restarts.
pub struct SqliteStore {
    db: Mutex<Database>,
}

impl SqliteStore {
    /// Wrap an open database.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocalStore for SqliteStore {
    fn read(&self, key: &str) -> Result<Option<String>, WellkeepError> {
        let db = self.db();
        db.connection()
            .query_row(
                "SELECT value FROM local_slots WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| WellkeepError::Storage(format!("Failed to read {key}: {e}")))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), WellkeepError> {
        let db = self.db();
        db.connection()
            .execute(
                r"INSERT INTO local_slots (key, value, updated_at) VALUES (?1, ?2, ?3)
                  ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map_err(|e| WellkeepError::Storage(format!("Failed to write {key}: {e}")))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), WellkeepError> {
        let db = self.db();
        db.connection()
            .execute("DELETE FROM local_slots WHERE key = ?1", [key])
            .map_err(|e| WellkeepError::Storage(format!("Failed to remove {key}: {e}")))?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, WellkeepError> {
        let db = self.db();
        let conn = db.connection();

        let mut stmt = conn
            .prepare("SELECT key FROM local_slots ORDER BY key ASC")
            .map_err(|e| WellkeepError::Storage(format!("Failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e| WellkeepError::Storage(format!("Failed to list keys: {e}")))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row.map_err(|e| WellkeepError::Storage(e.to_string()))?);
        }
        Ok(keys)
    }
}

/// In-process store.
///
/// Used where nothing should touch disk. `fail_writes` makes every write
/// fail, which is how a full or disabled store looks to callers.
#[derive(Default)]
pub struct MemoryStore {
    slots: Mutex<BTreeMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn slots(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocalStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, WellkeepError> {
        Ok(self.slots().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), WellkeepError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(WellkeepError::Storage(format!(
                "Failed to write {key}: quota exceeded"
            )));
        }
        self.slots().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), WellkeepError> {
        self.slots().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, WellkeepError> {
        Ok(self.slots().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_sqlite_store() -> SqliteStore {
        SqliteStore::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn test_sqlite_read_missing() {
        let store = create_sqlite_store();
        assert_eq!(store.read("sleep-time").unwrap(), None);
    }

    #[test]
    fn test_sqlite_write_overwrites() {
        let store = create_sqlite_store();

        store.write("sleep-time", "\"07:00\"").unwrap();
        store.write("sleep-time", "\"07:30\"").unwrap();

        assert_eq!(store.read("sleep-time").unwrap().as_deref(), Some("\"07:30\""));
        assert_eq!(store.keys().unwrap(), vec!["sleep-time".to_string()]);
    }

    #[test]
    fn test_sqlite_remove() {
        let store = create_sqlite_store();

        store.write("todo-data", "{}").unwrap();
        store.remove("todo-data").unwrap();
        store.remove("todo-data").unwrap();

        assert_eq!(store.read("todo-data").unwrap(), None);
    }

    #[test]
    fn test_sqlite_survives_reopen() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("slots.db");

        {
            let store = SqliteStore::new(Database::open_at(&db_path).unwrap());
            store.write("caffeine-wake-time", "\"06:45\"").unwrap();
        }

        let store = SqliteStore::new(Database::open_at(&db_path).unwrap());
        assert_eq!(
            store.read("caffeine-wake-time").unwrap().as_deref(),
            Some("\"06:45\"")
        );
    }

    #[test]
    fn test_memory_store_keys_sorted() {
        let store = MemoryStore::new();
        store.write("b", "1").unwrap();
        store.write("a", "2").unwrap();

        assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_memory_store_failing_writes() {
        let store = MemoryStore::new();
        store.write("a", "1").unwrap();

        store.fail_writes(true);
        let err = store.write("a", "2").unwrap_err();
        assert!(matches!(err, WellkeepError::Storage(_)));
        assert_eq!(store.read("a").unwrap().as_deref(), Some("1"));

        store.fail_writes(false);
        store.write("a", "3").unwrap();
        assert_eq!(store.read("a").unwrap().as_deref(), Some("3"));
    }
}
