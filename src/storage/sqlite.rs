//! SQLite-backed key-value store.
//!
//! One table holds every namespace; each row is one backing-store entry.
//! A commit runs in a single transaction, so a failed batch leaves the
//! namespace untouched.

use crate::base::storeerror::StoreError;
use crate::storage::{EditBatch, EditOp, KeyValueStore};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS cookie_entries (
    namespace TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (namespace, key)
);";

/// How long a writer waits on a locked database file before failing.
const BUSY_TIMEOUT: Duration = Duration::from_millis(500);

pub struct SqliteKeyValueStore {
    conn: Mutex<Connection>,
}

impl SqliteKeyValueStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        Self::init(conn)
    }

    /// Private, non-durable database. Mostly useful in tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get_all(&self, namespace: &str) -> Result<BTreeMap<String, String>, StoreError> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT key, value FROM cookie_entries WHERE namespace = ?1")?;

        let rows = stmt.query_map([namespace], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut entries = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            entries.insert(key, value);
        }
        Ok(entries)
    }

    fn commit(&self, namespace: &str, batch: EditBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if batch.clears() {
            tx.execute(
                "DELETE FROM cookie_entries WHERE namespace = ?1",
                [namespace],
            )?;
        }

        for op in batch.ops() {
            match op {
                EditOp::Put { key, value } => {
                    tx.execute(
                        "INSERT INTO cookie_entries (namespace, key, value) VALUES (?1, ?2, ?3)
                         ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value",
                        params![namespace, key, value],
                    )?;
                }
                EditOp::Remove { key } => {
                    tx.execute(
                        "DELETE FROM cookie_entries WHERE namespace = ?1 AND key = ?2",
                        params![namespace, key],
                    )?;
                }
            }
        }

        tx.commit()?;
        tracing::trace!(namespace = %namespace, ops = batch.ops().len(), "sqlite commit");
        Ok(())
    }
}
