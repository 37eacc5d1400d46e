//! Durable key-value backends for [`PersistentCookieStore`](crate::cookies::persistentstore::PersistentCookieStore).
//!
//! A backend maps `(namespace, key)` to a string value. Changes are staged
//! in an [`EditBatch`] and applied with [`KeyValueStore::commit`], which must
//! be all-or-nothing for the batch.
//!
//! | Backend | Durability |
//! |---------|------------|
//! | [`MemoryKeyValueStore`](memory::MemoryKeyValueStore) | process lifetime |
//! | [`SqliteKeyValueStore`](sqlite::SqliteKeyValueStore) | SQLite file |

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use crate::base::storeerror::StoreError;
use std::collections::BTreeMap;

/// A single staged change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    Put { key: String, value: String },
    Remove { key: String },
}

/// Changes to apply to one namespace in one commit.
///
/// A staged `clear` runs before the individual operations, which then run
/// in the order they were staged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBatch {
    clear: bool,
    ops: Vec<EditOp>,
}

impl EditBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ops.push(EditOp::Put {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.ops.push(EditOp::Remove { key: key.into() });
        self
    }

    /// Drop every entry of the namespace.
    pub fn clear(mut self) -> Self {
        self.clear = true;
        self
    }

    pub fn clears(&self) -> bool {
        self.clear
    }

    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        !self.clear && self.ops.is_empty()
    }

    /// Apply the batch to an in-memory namespace map.
    pub(crate) fn apply_to(&self, entries: &mut BTreeMap<String, String>) {
        if self.clear {
            entries.clear();
        }
        for op in &self.ops {
            match op {
                EditOp::Put { key, value } => {
                    entries.insert(key.clone(), value.clone());
                }
                EditOp::Remove { key } => {
                    entries.remove(key);
                }
            }
        }
    }
}

/// A namespaced, enumerable string store with atomic batch commits.
///
/// Implementations must be `Send + Sync`; the cookie store calls them from
/// whichever thread performs the mutation.
pub trait KeyValueStore: Send + Sync {
    /// Every entry of `namespace`, ordered by key.
    fn get_all(&self, namespace: &str) -> Result<BTreeMap<String, String>, StoreError>;

    /// Apply `batch` to `namespace`. Either every staged change lands or none does.
    fn commit(&self, namespace: &str, batch: EditBatch) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_clear_runs_first() {
        let mut entries = BTreeMap::new();
        entries.insert("old".to_string(), "1".to_string());

        EditBatch::new()
            .put("a", "1")
            .put("b", "2")
            .remove("a")
            .clear()
            .apply_to(&mut entries);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries.get("b").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_empty_batch() {
        assert!(EditBatch::new().is_empty());
        assert!(!EditBatch::new().clear().is_empty());
        assert!(!EditBatch::new().remove("k").is_empty());
    }
}
