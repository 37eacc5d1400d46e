use crate::base::storeerror::StoreError;
use crate::storage::{EditBatch, KeyValueStore};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory key-value backend (no durability beyond the process).
///
/// Commits can be made to fail on demand, which lets callers exercise the
/// "index updated, backing store behind" path.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    namespaces: DashMap<String, BTreeMap<String, String>>,
    fail_commits: AtomicBool,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following commit fail (or succeed again).
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Write an entry directly, bypassing the commit switch.
    pub fn insert_raw(&self, namespace: &str, key: impl Into<String>, value: impl Into<String>) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Number of entries in `namespace`.
    pub fn len(&self, namespace: &str) -> usize {
        self.namespaces.get(namespace).map_or(0, |ns| ns.len())
    }

    pub fn is_empty(&self, namespace: &str) -> bool {
        self.len(namespace) == 0
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_all(&self, namespace: &str) -> Result<BTreeMap<String, String>, StoreError> {
        Ok(self
            .namespaces
            .get(namespace)
            .map(|ns| ns.value().clone())
            .unwrap_or_default())
    }

    fn commit(&self, namespace: &str, batch: EditBatch) -> Result<(), StoreError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::backend("commit rejected"));
        }
        batch.apply_to(&mut self.namespaces.entry(namespace.to_string()).or_default());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaces_are_isolated() {
        let store = MemoryKeyValueStore::new();
        store
            .commit("a", EditBatch::new().put("k", "1"))
            .unwrap();
        store
            .commit("b", EditBatch::new().put("k", "2"))
            .unwrap();

        assert_eq!(store.get_all("a").unwrap().get("k").unwrap(), "1");
        assert_eq!(store.get_all("b").unwrap().get("k").unwrap(), "2");
        assert!(store.get_all("c").unwrap().is_empty());
    }

    #[test]
    fn test_failed_commit_changes_nothing() {
        let store = MemoryKeyValueStore::new();
        store.insert_raw("ns", "k", "v");
        store.set_fail_commits(true);

        let err = store.commit("ns", EditBatch::new().clear()).unwrap_err();
        assert!(matches!(err, StoreError::Backend { .. }));
        assert_eq!(store.len("ns"), 1);

        store.set_fail_commits(false);
        store.commit("ns", EditBatch::new().clear()).unwrap();
        assert!(store.is_empty("ns"));
    }
}
