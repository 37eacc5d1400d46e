//! Process-wide lock per store name.
//!
//! Every [`PersistentCookieStore`](crate::cookies::persistentstore::PersistentCookieStore)
//! bound to the same name shares one guard, so two instances over the same
//! namespace never interleave an index update with another's commit.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

/// Entries are never evicted; they live for the rest of the process.
static STORE_LOCKS: LazyLock<Mutex<HashMap<String, Arc<Mutex<()>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// The guard shared by every store named `name`.
///
/// Registers `name` on first use; the entry is kept for the life of the process.
pub fn lock_for(name: &str) -> Arc<Mutex<()>> {
    let mut registry = STORE_LOCKS.lock().unwrap_or_else(|e| e.into_inner());
    registry
        .entry(name.to_string())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

/// Acquire `lock`, recovering from a panic in a previous holder.
pub(crate) fn acquire(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_same_lock() {
        let a = lock_for("locks-test-shared");
        let b = lock_for("locks-test-shared");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_different_names_different_locks() {
        let a = lock_for("locks-test-one");
        let b = lock_for("locks-test-two");
        assert!(!Arc::ptr_eq(&a, &b));

        let _held = acquire(&a);
        assert!(b.try_lock().is_ok());
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let lock = lock_for("locks-test-poison");
        let cloned = lock.clone();
        let _ = std::thread::spawn(move || {
            let _guard = cloned.lock().unwrap();
            panic!("poison");
        })
        .join();

        assert!(lock.is_poisoned());
        drop(acquire(&lock));
    }
}
