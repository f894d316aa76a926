//! In-process node locks.
//!
//! Read-modify-write operations (merging data, picking a creation ordinal)
//! hold the lock of the node they modify. Every handle opened on the same
//! directory shares one [`LockTable`], so handles opened separately in one
//! process still exclude each other. Separate processes are not coordinated.

use crate::path::NodePath;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, Weak};

/// Lock tables of every database open in this process, by canonical root.
static SHARED_TABLES: OnceLock<Mutex<HashMap<PathBuf, Weak<LockTable>>>> = OnceLock::new();

/// Node locks of one database.
///
/// An entry only lives while its lock is held or awaited. Released entries
/// are pruned when a new one is added.
#[derive(Default)]
pub(crate) struct LockTable {
    nodes: Mutex<HashMap<NodePath, Weak<Mutex<()>>>>,
}

impl LockTable {
    /// Returns the table shared by every store rooted at `root`.
    pub(crate) fn shared(root: &Path) -> Arc<Self> {
        let key = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let mut tables = SHARED_TABLES.get_or_init(Mutex::default).lock();

        if let Some(table) = tables.get(&key).and_then(Weak::upgrade) {
            return table;
        }

        tables.retain(|_, table| table.strong_count() > 0);
        let table = Arc::new(Self::default());
        tables.insert(key, Arc::downgrade(&table));
        table
    }

    /// Returns the lock of `node`.
    ///
    /// Callers holding the returned `Arc` keep the entry alive, so two
    /// concurrent callers always receive the same mutex.
    pub(crate) fn node(&self, node: &NodePath) -> Arc<Mutex<()>> {
        let mut nodes = self.nodes.lock();

        if let Some(lock) = nodes.get(node).and_then(Weak::upgrade) {
            return lock;
        }

        nodes.retain(|_, lock| lock.strong_count() > 0);
        let lock = Arc::new(Mutex::new(()));
        nodes.insert(node.clone(), Arc::downgrade(&lock));
        lock
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.nodes.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityKind;
    use tempfile::tempdir;

    fn dataset(name: &str) -> NodePath {
        NodePath::root().child(EntityKind::Dataset, name)
    }

    #[test]
    fn same_directory_shares_a_table() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("db");
        std::fs::create_dir(&root).unwrap();

        let first = LockTable::shared(&root);
        let second = LockTable::shared(&dir.path().join(".").join("db"));
        assert!(Arc::ptr_eq(&first, &second));

        let other = dir.path().join("other");
        std::fs::create_dir(&other).unwrap();
        assert!(!Arc::ptr_eq(&first, &LockTable::shared(&other)));
    }

    #[test]
    fn table_is_dropped_with_its_last_store() {
        let dir = tempdir().unwrap();
        let first = LockTable::shared(dir.path());
        let weak = Arc::downgrade(&first);
        drop(first);
        assert!(weak.upgrade().is_none());

        // A fresh table is handed out afterwards
        let _again = LockTable::shared(dir.path());
    }

    #[test]
    fn held_lock_is_shared() {
        let table = LockTable::default();
        let held = table.node(&dataset("a"));
        let _guard = held.lock();

        let again = table.node(&dataset("a"));
        assert!(Arc::ptr_eq(&held, &again));
        assert!(again.try_lock().is_none());
        assert!(table.node(&dataset("b")).try_lock().is_some());
    }

    #[test]
    fn released_locks_are_pruned() {
        let table = LockTable::default();
        for i in 0..100 {
            let lock = table.node(&dataset(&format!("n{i}")));
            let _guard = lock.lock();
        }
        assert_eq!(table.len(), 1);

        let kept = table.node(&dataset("kept"));
        table.node(&dataset("other"));
        assert_eq!(table.len(), 2);
        drop(kept);
    }
}
