//! In-memory storage backend for testing.

use crate::backend::{EntryKind, StorageBackend};
use crate::error::{StorageError, StorageResult};
use crate::file::STAGING_DIR;
use crate::path::ObjectPath;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone)]
enum Entry {
    Container,
    Object(Vec<u8>),
}

impl Entry {
    fn kind(&self) -> EntryKind {
        match self {
            Self::Container => EntryKind::Container,
            Self::Object(_) => EntryKind::Object,
        }
    }
}

/// An in-memory storage backend.
///
/// This backend keeps the whole tree in a map and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral databases that don't need persistence
///
/// Every operation runs under one lock, which makes replacing writes and
/// publishes trivially atomic.
///
/// # Example
///
/// ```rust
/// use hards_storage::{EntryKind, InMemoryBackend, ObjectPath, StorageBackend};
///
/// let backend = InMemoryBackend::new();
/// let dir = ObjectPath::root().join("files");
/// backend.create_container(&dir).unwrap();
/// backend.write_object(&dir.join("a.txt"), b"test data").unwrap();
/// assert_eq!(backend.list(&dir, EntryKind::Object).unwrap(), vec!["a.txt"]);
/// ```
#[derive(Debug)]
pub struct InMemoryBackend {
    entries: RwLock<BTreeMap<ObjectPath, Entry>>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(ObjectPath::root(), Entry::Container);
        Self {
            entries: RwLock::new(entries),
        }
    }
}

impl InMemoryBackend {
    /// Creates a new backend holding only an empty root container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries, including the root.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if only the root container exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }
}

fn check(path: &ObjectPath) -> StorageResult<()> {
    match path.invalid_segment() {
        Some(segment) => Err(StorageError::InvalidPath {
            path: path.clone(),
            segment: segment.to_string(),
        }),
        None => Ok(()),
    }
}

fn expect_container(entries: &BTreeMap<ObjectPath, Entry>, path: &ObjectPath) -> StorageResult<()> {
    match entries.get(path) {
        Some(Entry::Container) => Ok(()),
        Some(Entry::Object(_)) => Err(StorageError::wrong_kind(path)),
        None => Err(StorageError::not_found(path)),
    }
}

fn expect_parent(entries: &BTreeMap<ObjectPath, Entry>, path: &ObjectPath) -> StorageResult<()> {
    let parent = path.parent().ok_or_else(|| StorageError::wrong_kind(path))?;
    expect_container(entries, &parent)
}

fn subtree_keys(entries: &BTreeMap<ObjectPath, Entry>, prefix: &ObjectPath) -> Vec<ObjectPath> {
    entries
        .range(prefix.clone()..)
        .take_while(|(key, _)| key.starts_with(prefix))
        .map(|(key, _)| key.clone())
        .collect()
}

impl StorageBackend for InMemoryBackend {
    fn entry_kind(&self, path: &ObjectPath) -> StorageResult<Option<EntryKind>> {
        check(path)?;
        Ok(self.entries.read().get(path).map(Entry::kind))
    }

    fn create_container(&self, path: &ObjectPath) -> StorageResult<()> {
        check(path)?;
        let mut entries = self.entries.write();
        expect_parent(&entries, path)?;
        if entries.contains_key(path) {
            return Err(StorageError::already_exists(path));
        }
        entries.insert(path.clone(), Entry::Container);
        Ok(())
    }

    fn list(&self, path: &ObjectPath, kind: EntryKind) -> StorageResult<Vec<String>> {
        check(path)?;
        let entries = self.entries.read();
        expect_container(&entries, path)?;

        let depth = path.segments().len() + 1;
        Ok(entries
            .range(path.clone()..)
            .take_while(|(key, _)| key.starts_with(path))
            .filter(|(key, entry)| key.segments().len() == depth && entry.kind() == kind)
            .filter_map(|(key, _)| key.file_name().map(str::to_string))
            .collect())
    }

    fn read_object(&self, path: &ObjectPath) -> StorageResult<Vec<u8>> {
        check(path)?;
        match self.entries.read().get(path) {
            Some(Entry::Object(data)) => Ok(data.clone()),
            Some(Entry::Container) => Err(StorageError::wrong_kind(path)),
            None => Err(StorageError::not_found(path)),
        }
    }

    fn object_len(&self, path: &ObjectPath) -> StorageResult<u64> {
        check(path)?;
        match self.entries.read().get(path) {
            Some(Entry::Object(data)) => Ok(data.len() as u64),
            Some(Entry::Container) => Err(StorageError::wrong_kind(path)),
            None => Err(StorageError::not_found(path)),
        }
    }

    fn write_object(&self, path: &ObjectPath, data: &[u8]) -> StorageResult<()> {
        check(path)?;
        let mut entries = self.entries.write();
        expect_parent(&entries, path)?;
        if let Some(Entry::Container) = entries.get(path) {
            return Err(StorageError::wrong_kind(path));
        }
        entries.insert(path.clone(), Entry::Object(data.to_vec()));
        Ok(())
    }

    fn stage_container(&self) -> StorageResult<ObjectPath> {
        let staging = ObjectPath::root().join(STAGING_DIR);
        let staged = staging.join(Uuid::new_v4().simple().to_string());

        let mut entries = self.entries.write();
        entries.entry(staging).or_insert(Entry::Container);
        entries.insert(staged.clone(), Entry::Container);
        Ok(staged)
    }

    fn publish_container(&self, staged: &ObjectPath, dest: &ObjectPath) -> StorageResult<()> {
        check(staged)?;
        check(dest)?;
        let mut entries = self.entries.write();
        expect_container(&entries, staged)?;
        expect_parent(&entries, dest)?;
        if entries.contains_key(dest) {
            return Err(StorageError::already_exists(dest));
        }

        let prefix_len = staged.segments().len();
        for key in subtree_keys(&entries, staged) {
            if let Some(entry) = entries.remove(&key) {
                let moved = key.segments()[prefix_len..]
                    .iter()
                    .fold(dest.clone(), |path, segment| path.join(segment.as_str()));
                entries.insert(moved, entry);
            }
        }
        Ok(())
    }

    fn discard_container(&self, staged: &ObjectPath) -> StorageResult<()> {
        check(staged)?;
        let mut entries = self.entries.write();
        for key in subtree_keys(&entries, staged) {
            entries.remove(&key);
        }
        Ok(())
    }
}
