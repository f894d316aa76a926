//! Storage backend trait definition.

use crate::error::StorageResult;
use crate::path::ObjectPath;
use std::path::{Path, PathBuf};

/// The kind of entry stored at an [`ObjectPath`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A container of further entries (a directory on the filesystem).
    Container,
    /// An opaque byte object (a regular file on the filesystem).
    Object,
}

/// A hierarchical storage backend for HARDS.
///
/// Backends are **opaque trees of containers and byte objects**. They know
/// nothing about datasets, datapoints or the metadata formats HARDS stores;
/// `hards_core` owns all layout interpretation.
///
/// # Invariants
///
/// - `write_object` and `import_object` replace an existing object atomically:
///   a concurrent reader sees either the old bytes or the new bytes
/// - `publish_container` never replaces an occupied destination
/// - containers built under `stage_container` are invisible to `list` on any
///   other path until published
/// - Backends must be `Send + Sync` so handles can be shared across threads
///
/// # Implementors
///
/// - [`super::FileBackend`] - For persistent storage
/// - [`super::InMemoryBackend`] - For testing
pub trait StorageBackend: Send + Sync {
    /// Returns the kind of entry at `path`, or `None` if nothing is there.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or an I/O error occurs.
    fn entry_kind(&self, path: &ObjectPath) -> StorageResult<Option<EntryKind>>;

    /// Creates an empty container at `path`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if `path` is occupied and `NotFound` if its
    /// parent container does not exist.
    fn create_container(&self, path: &ObjectPath) -> StorageResult<()>;

    /// Lists the names of the entries of `kind` directly inside `path`,
    /// sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no container at `path`.
    fn list(&self, path: &ObjectPath, kind: EntryKind) -> StorageResult<Vec<String>>;

    /// Reads the full contents of the object at `path`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no object at `path`.
    fn read_object(&self, path: &ObjectPath) -> StorageResult<Vec<u8>>;

    /// Returns the size in bytes of the object at `path`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no object at `path`.
    fn object_len(&self, path: &ObjectPath) -> StorageResult<u64>;

    /// Writes `data` to `path`, atomically replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the parent container does not exist.
    fn write_object(&self, path: &ObjectPath, data: &[u8]) -> StorageResult<()>;

    /// Copies the local file at `source` into the backend at `path`,
    /// atomically replacing any existing object. Returns the number of bytes
    /// copied.
    ///
    /// The stored copy is independent of `source`: later changes to the
    /// source are not reflected.
    ///
    /// # Errors
    ///
    /// Returns an error if `source` cannot be read or the parent container of
    /// `path` does not exist.
    fn import_object(&self, path: &ObjectPath, source: &Path) -> StorageResult<u64> {
        let data = std::fs::read(source)?;
        self.write_object(path, &data)?;
        Ok(data.len() as u64)
    }

    /// Creates a fresh, empty container in a private staging area and
    /// returns its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the staging area cannot be written.
    fn stage_container(&self) -> StorageResult<ObjectPath>;

    /// Moves the staged container to `dest` in one atomic step.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if `dest` is occupied; the staged container is
    /// left in place for the caller to discard.
    fn publish_container(&self, staged: &ObjectPath, dest: &ObjectPath) -> StorageResult<()>;

    /// Removes a staged container and everything inside it.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be removed.
    fn discard_container(&self, staged: &ObjectPath) -> StorageResult<()>;

    /// Returns the local filesystem path backing `path`, if the backend keeps
    /// its entries on the local filesystem.
    fn local_path(&self, path: &ObjectPath) -> Option<PathBuf> {
        let _ = path;
        None
    }
}
