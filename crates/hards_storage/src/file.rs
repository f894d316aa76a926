//! File-based storage backend for persistent storage.

use crate::backend::{EntryKind, StorageBackend};
use crate::error::{StorageError, StorageResult};
use crate::path::ObjectPath;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Directory under the backend root used for staging writes.
pub const STAGING_DIR: &str = ".staging";

/// A directory-tree storage backend.
///
/// Containers map to directories and objects to regular files below a root
/// directory. Replacing writes go to a uniquely named file in
/// [`STAGING_DIR`] first and are renamed into place, so readers never see a
/// partially written object. The staging directory lives under the same
/// root, which keeps every rename on one filesystem.
///
/// # Durability
///
/// With `sync_writes` enabled (the default) every staged file is fsynced
/// before it is renamed, and the destination directory is fsynced after.
///
/// # Example
///
/// ```no_run
/// use hards_storage::{FileBackend, ObjectPath, StorageBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::create(Path::new("my_store")).unwrap();
/// let path = ObjectPath::root().join("hello.txt");
/// backend.write_object(&path, b"hello").unwrap();
/// assert_eq!(backend.read_object(&path).unwrap(), b"hello");
/// ```
#[derive(Debug)]
pub struct FileBackend {
    root: PathBuf,
    sync_writes: bool,
}

impl FileBackend {
    /// Creates a new, empty root directory at `root`.
    ///
    /// Missing parent directories are created. The root itself must not
    /// exist yet.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if anything exists at `root`.
    pub fn create(root: &Path) -> StorageResult<Self> {
        if let Some(parent) = root.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::create_dir(root).map_err(|e| map_io(e, &ObjectPath::root()))?;
        tracing::debug!(root = %root.display(), "created storage root");

        Ok(Self {
            root: root.to_path_buf(),
            sync_writes: true,
        })
    }

    /// Opens an existing root directory.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `root` does not exist and `WrongKind` if it is
    /// not a directory.
    pub fn open(root: &Path) -> StorageResult<Self> {
        let metadata = fs::metadata(root).map_err(|e| map_io(e, &ObjectPath::root()))?;
        if !metadata.is_dir() {
            return Err(StorageError::wrong_kind(&ObjectPath::root()));
        }

        Ok(Self {
            root: root.to_path_buf(),
            sync_writes: true,
        })
    }

    /// Sets whether writes are fsynced before they become visible.
    #[must_use]
    pub const fn sync_writes(mut self, value: bool) -> Self {
        self.sync_writes = value;
        self
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn fs_path(&self, path: &ObjectPath) -> StorageResult<PathBuf> {
        if let Some(segment) = path.invalid_segment() {
            return Err(StorageError::InvalidPath {
                path: path.clone(),
                segment: segment.to_string(),
            });
        }
        let mut full = self.root.clone();
        full.extend(path.segments());
        Ok(full)
    }

    /// Resolves `path` and checks that it holds an entry of `kind`.
    fn expect_kind(&self, path: &ObjectPath, kind: EntryKind) -> StorageResult<PathBuf> {
        match self.entry_kind(path)? {
            Some(found) if found == kind => self.fs_path(path),
            Some(_) => Err(StorageError::wrong_kind(path)),
            None => Err(StorageError::not_found(path)),
        }
    }

    fn expect_parent(&self, path: &ObjectPath) -> StorageResult<PathBuf> {
        let parent = path.parent().ok_or_else(|| StorageError::wrong_kind(path))?;
        self.expect_kind(&parent, EntryKind::Container)
    }

    fn staging_dir(&self) -> StorageResult<PathBuf> {
        let dir = self.root.join(STAGING_DIR);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Moves a fully written staged file over `dest`.
    fn commit_staged_file(&self, temp: &Path, dest: &Path, parent: &Path) -> StorageResult<()> {
        if let Err(e) = fs::rename(temp, dest) {
            // Clean up orphaned temp file if rename failed
            let _ = fs::remove_file(temp);
            return Err(StorageError::Io(e));
        }
        if self.sync_writes {
            sync_directory(parent)?;
        }
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn entry_kind(&self, path: &ObjectPath) -> StorageResult<Option<EntryKind>> {
        let full = self.fs_path(path)?;
        match fs::metadata(&full) {
            Ok(metadata) if metadata.is_dir() => Ok(Some(EntryKind::Container)),
            Ok(metadata) if metadata.is_file() => Ok(Some(EntryKind::Object)),
            Ok(_) => Err(StorageError::wrong_kind(path)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn create_container(&self, path: &ObjectPath) -> StorageResult<()> {
        let parent = self.expect_parent(path)?;
        let full = self.fs_path(path)?;
        fs::create_dir(&full).map_err(|e| map_io(e, path))?;
        if self.sync_writes {
            sync_directory(&parent)?;
        }
        Ok(())
    }

    fn list(&self, path: &ObjectPath, kind: EntryKind) -> StorageResult<Vec<String>> {
        let full = self.expect_kind(path, EntryKind::Container)?;

        let mut names = Vec::new();
        for entry in fs::read_dir(&full)? {
            let entry = entry?;
            let metadata = match fs::metadata(entry.path()) {
                Ok(metadata) => metadata,
                // Dangling symlink or entry removed while listing
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::Io(e)),
            };
            let matches = match kind {
                EntryKind::Container => metadata.is_dir(),
                EntryKind::Object => metadata.is_file(),
            };
            if !matches {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => {
                    tracing::warn!(container = %path, ?name, "skipping non UTF-8 entry");
                }
            }
        }

        names.sort();
        Ok(names)
    }

    fn read_object(&self, path: &ObjectPath) -> StorageResult<Vec<u8>> {
        let full = self.expect_kind(path, EntryKind::Object)?;
        fs::read(&full).map_err(|e| map_io(e, path))
    }

    fn object_len(&self, path: &ObjectPath) -> StorageResult<u64> {
        let full = self.expect_kind(path, EntryKind::Object)?;
        Ok(fs::metadata(&full)?.len())
    }

    fn write_object(&self, path: &ObjectPath, data: &[u8]) -> StorageResult<()> {
        let parent = self.expect_parent(path)?;
        let dest = self.fs_path(path)?;
        let temp = self.staging_dir()?.join(format!("{}.tmp", Uuid::new_v4().simple()));

        let mut file = File::create(&temp)?;
        let written = file.write_all(data).and_then(|()| {
            if self.sync_writes {
                file.sync_all()
            } else {
                Ok(())
            }
        });
        drop(file);
        if let Err(e) = written {
            let _ = fs::remove_file(&temp);
            return Err(StorageError::Io(e));
        }

        self.commit_staged_file(&temp, &dest, &parent)
    }

    fn import_object(&self, path: &ObjectPath, source: &Path) -> StorageResult<u64> {
        let parent = self.expect_parent(path)?;
        let dest = self.fs_path(path)?;
        let temp = self.staging_dir()?.join(format!("{}.tmp", Uuid::new_v4().simple()));

        let copied = (|| -> io::Result<u64> {
            let mut src = File::open(source)?;
            let mut dst = File::create(&temp)?;
            let copied = io::copy(&mut src, &mut dst)?;
            if self.sync_writes {
                dst.sync_all()?;
            }
            drop(dst);
            set_readonly(&temp)?;
            Ok(copied)
        })();

        let copied = match copied {
            Ok(copied) => copied,
            Err(e) => {
                let _ = fs::remove_file(&temp);
                return Err(StorageError::Io(e));
            }
        };

        self.commit_staged_file(&temp, &dest, &parent)?;
        Ok(copied)
    }

    fn stage_container(&self) -> StorageResult<ObjectPath> {
        let id = Uuid::new_v4().simple().to_string();
        fs::create_dir(self.staging_dir()?.join(&id))?;
        Ok(ObjectPath::root().join(STAGING_DIR).join(id))
    }

    fn publish_container(&self, staged: &ObjectPath, dest: &ObjectPath) -> StorageResult<()> {
        let src = self.expect_kind(staged, EntryKind::Container)?;
        let parent = self.expect_parent(dest)?;
        let target = self.fs_path(dest)?;

        if fs::symlink_metadata(&target).is_ok() {
            return Err(StorageError::already_exists(dest));
        }

        if let Err(e) = fs::rename(&src, &target) {
            // Lost a race with another creator: the target is non-empty now
            if fs::symlink_metadata(&target).is_ok() {
                return Err(StorageError::already_exists(dest));
            }
            return Err(StorageError::Io(e));
        }

        if self.sync_writes {
            sync_directory(&parent)?;
        }
        Ok(())
    }

    fn discard_container(&self, staged: &ObjectPath) -> StorageResult<()> {
        let full = self.fs_path(staged)?;
        match fs::remove_dir_all(&full) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn local_path(&self, path: &ObjectPath) -> Option<PathBuf> {
        self.fs_path(path).ok()
    }
}

fn map_io(err: io::Error, path: &ObjectPath) -> StorageError {
    match err.kind() {
        io::ErrorKind::NotFound => StorageError::not_found(path),
        io::ErrorKind::AlreadyExists => StorageError::already_exists(path),
        _ => StorageError::Io(err),
    }
}

/// Syncs a directory so that renames and creations inside it are durable.
///
/// Directory fsync is not supported on Windows; NTFS journaling covers
/// metadata durability there, so it is skipped.
#[cfg(unix)]
fn sync_directory(dir: &Path) -> StorageResult<()> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_directory(_dir: &Path) -> StorageResult<()> {
    Ok(())
}

/// Makes an imported object read-only for everyone but its owner's reads.
#[cfg(unix)]
fn set_readonly(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o400))
}

#[cfg(not(unix))]
fn set_readonly(path: &Path) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_readonly(true);
    fs::set_permissions(path, perms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn backend() -> (tempfile::TempDir, FileBackend) {
        let dir = tempdir().unwrap();
        let backend = FileBackend::create(&dir.path().join("store")).unwrap();
        (dir, backend)
    }

    #[test]
    fn create_fails_if_occupied() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("store");

        FileBackend::create(&root).unwrap();
        let result = FileBackend::create(&root);
        assert!(matches!(result, Err(StorageError::AlreadyExists { .. })));
    }

    #[test]
    fn create_makes_parent_directories() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("a").join("b").join("store");

        let backend = FileBackend::create(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(backend.root(), root);
    }

    #[test]
    fn open_fails_if_missing() {
        let dir = tempdir().unwrap();
        let result = FileBackend::open(&dir.path().join("missing"));
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }

    #[test]
    fn open_fails_on_regular_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, b"x").unwrap();

        let result = FileBackend::open(&file);
        assert!(matches!(result, Err(StorageError::WrongKind { .. })));
    }

    #[test]
    fn containers_and_objects() {
        let (_dir, backend) = backend();
        let container = ObjectPath::root().join("children");
        let object = container.join("data.json");

        backend.create_container(&container).unwrap();
        backend.write_object(&object, b"{}").unwrap();

        assert_eq!(
            backend.entry_kind(&container).unwrap(),
            Some(EntryKind::Container)
        );
        assert_eq!(backend.entry_kind(&object).unwrap(), Some(EntryKind::Object));
        assert_eq!(backend.entry_kind(&container.join("nope")).unwrap(), None);
        assert_eq!(backend.read_object(&object).unwrap(), b"{}");
        assert_eq!(backend.object_len(&object).unwrap(), 2);
    }

    #[test]
    fn create_container_twice_fails() {
        let (_dir, backend) = backend();
        let container = ObjectPath::root().join("children");

        backend.create_container(&container).unwrap();
        let result = backend.create_container(&container);
        assert!(matches!(result, Err(StorageError::AlreadyExists { .. })));
    }

    #[test]
    fn write_requires_parent() {
        let (_dir, backend) = backend();
        let object = ObjectPath::root().join("missing").join("x");

        let result = backend.write_object(&object, b"x");
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }

    #[test]
    fn write_replaces_existing_object() {
        let (_dir, backend) = backend();
        let object = ObjectPath::root().join("x");

        backend.write_object(&object, b"first version").unwrap();
        backend.write_object(&object, b"second").unwrap();

        assert_eq!(backend.read_object(&object).unwrap(), b"second");
        // Nothing left behind in staging
        let staged = backend
            .list(&ObjectPath::root().join(STAGING_DIR), EntryKind::Object)
            .unwrap();
        assert!(staged.is_empty());
    }

    #[test]
    fn list_filters_by_kind_and_sorts() {
        let (_dir, backend) = backend();
        backend.create_container(&ObjectPath::root().join("b")).unwrap();
        backend.create_container(&ObjectPath::root().join("a")).unwrap();
        backend
            .write_object(&ObjectPath::root().join("c"), b"")
            .unwrap();

        let containers = backend
            .list(&ObjectPath::root(), EntryKind::Container)
            .unwrap();
        // The staging area was created by the write above
        assert_eq!(containers, vec![STAGING_DIR, "a", "b"]);
        assert_eq!(
            backend.list(&ObjectPath::root(), EntryKind::Object).unwrap(),
            vec!["c".to_string()]
        );
    }

    #[test]
    fn import_copies_and_detaches_from_source() {
        let (dir, backend) = backend();
        let source = dir.path().join("source.dat");
        fs::write(&source, b"file data!\n").unwrap();

        let object = ObjectPath::root().join("source.dat");
        let copied = backend.import_object(&object, &source).unwrap();
        assert_eq!(copied, 11);

        fs::write(&source, b"changed").unwrap();
        assert_eq!(backend.read_object(&object).unwrap(), b"file data!\n");
    }

    #[cfg(unix)]
    #[test]
    fn imported_objects_are_read_only() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, backend) = backend();
        let source = dir.path().join("source.dat");
        fs::write(&source, b"abc").unwrap();

        let object = ObjectPath::root().join("f");
        backend.import_object(&object, &source).unwrap();

        let local = backend.local_path(&object).unwrap();
        let mode = fs::metadata(&local).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o400);

        // A read-only object can still be replaced by name
        fs::write(&source, b"new").unwrap();
        backend.import_object(&object, &source).unwrap();
        assert_eq!(backend.read_object(&object).unwrap(), b"new");
    }

    #[test]
    fn stage_and_publish() {
        let (_dir, backend) = backend();
        backend
            .create_container(&ObjectPath::root().join("children"))
            .unwrap();

        let staged = backend.stage_container().unwrap();
        backend.write_object(&staged.join("data.json"), b"{}").unwrap();

        let dest = ObjectPath::root().join("children").join("a");
        backend.publish_container(&staged, &dest).unwrap();

        assert_eq!(backend.entry_kind(&staged).unwrap(), None);
        assert_eq!(backend.read_object(&dest.join("data.json")).unwrap(), b"{}");
    }

    #[test]
    fn publish_never_replaces() {
        let (_dir, backend) = backend();
        let children = ObjectPath::root().join("children");
        backend.create_container(&children).unwrap();
        let dest = children.join("a");
        backend.create_container(&dest).unwrap();

        let staged = backend.stage_container().unwrap();
        let result = backend.publish_container(&staged, &dest);
        assert!(matches!(result, Err(StorageError::AlreadyExists { .. })));

        backend.discard_container(&staged).unwrap();
        assert_eq!(backend.entry_kind(&staged).unwrap(), None);
    }

    #[test]
    fn traversal_is_rejected() {
        let (_dir, backend) = backend();
        let path = ObjectPath::root().join("..").join("escape");

        let result = backend.write_object(&path, b"x");
        assert!(matches!(result, Err(StorageError::InvalidPath { .. })));
        assert!(backend.local_path(&path).is_none());
    }
}
