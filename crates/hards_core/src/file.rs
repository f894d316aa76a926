//! Read-only handles to stored files.

use crate::error::CoreResult;
use hards_storage::{ObjectPath, StorageBackend};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// A read-only handle to a file attached to a dataset or datapoint.
///
/// The handle reads from the backend on every call, so it always sees the
/// latest content stored under its name.
#[derive(Clone)]
pub struct FileHandle {
    backend: Arc<dyn StorageBackend>,
    path: ObjectPath,
    name: String,
}

impl FileHandle {
    pub(crate) fn new(backend: Arc<dyn StorageBackend>, path: ObjectPath, name: String) -> Self {
        Self {
            backend,
            path,
            name,
        }
    }

    /// Returns the name the file is stored under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the size of the file in bytes.
    pub fn len(&self) -> CoreResult<u64> {
        Ok(self.backend.object_len(&self.path)?)
    }

    /// Returns true if the file is empty.
    pub fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Reads the whole file.
    pub fn read(&self) -> CoreResult<Vec<u8>> {
        Ok(self.backend.read_object(&self.path)?)
    }

    /// Reads the whole file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidData` I/O error if the content is not UTF-8.
    pub fn read_to_string(&self) -> CoreResult<String> {
        let bytes = self.read()?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
    }

    /// Returns the location of the stored copy on the local filesystem, if
    /// the database lives there.
    ///
    /// The copy is read-only; it must not be modified in place.
    #[must_use]
    pub fn local_path(&self) -> Option<PathBuf> {
        self.backend.local_path(&self.path)
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("name", &self.name)
            .field("path", &self.path.to_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use hards_storage::InMemoryBackend;

    fn handle(content: &[u8]) -> FileHandle {
        let backend = Arc::new(InMemoryBackend::new());
        let path = ObjectPath::root().join("f.txt");
        backend.write_object(&path, content).unwrap();
        FileHandle::new(backend, path, "f.txt".to_string())
    }

    #[test]
    fn reads_content() {
        let file = handle(b"file data!\n");
        assert_eq!(file.name(), "f.txt");
        assert_eq!(file.len().unwrap(), 11);
        assert!(!file.is_empty().unwrap());
        assert_eq!(file.read().unwrap(), b"file data!\n");
        assert_eq!(file.read_to_string().unwrap(), "file data!\n");
        assert!(file.local_path().is_none());
    }

    #[test]
    fn non_utf8_is_invalid_data() {
        let file = handle(&[0xff, 0xfe]);
        match file.read_to_string().unwrap_err() {
            CoreError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::InvalidData),
            other => panic!("unexpected error: {other}"),
        }
    }
}
