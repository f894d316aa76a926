//! Database facade.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::layout::Store;
use crate::node::sealed::Sealed;
use crate::node::{HasDatasets, NodeRef, TreeNode};
use crate::path::NodePath;
use hards_storage::{EntryKind, FileBackend, ObjectPath, StorageBackend, StorageError, STAGING_DIR};
use std::path::Path;
use std::sync::Arc;

/// Name of databases that do not live on the local filesystem.
pub const IN_MEMORY_NAME: &str = "memory";

/// The root of a tree of datasets.
///
/// `Database` is the entry point for interacting with HARDS. It owns the
/// storage location and the top-level datasets; it has no data or files of
/// its own. Handles are cheap to clone and can be shared across threads.
///
/// # Opening a Database
///
/// ```rust,ignore
/// use hards_core::prelude::*;
/// use std::path::Path;
///
/// let db = Database::create(Path::new("my_database"))?;
/// let raw = db.create_dataset("raw")?;
/// raw.add_data([("instrument", serde_json::json!("spectrometer"))])?;
///
/// // Later, possibly in another process
/// let db = Database::open(Path::new("my_database"))?;
/// let raw = db.get_dataset("raw")?;
/// ```
///
/// # In-Memory Databases
///
/// For testing, use `Database::create_in_memory()`:
///
/// ```rust,ignore
/// let db = Database::create_in_memory()?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Database {
    node: NodeRef,
}

impl Database {
    pub(crate) fn from_node(node: NodeRef) -> Self {
        Self { node }
    }

    /// Creates a new, empty database at `path`.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if anything is already at `path`.
    pub fn create(path: &Path) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default().error_if_exists(true))
    }

    /// Opens the existing database at `path`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseNotFound` if there is no database at `path`, and
    /// `CorruptState` if `path` holds something that is not a database.
    pub fn open(path: &Path) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default().create_if_missing(false))
    }

    /// Opens or creates the database at `path` with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use hards_core::{Config, Database};
    /// use std::path::Path;
    ///
    /// let config = Config::default().sync_writes(false);
    /// let db = Database::open_with_config(Path::new("scratch"), config)?;
    /// ```
    ///
    /// # Errors
    ///
    /// See [`Database::create`] and [`Database::open`].
    pub fn open_with_config(path: &Path, config: Config) -> CoreResult<Self> {
        let location = || path.display().to_string();

        if config.error_if_exists && path.exists() {
            return Err(CoreError::AlreadyExists {
                location: location(),
            });
        }

        let backend = match FileBackend::open(path) {
            Ok(backend) => backend,
            Err(StorageError::NotFound { .. }) if config.create_if_missing => {
                FileBackend::create(path).map_err(|e| match e {
                    StorageError::AlreadyExists { .. } => CoreError::AlreadyExists {
                        location: location(),
                    },
                    other => other.into(),
                })?
            }
            Err(StorageError::NotFound { .. }) => {
                return Err(CoreError::DatabaseNotFound {
                    location: location(),
                });
            }
            Err(StorageError::WrongKind { .. }) => {
                return Err(CoreError::corrupt_state(location(), "not a directory"));
            }
            Err(e) => return Err(e.into()),
        };

        let backend = backend.sync_writes(config.sync_writes);
        Self::with_backend(Arc::new(backend), config)
    }

    /// Creates a new database that lives in memory only.
    ///
    /// # Errors
    ///
    /// Only fails if the initial layout cannot be written.
    pub fn create_in_memory() -> CoreResult<Self> {
        Self::with_backend(
            Arc::new(hards_storage::InMemoryBackend::new()),
            Config::default().error_if_exists(true),
        )
    }

    /// Opens or creates a database in an arbitrary storage backend.
    ///
    /// An empty backend is initialized if `create_if_missing` is set; a
    /// backend holding a database is opened unless `error_if_exists` is set.
    ///
    /// # Errors
    ///
    /// `AlreadyExists`, `DatabaseNotFound` or `CorruptState` as decided by
    /// `config` and what the backend holds.
    pub fn with_backend(backend: Arc<dyn StorageBackend>, config: Config) -> CoreResult<Self> {
        let root = ObjectPath::root();
        let location = backend.local_path(&root);
        let name = location
            .as_deref()
            .and_then(Path::file_name)
            .map_or_else(|| IN_MEMORY_NAME.to_string(), |n| n.to_string_lossy().into_owned());
        let describe = || {
            location
                .as_ref()
                .map_or_else(|| name.clone(), |l| l.display().to_string())
        };

        let store = if Store::is_initialized(&*backend)? {
            if config.error_if_exists {
                return Err(CoreError::AlreadyExists {
                    location: describe(),
                });
            }
            Store::open(backend, config, location, name)?
        } else if is_empty(&*backend)? {
            if !config.create_if_missing {
                return Err(CoreError::DatabaseNotFound {
                    location: describe(),
                });
            }
            Store::create(backend, config, location, name)?
        } else {
            // Reports what is missing.
            Store::open(backend, config, location, name)?
        };

        Ok(Self::from_node(NodeRef::new(Arc::new(store), NodePath::root())))
    }

    /// Returns the filesystem location of the database, or `None` for
    /// databases that do not live on the local filesystem.
    #[must_use]
    pub fn location(&self) -> Option<&Path> {
        self.node.store.location()
    }

    /// Returns the configuration the database was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        self.node.store.config()
    }
}

/// Returns true if the backend holds nothing besides its staging area.
fn is_empty(backend: &dyn StorageBackend) -> CoreResult<bool> {
    let root = ObjectPath::root();
    let objects = backend.list(&root, EntryKind::Object)?;
    let containers = backend.list(&root, EntryKind::Container)?;
    Ok(objects.is_empty() && containers.iter().all(|c| c == STAGING_DIR))
}

impl Sealed for Database {
    fn node_ref(&self) -> &NodeRef {
        &self.node
    }
}

impl TreeNode for Database {}
impl HasDatasets for Database {}
