//! Storage layout of a database.
//!
//! This module maps the tree onto a storage backend:
//!
//! ```text
//! <root>/
//! ├─ manifest.json     # Format version and creation time
//! └─ children/         # Top-level datasets
//!    └─ <dataset>/
//!       ├─ node.json   # Kind marker and creation ordinal
//!       ├─ data.json   # Direct data (JSON object)
//!       ├─ files/      # Direct file attachments
//!       ├─ children/   # Child datasets
//!       └─ datapoints/ # Child datapoints (node.json, data.json, files/)
//! ```
//!
//! New nodes are assembled in the backend's staging area and published
//! with a single rename, so a node is either fully present or absent.
//! Creating a child only adds an entry to the parent's child container;
//! parent metadata is never rewritten.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::locks::LockTable;
use crate::manifest::{unix_millis, Manifest, MANIFEST_FILE};
use crate::name::validate_name;
use crate::path::NodePath;
use crate::types::{Data, EntityKind};
use hards_storage::{EntryKind, ObjectPath, StorageBackend, StorageError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Container of child datasets.
pub const CHILDREN_DIR: &str = "children";
/// Container of child datapoints.
pub const DATAPOINTS_DIR: &str = "datapoints";
/// Container of file attachments.
pub const FILES_DIR: &str = "files";
/// Object holding a node's direct data.
pub const DATA_FILE: &str = "data.json";
/// Object holding a node's kind and creation ordinal.
pub const NODE_FILE: &str = "node.json";

/// Returns the container a node of `kind` is stored in under its parent.
pub(crate) fn container_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Datapoint => DATAPOINTS_DIR,
        EntityKind::File => FILES_DIR,
        EntityKind::Dataset | EntityKind::Database => CHILDREN_DIR,
    }
}

/// Metadata persisted with every dataset and datapoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct NodeMeta {
    /// Which namespace the node belongs to.
    pub kind: EntityKind,
    /// Number of siblings that existed when the node was created.
    pub ordinal: u64,
    /// Creation time (Unix timestamp in milliseconds).
    pub created_at_ms: u64,
}

/// The persistence layer shared by every handle of one database.
///
/// Holds no node state: every query goes to the backend. Read-modify-write
/// operations are serialized per node with an in-process lock, shared with
/// every other store on the same directory.
pub(crate) struct Store {
    backend: Arc<dyn StorageBackend>,
    config: Config,
    location: Option<PathBuf>,
    name: String,
    locks: Arc<LockTable>,
    reported_unmarked: AtomicBool,
}

impl Store {
    fn new(
        backend: Arc<dyn StorageBackend>,
        config: Config,
        location: Option<PathBuf>,
        name: String,
    ) -> Self {
        let locks = match &location {
            Some(root) => LockTable::shared(root),
            None => Arc::default(),
        };
        Self {
            backend,
            config,
            location,
            name,
            locks,
            reported_unmarked: AtomicBool::new(false),
        }
    }

    /// Writes the layout of a new, empty database into `backend`.
    pub(crate) fn create(
        backend: Arc<dyn StorageBackend>,
        config: Config,
        location: Option<PathBuf>,
        name: String,
    ) -> CoreResult<Self> {
        let store = Self::new(backend, config, location, name);
        let location = store.describe(&ObjectPath::root());
        let manifest_path = ObjectPath::root().join(MANIFEST_FILE);
        let children = ObjectPath::root().join(CHILDREN_DIR);
        let already_exists = || CoreError::AlreadyExists {
            location: location.clone(),
        };

        if store.backend.entry_kind(&manifest_path)?.is_some()
            || store.backend.entry_kind(&children)?.is_some()
        {
            return Err(already_exists());
        }

        // Manifest first: a root left without 'children' is then reported
        // as incomplete instead of opening as a legacy database.
        let manifest = Manifest::new(store.config.format_version);
        store
            .backend
            .write_object(&manifest_path, &manifest.encode()?)?;
        store
            .backend
            .create_container(&children)
            .map_err(|e| match e {
                StorageError::AlreadyExists { .. } => already_exists(),
                other => other.into(),
            })?;

        tracing::info!(%location, format_version = ?manifest.format_version, "created database");
        Ok(store)
    }

    /// Validates the layout of an existing database in `backend`.
    pub(crate) fn open(
        backend: Arc<dyn StorageBackend>,
        config: Config,
        location: Option<PathBuf>,
        name: String,
    ) -> CoreResult<Self> {
        let store = Self::new(backend, config, location, name);
        let location = store.describe(&ObjectPath::root());

        let manifest = store.load_manifest()?;
        let children = ObjectPath::root().join(CHILDREN_DIR);
        if store.backend.entry_kind(&children)? != Some(EntryKind::Container) {
            let reason = if manifest.is_some() {
                format!("incomplete database, missing '{CHILDREN_DIR}' directory")
            } else {
                format!("missing '{CHILDREN_DIR}' directory, not a database")
            };
            return Err(CoreError::corrupt_state(&location, reason));
        }

        match manifest {
            Some(manifest) => {
                if !manifest.is_compatible(store.config.format_version) {
                    return Err(CoreError::corrupt_state(
                        &location,
                        format!(
                            "incompatible format version: database is v{}.{}, expected v{}.{}",
                            manifest.format_version.0,
                            manifest.format_version.1,
                            store.config.format_version.0,
                            store.config.format_version.1
                        ),
                    ));
                }
                tracing::info!(%location, format_version = ?manifest.format_version, "opened database");
            }
            None => {
                tracing::warn!(%location, "opened database without a manifest");
            }
        }

        Ok(store)
    }

    /// Returns true if the backend already holds a database layout.
    pub(crate) fn is_initialized(backend: &dyn StorageBackend) -> CoreResult<bool> {
        Ok(backend
            .entry_kind(&ObjectPath::root().join(CHILDREN_DIR))?
            .is_some())
    }

    fn load_manifest(&self) -> CoreResult<Option<Manifest>> {
        match self.backend.read_object(&ObjectPath::root().join(MANIFEST_FILE)) {
            Ok(data) => Ok(Some(Manifest::decode(&data)?)),
            Err(StorageError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Human readable location of a backend path, for errors and logs.
    fn describe(&self, path: &ObjectPath) -> String {
        match self.backend.local_path(path) {
            Some(local) => local.display().to_string(),
            None => format!("{}:{path}", self.name),
        }
    }

    fn lock(&self, node: &NodePath) -> Arc<Mutex<()>> {
        self.locks.node(node)
    }

    /// Checks that the container at `path` exists, reporting it as corrupt
    /// otherwise.
    fn expect_container(&self, path: &ObjectPath, what: &str) -> CoreResult<()> {
        match self.backend.entry_kind(path)? {
            Some(EntryKind::Container) => Ok(()),
            Some(EntryKind::Object) => Err(CoreError::corrupt_state(
                self.describe(path),
                format!("'{what}' is not a directory"),
            )),
            None => Err(CoreError::corrupt_state(
                self.describe(path),
                format!("missing '{what}' directory"),
            )),
        }
    }

    /// Checks that `node` exists and has the layout of its kind.
    ///
    /// # Errors
    ///
    /// `NotFound` if the node is absent, `CorruptState` if it is malformed.
    pub(crate) fn check_node(&self, node: &NodePath) -> CoreResult<()> {
        if node.is_root() {
            return Ok(());
        }

        let location = node.object_path();
        match self.backend.entry_kind(&location)? {
            Some(EntryKind::Container) => {}
            Some(EntryKind::Object) => {
                return Err(CoreError::corrupt_state(
                    self.describe(&location),
                    format!("{} is not a directory", node.kind()),
                ));
            }
            None => {
                let parent = node.parent().unwrap_or_default();
                return Err(CoreError::not_found(
                    node.kind(),
                    node.name().unwrap_or_default(),
                    parent,
                ));
            }
        }

        let data = location.join(DATA_FILE);
        if self.backend.entry_kind(&data)? != Some(EntryKind::Object) {
            return Err(CoreError::corrupt_state(
                self.describe(&location),
                format!("missing '{DATA_FILE}' file"),
            ));
        }
        self.expect_container(&location.join(FILES_DIR), FILES_DIR)?;
        if node.kind() == EntityKind::Dataset {
            self.expect_container(&location.join(CHILDREN_DIR), CHILDREN_DIR)?;
            self.expect_container(&location.join(DATAPOINTS_DIR), DATAPOINTS_DIR)?;
        }
        Ok(())
    }

    /// Creates the child `name` of kind `kind` under `parent`.
    ///
    /// # Errors
    ///
    /// `InvalidName` or `NameConflict` before anything is written; storage
    /// errors after staging leave no trace of the new node.
    pub(crate) fn create_node(
        &self,
        parent: &NodePath,
        kind: EntityKind,
        name: &str,
    ) -> CoreResult<NodePath> {
        validate_name(name)?;

        let lock = self.lock(parent);
        let _guard = lock.lock();

        let container = parent.object_path().join(container_name(kind));
        self.expect_container(&container, container_name(kind))?;

        let child = parent.child(kind, name);
        let dest = child.object_path();
        if self.backend.entry_kind(&dest)?.is_some() {
            return Err(CoreError::name_conflict(kind, name, parent));
        }

        let ordinal = self.backend.list(&container, EntryKind::Container)?.len() as u64;
        let staged = self.backend.stage_container()?;
        let published = self
            .populate(&staged, kind, ordinal)
            .and_then(|()| {
                self.backend
                    .publish_container(&staged, &dest)
                    .map_err(|e| match e {
                        StorageError::AlreadyExists { .. } => {
                            CoreError::name_conflict(kind, name, parent)
                        }
                        other => other.into(),
                    })
            });

        if let Err(err) = published {
            if let Err(cleanup) = self.backend.discard_container(&staged) {
                tracing::warn!(staged = %staged, error = %cleanup, "failed to discard staged node");
            }
            return Err(err);
        }

        tracing::debug!(node = %child, %kind, ordinal, "created node");
        Ok(child)
    }

    /// Writes the initial state of a node into the staged container.
    fn populate(&self, staged: &ObjectPath, kind: EntityKind, ordinal: u64) -> CoreResult<()> {
        let meta = NodeMeta {
            kind,
            ordinal,
            created_at_ms: unix_millis(),
        };
        self.backend
            .write_object(&staged.join(NODE_FILE), &serde_json::to_vec_pretty(&meta)?)?;
        self.backend.write_object(&staged.join(DATA_FILE), b"{}")?;
        self.backend.create_container(&staged.join(FILES_DIR))?;
        if kind == EntityKind::Dataset {
            self.backend.create_container(&staged.join(CHILDREN_DIR))?;
            self.backend.create_container(&staged.join(DATAPOINTS_DIR))?;
        }
        Ok(())
    }

    /// Reads the marker of the node stored at `location`.
    ///
    /// Returns `None` for nodes written without a marker.
    fn read_meta(&self, location: &ObjectPath, kind: EntityKind) -> CoreResult<Option<NodeMeta>> {
        let data = match self.backend.read_object(&location.join(NODE_FILE)) {
            Ok(data) => data,
            Err(StorageError::NotFound { .. }) => {
                if self.reported_unmarked.swap(true, Ordering::Relaxed) {
                    tracing::debug!(node = %location, "node has no '{NODE_FILE}', ordering by name");
                } else {
                    tracing::warn!(
                        database = %self.name,
                        node = %location,
                        "database has nodes without '{NODE_FILE}', ordering them by name"
                    );
                }
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let meta: NodeMeta = serde_json::from_slice(&data).map_err(|e| {
            CoreError::corrupt_state(self.describe(location), format!("unparsable '{NODE_FILE}': {e}"))
        })?;
        if meta.kind != kind {
            return Err(CoreError::corrupt_state(
                self.describe(location),
                format!("{} stored in the {kind} namespace", meta.kind),
            ));
        }
        Ok(Some(meta))
    }

    /// Lists the names of the direct children of `parent` of `kind`, in
    /// creation order.
    ///
    /// Children without a marker come last, ordered by name.
    pub(crate) fn children(&self, parent: &NodePath, kind: EntityKind) -> CoreResult<Vec<String>> {
        // The database only holds datasets.
        if parent.is_root() && kind == EntityKind::Datapoint {
            return Ok(Vec::new());
        }

        let container = parent.object_path().join(container_name(kind));
        self.expect_container(&container, container_name(kind))?;

        let mut ordered = Vec::new();
        for name in self.backend.list(&container, EntryKind::Container)? {
            let meta = self.read_meta(&container.join(name.as_str()), kind)?;
            let ordinal = meta.map_or(u64::MAX, |m| m.ordinal);
            ordered.push((ordinal, name));
        }
        ordered.sort();
        Ok(ordered.into_iter().map(|(_, name)| name).collect())
    }

    /// Reads the direct data of `node`.
    pub(crate) fn read_data(&self, node: &NodePath) -> CoreResult<Data> {
        let location = node.object_path().join(DATA_FILE);
        let bytes = match self.backend.read_object(&location) {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound { .. }) => {
                return Err(CoreError::corrupt_state(
                    self.describe(&location),
                    format!("missing '{DATA_FILE}' file"),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(Value::Object(data)) => Ok(data),
            Ok(_) => Err(CoreError::corrupt_state(
                self.describe(&location),
                "data is not a JSON object",
            )),
            Err(e) => Err(CoreError::corrupt_state(
                self.describe(&location),
                format!("unparsable data: {e}"),
            )),
        }
    }

    /// Merges `new_data` into the direct data of `node` and writes the
    /// merged object back in one atomic replace.
    pub(crate) fn merge_data(&self, node: &NodePath, new_data: Data) -> CoreResult<()> {
        let lock = self.lock(node);
        let _guard = lock.lock();

        let mut data = self.read_data(node)?;
        let added = new_data.len();
        for (key, value) in new_data {
            data.insert(key, value);
        }

        let bytes = serde_json::to_vec_pretty(&Value::Object(data))?;
        self.backend
            .write_object(&node.object_path().join(DATA_FILE), &bytes)?;

        tracing::debug!(%node, keys = added, "merged data");
        Ok(())
    }

    fn files_container(&self, node: &NodePath) -> CoreResult<ObjectPath> {
        let files = node.object_path().join(FILES_DIR);
        self.expect_container(&files, FILES_DIR)?;
        Ok(files)
    }

    /// Copies the local file `source` into the files of `node`.
    ///
    /// Stored under `name`, or the base name of `source` if `None`.
    pub(crate) fn import_file(
        &self,
        node: &NodePath,
        source: &Path,
        name: Option<&str>,
    ) -> CoreResult<String> {
        let name = match name {
            Some(name) => name.to_string(),
            None => source
                .file_name()
                .and_then(OsStr::to_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    CoreError::invalid_name(
                        source.display().to_string(),
                        "source has no UTF-8 file name",
                    )
                })?,
        };
        validate_name(&name)?;

        if !source.is_file() {
            return Err(CoreError::SourceNotFound {
                path: source.to_path_buf(),
            });
        }

        let files = self.files_container(node)?;
        let bytes = self.backend.import_object(&files.join(name.as_str()), source)?;

        tracing::debug!(%node, file = %name, bytes, "imported file");
        Ok(name)
    }

    /// Lists the file names of `node`, sorted.
    pub(crate) fn files(&self, node: &NodePath) -> CoreResult<Vec<String>> {
        let files = self.files_container(node)?;
        Ok(self.backend.list(&files, EntryKind::Object)?)
    }

    /// Returns the backend path of the file `name` of `node`.
    ///
    /// # Errors
    ///
    /// `InvalidName` for names that could not have been stored, `NotFound`
    /// if no such file exists.
    pub(crate) fn file(&self, node: &NodePath, name: &str) -> CoreResult<ObjectPath> {
        validate_name(name)?;
        let path = self.files_container(node)?.join(name);
        match self.backend.entry_kind(&path)? {
            Some(EntryKind::Object) => Ok(path),
            _ => Err(CoreError::not_found(EntityKind::File, name, node)),
        }
    }
}
