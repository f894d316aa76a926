//! Capabilities shared by the handle types.
//!
//! Every handle is a [`NodeRef`]: the shared store plus the path of the node.
//! The traits here provide the operations common to several kinds of node,
//! so [`Database`], [`Dataset`] and [`Datapoint`] only implement what is
//! specific to them.

use crate::database::Database;
use crate::datapoint::Datapoint;
use crate::dataset::Dataset;
use crate::error::{CoreError, CoreResult};
use crate::file::FileHandle;
use crate::layout::Store;
use crate::path::{resolve, resolve_child, NodePath};
use crate::types::{Data, EntityKind};
use sealed::Sealed;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A node of one database: the store it lives in and its path.
#[derive(Clone)]
pub struct NodeRef {
    pub(crate) store: Arc<Store>,
    pub(crate) path: NodePath,
}

impl NodeRef {
    pub(crate) fn new(store: Arc<Store>, path: NodePath) -> Self {
        Self { store, path }
    }

    pub(crate) fn with_path(&self, path: NodePath) -> Self {
        Self::new(Arc::clone(&self.store), path)
    }

    fn same_database(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.store, &other.store) {
            return true;
        }
        match (self.store.location(), other.store.location()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("database", &self.store.name())
            .field("path", &self.path.to_string())
            .finish()
    }
}

/// Handles are equal when they name the same node of the same database,
/// whether or not they were obtained from the same `Database` value.
impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.same_database(other)
    }
}

impl Eq for NodeRef {}

pub(crate) mod sealed {
    use super::NodeRef;

    pub trait Sealed {
        fn node_ref(&self) -> &NodeRef;
    }
}

/// Navigation available on every node of the tree.
pub trait TreeNode: Sealed {
    /// Returns the kind of this node.
    fn kind(&self) -> EntityKind {
        self.node_ref().path.kind()
    }

    /// Returns true for the database itself.
    fn is_database(&self) -> bool {
        self.node_ref().path.is_root()
    }

    /// Returns the name of the node.
    ///
    /// For the database this is the final component of its location.
    fn name(&self) -> &str {
        let node = self.node_ref();
        node.path.name().unwrap_or_else(|| node.store.name())
    }

    /// Returns the path of this node below its database.
    fn path(&self) -> &NodePath {
        &self.node_ref().path
    }

    /// Returns the names of the nodes from just below the database down to
    /// and including this one. Empty for the database.
    fn path_to_database(&self) -> Vec<String> {
        self.node_ref().path.names()
    }

    /// Returns the path that [`HasDatasets::recursively_get_dataset`] or
    /// [`HasDatasets::recursively_get_datapoint`] on the database resolves
    /// back to this node.
    fn fullname(&self) -> String {
        self.node_ref().path.fullname()
    }

    /// Returns the database this node belongs to.
    fn database(&self) -> Database {
        Database::from_node(self.node_ref().with_path(NodePath::root()))
    }
}

/// Child datasets, for the database and for datasets.
pub trait HasDatasets: TreeNode {
    /// Returns the names of the direct child datasets, in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the child container cannot be listed or holds a
    /// malformed node.
    fn datasets(&self) -> CoreResult<Vec<String>> {
        let node = self.node_ref();
        node.store.children(&node.path, EntityKind::Dataset)
    }

    /// Returns true if a direct child dataset `name` exists.
    ///
    /// Invalid names are reported as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the child exists but is malformed.
    fn has_dataset(&self, name: &str) -> CoreResult<bool> {
        exists(self.get_dataset(name))
    }

    /// Returns the direct child dataset `name`.
    ///
    /// # Errors
    ///
    /// `InvalidName` for an invalid name, `NotFound` if there is no such
    /// child.
    fn get_dataset(&self, name: &str) -> CoreResult<Dataset> {
        let node = self.node_ref();
        let child = resolve_child(&node.store, &node.path, EntityKind::Dataset, name)?;
        Ok(Dataset::from_node(node.with_path(child)))
    }

    /// Creates the direct child dataset `name`.
    ///
    /// # Errors
    ///
    /// `InvalidName` for an invalid name, `NameConflict` if a child dataset
    /// of that name already exists.
    fn create_dataset(&self, name: &str) -> CoreResult<Dataset> {
        let node = self.node_ref();
        let child = node.store.create_node(&node.path, EntityKind::Dataset, name)?;
        Ok(Dataset::from_node(node.with_path(child)))
    }

    /// Resolves a `/`-separated path of datasets below this node.
    ///
    /// # Errors
    ///
    /// `NotFound` naming the first segment that does not exist.
    fn recursively_get_dataset(&self, path: &str) -> CoreResult<Dataset> {
        let node = self.node_ref();
        let found = resolve(&node.store, &node.path, path, EntityKind::Dataset)?;
        Ok(Dataset::from_node(node.with_path(found)))
    }

    /// Resolves a `/`-separated path whose last segment names a datapoint
    /// and whose other segments name datasets.
    ///
    /// # Errors
    ///
    /// `NotFound` naming the first segment that does not exist.
    fn recursively_get_datapoint(&self, path: &str) -> CoreResult<Datapoint> {
        let node = self.node_ref();
        let found = resolve(&node.store, &node.path, path, EntityKind::Datapoint)?;
        Ok(Datapoint::from_node(node.with_path(found)))
    }
}

/// Direct data and files, for datasets and datapoints.
pub trait HasContent: TreeNode {
    /// Reads the direct data of this node.
    ///
    /// # Errors
    ///
    /// `CorruptState` if the stored data is not a JSON object.
    fn data(&self) -> CoreResult<Data> {
        let node = self.node_ref();
        node.store.read_data(&node.path)
    }

    /// Merges `data` into the direct data of this node.
    ///
    /// Keys already present are overwritten, all other keys are kept. The
    /// merged object is persisted before this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored data cannot be read or the merged data
    /// cannot be written; the stored data is then unchanged.
    fn add_data<I, K>(&self, data: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let data: Data = data.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let node = self.node_ref();
        node.store.merge_data(&node.path, data)
    }

    /// Returns the names of the files of this node, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the file container cannot be listed.
    fn files(&self) -> CoreResult<Vec<String>> {
        let node = self.node_ref();
        node.store.files(&node.path)
    }

    /// Returns true if this node has a file `name`.
    ///
    /// Invalid names are reported as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file container cannot be inspected.
    fn has_file(&self, name: &str) -> CoreResult<bool> {
        exists(self.get_file(name))
    }

    /// Returns a read-only handle to the file `name`.
    ///
    /// # Errors
    ///
    /// `InvalidName` for an invalid name, `NotFound` if there is no such
    /// file.
    fn get_file(&self, name: &str) -> CoreResult<FileHandle> {
        let node = self.node_ref();
        let location = node.store.file(&node.path, name)?;
        Ok(FileHandle::new(
            Arc::clone(node.store.backend()),
            location,
            name.to_string(),
        ))
    }

    /// Copies the local file `source` into this node.
    ///
    /// The copy is stored under `name`, or under the file name of `source`
    /// when `name` is `None`. A file of the same name is replaced.
    ///
    /// # Errors
    ///
    /// `SourceNotFound` if `source` is not a regular file, `InvalidName` if
    /// the name to store under is invalid.
    fn add_file(&self, source: &Path, name: Option<&str>) -> CoreResult<FileHandle> {
        let node = self.node_ref();
        let stored = node.store.import_file(&node.path, source, name)?;
        self.get_file(&stored)
    }
}

/// Maps a lookup to whether its target exists.
pub(crate) fn exists<T>(lookup: CoreResult<T>) -> CoreResult<bool> {
    match lookup {
        Ok(_) => Ok(true),
        Err(CoreError::NotFound { .. } | CoreError::InvalidName { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// The parent of a dataset: the database for top-level datasets, a dataset
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parent {
    /// The dataset is a top-level dataset.
    Database(Database),
    /// The dataset is a child dataset.
    Dataset(Dataset),
}

impl Parent {
    pub(crate) fn from_node(node: NodeRef) -> Self {
        if node.path.is_root() {
            Self::Database(Database::from_node(node))
        } else {
            Self::Dataset(Dataset::from_node(node))
        }
    }

    /// Returns the dataset, or `None` for the database.
    #[must_use]
    pub fn as_dataset(&self) -> Option<&Dataset> {
        match self {
            Self::Dataset(dataset) => Some(dataset),
            Self::Database(_) => None,
        }
    }

    /// Converts into the dataset, or `None` for the database.
    #[must_use]
    pub fn into_dataset(self) -> Option<Dataset> {
        match self {
            Self::Dataset(dataset) => Some(dataset),
            Self::Database(_) => None,
        }
    }
}

impl Sealed for Parent {
    fn node_ref(&self) -> &NodeRef {
        match self {
            Self::Database(database) => database.node_ref(),
            Self::Dataset(dataset) => dataset.node_ref(),
        }
    }
}

impl TreeNode for Parent {}
impl HasDatasets for Parent {}
