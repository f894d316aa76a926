//! Node paths and path resolution.
//!
//! A [`NodePath`] names a node by the chain of (kind, name) steps leading to
//! it from the database. Path strings such as `"a/b/c"` are resolved one
//! segment at a time against the backend, failing on the first segment that
//! does not exist.

use crate::error::{CoreError, CoreResult};
use crate::layout::{self, Store};
use crate::name::validate_name;
use crate::types::EntityKind;
use hards_storage::ObjectPath;
use std::fmt;

/// Separator between segments of a path string.
pub const PATH_SEPARATOR: char = '/';

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Step {
    kind: EntityKind,
    name: String,
}

/// The location of a node in the tree, relative to its database.
///
/// Displayed as `/` for the database itself and `/a/b` below it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath {
    steps: Vec<Step>,
}

impl NodePath {
    /// The database itself.
    #[must_use]
    pub const fn root() -> Self {
        Self { steps: Vec::new() }
    }

    pub(crate) fn child(&self, kind: EntityKind, name: &str) -> Self {
        let mut steps = self.steps.clone();
        steps.push(Step {
            kind,
            name: name.to_string(),
        });
        Self { steps }
    }

    /// Returns true for the database itself.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the kind of node this path leads to.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.steps.last().map_or(EntityKind::Database, |s| s.kind)
    }

    /// Returns the name of the node, or `None` for the database.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.steps.last().map(|s| s.name.as_str())
    }

    /// Returns the path of the parent node, or `None` for the database.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.steps.is_empty() {
            return None;
        }
        Some(Self {
            steps: self.steps[..self.steps.len() - 1].to_vec(),
        })
    }

    /// Returns the number of steps below the database.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    /// Returns the names of the nodes from the database down to this one.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.name.clone()).collect()
    }

    /// Returns the names joined with `/`; empty for the database.
    ///
    /// Resolving this string from the database leads back to this node.
    #[must_use]
    pub fn fullname(&self) -> String {
        self.steps
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Returns the dataset paths from the top-level dataset down to this
    /// node, including this node if it is a dataset.
    pub(crate) fn dataset_chain(&self) -> Vec<Self> {
        (1..=self.steps.len())
            .map(|len| Self {
                steps: self.steps[..len].to_vec(),
            })
            .filter(|path| path.kind() == EntityKind::Dataset)
            .collect()
    }

    /// Maps the node onto its container in the storage backend.
    pub(crate) fn object_path(&self) -> ObjectPath {
        self.steps.iter().fold(ObjectPath::root(), |path, step| {
            path.join(layout::container_name(step.kind))
                .join(step.name.as_str())
        })
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.fullname())
    }
}

/// Splits a path string into its segments.
///
/// Leading and trailing separators are ignored, so `"a/"` and `"/a//"` both
/// split to `["a"]`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidName`] if nothing is left after trimming or a
/// segment between two separators is empty.
pub fn split_path(path: &str) -> CoreResult<Vec<&str>> {
    let trimmed = path.trim_matches(PATH_SEPARATOR);
    if trimmed.is_empty() {
        return Err(CoreError::invalid_name(path, "path has no segments"));
    }

    let segments: Vec<&str> = trimmed.split(PATH_SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(CoreError::invalid_name(path, "path contains an empty segment"));
    }
    Ok(segments)
}

/// Looks up the direct child `name` of kind `kind` under `parent`.
pub(crate) fn resolve_child(
    store: &Store,
    parent: &NodePath,
    kind: EntityKind,
    name: &str,
) -> CoreResult<NodePath> {
    validate_name(name)?;
    let child = parent.child(kind, name);
    store.check_node(&child)?;
    Ok(child)
}

/// Resolves `path` from `start`, descending through datasets and resolving
/// the final segment as `last`.
pub(crate) fn resolve(
    store: &Store,
    start: &NodePath,
    path: &str,
    last: EntityKind,
) -> CoreResult<NodePath> {
    let segments = split_path(path)?;
    let final_index = segments.len() - 1;

    let mut current = start.clone();
    for (index, segment) in segments.into_iter().enumerate() {
        let kind = if index == final_index {
            last
        } else {
            EntityKind::Dataset
        };
        current = resolve_child(store, &current, kind, segment)?;
    }
    Ok(current)
}
