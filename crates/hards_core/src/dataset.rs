//! Dataset handles.

use crate::datapoint::Datapoint;
use crate::error::CoreResult;
use crate::inherit;
use crate::node::sealed::Sealed;
use crate::node::{exists, HasContent, HasDatasets, NodeRef, Parent, TreeNode};
use crate::path::resolve_child;
use crate::types::EntityKind;

/// An internal node of the tree.
///
/// A dataset owns child datasets and child datapoints, in two separate
/// namespaces, as well as its own data and files. Navigation and content
/// operations come from [`TreeNode`], [`HasDatasets`] and [`HasContent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    node: NodeRef,
}

impl Dataset {
    pub(crate) fn from_node(node: NodeRef) -> Self {
        Self { node }
    }

    /// Returns the parent of this dataset.
    #[must_use]
    pub fn parent(&self) -> Parent {
        let parent = self.node.path.parent().unwrap_or_default();
        Parent::from_node(self.node.with_path(parent))
    }

    /// Returns the names of the direct child datapoints, in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the datapoint container cannot be listed or holds
    /// a malformed node.
    pub fn datapoints(&self) -> CoreResult<Vec<String>> {
        self.node.store.children(&self.node.path, EntityKind::Datapoint)
    }

    /// Returns true if a direct child datapoint `name` exists.
    ///
    /// Invalid names are reported as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the child exists but is malformed.
    pub fn has_datapoint(&self, name: &str) -> CoreResult<bool> {
        exists(self.get_datapoint(name))
    }

    /// Returns the direct child datapoint `name`.
    ///
    /// # Errors
    ///
    /// `InvalidName` for an invalid name, `NotFound` if there is no such
    /// child.
    pub fn get_datapoint(&self, name: &str) -> CoreResult<Datapoint> {
        let path = resolve_child(&self.node.store, &self.node.path, EntityKind::Datapoint, name)?;
        Ok(Datapoint::from_node(self.node.with_path(path)))
    }

    /// Creates the direct child datapoint `name`.
    ///
    /// A datapoint may share its name with a child dataset.
    ///
    /// # Errors
    ///
    /// `InvalidName` for an invalid name, `NameConflict` if a child datapoint
    /// of that name already exists.
    pub fn create_datapoint(&self, name: &str) -> CoreResult<Datapoint> {
        let path = self
            .node
            .store
            .create_node(&self.node.path, EntityKind::Datapoint, name)?;
        Ok(Datapoint::from_node(self.node.with_path(path)))
    }

    /// Returns the direct child datapoints, in creation order.
    ///
    /// # Errors
    ///
    /// See [`Dataset::datapoints`].
    pub fn direct_datapoints(&self) -> CoreResult<Vec<Datapoint>> {
        inherit::direct_datapoints(&self.node)
    }

    /// Returns every datapoint visible from this dataset.
    ///
    /// These are the direct datapoints of the top-level dataset, followed by
    /// those of each dataset on the way down, ending with the datapoints of
    /// this dataset. Datapoints of child datasets are not included.
    ///
    /// # Errors
    ///
    /// See [`Dataset::datapoints`].
    pub fn recursively_get_datapoints(&self) -> CoreResult<Vec<Datapoint>> {
        inherit::visible_datapoints(&self.node)
    }
}

impl Sealed for Dataset {
    fn node_ref(&self) -> &NodeRef {
        &self.node
    }
}

impl TreeNode for Dataset {}
impl HasDatasets for Dataset {}
impl HasContent for Dataset {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::error::CoreError;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    #[test]
    fn navigation() {
        let db = Database::create_in_memory().unwrap();
        let a = db.create_dataset("a").unwrap();
        let b = a.create_dataset("b").unwrap();

        assert_eq!(b.name(), "b");
        assert_eq!(b.kind(), EntityKind::Dataset);
        assert!(!b.is_database());
        assert_eq!(b.path_to_database(), vec!["a", "b"]);
        assert_eq!(b.fullname(), "a/b");
        assert_eq!(b.database(), db);
        assert_eq!(db.recursively_get_dataset(&b.fullname()).unwrap(), b);
    }

    #[test]
    fn datapoints_in_creation_order() {
        let db = Database::create_in_memory().unwrap();
        let a = db.create_dataset("a").unwrap();
        for name in ["p3", "p1", "p2"] {
            a.create_datapoint(name).unwrap();
        }
        assert_eq!(a.datapoints().unwrap(), vec!["p3", "p1", "p2"]);
        assert!(a.has_datapoint("p1").unwrap());
        assert!(!a.has_datapoint("p4").unwrap());
        assert_eq!(a.get_datapoint("p1").unwrap().name(), "p1");
    }

    #[test]
    fn namespaces_are_independent() {
        let db = Database::create_in_memory().unwrap();
        let a = db.create_dataset("a").unwrap();
        a.create_dataset("x").unwrap();

        let err = a.create_dataset("x").unwrap_err();
        assert!(matches!(err, CoreError::NameConflict { .. }));
        a.create_datapoint("x").unwrap();
        let err = a.create_datapoint("x").unwrap_err();
        assert!(matches!(err, CoreError::NameConflict { kind: EntityKind::Datapoint, .. }));

        assert_eq!(a.datasets().unwrap(), vec!["x"]);
        assert_eq!(a.datapoints().unwrap(), vec!["x"]);
    }

    #[test]
    fn lookup_errors() {
        let db = Database::create_in_memory().unwrap();
        let a = db.create_dataset("a").unwrap();

        match a.get_datapoint("missing").unwrap_err() {
            CoreError::NotFound { kind, name, parent } => {
                assert_eq!(kind, EntityKind::Datapoint);
                assert_eq!(name, "missing");
                assert_eq!(parent, "/a");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            a.get_datapoint("d&tapoint").unwrap_err(),
            CoreError::InvalidName { .. }
        ));
        assert!(matches!(
            a.create_datapoint("d&tapoint").unwrap_err(),
            CoreError::InvalidName { .. }
        ));
    }

    #[test]
    fn deep_lookup_fails_on_first_missing_segment() {
        let db = Database::create_in_memory().unwrap();
        let a = db.create_dataset("a").unwrap();
        a.create_dataset("b").unwrap();

        match db.recursively_get_dataset("a/missing/c").unwrap_err() {
            CoreError::NotFound { name, parent, .. } => {
                assert_eq!(name, "missing");
                assert_eq!(parent, "/a");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(db.recursively_get_dataset("a/b/").unwrap().fullname(), "a/b");
        assert!(matches!(
            db.recursively_get_dataset("a//b").unwrap_err(),
            CoreError::InvalidName { .. }
        ));
    }

    #[test]
    fn recursive_datapoints_direction() {
        let db = Database::create_in_memory().unwrap();
        let a = db.create_dataset("a").unwrap();
        let b = a.create_dataset("b").unwrap();
        let c = b.create_dataset("c").unwrap();
        let from_a = a.create_datapoint("from_a").unwrap();
        let from_c = c.create_datapoint("from_c").unwrap();

        for dataset in [&a, &b, &c] {
            assert!(dataset.recursively_get_datapoints().unwrap().contains(&from_a));
        }
        assert!(c.recursively_get_datapoints().unwrap().contains(&from_c));
        assert!(!b.recursively_get_datapoints().unwrap().contains(&from_c));
        assert!(!a.recursively_get_datapoints().unwrap().contains(&from_c));
        assert_eq!(c.direct_datapoints().unwrap(), vec![from_c]);
    }

    #[test]
    fn data_merge_and_files() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("example_file.dat");
        std::fs::write(&source, b"file data!\n").unwrap();

        let db = Database::create(&dir.path().join("db")).unwrap();
        let a = db.create_dataset("a").unwrap();
        a.add_data([("x", json!(1)), ("y", json!("keep"))]).unwrap();
        a.add_data([("x", json!({"nested": [1, 2]}))]).unwrap();
        assert_eq!(
            Value::Object(a.data().unwrap()),
            json!({"x": {"nested": [1, 2]}, "y": "keep"})
        );

        let file = a.add_file(&source, None).unwrap();
        assert_eq!(file.name(), "example_file.dat");
        assert!(a.has_file("example_file.dat").unwrap());
        assert_eq!(a.files().unwrap(), vec!["example_file.dat"]);
        assert_eq!(a.get_file("example_file.dat").unwrap().read().unwrap(), b"file data!\n");
    }
}
