//! Datapoint handles.

use crate::dataset::Dataset;
use crate::node::sealed::Sealed;
use crate::node::{HasContent, NodeRef, TreeNode};

/// A leaf of the tree: data and files, no children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datapoint {
    node: NodeRef,
}

impl Datapoint {
    pub(crate) fn from_node(node: NodeRef) -> Self {
        Self { node }
    }

    /// Returns the dataset this datapoint belongs to.
    #[must_use]
    pub fn parent(&self) -> Dataset {
        let parent = self.node.path.parent().unwrap_or_default();
        Dataset::from_node(self.node.with_path(parent))
    }
}

impl Sealed for Datapoint {
    fn node_ref(&self) -> &NodeRef {
        &self.node
    }
}

impl TreeNode for Datapoint {}
impl HasContent for Datapoint {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::error::CoreError;
    use crate::node::HasDatasets;
    use crate::types::EntityKind;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    fn datapoint() -> (Database, Dataset, Datapoint) {
        let db = Database::create_in_memory().unwrap();
        let dataset = db.create_dataset("test_dataset").unwrap();
        let point = dataset.create_datapoint("test_datapoint").unwrap();
        (db, dataset, point)
    }

    #[test]
    fn path_to_database() {
        let (db, dataset, point) = datapoint();
        assert_eq!(point.path_to_database(), vec!["test_dataset", "test_datapoint"]);
        assert_eq!(point.fullname(), "test_dataset/test_datapoint");
        assert_eq!(point.kind(), EntityKind::Datapoint);
        assert_eq!(point.parent(), dataset);
        assert_eq!(point.database(), db);
        assert_eq!(db.recursively_get_datapoint(&point.fullname()).unwrap(), point);
    }

    #[test]
    fn add_data_overwrites_per_key() {
        let (_db, _dataset, point) = datapoint();
        assert!(point.data().unwrap().is_empty());

        point.add_data([("a", json!(1)), ("b", json!(2))]).unwrap();
        point.add_data([("b", json!(3)), ("c", json!([true, null]))]).unwrap();
        assert_eq!(
            Value::Object(point.data().unwrap()),
            json!({"a": 1, "b": 3, "c": [true, null]})
        );
    }

    #[test]
    fn add_file_replaces_by_name() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        std::fs::write(&first, b"one").unwrap();
        std::fs::write(&second, b"two").unwrap();

        let db = Database::create(&dir.path().join("db")).unwrap();
        let point = db
            .create_dataset("d")
            .unwrap()
            .create_datapoint("p")
            .unwrap();

        point.add_file(&first, Some("data.txt")).unwrap();
        let file = point.add_file(&second, Some("data.txt")).unwrap();
        assert_eq!(file.read_to_string().unwrap(), "two");
        assert_eq!(point.files().unwrap(), vec!["data.txt"]);

        // The stored copy no longer follows the source
        std::fs::write(&second, b"changed").unwrap();
        assert_eq!(point.get_file("data.txt").unwrap().read().unwrap(), b"two");
    }

    #[cfg(unix)]
    #[test]
    fn stored_files_are_read_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let source = dir.path().join("f.txt");
        std::fs::write(&source, b"x").unwrap();

        let db = Database::create(&dir.path().join("db")).unwrap();
        let point = db.create_dataset("d").unwrap().create_datapoint("p").unwrap();
        let file = point.add_file(&source, None).unwrap();

        let local = file.local_path().unwrap();
        let mode = std::fs::metadata(local).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o400);
    }

    #[test]
    fn file_errors() {
        let dir = tempdir().unwrap();
        let (_db, _dataset, point) = datapoint();

        let err = point.add_file(&dir.path().join("nope.dat"), None).unwrap_err();
        assert!(matches!(err, CoreError::SourceNotFound { .. }));
        assert!(err.is_not_found());

        let err = point.get_file("other.txt").unwrap_err();
        assert!(matches!(err, CoreError::NotFound { kind: EntityKind::File, .. }));
        assert!(point.files().unwrap().is_empty());
    }
}
