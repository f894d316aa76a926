//! Core type definitions for HARDS.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The direct data of a node: an insertion-ordered JSON object.
pub type Data = serde_json::Map<String, serde_json::Value>;

/// The kinds of entity the engine manages.
///
/// Used for tree nodes, for the `kind` marker persisted with every node,
/// and to say what was missing or conflicting in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// The root of a tree.
    Database,
    /// An internal node.
    Dataset,
    /// A leaf node.
    Datapoint,
    /// A file attached to a dataset or datapoint.
    File,
}

impl EntityKind {
    /// Returns the lowercase name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Dataset => "dataset",
            Self::Datapoint => "datapoint",
            Self::File => "file",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
