//! # HARDS Core
//!
//! Hierarchical dataset storage engine.
//!
//! A [`Database`] owns a tree of [`Dataset`]s; each dataset owns further
//! datasets and [`Datapoint`]s. Datasets and datapoints carry direct data
//! (an insertion-ordered JSON object) and files copied into the database.
//! A dataset sees the datapoints of all datasets above it, so aggregate
//! views live further up the tree than the data they are built from.
//!
//! This crate provides:
//! - Name validation and path resolution
//! - Database, dataset and datapoint handles
//! - Datapoint inheritance along the ancestor chain
//! - File import with read-only handles
//! - The persistent layout on any [`hards_storage::StorageBackend`]
//!
//! ## Example
//!
//! ```rust
//! use hards_core::prelude::*;
//! use serde_json::json;
//!
//! let db = Database::create_in_memory().unwrap();
//! let raw = db.create_dataset("raw").unwrap();
//! raw.create_datapoint("sample_1").unwrap();
//!
//! let filtered = raw.create_dataset("filtered").unwrap();
//! filtered.add_data([("threshold", json!(0.5))]).unwrap();
//! filtered.create_datapoint("sample_2").unwrap();
//!
//! let visible: Vec<String> = filtered
//!     .recursively_get_datapoints()
//!     .unwrap()
//!     .iter()
//!     .map(|p| p.fullname())
//!     .collect();
//! assert_eq!(visible, ["raw/sample_1", "raw/filtered/sample_2"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod datapoint;
mod dataset;
mod error;
mod file;
mod inherit;
mod layout;
mod locks;
mod manifest;
pub mod name;
mod node;
mod path;
mod types;

pub use config::Config;
pub use database::{Database, IN_MEMORY_NAME};
pub use datapoint::Datapoint;
pub use dataset::Dataset;
pub use error::{CoreError, CoreResult};
pub use file::FileHandle;
pub use layout::{CHILDREN_DIR, DATAPOINTS_DIR, DATA_FILE, FILES_DIR, NODE_FILE};
pub use manifest::{Manifest, MANIFEST_FILE};
pub use name::validate_name;
pub use node::{HasContent, HasDatasets, Parent, TreeNode};
pub use path::{split_path, NodePath, PATH_SEPARATOR};
pub use types::{Data, EntityKind};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The handle types and the traits that give them their operations.
pub mod prelude {
    pub use crate::{
        Data, Database, Datapoint, Dataset, EntityKind, FileHandle, HasContent, HasDatasets,
        Parent, TreeNode,
    };
}
