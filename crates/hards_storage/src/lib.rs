//! # HARDS Storage
//!
//! Storage backend trait and implementations for HARDS.
//!
//! This crate provides the lowest-level storage abstraction for HARDS.
//! Storage backends are **opaque trees** of containers and byte objects:
//! they do not interpret the metadata HARDS keeps in them.
//!
//! ## Design Principles
//!
//! - Backends store containers and objects addressed by [`ObjectPath`]
//! - Replacing writes are atomic; new subtrees are staged, then published
//! - No knowledge of datasets, datapoints or metadata formats
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - A directory tree on the local filesystem
//! - [`InMemoryBackend`] - For testing and ephemeral storage
//!
//! ## Example
//!
//! ```rust
//! use hards_storage::{InMemoryBackend, ObjectPath, StorageBackend};
//!
//! let backend = InMemoryBackend::new();
//! let path = ObjectPath::root().join("hello.txt");
//! backend.write_object(&path, b"hello world").unwrap();
//! assert_eq!(backend.read_object(&path).unwrap(), b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;
mod path;

pub use backend::{EntryKind, StorageBackend};
pub use error::{StorageError, StorageResult};
pub use file::{FileBackend, STAGING_DIR};
pub use memory::InMemoryBackend;
pub use path::ObjectPath;
