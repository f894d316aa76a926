//! Error types for storage operations.

use crate::path::ObjectPath;
use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Nothing is stored at the requested path.
    #[error("no entry at {path}")]
    NotFound {
        /// The path that was looked up.
        path: ObjectPath,
    },

    /// The destination of a create or publish is already occupied.
    #[error("entry already exists at {path}")]
    AlreadyExists {
        /// The occupied path.
        path: ObjectPath,
    },

    /// A path segment cannot be mapped onto the backend safely.
    #[error("invalid path segment {segment:?} in {path}")]
    InvalidPath {
        /// The full path.
        path: ObjectPath,
        /// The offending segment.
        segment: String,
    },

    /// An object was found where a container was expected, or the reverse.
    #[error("unexpected entry kind at {path}")]
    WrongKind {
        /// The path with the unexpected entry.
        path: ObjectPath,
    },
}

impl StorageError {
    /// Creates a not found error.
    pub fn not_found(path: &ObjectPath) -> Self {
        Self::NotFound { path: path.clone() }
    }

    /// Creates an already exists error.
    pub fn already_exists(path: &ObjectPath) -> Self {
        Self::AlreadyExists { path: path.clone() }
    }

    /// Creates a wrong kind error.
    pub fn wrong_kind(path: &ObjectPath) -> Self {
        Self::WrongKind { path: path.clone() }
    }

    /// Returns true for [`StorageError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for [`StorageError::AlreadyExists`].
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}
