//! Error types for HARDS core.

use crate::types::EntityKind;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in HARDS core operations.
///
/// Every variant carries the name or location it is about. Failed mutating
/// calls leave the previously persisted state of the node unchanged.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] hards_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A name violates the allowed character set or shape.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A sibling of the same kind already has this name.
    #[error("{kind} {name:?} already exists in {parent}")]
    NameConflict {
        /// The namespace the conflict is in.
        kind: EntityKind,
        /// The conflicting name.
        name: String,
        /// Full path of the parent node.
        parent: String,
    },

    /// A dataset, datapoint or file does not exist.
    #[error("{kind} {name:?} not found in {parent}")]
    NotFound {
        /// What was looked up.
        kind: EntityKind,
        /// The unresolved name.
        name: String,
        /// Full path of the node it was looked up in.
        parent: String,
    },

    /// The source of a file import does not exist or is not a regular file.
    #[error("source file not found: {}", path.display())]
    SourceNotFound {
        /// The source location.
        path: PathBuf,
    },

    /// No database exists at the location.
    #[error("database not found at {location}")]
    DatabaseNotFound {
        /// The database location.
        location: String,
    },

    /// A database cannot be created because the location is occupied.
    #[error("database location already exists: {location}")]
    AlreadyExists {
        /// The database location.
        location: String,
    },

    /// Persisted state is present but unreadable or malformed.
    #[error("corrupt state at {location}: {message}")]
    CorruptState {
        /// Where the problem was found.
        location: String,
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid name error.
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a name conflict error.
    pub fn name_conflict(kind: EntityKind, name: impl Into<String>, parent: impl fmt::Display) -> Self {
        Self::NameConflict {
            kind,
            name: name.into(),
            parent: parent.to_string(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(kind: EntityKind, name: impl Into<String>, parent: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
            parent: parent.to_string(),
        }
    }

    /// Creates a corrupt state error.
    pub fn corrupt_state(location: impl fmt::Display, message: impl Into<String>) -> Self {
        Self::CorruptState {
            location: location.to_string(),
            message: message.into(),
        }
    }

    /// Returns true for every error meaning "the thing asked for is absent":
    /// [`CoreError::NotFound`], [`CoreError::SourceNotFound`] and
    /// [`CoreError::DatabaseNotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::SourceNotFound { .. } | Self::DatabaseNotFound { .. }
        )
    }
}
