//! Database manifest for metadata storage.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Name of the manifest object at the database root.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Database manifest.
///
/// The manifest stores:
/// - Format version
/// - Creation time
///
/// Databases written before manifests existed have none; they open as
/// format version 1.0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Format version (major, minor).
    pub format_version: (u16, u16),
    /// When the database was created (Unix timestamp in milliseconds).
    pub created_at_ms: u64,
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new((1, 0))
    }
}

impl Manifest {
    /// Creates a manifest stamped with the current time.
    #[must_use]
    pub fn new(format_version: (u16, u16)) -> Self {
        Self {
            format_version,
            created_at_ms: unix_millis(),
        }
    }

    /// Returns true if a database with this manifest can be opened by a
    /// reader expecting `expected`.
    #[must_use]
    pub fn is_compatible(&self, expected: (u16, u16)) -> bool {
        self.format_version.0 == expected.0
    }

    /// Encodes the manifest to bytes.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Decodes a manifest from bytes.
    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        serde_json::from_slice(data)
            .map_err(|e| CoreError::corrupt_state(MANIFEST_FILE, format!("unparsable manifest: {e}")))
    }
}

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
