//! Backend-relative paths.

use std::fmt;

/// A path inside a storage backend, relative to the backend root.
///
/// Paths are plain sequences of segments. Backends refuse segments that
/// would escape the root or alias another entry (empty, `.`, `..`, or
/// anything containing a separator); see [`ObjectPath::invalid_segment`].
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectPath {
    segments: Vec<String>,
}

impl ObjectPath {
    /// The backend root.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Returns a new path with `segment` appended.
    #[must_use]
    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Returns the parent path, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Returns the last segment, or `None` for the root.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns the segments of this path.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns true if this is the backend root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns true if `self` equals `other` or lies below it.
    #[must_use]
    pub fn starts_with(&self, other: &ObjectPath) -> bool {
        self.segments.starts_with(&other.segments)
    }

    /// Returns the first segment that cannot be stored safely, if any.
    #[must_use]
    pub fn invalid_segment(&self) -> Option<&str> {
        self.segments
            .iter()
            .map(String::as_str)
            .find(|s| s.is_empty() || *s == "." || *s == ".." || s.contains(['/', '\\', '\0']))
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        f.write_str(&self.segments.join("/"))
    }
}

impl<S: Into<String>> FromIterator<S> for ObjectPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}
