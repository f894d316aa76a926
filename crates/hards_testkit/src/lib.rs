//! # HARDS Testkit
//!
//! Test utilities for HARDS.
//!
//! This crate provides:
//! - Test fixtures and database helpers
//! - Property-based test generators using proptest
//! - Log output for tests
//!
//! The cross-crate integration tests live in this crate's `tests/`
//! directory.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hards_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_database() {
//!     with_temp_db(|db| {
//!         let dataset = db.create_dataset("test").unwrap();
//!         // ... test operations
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod logging;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::*;
    pub use hards_core::prelude::*;
}

pub use fixtures::*;
pub use generators::*;
pub use logging::*;
