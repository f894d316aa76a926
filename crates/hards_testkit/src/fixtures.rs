//! Test fixtures and database helpers.
//!
//! Provides convenience functions for setting up test databases
//! and common test scenarios.

use hards_core::{Config, Database};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Name of the database directory inside the fixture's temporary directory.
pub const TEST_DB_NAME: &str = "test_db";

/// A test database with automatic cleanup.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestDatabase {
    /// Creates a new in-memory test database.
    pub fn memory() -> Self {
        Self {
            db: Database::create_in_memory().expect("Failed to create in-memory database"),
            temp_dir: None,
        }
    }

    /// Creates a new file-based test database.
    ///
    /// Writes are not fsynced; the temporary directory is gone after the
    /// test anyway.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join(TEST_DB_NAME);
        let config = Config::default().error_if_exists(true).sync_writes(false);
        let db = Database::open_with_config(&path, config).expect("Failed to create file database");

        Self {
            db,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the database path if file-based, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self.temp_dir.as_ref().map(|d| d.path().join(TEST_DB_NAME))
    }

    /// Returns the temporary directory if file-based, for placing source
    /// files next to the database.
    pub fn temp_dir(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }

    /// Opens a second, independent handle on the same database.
    ///
    /// # Panics
    ///
    /// Panics for in-memory databases.
    pub fn reopen(&self) -> Database {
        let path = self.path().expect("Only file databases can be reopened");
        Database::open(&path).expect("Failed to reopen database")
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Runs a test with a temporary in-memory database.
///
/// # Example
///
/// ```rust
/// use hards_testkit::with_temp_db;
/// use hards_core::prelude::*;
///
/// with_temp_db(|db| {
///     db.create_dataset("test").unwrap();
///     assert!(db.has_dataset("test").unwrap());
/// });
/// ```
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database) -> R,
{
    let test_db = TestDatabase::memory();
    f(&test_db.db)
}

/// Runs a test with a temporary file-based database.
pub fn with_file_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database, &Path) -> R,
{
    let test_db = TestDatabase::file();
    let path = test_db.path().expect("File database should have a path");
    f(&test_db.db, &path)
}

/// Writes an asset file to import into a database and returns its path.
pub fn write_asset(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("Failed to write asset");
    path
}

/// Test scenario helpers.
pub mod scenarios {
    use hards_core::prelude::*;

    /// Creates a chain of nested datasets, one per name, starting at the
    /// database, and returns them from the top down.
    pub fn chain(db: &Database, names: &[&str]) -> Vec<Dataset> {
        let mut chain: Vec<Dataset> = Vec::with_capacity(names.len());
        for name in names {
            let dataset = match chain.last() {
                Some(parent) => parent.create_dataset(name),
                None => db.create_dataset(name),
            }
            .expect("Failed to create dataset");
            chain.push(dataset);
        }
        chain
    }

    /// Creates a dataset holding `count` datapoints named `point_<i>`.
    pub fn populated_dataset(db: &Database, name: &str, count: usize) -> Dataset {
        let dataset = db.create_dataset(name).expect("Failed to create dataset");
        for i in 0..count {
            dataset
                .create_datapoint(&format!("point_{i}"))
                .expect("Failed to create datapoint");
        }
        dataset
    }
}
