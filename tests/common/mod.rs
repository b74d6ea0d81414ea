//! Test utilities for yapdict integration tests.
//!
//! Provides:
//! - Temporary database fixtures
//! - Store openers with short busy timeouts

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use yapdict::Store;

/// Test fixture that manages a temporary database directory.
///
/// The directory is automatically cleaned up when the fixture is dropped.
pub struct TestFixture {
    /// Temporary directory for test database
    pub temp_dir: TempDir,
    /// Path to the database file
    pub db_path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with a temporary database directory.
    pub fn new() -> Self {
        yapdict::observability::tracing::init_test_tracing();
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        Self { temp_dir, db_path }
    }

    /// Open a store on the fixture's database file.
    pub fn open(&self) -> Store {
        Store::open(&self.db_path).expect("failed to open store")
    }

    /// Open a store that gives up on the write lock after `timeout`.
    pub fn open_with_timeout(&self, timeout: Duration) -> Store {
        Store::open_with_timeout(&self.db_path, timeout).expect("failed to open store")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
