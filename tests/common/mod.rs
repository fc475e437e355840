//! Shared fixtures for sqlite-object integration tests.
//!
//! Provides:
//! - A temporary directory holding durable store files
//! - Config helpers for opening containers inside it

#![allow(dead_code)]

use sqlite_object::StoreConfig;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test fixture that manages a temporary store directory.
///
/// The directory is automatically cleaned up when the fixture is dropped.
pub struct TestFixture {
    /// Temporary directory for store files
    pub temp_dir: TempDir,
    /// Path to the default store file
    pub db_path: PathBuf,
}

impl TestFixture {
    /// Create a new fixture with an empty temporary directory.
    pub fn new() -> Self {
        sqlite_object::observability::tracing::init_test_tracing();
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite3");
        Self { temp_dir, db_path }
    }

    /// Config for the default store file that keeps it on close.
    pub fn durable(&self) -> StoreConfig {
        StoreConfig::at(&self.db_path).with_persist(true)
    }

    /// Config for the default store file that deletes it on close.
    pub fn disposable(&self) -> StoreConfig {
        StoreConfig::at(&self.db_path)
    }

    /// Durable config for a named container in the default store file.
    pub fn named(&self, name: &str) -> StoreConfig {
        self.durable().with_name(name)
    }

    /// Whether the default store file exists.
    pub fn db_exists(&self) -> bool {
        self.db_path.exists()
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.temp_dir.path().exists());
        assert!(!fixture.db_exists());
    }
}
