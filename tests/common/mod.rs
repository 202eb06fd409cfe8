//! Shared utilities for integration tests.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A rule file living in its own temporary directory.
pub struct RulesFixture {
    _dir: TempDir,
    path: PathBuf,
}

impl RulesFixture {
    pub fn new(contents: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autoresponder.rules");
        std::fs::write(&path, contents).unwrap();
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file contents atomically (write then rename).
    #[allow(dead_code)]
    pub fn replace(&self, contents: &str) {
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, contents).unwrap();
        std::fs::rename(&tmp, &self.path).unwrap();
    }

    #[allow(dead_code)]
    pub fn remove(&self) {
        std::fs::remove_file(&self.path).unwrap();
    }
}
