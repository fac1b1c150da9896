//! Test support utilities for secrets-api integration tests.
//!
//! Provides an isolated CLI environment and in-process service fixtures.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use tempfile::TempDir;

/// Test environment with an isolated temp directory.
///
/// Child processes use `.current_dir()` so tests can run in parallel.
pub struct Test {
    /// Temporary working directory
    pub dir: TempDir,
}

impl Test {
    /// Create a new empty test environment.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        Self { dir }
    }

    /// Absolute path of `name` inside the test directory.
    pub fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }
}
