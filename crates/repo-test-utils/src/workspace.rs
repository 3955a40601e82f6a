//! [`TestWorkspace`] builder for store, build and CLI test scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::tool;

/// Relative path of the build tool inside every test workspace.
pub const BINARY: &str = "vendor/bin/satis";

/// A temporary install root laid out the way the manager expects it:
///
/// ```text
/// <root>/satis.json        configuration document
/// <root>/var/lock/         named lock files
/// <root>/vendor/bin/satis  fake build tool (optional)
/// ```
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    /// Create an empty temporary install root.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("satis.json")
    }

    pub fn lock_dir(&self) -> PathBuf {
        self.root().join("var/lock")
    }

    pub fn composer_home(&self) -> PathBuf {
        self.root().join("var/composer")
    }

    /// Write the configuration document verbatim.
    pub fn write_config(&self, content: &str) -> &Self {
        fs::write(self.config_path(), content).unwrap();
        self
    }

    /// Read the configuration document back.
    ///
    /// # Panics
    /// Panics if the file does not exist.
    pub fn read_config(&self) -> String {
        fs::read_to_string(self.config_path())
            .unwrap_or_else(|_| panic!("Could not read {}", self.config_path().display()))
    }

    /// Install a fake build tool exiting with `exit_code`.
    pub fn install_build_tool(&self, exit_code: i32) -> &Self {
        tool::write_build_tool(self.root(), BINARY, exit_code);
        self
    }

    /// Install a fake build tool that sleeps for `seconds`.
    pub fn install_slow_tool(&self, seconds: u32) -> &Self {
        tool::write_slow_tool(self.root(), BINARY, seconds);
        self
    }

    /// Argument lines recorded by the fake build tool.
    pub fn invocations(&self) -> Vec<String> {
        tool::invocations(self.root())
    }

    /// Assert that `path` (relative to the root) exists.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the root) does **not** exist.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }
}
