//! Common test utilities for Pinny integration tests

use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

/// Address nothing listens on, so tests never reach a real API
pub const UNREACHABLE_API: &str = "http://127.0.0.1:1";

/// A test workspace for integration tests
pub struct TestWorkspace {
    /// Temporary directory
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

impl TestWorkspace {
    /// Create a new test workspace
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Write a file in workspace
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Read a file from workspace
    pub fn read_file(&self, path: &str) -> String {
        let file_path = self.path.join(path);
        std::fs::read_to_string(&file_path).expect("Failed to read file")
    }

    /// Check if a file exists in workspace
    #[allow(dead_code)]
    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    /// Sorted entry names of a workspace directory
    pub fn entries(&self, dir: &str) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.path.join(dir))
            .expect("Failed to read directory")
            .map(|e| {
                e.expect("Failed to read entry")
                    .file_name()
                    .to_string_lossy()
                    .to_string()
            })
            .collect();
        names.sort();
        names
    }

    /// A pinny command running in this workspace with a clean environment
    pub fn pinny(&self) -> Command {
        let mut cmd = pinny_cmd();
        cmd.current_dir(&self.path)
            .env_remove("GITHUB_TOKEN")
            .env_remove("PINNY_LOCKFILE")
            .env_remove("RUST_LOG")
            .env("PINNY_GITHUB_API_URL", UNREACHABLE_API);
        cmd
    }
}

// Temporary fix for deprecated cargo_bin - will be updated when build-dir issues are resolved
#[allow(deprecated)]
pub fn pinny_cmd() -> Command {
    Command::cargo_bin("pinny").expect("Failed to find pinny binary")
}
