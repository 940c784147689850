//! Test fixtures and in-memory fakes for the remote collaborators.
//!
//! The fakes record how often they were called so tests can assert on
//! memoization and on which remote calls an operation performs.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_fixtures::{FakeHosting, FakeRegistry, create_temp_dir};
//!
//! let hosting = FakeHosting::new().with_ref("refs/tags/v1", ObjectKind::Commit, SHA);
//! let calls = hosting.list_calls_handle();
//! let mut resolver = Resolver::new(Box::new(hosting), Box::new(FakeRegistry::new()));
//! ```

#![allow(clippy::expect_used)]

use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::TempDir;

use crate::client::{Comparison, GitRef, HostingApi, ObjectKind, RegistryApi};
use crate::error::{PinnyError, Result};
use crate::reference::ImageRef;

/// Absolute base for temp dirs so they never land under the working directory
fn temp_dir_base() -> PathBuf {
    let t = std::env::temp_dir();
    if t.is_absolute() {
        t
    } else {
        PathBuf::from("/tmp")
    }
}

/// Create a temp directory in the system temp location.
///
/// # Panics
///
/// Panics if the temp directory cannot be created.
#[must_use]
pub fn create_temp_dir() -> TempDir {
    TempDir::new_in(temp_dir_base()).expect("Failed to create temp directory")
}

/// Create test files in a directory.
///
/// Takes a list of (path, content) tuples. Paths are relative to `base`.
///
/// # Panics
///
/// Panics if any file cannot be created.
pub fn create_test_files(base: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let full_path = base.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&full_path, content).expect("Failed to write test file");
    }
}

/// List the names of all entries in `dir`, sorted.
///
/// # Panics
///
/// Panics if the directory cannot be read.
#[must_use]
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
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

/// In-memory hosting API
#[derive(Default)]
pub struct FakeHosting {
    refs: Vec<GitRef>,
    annotated: HashMap<String, String>,
    comparisons: HashMap<String, Comparison>,
    failing: bool,
    list_calls: Rc<Cell<usize>>,
    compare_calls: Rc<Cell<usize>>,
}

impl FakeHosting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listed ref
    pub fn with_ref(mut self, name: &str, kind: ObjectKind, sha: &str) -> Self {
        self.refs.push(GitRef::new(name, kind, sha));
        self
    }

    /// Make the annotated tag object `tag_sha` point at `target`
    pub fn with_annotated_tag(mut self, tag_sha: &str, target: &str) -> Self {
        self.annotated
            .insert(tag_sha.to_string(), target.to_string());
        self
    }

    /// Answer comparisons against `base` with `comparison`. Unset bases are `NotFound`.
    pub fn with_comparison(mut self, base: &str, comparison: Comparison) -> Self {
        self.comparisons.insert(base.to_string(), comparison);
        self
    }

    /// Fail every call as if the API were unreachable
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Shared counter of `list_refs` calls, usable after the fake is boxed
    pub fn list_calls_handle(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.list_calls)
    }

    /// Number of `compare` calls so far
    pub fn compare_calls(&self) -> usize {
        self.compare_calls.get()
    }

    fn check(&self, owner: &str, repo: &str) -> Result<()> {
        if self.failing {
            return Err(PinnyError::RemoteUnavailable {
                target: format!("{owner}/{repo}"),
                reason: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

impl HostingApi for FakeHosting {
    fn list_refs(&self, owner: &str, repo: &str) -> Result<Vec<GitRef>> {
        self.list_calls.set(self.list_calls.get() + 1);
        self.check(owner, repo)?;
        Ok(self.refs.clone())
    }

    fn annotated_tag_target(&self, owner: &str, repo: &str, sha: &str) -> Result<String> {
        self.check(owner, repo)?;
        self.annotated
            .get(sha)
            .cloned()
            .ok_or_else(|| PinnyError::RemoteUnavailable {
                target: format!("{owner}/{repo}"),
                reason: format!("HTTP 404: tag {sha} not found"),
            })
    }

    fn compare(&self, owner: &str, repo: &str, base: &str, _head: &str) -> Result<Comparison> {
        self.compare_calls.set(self.compare_calls.get() + 1);
        self.check(owner, repo)?;
        Ok(self
            .comparisons
            .get(base)
            .copied()
            .unwrap_or(Comparison::NotFound))
    }
}

/// In-memory registry keyed by canonical image reference
#[derive(Default)]
pub struct FakeRegistry {
    digests: HashMap<String, String>,
    calls: Rc<Cell<usize>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `digest` for the canonical reference `canonical`
    pub fn with_digest(mut self, canonical: &str, digest: &str) -> Self {
        self.digests
            .insert(canonical.to_string(), digest.to_string());
        self
    }

    /// Shared counter of `digest` calls, usable after the fake is boxed
    pub fn calls_handle(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.calls)
    }
}

impl RegistryApi for FakeRegistry {
    fn digest(&mut self, image: &ImageRef) -> Result<String> {
        self.calls.set(self.calls.get() + 1);
        self.digests
            .get(&image.canonical())
            .cloned()
            .ok_or_else(|| PinnyError::RemoteUnavailable {
                target: image.canonical(),
                reason: "manifest not found".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_temp_dir() {
        let temp = create_temp_dir();
        assert!(temp.path().exists());
        assert!(temp.path().is_absolute());
    }

    #[test]
    fn test_create_test_files() {
        let temp = create_temp_dir();
        create_test_files(temp.path(), &[("a/b.txt", "x"), ("c.txt", "y")]);
        assert_eq!(dir_entries(temp.path()), vec!["a", "c.txt"]);
        assert_eq!(
            std::fs::read_to_string(temp.path().join("a/b.txt")).unwrap(),
            "x"
        );
    }

    #[test]
    fn test_fake_hosting_counts_calls() {
        let hosting = FakeHosting::new().with_ref("refs/tags/v1", ObjectKind::Commit, "a");
        let calls = hosting.list_calls_handle();
        hosting.list_refs("o", "r").unwrap();
        hosting.list_refs("o", "r").unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_fake_registry_missing_is_remote_error() {
        let mut registry = FakeRegistry::new();
        let image = ImageRef::parse("alpine").unwrap();
        assert!(matches!(
            registry.digest(&image),
            Err(PinnyError::RemoteUnavailable { .. })
        ));
    }
}
