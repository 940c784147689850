//! Staged writes for atomic file replacement
//!
//! Every output is first written to a temporary sibling of its target, so the
//! rename that publishes it never crosses filesystems. Nothing becomes visible
//! until [`Transaction::commit`]; a transaction dropped before commit removes
//! all of its temporary files and leaves the targets untouched.
//!
//! ## Usage
//!
//! ```ignore
//! let mut transaction = Transaction::new();
//! transaction.stage(&path, &rewritten)?;
//!
//! // On success:
//! transaction.commit()?;
//!
//! // On error (automatic via Drop if not committed):
//! // staged temp files are removed
//! ```

use std::fs::{self, Permissions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{PinnyError, Result};

/// One output waiting to be published
#[derive(Debug)]
struct StagedFile {
    /// Final destination
    target: PathBuf,
    /// Temporary sibling holding the new content
    file: NamedTempFile,
}

/// A set of outputs published together
#[derive(Debug, Default)]
pub struct Transaction {
    staged: Vec<StagedFile>,
}

impl Transaction {
    /// Create an empty transaction
    pub fn new() -> Self {
        Self { staged: Vec::new() }
    }

    /// Write `content` to a temporary file next to `target`
    pub fn stage(&mut self, target: &Path, content: &str) -> Result<()> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut file = tempfile::Builder::new()
            .prefix(&format!(".{name}."))
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| write_error(target, e))?;
        file.write_all(content.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| write_error(file.path(), e))?;

        if let Some(permissions) = target_permissions(target) {
            fs::set_permissions(file.path(), permissions)
                .map_err(|e| write_error(file.path(), e))?;
        }

        tracing::debug!("Staged {} at {}", target.display(), file.path().display());
        self.staged.push(StagedFile {
            target: target.to_path_buf(),
            file,
        });
        Ok(())
    }

    /// Number of staged outputs
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// Returns `true` if nothing was staged
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Publish every staged output by renaming it over its target
    ///
    /// On a rename failure the remaining temp files are removed; outputs
    /// renamed before the failure stay published.
    pub fn commit(mut self) -> Result<()> {
        for staged in std::mem::take(&mut self.staged) {
            staged
                .file
                .persist(&staged.target)
                .map_err(|e| write_error(&staged.target, e.error))?;
            tracing::debug!("Wrote {}", staged.target.display());
        }
        Ok(())
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.staged.is_empty() {
            tracing::debug!("Discarding {} staged file(s)", self.staged.len());
        }
    }
}

/// Write `content` to `target` atomically
pub fn write_atomic(target: &Path, content: &str) -> Result<()> {
    let mut transaction = Transaction::new();
    transaction.stage(target, content)?;
    transaction.commit()
}

/// Permissions for the replacement: the target's own, or 0644 for new files
fn target_permissions(target: &Path) -> Option<Permissions> {
    if let Ok(metadata) = fs::metadata(target) {
        return Some(metadata.permissions());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Some(Permissions::from_mode(0o644))
    }
    #[cfg(not(unix))]
    {
        None
    }
}

fn write_error(path: &Path, err: std::io::Error) -> PinnyError {
    PinnyError::FileWriteFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{create_temp_dir, dir_entries};

    #[test]
    fn test_commit_replaces_targets() {
        let temp = create_temp_dir();
        let a = temp.path().join("a.yml");
        let b = temp.path().join("b.yml");
        fs::write(&a, "old a").unwrap();

        let mut transaction = Transaction::new();
        transaction.stage(&a, "new a").unwrap();
        transaction.stage(&b, "new b").unwrap();
        assert_eq!(transaction.len(), 2);
        assert_eq!(fs::read_to_string(&a).unwrap(), "old a");
        assert!(!b.exists());

        transaction.commit().unwrap();
        assert_eq!(fs::read_to_string(&a).unwrap(), "new a");
        assert_eq!(fs::read_to_string(&b).unwrap(), "new b");
        assert_eq!(dir_entries(temp.path()), vec!["a.yml", "b.yml"]);
    }

    #[test]
    fn test_drop_discards_staged_files() {
        let temp = create_temp_dir();
        let a = temp.path().join("a.yml");
        fs::write(&a, "old").unwrap();

        {
            let mut transaction = Transaction::new();
            transaction.stage(&a, "new").unwrap();
            assert_eq!(dir_entries(temp.path()).len(), 2);
        }

        assert_eq!(fs::read_to_string(&a).unwrap(), "old");
        assert_eq!(dir_entries(temp.path()), vec!["a.yml"]);
    }

    #[test]
    fn test_staged_file_is_hidden_sibling() {
        let temp = create_temp_dir();
        let target = temp.path().join("Dockerfile");

        let mut transaction = Transaction::new();
        transaction.stage(&target, "FROM alpine\n").unwrap();
        let entries = dir_entries(temp.path());
        assert_eq!(entries.len(), 1);
        assert!(entries[0].starts_with(".Dockerfile."));
        assert!(entries[0].ends_with(".tmp"));
        assert_eq!(transaction.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_commit_keeps_target_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = create_temp_dir();
        let target = temp.path().join("script.yml");
        fs::write(&target, "old").unwrap();
        fs::set_permissions(&target, Permissions::from_mode(0o755)).unwrap();

        write_atomic(&target, "new").unwrap();
        let mode = fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_stage_into_missing_dir_fails() {
        let temp = create_temp_dir();
        let target = temp.path().join("missing/out.json");
        let mut transaction = Transaction::new();
        let err = transaction.stage(&target, "{}").unwrap_err();
        assert!(matches!(err, PinnyError::FileWriteFailed { .. }));
        assert!(transaction.is_empty());
    }
}
