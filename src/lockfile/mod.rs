//! Lock file (pinny-lock.json)
//!
//! Maps canonical image references (tag form) to manifest digests so a
//! Dockerfile can later be pinned without network access. The file also
//! records when and by what it was generated.

pub mod serialization;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::dockerfile::Dockerfile;
use crate::error::{PinnyError, Result};
use crate::lockfile::serialization::{deserialize_lockfile, serialize_lockfile};
use crate::reference::ImageRef;
use crate::resolver::Resolver;
use crate::text::SourceText;
use crate::transaction;

/// Default lock file name
pub const DEFAULT_LOCKFILE: &str = "pinny-lock.json";

/// Sentinel key holding the generation timestamp
pub const GENERATED_AT_KEY: &str = "generated_at";

/// Sentinel key holding the generator name
pub const GENERATED_BY_KEY: &str = "generated_by";

/// Value written under [`GENERATED_BY_KEY`]
pub const GENERATOR: &str = "Pinny";

/// Generation metadata stored next to the entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockMetadata {
    pub generated_at: Option<String>,
    pub generated_by: Option<String>,
}

/// Lock file contents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockFile {
    /// Canonical tag-form reference to digest
    pub entries: BTreeMap<String, String>,
    pub metadata: LockMetadata,
}

impl Serialize for LockFile {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serialize_lockfile(&self.entries, &self.metadata, serializer)
    }
}

impl<'de> Deserialize<'de> for LockFile {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (entries, metadata) = deserialize_lockfile(deserializer)?;
        Ok(Self { entries, metadata })
    }
}

impl LockFile {
    /// Create an empty lock file
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse lock file JSON. `path` labels errors.
    pub fn from_json(path: &str, json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PinnyError::LockFileParseFailed {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Serialize to pretty JSON with four-space indentation
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)
            .map_err(|e| PinnyError::IoError {
                message: e.to_string(),
            })?;
        String::from_utf8(buf).map_err(|e| PinnyError::IoError {
            message: e.to_string(),
        })
    }

    /// Load a lock file, failing with `LockFileMissing` if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PinnyError::LockFileMissing {
                path: path.display().to_string(),
            });
        }
        let content = fs::read_to_string(path).map_err(|e| PinnyError::FileReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&path.display().to_string(), &content)
    }

    /// Load a lock file, or start empty if it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(PinnyError::LockFileMissing { .. }) => Ok(Self::new()),
            other => other,
        }
    }

    /// Write atomically to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut content = self.to_json()?;
        content.push('\n');
        transaction::write_atomic(path, &content)
    }

    /// Digest recorded for an exact canonical key
    pub fn get(&self, canonical: &str) -> Option<&str> {
        self.entries.get(canonical).map(String::as_str)
    }

    /// Digest recorded for an image, looked up by its canonical tag form
    pub fn lookup(&self, image: &ImageRef) -> Result<&str> {
        let key = image.canonical_tag();
        self.get(&key)
            .ok_or(PinnyError::DigestNotFound { reference: key })
    }

    /// Record a digest for a canonical key
    pub fn insert(&mut self, canonical: impl Into<String>, digest: impl Into<String>) {
        self.entries.insert(canonical.into(), digest.into());
    }

    /// Stamp the generation metadata
    pub fn stamp(&mut self, generated_at: impl Into<String>) {
        self.metadata = LockMetadata {
            generated_at: Some(generated_at.into()),
            generated_by: Some(GENERATOR.to_string()),
        };
    }
}

/// Resolve every pinnable image in `dockerfile` and merge the digests into the
/// lock file at `lock_path`
///
/// Each distinct canonical reference is resolved once. Entries already in the
/// lock file for other images are kept. Nothing is written unless every
/// image resolves.
pub fn generate(
    dockerfile: &Path,
    lock_path: &Path,
    resolver: &mut Resolver,
    generated_at: &str,
) -> Result<LockFile> {
    let source = SourceText::read(dockerfile)?;
    let parsed = Dockerfile::parse(&dockerfile.display().to_string(), &source.texts())?;
    let mut lock = LockFile::load_or_default(lock_path)?;

    let mut seen = BTreeSet::new();
    for (_, from) in parsed.from_instructions() {
        if !from.base.is_pinnable() {
            tracing::debug!("Skipping {}", from.image);
            continue;
        }
        let image = ImageRef::parse(&from.image)?;
        let key = image.canonical_tag();
        if !seen.insert(key.clone()) {
            continue;
        }

        let resolved = resolver.resolve_image(&from.image)?;
        if let Some(digest) = resolved.digest {
            lock.insert(key, digest);
        }
    }

    lock.stamp(generated_at);
    lock.save(lock_path)?;
    tracing::debug!(
        "Wrote {} entries to {}",
        lock.entries.len(),
        lock_path.display()
    );
    Ok(lock)
}
