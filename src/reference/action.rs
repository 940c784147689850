//! Step reference (`owner/repo[/path]@ref`) parsing and formatting

use std::fmt;

use crate::error::{PinnyError, Result};

/// Length of a full commit SHA
pub const FULL_SHA_LEN: usize = 40;

/// A parsed pipeline-step reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRef {
    /// The reference exactly as written in the source file
    pub raw: String,

    /// Repository owner
    pub owner: String,

    /// Repository name
    pub repo: String,

    /// Sub-path for composite actions living inside a larger repository
    pub path: Option<String>,

    /// User-supplied mutable pointer (tag, branch, or hash prefix)
    pub git_ref: String,

    /// Resolved commit SHA (populated after resolution)
    pub digest: Option<String>,

    /// Other ref names pointing at the same commit
    pub alias_refs: Vec<String>,
}

impl ActionRef {
    /// Parse a step reference
    pub fn parse(input: &str) -> Result<Self> {
        let malformed = |reason: &str| PinnyError::MalformedReference {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (name, git_ref) = input
            .split_once('@')
            .ok_or_else(|| malformed("missing @ref"))?;
        if git_ref.is_empty() {
            return Err(malformed("empty ref"));
        }

        let mut segments = name.splitn(3, '/');
        let owner = segments.next().unwrap_or_default();
        let repo = segments.next().unwrap_or_default();
        let path = segments.next();

        if owner.is_empty() {
            return Err(malformed("missing owner"));
        }
        if repo.is_empty() {
            return Err(malformed("missing repository"));
        }
        if path.is_some_and(str::is_empty) {
            return Err(malformed("empty sub-path"));
        }

        Ok(Self {
            raw: input.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            path: path.map(str::to_string),
            git_ref: git_ref.to_string(),
            digest: None,
            alias_refs: Vec::new(),
        })
    }

    /// `owner/repo[/path]` without any ref
    pub fn name(&self) -> String {
        match &self.path {
            Some(path) => format!("{}/{}/{}", self.owner, self.repo, path),
            None => format!("{}/{}", self.owner, self.repo),
        }
    }

    /// `owner/repo[/path]@ref`
    pub fn name_with_ref(&self) -> String {
        format!("{}@{}", self.name(), self.git_ref)
    }

    /// `owner/repo[/path]@digest`, or `None` before resolution
    pub fn name_with_digest(&self) -> Option<String> {
        self.digest
            .as_ref()
            .map(|digest| format!("{}@{}", self.name(), digest))
    }

    /// Returns `true` if the ref already looks like a full commit SHA
    pub fn is_full_sha(&self) -> bool {
        self.git_ref.len() == FULL_SHA_LEN && self.git_ref.chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl fmt::Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name_with_ref())
    }
}
