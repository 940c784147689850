//! Remote collaborators
//!
//! The resolvers only need a handful of operations from the outside world.
//! They are expressed as traits so that the engine can be driven by the
//! blocking HTTP clients in [`github`] and [`registry`], or by in-memory
//! fakes in tests.

pub mod github;
pub mod registry;

use crate::error::Result;
use crate::reference::ImageRef;

pub use github::GithubClient;
pub use registry::RegistryClient;

const TAG_PREFIX: &str = "refs/tags/";
const BRANCH_PREFIX: &str = "refs/heads/";

/// Type of the object a ref points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Direct commit (branches and lightweight tags)
    Commit,
    /// Annotated tag object that must be dereferenced
    Tag,
    /// Anything else (trees, blobs)
    Other,
}

impl ObjectKind {
    /// Map the API's object type string
    pub fn from_api(kind: &str) -> Self {
        match kind {
            "commit" => Self::Commit,
            "tag" => Self::Tag,
            _ => Self::Other,
        }
    }
}

/// A ref as listed by the hosting API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRef {
    /// Full ref name, e.g. `refs/tags/v1`
    pub name: String,
    /// Type of the pointed-at object
    pub kind: ObjectKind,
    /// SHA of the pointed-at object
    pub sha: String,
}

impl GitRef {
    /// Create a ref entry
    pub fn new(name: impl Into<String>, kind: ObjectKind, sha: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            sha: sha.into(),
        }
    }

    /// Returns `true` for `refs/tags/*`
    pub fn is_tag(&self) -> bool {
        self.name.starts_with(TAG_PREFIX)
    }

    /// Returns `true` for `refs/heads/*`
    pub fn is_branch(&self) -> bool {
        self.name.starts_with(BRANCH_PREFIX)
    }

    /// Ref name without the `refs/tags/` or `refs/heads/` prefix
    pub fn short_name(&self) -> &str {
        self.name
            .strip_prefix(TAG_PREFIX)
            .or_else(|| self.name.strip_prefix(BRANCH_PREFIX))
            .or_else(|| self.name.strip_prefix("refs/"))
            .unwrap_or(&self.name)
    }

    /// Returns `true` if this ref is the tag named `name`
    pub fn is_tag_named(&self, name: &str) -> bool {
        self.name.strip_prefix(TAG_PREFIX) == Some(name)
    }

    /// Returns `true` if this ref is the branch named `name`
    pub fn is_branch_named(&self, name: &str) -> bool {
        self.name.strip_prefix(BRANCH_PREFIX) == Some(name)
    }
}

/// Result of comparing two revisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Head has commits the base lacks
    Ahead,
    /// Head is an ancestor of the base
    Behind,
    /// Both revisions are the same commit
    Identical,
    /// Histories diverged
    Diverged,
    /// The endpoint found no common history
    NotFound,
}

impl Comparison {
    /// Map the API's status string
    pub fn from_api(status: &str) -> Self {
        match status {
            "ahead" => Self::Ahead,
            "behind" => Self::Behind,
            "identical" => Self::Identical,
            _ => Self::Diverged,
        }
    }

    /// Returns `true` if the head is reachable from the base
    pub fn is_contained(self) -> bool {
        matches!(self, Self::Behind | Self::Identical)
    }
}

/// Operations needed from the source hosting API
pub trait HostingApi {
    /// List all refs (tags and branches) of a repository
    fn list_refs(&self, owner: &str, repo: &str) -> Result<Vec<GitRef>>;

    /// Dereference an annotated tag object to the SHA it points at
    fn annotated_tag_target(&self, owner: &str, repo: &str, sha: &str) -> Result<String>;

    /// Compare `head` against `base`
    fn compare(&self, owner: &str, repo: &str, base: &str, head: &str) -> Result<Comparison>;
}

/// Operations needed from a container registry
pub trait RegistryApi {
    /// Fetch the current manifest digest for an image reference
    fn digest(&mut self, image: &ImageRef) -> Result<String>;
}
