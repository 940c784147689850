//! Container image reference parsing.
//!
//! Handles Docker-style image references:
//! - `alpine` → `docker://docker.io/library/alpine:latest`
//! - `alpine:3.18` → `docker://docker.io/library/alpine:3.18`
//! - `docker://ghcr.io/org/app:v1` → `docker://ghcr.io/org/app:v1`
//!
//! Default-filling (registry host, official-images namespace, `latest` tag) only
//! happens in the canonical forms. The parsed fields keep exactly what was written
//! so the reference can be re-serialized verbatim.

use std::fmt;

use crate::error::{PinnyError, Result};

/// Transport prefix accepted in front of image references
pub const DOCKER_SCHEME: &str = "docker://";

/// Default registry host
pub const DEFAULT_REGISTRY: &str = "docker.io";

/// Namespace of official images on the default registry
pub const OFFICIAL_NAMESPACE: &str = "library";

/// Tag used when none is given
pub const DEFAULT_TAG: &str = "latest";

/// A parsed container image reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// The reference exactly as written in the source file
    pub raw: String,

    /// Whether the reference carried the `docker://` prefix
    pub scheme: bool,

    /// Registry host, when written
    pub host: Option<String>,

    /// Namespace path between host and name (may contain `/`)
    pub namespace: Option<String>,

    /// Image name
    pub name: String,

    /// Tag, when written
    pub tag: Option<String>,

    /// Digest, when written or after resolution
    pub digest: Option<String>,
}

impl ImageRef {
    /// Parse an image reference string
    pub fn parse(input: &str) -> Result<Self> {
        let malformed = |reason: &str| PinnyError::MalformedReference {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, body) = match input.strip_prefix(DOCKER_SCHEME) {
            Some(rest) => (true, rest),
            None => (false, input),
        };

        if body.is_empty() {
            return Err(malformed("empty image reference"));
        }
        if body.chars().any(char::is_whitespace) {
            return Err(malformed("image reference contains whitespace"));
        }

        let (path, digest) = match body.split_once('@') {
            Some((path, digest)) => {
                if !digest.contains(':') || digest.ends_with(':') || digest.starts_with(':') {
                    return Err(malformed("invalid digest"));
                }
                (path, Some(digest.to_string()))
            }
            None => (body, None),
        };

        let mut segments: Vec<&str> = path.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(malformed("empty path segment"));
        }

        let host = if segments.len() > 1 && is_registry(segments[0]) {
            Some(segments.remove(0).to_string())
        } else {
            None
        };

        let last = segments.pop().unwrap_or_default();
        let (name, tag) = match last.split_once(':') {
            Some((_, "")) => return Err(malformed("empty tag")),
            Some((name, tag)) => (name, Some(tag.to_string())),
            None => (last, None),
        };
        if name.is_empty() {
            return Err(malformed("missing image name"));
        }

        let namespace = if segments.is_empty() {
            None
        } else {
            Some(segments.join("/"))
        };

        Ok(Self {
            raw: input.to_string(),
            scheme,
            host,
            namespace,
            name: name.to_string(),
            tag,
            digest,
        })
    }

    /// Registry host with the default applied
    pub fn registry(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_REGISTRY)
    }

    /// Repository path on the registry with the official namespace applied
    pub fn repository(&self) -> String {
        match (&self.namespace, self.registry()) {
            (Some(namespace), _) => format!("{}/{}", namespace, self.name),
            (None, DEFAULT_REGISTRY) => format!("{}/{}", OFFICIAL_NAMESPACE, self.name),
            (None, _) => self.name.clone(),
        }
    }

    /// Tag with the default applied
    pub fn tag_or_default(&self) -> &str {
        self.tag.as_deref().unwrap_or(DEFAULT_TAG)
    }

    /// The manifest reference used for resolution: the digest if present, else the tag
    pub fn manifest_reference(&self) -> &str {
        self.digest
            .as_deref()
            .unwrap_or_else(|| self.tag_or_default())
    }

    /// Canonical tag form used as lock file key, e.g. `docker://docker.io/library/alpine:latest`
    pub fn canonical_tag(&self) -> String {
        format!(
            "{}{}/{}:{}",
            DOCKER_SCHEME,
            self.registry(),
            self.repository(),
            self.tag_or_default()
        )
    }

    /// Canonical form used for resolution: digest form when a digest is present
    pub fn canonical(&self) -> String {
        match &self.digest {
            Some(digest) => format!(
                "{}{}/{}@{}",
                DOCKER_SCHEME,
                self.registry(),
                self.repository(),
                digest
            ),
            None => self.canonical_tag(),
        }
    }

    /// The name as written, without scheme, tag, or digest
    pub fn original_name(&self) -> String {
        let mut name = self.name.clone();
        if let Some(namespace) = &self.namespace {
            name = format!("{namespace}/{name}");
        }
        if let Some(host) = &self.host {
            name = format!("{host}/{name}");
        }
        name
    }

    /// The name as written followed by `@digest` (tag dropped)
    pub fn pinned_name(&self) -> Option<String> {
        self.digest
            .as_ref()
            .map(|digest| format!("{}@{}", self.original_name(), digest))
    }

    /// Returns `true` for the conventionally floating tag, or no tag at all
    pub fn is_floating(&self) -> bool {
        self.tag.as_deref().is_none_or(|tag| tag == DEFAULT_TAG)
    }
}

/// Returns `true` if the first path segment names a registry host rather than a namespace
fn is_registry(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scheme {
            write!(f, "{DOCKER_SCHEME}")?;
        }
        write!(f, "{}", self.original_name())?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}
