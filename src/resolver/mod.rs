//! Reference resolution
//!
//! This module handles:
//! - Resolving step references to commit SHAs (see [`action`])
//! - Resolving image references to manifest digests (see [`image`])
//! - Memoizing results for the duration of one run (see [`cache`])
//! - Enforcing strict mode for unresolvable step references
//!
//! A [`Resolver`] is the per-run context. It owns the remote collaborators
//! and the caches; nothing here is global.

pub mod action;
pub mod cache;
pub mod image;
pub mod warning;

use crate::client::{HostingApi, RegistryApi};
use crate::error::{PinnyError, Result};
use crate::reference::{ActionRef, ImageRef};

pub use action::{ActionResolution, ResolutionStatus};
pub use cache::ResolutionCache;
pub use warning::ResolutionWarning;

/// A step reference after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAction {
    /// The parsed reference; `digest` is set only when pinned
    pub reference: ActionRef,
    /// Resolution status
    pub status: ResolutionStatus,
    /// Warnings raised on first resolution
    pub warnings: Vec<ResolutionWarning>,
}

impl ResolvedAction {
    /// Returns `true` when the reference resolved to a commit
    pub fn is_pinned(&self) -> bool {
        self.status == ResolutionStatus::Resolved
    }
}

/// Per-run resolution context
pub struct Resolver {
    hosting: Box<dyn HostingApi>,
    registry: Box<dyn RegistryApi>,
    actions: ResolutionCache<ResolvedAction>,
    images: ResolutionCache<ImageRef>,
    strict: bool,
}

impl Resolver {
    /// Create a resolver around the given collaborators
    pub fn new(hosting: Box<dyn HostingApi>, registry: Box<dyn RegistryApi>) -> Self {
        Self {
            hosting,
            registry,
            actions: ResolutionCache::new(),
            images: ResolutionCache::new(),
            strict: false,
        }
    }

    /// Fail on step references that cannot be pinned instead of leaving them as written
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Resolve a raw step reference (`owner/repo[/path]@ref`)
    ///
    /// Unresolvable references succeed with no digest unless strict mode is
    /// on. In strict mode a full commit SHA that is reachable from some tag or
    /// branch is still accepted, since it is already immutable.
    pub fn resolve_action(&mut self, raw: &str) -> Result<ResolvedAction> {
        if let Some(cached) = self.actions.get(raw) {
            tracing::debug!("Cache hit for {}", raw);
            return Ok(cached.clone());
        }

        let mut reference = ActionRef::parse(raw)?;
        let resolution = action::resolve(
            self.hosting.as_ref(),
            &reference.owner,
            &reference.repo,
            &reference.git_ref,
        )?;

        if self.strict && !resolution.is_pinned() {
            let accepted = reference.is_full_sha()
                && resolution.status == (ResolutionStatus::Unresolved { reachable: true });
            if !accepted {
                return Err(PinnyError::UnresolvedReference {
                    reference: reference.name_with_ref(),
                });
            }
        }

        if resolution.is_pinned() {
            reference.digest = Some(resolution.digest);
            reference.alias_refs = resolution.alias_refs;
        }

        let resolved = ResolvedAction {
            reference,
            status: resolution.status,
            warnings: resolution.warnings,
        };
        self.actions.put(raw, resolved.clone());
        Ok(resolved)
    }

    /// Resolve a raw image reference to a copy carrying its manifest digest
    pub fn resolve_image(&mut self, raw: &str) -> Result<ImageRef> {
        if let Some(cached) = self.images.get(raw) {
            tracing::debug!("Cache hit for {}", raw);
            return Ok(cached.clone());
        }

        let parsed = ImageRef::parse(raw)?;
        let resolved = image::resolve(self.registry.as_mut(), &parsed)?;
        self.images.put(raw, resolved.clone());
        Ok(resolved)
    }
}
