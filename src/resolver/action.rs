//! Step reference resolution
//!
//! Resolves `owner/repo@ref` to a commit SHA using the hosting API:
//! 1. Exact ref name match (tags before branches)
//! 2. Shortened commit hash prefix match
//! 3. Unresolved fallback with impostor commit detection
//!
//! Annotated tags are dereferenced to their target commit, and every other
//! ref pointing at the same commit is reported as an alias.

use crate::client::{GitRef, HostingApi, ObjectKind};
use crate::error::Result;

use super::ResolutionWarning;

/// Whether a resolution produced a real pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStatus {
    /// The ref matched a tag, branch, or commit hash
    Resolved,
    /// Nothing matched; the digest is the literal input ref.
    /// `reachable` is `true` when some tag or branch history contains it.
    Unresolved { reachable: bool },
}

/// Outcome of resolving one step reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResolution {
    /// Full commit SHA, or the literal ref when unresolved
    pub digest: String,
    /// Other ref names pointing at the same commit
    pub alias_refs: Vec<String>,
    /// Resolution status
    pub status: ResolutionStatus,
    /// Advisory conditions found while resolving
    pub warnings: Vec<ResolutionWarning>,
}

impl ActionResolution {
    /// Returns `true` only when the digest is a genuine resolution
    pub fn is_pinned(&self) -> bool {
        self.status == ResolutionStatus::Resolved
    }
}

/// Resolve a ref of `owner/repo` to a commit SHA
pub fn resolve(
    api: &dyn HostingApi,
    owner: &str,
    repo: &str,
    git_ref: &str,
) -> Result<ActionResolution> {
    let target = format!("{owner}/{repo}@{git_ref}");
    let refs = api.list_refs(owner, repo)?;
    let mut warnings = Vec::new();

    let matched = match find_exact(&refs, git_ref) {
        Some((found, is_branch)) => {
            if is_branch {
                warnings.push(ResolutionWarning::MutableRef {
                    reference: target.clone(),
                });
            }
            Some(found)
        }
        None => find_short_hash(&refs, git_ref).inspect(|found| {
            if found.sha != git_ref {
                warnings.push(ResolutionWarning::ShortHash {
                    reference: target.clone(),
                    full_sha: found.sha.clone(),
                });
            }
        }),
    };

    let Some(matched) = matched else {
        warnings.push(ResolutionWarning::Unresolved {
            reference: target.clone(),
        });
        let reachable = is_reachable(api, owner, repo, &refs, git_ref)?;
        if !reachable {
            warnings.push(ResolutionWarning::Impostor {
                reference: target.clone(),
            });
        }
        emit(&warnings);
        return Ok(ActionResolution {
            digest: git_ref.to_string(),
            alias_refs: Vec::new(),
            status: ResolutionStatus::Unresolved { reachable },
            warnings,
        });
    };

    let digest = match matched.kind {
        ObjectKind::Tag => api.annotated_tag_target(owner, repo, &matched.sha)?,
        ObjectKind::Commit | ObjectKind::Other => matched.sha.clone(),
    };

    let alias_refs = collect_aliases(&refs, matched, &digest);

    tracing::debug!("Resolved {} to {}", target, digest);
    emit(&warnings);
    Ok(ActionResolution {
        digest,
        alias_refs,
        status: ResolutionStatus::Resolved,
        warnings,
    })
}

/// Find a tag named `git_ref`, else a branch. The flag is `true` for branches.
fn find_exact<'a>(refs: &'a [GitRef], git_ref: &str) -> Option<(&'a GitRef, bool)> {
    refs.iter()
        .find(|r| r.is_tag_named(git_ref))
        .map(|r| (r, false))
        .or_else(|| {
            refs.iter()
                .find(|r| r.is_branch_named(git_ref))
                .map(|r| (r, true))
        })
}

/// First ref pointing directly at a commit whose SHA starts with `git_ref`
fn find_short_hash<'a>(refs: &'a [GitRef], git_ref: &str) -> Option<&'a GitRef> {
    refs.iter()
        .find(|r| r.kind == ObjectKind::Commit && r.sha.starts_with(git_ref))
}

/// Ask whether any tag or branch history contains `git_ref`
fn is_reachable(
    api: &dyn HostingApi,
    owner: &str,
    repo: &str,
    refs: &[GitRef],
    git_ref: &str,
) -> Result<bool> {
    for r in refs.iter().filter(|r| r.is_tag() || r.is_branch()) {
        if api.compare(owner, repo, &r.name, git_ref)?.is_contained() {
            tracing::debug!("{} is contained in {}", git_ref, r.name);
            return Ok(true);
        }
    }
    Ok(false)
}

/// Other refs pointing at the matched object or the resolved commit
fn collect_aliases(refs: &[GitRef], matched: &GitRef, digest: &str) -> Vec<String> {
    let mut aliases: Vec<String> = Vec::new();
    for r in refs {
        if r.name == matched.name || (r.sha != matched.sha && r.sha != digest) {
            continue;
        }
        let name = r.short_name().to_string();
        if !aliases.contains(&name) {
            aliases.push(name);
        }
    }
    aliases
}

fn emit(warnings: &[ResolutionWarning]) {
    for warning in warnings {
        tracing::warn!("{}", warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Comparison;
    use crate::test_fixtures::FakeHosting;

    const SHA_A: &str = "abcdef0123456789abcdef0123456789abcdef01";
    const SHA_B: &str = "93ea575cb5d8a053eaa0ac8fa3b40d7e05a33cc8";
    const TAG_OBJECT: &str = "1111111111111111111111111111111111111111";

    #[test]
    fn test_exact_tag_match() {
        let api = FakeHosting::new().with_ref("refs/tags/v3.1.0", ObjectKind::Commit, SHA_B);
        let resolution = resolve(&api, "actions", "checkout", "v3.1.0").unwrap();
        assert_eq!(resolution.digest, SHA_B);
        assert!(resolution.is_pinned());
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn test_tag_preferred_over_branch() {
        // Branch is listed first so ordering alone cannot pick the tag
        let api = FakeHosting::new()
            .with_ref("refs/heads/v1", ObjectKind::Commit, SHA_B)
            .with_ref("refs/tags/v1", ObjectKind::Commit, SHA_A);
        let resolution = resolve(&api, "o", "r", "v1").unwrap();
        assert_eq!(resolution.digest, SHA_A);
        assert!(
            !resolution
                .warnings
                .iter()
                .any(|w| matches!(w, ResolutionWarning::MutableRef { .. }))
        );
    }

    #[test]
    fn test_branch_match_warns() {
        let api = FakeHosting::new().with_ref("refs/heads/main", ObjectKind::Commit, SHA_A);
        let resolution = resolve(&api, "o", "r", "main").unwrap();
        assert_eq!(resolution.digest, SHA_A);
        assert!(resolution.is_pinned());
        assert_eq!(
            resolution.warnings,
            vec![ResolutionWarning::MutableRef {
                reference: "o/r@main".to_string()
            }]
        );
    }

    #[test]
    fn test_shortened_hash() {
        let api = FakeHosting::new().with_ref("refs/tags/v1", ObjectKind::Commit, SHA_A);
        let resolution = resolve(&api, "o", "r", "abcdef0").unwrap();
        assert_eq!(resolution.digest, SHA_A);
        assert!(resolution.is_pinned());
        assert_eq!(
            resolution.warnings,
            vec![ResolutionWarning::ShortHash {
                reference: "o/r@abcdef0".to_string(),
                full_sha: SHA_A.to_string(),
            }]
        );
    }

    #[test]
    fn test_full_hash_no_warning() {
        let api = FakeHosting::new().with_ref("refs/tags/v1", ObjectKind::Commit, SHA_A);
        let resolution = resolve(&api, "o", "r", SHA_A).unwrap();
        assert_eq!(resolution.digest, SHA_A);
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn test_short_hash_is_case_sensitive() {
        let api = FakeHosting::new()
            .with_ref("refs/tags/v1", ObjectKind::Commit, SHA_A)
            .with_comparison("refs/tags/v1", Comparison::Diverged);
        let resolution = resolve(&api, "o", "r", "ABCDEF0").unwrap();
        assert!(!resolution.is_pinned());
    }

    #[test]
    fn test_short_hash_ignores_annotated_tag_objects() {
        let api = FakeHosting::new()
            .with_ref("refs/tags/v1", ObjectKind::Tag, TAG_OBJECT)
            .with_comparison("refs/tags/v1", Comparison::Diverged);
        let resolution = resolve(&api, "o", "r", "1111111").unwrap();
        assert!(!resolution.is_pinned());
    }

    #[test]
    fn test_impostor_detection() {
        let api = FakeHosting::new()
            .with_ref("refs/tags/v1", ObjectKind::Commit, SHA_A)
            .with_ref("refs/heads/main", ObjectKind::Commit, SHA_B)
            .with_comparison("refs/tags/v1", Comparison::Diverged)
            .with_comparison("refs/heads/main", Comparison::Diverged);
        let resolution = resolve(&api, "o", "r", "deadbeef").unwrap();

        assert_eq!(resolution.digest, "deadbeef");
        assert!(!resolution.is_pinned());
        assert_eq!(
            resolution.status,
            ResolutionStatus::Unresolved { reachable: false }
        );
        assert!(
            resolution
                .warnings
                .contains(&ResolutionWarning::Impostor {
                    reference: "o/r@deadbeef".to_string()
                })
        );
        assert!(
            resolution
                .warnings
                .contains(&ResolutionWarning::Unresolved {
                    reference: "o/r@deadbeef".to_string()
                })
        );
        assert_eq!(api.compare_calls(), 2);
    }

    #[test]
    fn test_not_found_comparison_is_not_contained() {
        let api = FakeHosting::new()
            .with_ref("refs/tags/v1", ObjectKind::Commit, SHA_A)
            .with_comparison("refs/tags/v1", Comparison::NotFound);
        let resolution = resolve(&api, "o", "r", "deadbeef").unwrap();
        assert_eq!(
            resolution.status,
            ResolutionStatus::Unresolved { reachable: false }
        );
    }

    #[test]
    fn test_unresolved_but_reachable_is_not_impostor() {
        let api = FakeHosting::new()
            .with_ref("refs/tags/v1", ObjectKind::Commit, SHA_A)
            .with_ref("refs/heads/main", ObjectKind::Commit, SHA_B)
            .with_comparison("refs/tags/v1", Comparison::Ahead)
            .with_comparison("refs/heads/main", Comparison::Behind);
        let resolution = resolve(&api, "o", "r", "cafe").unwrap();

        assert_eq!(resolution.digest, "cafe");
        assert!(!resolution.is_pinned());
        assert_eq!(
            resolution.status,
            ResolutionStatus::Unresolved { reachable: true }
        );
        assert!(
            !resolution
                .warnings
                .iter()
                .any(|w| matches!(w, ResolutionWarning::Impostor { .. }))
        );
    }

    #[test]
    fn test_reachability_stops_at_first_containing_ref() {
        let api = FakeHosting::new()
            .with_ref("refs/tags/v1", ObjectKind::Commit, SHA_A)
            .with_ref("refs/tags/v2", ObjectKind::Commit, SHA_B)
            .with_comparison("refs/tags/v1", Comparison::Identical);
        resolve(&api, "o", "r", "cafe").unwrap();
        assert_eq!(api.compare_calls(), 1);
    }

    #[test]
    fn test_reachability_skips_non_tag_non_branch_refs() {
        let api = FakeHosting::new()
            .with_ref("refs/pull/1/head", ObjectKind::Commit, SHA_A)
            .with_ref("refs/tags/v1", ObjectKind::Commit, SHA_B)
            .with_comparison("refs/tags/v1", Comparison::Diverged);
        resolve(&api, "o", "r", "cafe").unwrap();
        assert_eq!(api.compare_calls(), 1);
    }

    #[test]
    fn test_annotated_tag_dereferenced() {
        let api = FakeHosting::new()
            .with_ref("refs/tags/v2", ObjectKind::Tag, TAG_OBJECT)
            .with_annotated_tag(TAG_OBJECT, SHA_B);
        let resolution = resolve(&api, "o", "r", "v2").unwrap();
        assert_eq!(resolution.digest, SHA_B);
        assert_ne!(resolution.digest, TAG_OBJECT);
    }

    #[test]
    fn test_aliases_collected() {
        let api = FakeHosting::new()
            .with_ref("refs/tags/v2", ObjectKind::Commit, SHA_B)
            .with_ref("refs/tags/v2.2.0", ObjectKind::Commit, SHA_B)
            .with_ref("refs/heads/releases/v2", ObjectKind::Commit, SHA_B)
            .with_ref("refs/tags/v1", ObjectKind::Commit, SHA_A);
        let resolution = resolve(&api, "actions", "setup-go", "v2").unwrap();
        assert_eq!(resolution.alias_refs, vec!["v2.2.0", "releases/v2"]);
    }

    #[test]
    fn test_aliases_include_branch_at_annotated_tag_commit() {
        let api = FakeHosting::new()
            .with_ref("refs/tags/v2", ObjectKind::Tag, TAG_OBJECT)
            .with_ref("refs/heads/main", ObjectKind::Commit, SHA_B)
            .with_annotated_tag(TAG_OBJECT, SHA_B);
        let resolution = resolve(&api, "o", "r", "v2").unwrap();
        assert_eq!(resolution.alias_refs, vec!["main"]);
    }

    #[test]
    fn test_list_failure_propagates() {
        let api = FakeHosting::new().failing();
        let err = resolve(&api, "o", "r", "v1").unwrap_err();
        assert!(matches!(
            err,
            crate::error::PinnyError::RemoteUnavailable { .. }
        ));
    }
}
