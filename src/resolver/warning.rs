//! Advisory conditions raised during resolution

use std::fmt;

/// Non-fatal condition surfaced to the user while resolving a reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionWarning {
    /// Resolved through a branch name, which can move at any time
    MutableRef { reference: String },
    /// Resolved through an abbreviated commit hash
    ShortHash { reference: String, full_sha: String },
    /// No ref or commit matched
    Unresolved { reference: String },
    /// The commit is not reachable from any tag or branch of the repository
    Impostor { reference: String },
}

impl fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MutableRef { reference } => {
                write!(f, "{reference} resolved through a mutable branch ref")
            }
            Self::ShortHash {
                reference,
                full_sha,
            } => write!(
                f,
                "{reference} uses a shortened commit hash, the full hash is {full_sha}"
            ),
            Self::Unresolved { reference } => write!(f, "{reference} could not be resolved"),
            Self::Impostor { reference } => write!(
                f,
                "{reference} is not reachable from any tag or branch and may be an impostor commit"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_reference() {
        let warnings = [
            (
                "a/b@main",
                ResolutionWarning::MutableRef {
                    reference: "a/b@main".to_string(),
                },
            ),
            (
                "a/b@abc",
                ResolutionWarning::ShortHash {
                    reference: "a/b@abc".to_string(),
                    full_sha: "abcdef".to_string(),
                },
            ),
            (
                "a/b@x",
                ResolutionWarning::Unresolved {
                    reference: "a/b@x".to_string(),
                },
            ),
            (
                "a/b@y",
                ResolutionWarning::Impostor {
                    reference: "a/b@y".to_string(),
                },
            ),
        ];
        for (reference, warning) in &warnings {
            assert!(warning.to_string().contains(reference));
        }
    }

    #[test]
    fn test_short_hash_mentions_full_sha() {
        let warning = ResolutionWarning::ShortHash {
            reference: "a/b@abc".to_string(),
            full_sha: "abcdef0123".to_string(),
        };
        assert!(warning.to_string().contains("abcdef0123"));
    }

    #[test]
    fn test_impostor_wording() {
        let warning = ResolutionWarning::Impostor {
            reference: "a/b@x".to_string(),
        };
        assert!(warning.to_string().contains("impostor"));
    }
}
