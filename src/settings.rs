//! Run settings assembled from flags and environment
//!
//! The engine never reads the environment itself; clap fills these values
//! (including the `GITHUB_TOKEN`, `PINNY_GITHUB_API_URL` and `PINNY_LOCKFILE`
//! variables) and commands pass them down.

use std::path::PathBuf;

use crate::client::github::DEFAULT_API_URL;
use crate::client::{GithubClient, RegistryClient};
use crate::lockfile::DEFAULT_LOCKFILE;
use crate::resolver::Resolver;

/// Settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Bearer credential for the hosting API
    pub github_token: Option<String>,
    /// Hosting API base URL
    pub github_api_url: String,
    /// Lock file location
    pub lockfile: PathBuf,
    /// Fail on step references that cannot be pinned
    pub strict: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            github_token: None,
            github_api_url: DEFAULT_API_URL.to_string(),
            lockfile: PathBuf::from(DEFAULT_LOCKFILE),
            strict: false,
        }
    }
}

impl Settings {
    /// Set the hosting API token; blank values count as absent
    pub fn with_github_token(mut self, token: Option<String>) -> Self {
        self.github_token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self
    }

    /// Set the hosting API base URL
    pub fn with_github_api_url(mut self, url: impl Into<String>) -> Self {
        self.github_api_url = url.into();
        self
    }

    /// Set the lock file location
    pub fn with_lockfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.lockfile = path.into();
        self
    }

    /// Enable or disable strict mode
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Build a resolver backed by the real remote clients
    pub fn resolver(&self) -> Resolver {
        if self.github_token.is_none() {
            tracing::debug!("No GITHUB_TOKEN set, using anonymous API access");
        }
        let hosting = GithubClient::new(self.github_api_url.as_str(), self.github_token.clone());
        Resolver::new(Box::new(hosting), Box::new(RegistryClient::new())).strict(self.strict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.github_api_url, "https://api.github.com");
        assert_eq!(settings.lockfile, PathBuf::from("pinny-lock.json"));
        assert!(settings.github_token.is_none());
        assert!(!settings.strict);
    }

    #[test]
    fn test_blank_token_is_absent() {
        let settings = Settings::default().with_github_token(Some("  \n".to_string()));
        assert!(settings.github_token.is_none());

        let settings = Settings::default().with_github_token(Some(" ghp_abc \n".to_string()));
        assert_eq!(settings.github_token.as_deref(), Some("ghp_abc"));
    }

    #[test]
    fn test_builders() {
        let settings = Settings::default()
            .with_github_api_url("http://127.0.0.1:1")
            .with_lockfile("locks/pinny.json")
            .with_strict(true);
        assert_eq!(settings.github_api_url, "http://127.0.0.1:1");
        assert_eq!(settings.lockfile, PathBuf::from("locks/pinny.json"));
        assert!(settings.strict);
    }
}
