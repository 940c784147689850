//! Error types and handling for Pinny
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for Pinny operations
#[derive(Error, Diagnostic, Debug)]
pub enum PinnyError {
    // Reference errors
    #[error("Malformed reference '{input}': {reason}")]
    #[diagnostic(
        code(pinny::reference::malformed),
        help(
            "Step references look like owner/repo[/path]@ref, image references like [host/][namespace/]name[:tag][@digest]"
        )
    )]
    MalformedReference { input: String, reason: String },

    #[error("Reference '{reference}' could not be resolved to a digest")]
    #[diagnostic(
        code(pinny::reference::unresolved),
        help("Run without --strict to leave unresolved references untouched")
    )]
    UnresolvedReference { reference: String },

    // Remote errors
    #[error("Remote unavailable while resolving '{target}': {reason}")]
    #[diagnostic(
        code(pinny::remote::unavailable),
        help("Set GITHUB_TOKEN if you are being rate limited by the GitHub API")
    )]
    RemoteUnavailable { target: String, reason: String },

    // Lock file errors
    #[error("Digest not found for {reference}")]
    #[diagnostic(
        code(pinny::lockfile::digest_not_found),
        help("Run 'pinny docker lock' to refresh the lock file")
    )]
    DigestNotFound { reference: String },

    #[error("Lock file is missing: {path}")]
    #[diagnostic(
        code(pinny::lockfile::missing),
        help("Run 'pinny docker lock' to generate a lock file")
    )]
    LockFileMissing { path: String },

    #[error("Failed to parse lock file {path}: {reason}")]
    #[diagnostic(code(pinny::lockfile::parse_failed))]
    LockFileParseFailed { path: String, reason: String },

    // Source file errors
    #[error("Failed to parse Dockerfile {path}: {reason}")]
    #[diagnostic(code(pinny::dockerfile::parse_failed))]
    DockerfileParseFailed { path: String, reason: String },

    #[error("No workflows found in {path}")]
    #[diagnostic(
        code(pinny::workflow::none_found),
        help("Run from the repository root or pass --workflow-dir")
    )]
    NoWorkflowsFound { path: String },

    // File system errors
    #[error("Failed to read file {path}: {reason}")]
    #[diagnostic(code(pinny::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file {path}: {reason}")]
    #[diagnostic(code(pinny::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    // CLI errors
    #[error("Unknown shell: {shell}")]
    #[diagnostic(
        code(pinny::cli::unsupported_shell),
        help("Supported shells: bash, elvish, fish, powershell, zsh")
    )]
    UnsupportedShell { shell: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(pinny::fs::io_error))]
    IoError { message: String },
}

impl From<std::io::Error> for PinnyError {
    fn from(err: std::io::Error) -> Self {
        PinnyError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for PinnyError {
    fn from(err: serde_json::Error) -> Self {
        PinnyError::LockFileParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, PinnyError>;
