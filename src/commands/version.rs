//! Version command implementation

use crate::client::github::DEFAULT_API_URL;
use crate::error::Result;
use crate::lockfile::DEFAULT_LOCKFILE;

/// Run version command
pub fn run() -> Result<()> {
    for line in version_lines() {
        println!("{line}");
    }
    Ok(())
}

fn version_lines() -> Vec<String> {
    vec![
        format!("pinny {}", env!("CARGO_PKG_VERSION")),
        String::new(),
        "Defaults:".to_string(),
        format!("  GitHub API: {DEFAULT_API_URL}"),
        format!("  Lock file: {DEFAULT_LOCKFILE}"),
        String::new(),
        "Build info:".to_string(),
        format!("  Minimum Rust version: {}", env!("CARGO_PKG_RUST_VERSION")),
        format!("  Profile: {}", build_profile()),
    ]
}

fn build_profile() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}
