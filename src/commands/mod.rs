//! Command implementations for Pinny CLI

pub mod actions;
pub mod completions;
pub mod docker;
pub mod version;

/// Current time in RFC 1123 form, used for provenance comments and lock metadata
pub fn timestamp() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}
