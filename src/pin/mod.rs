//! Pinning rewriters
//!
//! Both rewriters take a [`SourceText`](crate::text::SourceText) and return
//! the full rewritten content; they never touch the filesystem. Callers stage
//! the result through a [`Transaction`](crate::transaction::Transaction) so a
//! failure anywhere leaves every source file as it was.
//!
//! - [`workflow`]: `uses:` lines of pipeline definitions
//! - [`dockerfile`]: `FROM` instructions of image build files

pub mod dockerfile;
pub mod workflow;

/// Output of rewriting one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Complete new file content
    pub content: String,
    /// Number of declarations that were rewritten
    pub pinned: usize,
    /// Resolution warnings raised while rewriting
    pub warnings: usize,
}

impl Rewrite {
    /// Returns `true` if nothing was rewritten
    pub fn is_unchanged(&self) -> bool {
        self.pinned == 0
    }
}
