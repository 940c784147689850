//! Per-run resolution cache
//!
//! Keyed by the raw reference string exactly as written. Two spellings of the
//! same target are resolved independently; the cache only saves repeat lookups
//! for literally repeated references within one run.

use std::collections::HashMap;

/// Memoization table owned by a single run
#[derive(Debug)]
pub struct ResolutionCache<T> {
    entries: HashMap<String, T>,
}

impl<T> ResolutionCache<T> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Look up a previously resolved reference
    pub fn get(&self, raw: &str) -> Option<&T> {
        self.entries.get(raw)
    }

    /// Store a resolved reference
    pub fn put(&mut self, raw: impl Into<String>, value: T) {
        self.entries.insert(raw.into(), value);
    }
}

impl<T> Default for ResolutionCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
