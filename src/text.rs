//! Line-oriented view of a source file that keeps line endings
//!
//! Rewriters replace whole lines and copy the rest verbatim, so every line
//! remembers its own terminator (`\n`, `\r\n`, or none for a final line
//! without newline).

use std::fs;
use std::path::Path;

use crate::error::{PinnyError, Result};

/// A file split into lines with their terminators
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceText {
    lines: Vec<(String, &'static str)>,
}

impl SourceText {
    /// Split `content` into lines
    pub fn parse(content: &str) -> Self {
        let lines = content
            .split_inclusive('\n')
            .map(|line| {
                if let Some(text) = line.strip_suffix("\r\n") {
                    (text.to_string(), "\r\n")
                } else if let Some(text) = line.strip_suffix('\n') {
                    (text.to_string(), "\n")
                } else {
                    (line.to_string(), "")
                }
            })
            .collect();
        Self { lines }
    }

    /// Read and split a file
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| PinnyError::FileReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::parse(&content))
    }

    /// Number of lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` for an empty file
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Text of line `index`, without terminator
    pub fn text(&self, index: usize) -> &str {
        &self.lines[index].0
    }

    /// Terminator of line `index`
    pub fn ending(&self, index: usize) -> &'static str {
        self.lines[index].1
    }

    /// All lines without terminators
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|(text, _)| text.as_str()).collect()
    }

    /// The terminator used by the file, `\n` if it has none
    pub fn newline(&self) -> &'static str {
        self.lines
            .iter()
            .map(|(_, ending)| *ending)
            .find(|ending| !ending.is_empty())
            .unwrap_or("\n")
    }

    /// Line `index` including its terminator
    pub fn line(&self, index: usize) -> String {
        let (text, ending) = &self.lines[index];
        format!("{text}{ending}")
    }
}
