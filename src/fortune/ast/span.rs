//! Positions in template source
//!
//! Positions are zero-based internally. Error messages shown to template authors
//! add one to both line and column.

use serde::Serialize;
use std::fmt;

/// A position in template source (line and column, both zero-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// One-based rendering used in author-facing messages
    pub fn human(&self) -> String {
        format!("line {}, column {}", self.line + 1, self.column + 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
