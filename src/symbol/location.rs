use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A resolved position in a source file.
///
/// `offset` is the 0-indexed byte offset into the file; `line` and `column`
/// are 1-indexed, matching what editors display. All persisted relationships
/// key on `(path, offset)`; line and column ride along for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub path: PathBuf,
    pub offset: u32,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(path: impl Into<PathBuf>, offset: u32, line: u32, column: u32) -> Self {
        Self {
            path: path.into(),
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path.display(), self.line, self.column)
    }
}

/// A contiguous span between two locations in the same file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}-{}:{}",
            self.start.path.display(),
            self.start.line,
            self.start.column,
            self.end.line,
            self.end.column
        )
    }
}
