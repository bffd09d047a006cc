use serde::{Deserialize, Serialize};

use crate::symbol::{SourceLocation, SourceRange};

/// Diagnostic severity, ordered from least to most severe.
///
/// The numeric values match what libclang reports, so adapters can cast
/// straight through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Ignored = 0,
    Note = 1,
    Warning = 2,
    Error = 3,
    Fatal = 4,
}

/// One issue reported while parsing a translation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,

    /// Where the issue was reported. `None` for location-less diagnostics
    /// (e.g. bad command-line arguments).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    pub message: String,

    /// Source ranges the diagnostic highlights, possibly empty.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub ranges: Vec<SourceRange>,

    /// Named option that triggered the diagnostic (e.g. "-Wunused-variable").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            location: None,
            message: message.into(),
            ranges: Vec::new(),
            option: None,
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.option = Some(option.into());
        self
    }
}
