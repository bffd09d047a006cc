use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ast::diagnostics::{Diagnostic, Severity};
use crate::ast::node::{AstNode, NodeKind};

/// One include relationship observed while parsing a translation unit.
///
/// `depth` is the DFS depth at which the preprocessor discovered the edge,
/// counted from 1 for includes written directly in the unit's main file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeEdge {
    pub source: PathBuf,
    pub include: PathBuf,
    pub depth: u32,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parser backend error for {path}: {reason}")]
    Backend { path: PathBuf, reason: String },
}

/// The parsed representation of one compiled source file.
///
/// Owns its syntax tree, diagnostics and include edges. Identified by the
/// absolute path of its main file; header content appears as subtrees with
/// their own file attribution.
#[derive(Debug, Clone)]
pub struct ParsedUnit {
    pub path: PathBuf,
    pub root: AstNode,
    pub diagnostics: Vec<Diagnostic>,
    pub includes: Vec<IncludeEdge>,
    /// Compiler arguments the unit was parsed with.
    pub args: Vec<String>,
}

impl ParsedUnit {
    pub fn new(path: impl Into<PathBuf>, root: AstNode) -> Self {
        Self {
            path: path.into(),
            root,
            diagnostics: Vec::new(),
            includes: Vec::new(),
            args: Vec::new(),
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.diagnostics.push(diagnostic);
        self
    }

    pub fn with_include(
        mut self,
        source: impl Into<PathBuf>,
        include: impl Into<PathBuf>,
        depth: u32,
    ) -> Self {
        self.includes.push(IncludeEdge {
            source: source.into(),
            include: include.into(),
            depth,
        });
        self
    }

    /// Placeholder unit for a file the parser could not process at all.
    /// Keeps the failure visible through the diagnostics query instead of
    /// aborting the surrounding build.
    pub fn from_parse_failure(path: PathBuf, reason: String) -> Self {
        let root = AstNode::new(NodeKind::TranslationUnit, 0, 0);
        Self {
            path,
            root,
            diagnostics: vec![Diagnostic::new(Severity::Fatal, reason)],
            includes: Vec::new(),
            args: Vec::new(),
        }
    }

    /// Innermost node at `offset` within `path`, which may be the unit's
    /// main file or any header it includes.
    pub fn node_at(&self, path: &Path, offset: u32) -> Option<&AstNode> {
        self.root.find_at(path, offset)
    }
}

/// The external parser collaborator.
///
/// `parse` is called from worker threads during the parallel parse phase and
/// again for single-file reparses, so implementations must be `Send + Sync`.
/// Recoverable syntax errors belong in the returned unit's diagnostics; an
/// `Err` means no tree could be produced at all.
pub trait SourceParser: Send + Sync {
    fn parse(&self, path: &Path, args: &[String]) -> Result<ParsedUnit, ParseError>;
}
