//! Persistent cross-translation-unit symbol index for C/C++ source trees.
//!
//! The crate answers "where is this declared/defined", "who references this",
//! "what inherits from this", and "what includes this" without re-parsing the
//! whole project on every query. Relationships are keyed by USR (a string
//! identity stable across translation units) and persisted in a per-project
//! SQLite store, so an index survives process restarts.
//!
//! The parser itself is an external collaborator: callers supply a
//! [`ast::SourceParser`] implementation that turns a file plus compiler
//! arguments into an owned syntax tree. Discovery, concurrent parsing, index
//! construction, incremental updates and the query surface all live behind
//! [`index::IndexEngine`].

pub mod ast;
pub mod index;
pub mod logging;
pub mod project;
pub mod store;
pub mod symbol;

#[cfg(test)]
mod test_utils;

pub use ast::{AstNode, Diagnostic, NodeKind, ParsedUnit, Severity, SourceParser};
pub use index::{
    EngineOptions, IncludeEntry, IndexEngine, IndexError, IndexedFile, ProgressEvent,
    ProgressObserver, ReferenceSite,
};
pub use project::{CompileArgsSource, FolderSpec};
pub use symbol::{SourceLocation, Symbol};
