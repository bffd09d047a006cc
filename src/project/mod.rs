//! Project discovery and the concurrent parse phase.
//!
//! Discovery walks the configured roots for indexable sources, the
//! compilation database supplies per-file compiler arguments, and
//! [`ProjectParser`] parses every discovered file on a worker pool to
//! produce the in-memory translation unit map.

pub mod compilation_database;
pub mod error;
pub mod parser;
pub mod scanner;

pub use compilation_database::{CompilationDatabase, CompilationDatabaseError, CompileArgsSource};
pub use error::ProjectError;
pub use parser::ProjectParser;
pub use scanner::{FolderSpec, discover_sources};
