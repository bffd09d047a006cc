//! AST access boundary.
//!
//! The index never talks to a compiler front end directly. A
//! [`SourceParser`] implementation (libclang bindings, a test fake, ...)
//! turns a file plus compiler arguments into a [`ParsedUnit`]: an owned tree
//! of [`AstNode`]s with diagnostics and include edges attached. The node
//! kinds form a closed enumeration so indexing policy is an exhaustive match,
//! not an open class hierarchy.

pub mod diagnostics;
pub mod node;
pub mod testing;
pub mod unit;

pub use diagnostics::{Diagnostic, Severity};
pub use node::{AstNode, NodeKind, Reference};
pub use unit::{IncludeEdge, ParseError, ParsedUnit, SourceParser};
