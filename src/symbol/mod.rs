//! Source locations and symbol snapshots returned by the query surface.

pub mod location;
#[allow(clippy::module_inception)]
mod symbol;

pub use location::{SourceLocation, SourceRange};
pub use symbol::Symbol;
