//! Core Symbol representation
//!
//! A `Symbol` is the owned snapshot of one AST node that queries hand back:
//! its name, kind, optional USR and resolved location. Query results never
//! borrow from the in-memory translation units.

use serde::{Deserialize, Serialize};

use crate::ast::{AstNode, NodeKind};
use crate::symbol::SourceLocation;

/// A declaration, definition or reference site with a resolved location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Symbol name (spelling of the underlying node)
    pub name: String,

    /// Node kind (function, class, namespace, etc.)
    pub kind: NodeKind,

    /// USR, when the node carries one. Reference sites usually do not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usr: Option<String>,

    /// Location of the node in its source file
    pub location: SourceLocation,
}

impl Symbol {
    /// Snapshot an AST node. Returns `None` for nodes without a concrete
    /// file location (e.g. synthesized or builtin nodes).
    pub fn from_node(node: &AstNode) -> Option<Self> {
        let location = node.location.clone()?;
        Some(Self {
            name: node.spelling.clone(),
            kind: node.kind,
            usr: node.usr.clone(),
            location,
        })
    }
}
