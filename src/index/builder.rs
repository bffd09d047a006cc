//! AST walk that populates the schema store.
//!
//! One pass per translation unit, threading the enclosing-definition context
//! downward. Order matters within a node: a definition first records its
//! `defs` row and takes over the enclosing context, then any reference edge
//! it carries is recorded against the updated context, so an out-of-line
//! method definition is both a definition and a reference site.

use rusqlite::Connection;

use crate::ast::{AstNode, NodeKind, ParsedUnit};
use crate::store::{self, Result};

/// Walk `unit`'s tree and insert its defs, refs, class edges and include
/// edges. Runs inside the caller's transaction; nothing is committed here.
pub fn build_unit(conn: &Connection, unit: &ParsedUnit) -> Result<()> {
    visit(conn, unit, &unit.root, None)
}

fn visit<'a>(
    conn: &Connection,
    unit: &ParsedUnit,
    node: &'a AstNode,
    mut enclosing: Option<&'a AstNode>,
) -> Result<()> {
    if node.is_definition {
        if let (Some(usr), Some(loc)) = (&node.usr, &node.location) {
            store::insert_def(conn, usr, &unit.path, loc.offset)?;
        }
        if node.kind.is_enclosing_definition() {
            enclosing = Some(node);
        }
    }

    if let (Some(referenced), Some(loc)) = (&node.referenced, &node.location) {
        // Only sites that resolve to a *different* node count as references,
        // and only when they lie in the file being indexed: header subtrees
        // are indexed through their own includers.
        let distinct = referenced
            .location
            .as_ref()
            .is_none_or(|ref_loc| ref_loc != loc);
        if distinct && loc.path == unit.path {
            let enclosing_offset = enclosing
                .and_then(|e| e.location.as_ref())
                .map_or(-1, |l| i64::from(l.offset));
            store::insert_ref(conn, &referenced.usr, &unit.path, loc.offset, enclosing_offset)?;
        }
    }

    if node.kind.is_base_specifier()
        && let Some(referenced) = &node.referenced
        && let Some(enclosing_def) = enclosing
        && let Some(sub_usr) = &enclosing_def.usr
        && let Some(super_loc) = &referenced.location
    {
        store::insert_class_edge(conn, sub_usr, &referenced.usr, &unit.path, &super_loc.path)?;
    }

    if node.kind == NodeKind::TranslationUnit {
        for edge in &unit.includes {
            store::insert_include(conn, &unit.path, &edge.source, &edge.include, edge.depth)?;
        }
    }

    for child in &node.children {
        visit(conn, unit, child, enclosing)?;
    }
    Ok(())
}
