use serde::{Deserialize, Serialize};

use crate::symbol::SourceLocation;

/// Closed enumeration of AST node kinds the index cares about.
///
/// This mirrors the subset of cursor kinds the indexing policy inspects;
/// anything else a parser produces maps to [`NodeKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    TranslationUnit,
    Struct,
    Union,
    Class,
    Enum,
    EnumConstant,
    Function,
    Method,
    Namespace,
    Constructor,
    Destructor,
    ConversionFunction,
    Typedef,
    ObjCInterface,
    ObjCCategory,
    ObjCProtocol,
    ObjCImplementation,
    ObjCCategoryImpl,
    ObjCInstanceMethod,
    ObjCClassMethod,
    BaseSpecifier,
    Field,
    Variable,
    Parameter,
    DeclRef,
    MemberRef,
    TypeRef,
    Call,
    Other,
}

impl NodeKind {
    /// Kinds whose definitions become the enclosing-definition context for
    /// their subtree while indexing.
    pub fn is_enclosing_definition(self) -> bool {
        matches!(
            self,
            NodeKind::Struct
                | NodeKind::Union
                | NodeKind::Class
                | NodeKind::Enum
                | NodeKind::Function
                | NodeKind::Method
                | NodeKind::Namespace
                | NodeKind::Constructor
                | NodeKind::Destructor
                | NodeKind::ConversionFunction
                | NodeKind::Typedef
                | NodeKind::ObjCInterface
                | NodeKind::ObjCCategory
                | NodeKind::ObjCProtocol
                | NodeKind::ObjCImplementation
                | NodeKind::ObjCCategoryImpl
                | NodeKind::ObjCInstanceMethod
                | NodeKind::ObjCClassMethod
        )
    }

    pub fn is_base_specifier(self) -> bool {
        matches!(self, NodeKind::BaseSpecifier)
    }
}

/// Summary of the declaration a node's "referenced" edge resolves to.
///
/// Parsers that fail to resolve a reference leave the edge out entirely
/// rather than producing a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub usr: String,
    pub spelling: String,
    pub kind: NodeKind,
    pub is_definition: bool,
    /// Location of the resolved declaration, when it has one.
    pub location: Option<SourceLocation>,
}

/// One node of an owned syntax tree.
///
/// `extent` is the byte span the node covers in the file named by its
/// location; a point query anywhere inside the span resolves to this node
/// (or to a narrower descendant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstNode {
    pub kind: NodeKind,
    pub spelling: String,
    pub usr: Option<String>,
    pub location: Option<SourceLocation>,
    pub extent_start: u32,
    pub extent_end: u32,
    pub is_definition: bool,
    pub referenced: Option<Reference>,
    pub children: Vec<AstNode>,
}

impl AstNode {
    pub fn new(kind: NodeKind, extent_start: u32, extent_end: u32) -> Self {
        Self {
            kind,
            spelling: String::new(),
            usr: None,
            location: None,
            extent_start,
            extent_end,
            is_definition: false,
            referenced: None,
            children: Vec::new(),
        }
    }

    pub fn with_spelling(mut self, spelling: impl Into<String>) -> Self {
        self.spelling = spelling.into();
        self
    }

    pub fn with_usr(mut self, usr: impl Into<String>) -> Self {
        self.usr = Some(usr.into());
        self
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn definition(mut self) -> Self {
        self.is_definition = true;
        self
    }

    pub fn refers_to(mut self, reference: Reference) -> Self {
        self.referenced = Some(reference);
        self
    }

    pub fn with_child(mut self, child: AstNode) -> Self {
        self.children.push(child);
        self
    }

    fn covers(&self, path: &std::path::Path, offset: u32) -> bool {
        self.location.as_ref().is_some_and(|loc| loc.path == path)
            && self.extent_start <= offset
            && offset < self.extent_end
    }

    /// Innermost node in this subtree whose extent in `path` contains
    /// `offset`. Children win over their parent, so a query inside a call
    /// expression resolves to the call, not the enclosing function.
    pub fn find_at(&self, path: &std::path::Path, offset: u32) -> Option<&AstNode> {
        for child in &self.children {
            if let Some(hit) = child.find_at(path, offset) {
                return Some(hit);
            }
        }
        if self.covers(path, offset) {
            return Some(self);
        }
        None
    }
}
