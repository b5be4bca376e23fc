//! Typed view of clang's `-ast-dump=json` output.
//!
//! Only the fields the identifier walk needs are decoded; everything else in
//! a node is skipped by serde.

use serde::Deserialize;

/// Node kind clang uses for a use of a named declaration.
pub const DECL_REF_KIND: &str = "DeclRefExpr";

/// The declaration a `DeclRefExpr` points at.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReferencedDecl {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawNode")]
pub enum AstNode {
    DeclRef {
        referenced: Option<ReferencedDecl>,
        inner: Vec<AstNode>,
    },
    Other {
        kind: String,
        inner: Vec<AstNode>,
    },
    /// A node without a `kind`; it carries nothing and ends its branch.
    Untagged,
}

impl AstNode {
    pub fn children(&self) -> &[AstNode] {
        match self {
            AstNode::DeclRef { inner, .. } | AstNode::Other { inner, .. } => inner,
            AstNode::Untagged => &[],
        }
    }
}

// clang trees can be tens of thousands of levels deep; the derived drop
// would recurse once per level.
impl Drop for AstNode {
    fn drop(&mut self) {
        let mut pending = match self {
            AstNode::DeclRef { inner, .. } | AstNode::Other { inner, .. } => std::mem::take(inner),
            AstNode::Untagged => return,
        };
        while let Some(mut node) = pending.pop() {
            if let AstNode::DeclRef { inner, .. } | AstNode::Other { inner, .. } = &mut node {
                pending.append(inner);
            }
        }
    }
}

#[derive(Deserialize)]
struct RawNode {
    #[serde(default)]
    kind: Option<String>,
    #[serde(default, rename = "referencedDecl")]
    referenced_decl: Option<ReferencedDecl>,
    #[serde(default)]
    inner: Vec<AstNode>,
}

impl From<RawNode> for AstNode {
    fn from(raw: RawNode) -> Self {
        match raw.kind {
            None => AstNode::Untagged,
            Some(kind) if kind == DECL_REF_KIND => AstNode::DeclRef {
                referenced: raw.referenced_decl,
                inner: raw.inner,
            },
            Some(kind) => AstNode::Other {
                kind,
                inner: raw.inner,
            },
        }
    }
}
