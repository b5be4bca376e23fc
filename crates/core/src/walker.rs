use crate::ast::{AstNode, ReferencedDecl};
use crate::error::{AstrefError, Result};
use crate::identifiers::{Category, IdentifierRecord, IdentifierSet};

/// Adds every identifier referenced under `root` to `identifiers`.
///
/// Pre-order, depth-first, with an explicit stack. An unmapped declaration
/// kind aborts the walk; entries already inserted stay in the set.
pub fn collect_identifiers(root: &AstNode, identifiers: &mut IdentifierSet) -> Result<()> {
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if let AstNode::DeclRef { referenced, .. } = node {
            identifiers.insert(resolve(referenced.as_ref())?);
        }
        stack.extend(node.children().iter().rev());
    }

    Ok(())
}

pub fn walk(root: &AstNode) -> Result<IdentifierSet> {
    let mut identifiers = IdentifierSet::new();
    collect_identifiers(root, &mut identifiers)?;
    Ok(identifiers)
}

fn resolve(referenced: Option<&ReferencedDecl>) -> Result<IdentifierRecord> {
    let decl = referenced.ok_or_else(|| {
        AstrefError::MalformedNode("DeclRefExpr without referencedDecl".to_string())
    })?;
    let name = decl.name.as_deref().ok_or_else(|| {
        AstrefError::MalformedNode("referencedDecl without name".to_string())
    })?;
    let kind = decl.kind.as_deref().ok_or_else(|| {
        AstrefError::MalformedNode(format!("referencedDecl `{name}` without kind"))
    })?;

    let category = Category::from_decl_kind(kind).ok_or_else(|| AstrefError::UnknownDeclKind {
        kind: kind.to_string(),
        name: name.to_string(),
    })?;

    Ok(IdentifierRecord::new(name, category))
}
