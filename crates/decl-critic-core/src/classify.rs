//! Export style classification.
//!
//! Decides which export convention a module uses by searching its syntax
//! tree for the first node matching a style predicate. Whole-module
//! detection runs first and wins when both patterns coexist in one module.

use serde::{Deserialize, Serialize};

use crate::oracle::{NodeKind, SyntaxNode, SyntaxTree};

/// The conventional binding a source module reassigns to export one value.
const WHOLE_MODULE_BINDING: &str = "module.exports";
/// The conventional alias for the exports object.
const EXPORTS_ALIAS: &str = "exports";

/// How a module exposes its public surface. Exactly one style applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportStyle {
    /// The entire exports object is assigned (or referenced) as one value.
    WholeModuleAssignment,
    /// Individual bindings are exported.
    NamedExports,
    /// Neither syntactic pattern was found.
    Unclassified,
}

impl std::fmt::Display for ExportStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WholeModuleAssignment => write!(f, "whole-module assignment"),
            Self::NamedExports => write!(f, "named exports"),
            Self::Unclassified => write!(f, "unclassified"),
        }
    }
}

/// Classifies a module's export style from its syntax tree.
///
/// Classification is total: a tree with no export syntax at all is
/// [`ExportStyle::Unclassified`], not an error.
#[must_use]
pub fn classify_exports(tree: &SyntaxTree) -> ExportStyle {
    if matches(&tree.root, &is_whole_module_export) {
        return ExportStyle::WholeModuleAssignment;
    }
    if matches(&tree.root, &is_named_export) {
        return ExportStyle::NamedExports;
    }
    ExportStyle::Unclassified
}

/// Pre-order depth-first existence search, short-circuiting at the first
/// match. Child order is fixed by the oracle, so results are reproducible.
fn matches(node: &SyntaxNode, predicate: &dyn Fn(&SyntaxNode) -> bool) -> bool {
    if predicate(node) {
        return true;
    }
    node.children.iter().any(|child| matches(child, predicate))
}

/// Assignment to the conventional exports binding, a direct reference to
/// it, or the declaration-file spelling of the same convention.
fn is_whole_module_export(node: &SyntaxNode) -> bool {
    match node.kind {
        NodeKind::PropertyAccess => node.text == WHOLE_MODULE_BINDING,
        NodeKind::Identifier => node.text == EXPORTS_ALIAS,
        NodeKind::ExportEquals => true,
        _ => false,
    }
}

/// An export declaration, a default-export assignment, or any declaration
/// carrying an export modifier.
fn is_named_export(node: &SyntaxNode) -> bool {
    matches!(
        node.kind,
        NodeKind::ExportDeclaration | NodeKind::ExportDefault | NodeKind::ExportedDeclaration
    )
}
