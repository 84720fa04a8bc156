//! Lowering from tree-sitter syntax to the simplified module tree.
//!
//! The classifier only distinguishes a handful of syntactic categories;
//! everything else lowers to [`NodeKind::Other`] with its children intact
//! so existence searches can still reach nested export syntax.

use decl_critic_core::{NodeKind, Position, SyntaxNode};
use tree_sitter::Node;

/// Lowers a parsed module's root node into the simplified tree.
pub(crate) fn lower_module(root: &Node<'_>, src: &[u8]) -> SyntaxNode {
    let mut module = SyntaxNode::new(NodeKind::Module).with_position(position(root));
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        module.children.push(lower(&child, src));
    }
    module
}

fn lower(node: &Node<'_>, src: &[u8]) -> SyntaxNode {
    let kind = map_kind(node, src);
    let mut lowered = SyntaxNode::new(kind).with_position(position(node));

    match kind {
        NodeKind::PropertyAccess | NodeKind::Identifier => {
            lowered = lowered.with_text(text(node, src));
        }
        NodeKind::AmbientModule => {
            if let Some(name) = module_name(node, src) {
                lowered = lowered.with_text(name);
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        lowered.children.push(lower(&child, src));
    }
    lowered
}

fn map_kind(node: &Node<'_>, _src: &[u8]) -> NodeKind {
    match node.kind() {
        "member_expression" => NodeKind::PropertyAccess,
        "identifier" => NodeKind::Identifier,
        "module" => NodeKind::AmbientModule,
        "export_statement" => classify_export_statement(node),
        _ => NodeKind::Other,
    }
}

/// Splits the export-statement kinds the classifier treats differently.
fn classify_export_statement(node: &Node<'_>) -> NodeKind {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "=" => return NodeKind::ExportEquals,
            "default" => return NodeKind::ExportDefault,
            _ => {}
        }
    }
    if node.child_by_field_name("declaration").is_some() {
        return NodeKind::ExportedDeclaration;
    }
    NodeKind::ExportDeclaration
}

/// The quoted name of an ambient `module "name"` declaration, unquoted.
fn module_name(node: &Node<'_>, src: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "string" {
            let raw = text(&child, src);
            return Some(raw.trim_matches(|c| c == '"' || c == '\'').to_owned());
        }
    }
    None
}

pub(crate) fn text<'a>(node: &Node<'_>, src: &'a [u8]) -> &'a str {
    std::str::from_utf8(&src[node.start_byte()..node.end_byte()]).unwrap_or("")
}

pub(crate) fn position(node: &Node<'_>) -> Position {
    Position::new(node.start_byte(), node.end_byte() - node.start_byte())
}
