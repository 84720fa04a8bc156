//! Export-type resolution for executable source modules.
//!
//! Syntactic best-effort: the shape of `module.exports` (or of the module
//! namespace, for declarative exports) is read off the tree, following
//! identifiers to their top-level declarations. Anything the syntax cannot
//! answer is an inference failure, never a guess.

use decl_critic_core::{
    ExportStyle, InferenceFailure, InferenceResult, PropertySymbol, TypeFlag,
};
use tracing::debug;
use tree_sitter::Node;

use crate::lower::text;
use crate::shape::ShapeType;

/// The conventional whole-module binding.
const WHOLE_BINDING: &str = "module.exports";
/// Maximum identifier-resolution hops before giving up.
const MAX_RESOLUTION_DEPTH: usize = 4;

/// Resolves the export type of a source module.
pub(crate) fn resolve_source_export(
    root: &Node<'_>,
    src: &[u8],
    style: ExportStyle,
) -> InferenceResult<ShapeType> {
    match style {
        ExportStyle::WholeModuleAssignment => resolve_whole_module(root, src),
        ExportStyle::NamedExports => Ok(resolve_named_exports(root, src)),
        ExportStyle::Unclassified => Err(InferenceFailure::new(
            "could not infer the type of exports because the export style is unclassified",
        )),
    }
}

/// The shape assigned to `module.exports`, merged with any property
/// assignments on the exports object.
fn resolve_whole_module(root: &Node<'_>, src: &[u8]) -> InferenceResult<ShapeType> {
    let mut whole_rhs: Option<Node<'_>> = None;
    let mut extra_properties: Vec<PropertySymbol> = Vec::new();

    let mut cursor = root.walk();
    for statement in root.children(&mut cursor) {
        let Some(assignment) = statement_assignment(&statement) else {
            continue;
        };
        let Some(left) = assignment.child_by_field_name("left") else {
            continue;
        };
        if left.kind() != "member_expression" {
            continue;
        }
        let target = text(&left, src);
        if target == WHOLE_BINDING {
            // The last whole assignment wins, like it does at runtime.
            whole_rhs = assignment.child_by_field_name("right");
        } else if let Some(name) = exported_property_name(target) {
            extra_properties.push(PropertySymbol::new(name));
        }
    }

    if let Some(rhs) = whole_rhs {
        let mut shape = shape_of_expression(&rhs, root, src, MAX_RESOLUTION_DEPTH)?;
        for property in extra_properties {
            shape.add_property(property);
        }
        return Ok(shape);
    }

    if !extra_properties.is_empty() {
        let mut shape = ShapeType::object("typeof module.exports");
        for property in extra_properties {
            shape.add_property(property);
        }
        return Ok(shape);
    }

    Err(InferenceFailure::new(
        "could not locate an assignment to 'module.exports'",
    ))
}

/// A property name from `module.exports.<name>` or `exports.<name>`.
/// Deeper accesses do not create exports and are ignored.
fn exported_property_name(target: &str) -> Option<&str> {
    let rest = target
        .strip_prefix("module.exports.")
        .or_else(|| target.strip_prefix("exports."))?;
    if rest.is_empty() || rest.contains('.') {
        return None;
    }
    Some(rest)
}

/// The module-namespace shape of a declaratively exporting module.
fn resolve_named_exports(root: &Node<'_>, src: &[u8]) -> ShapeType {
    let mut shape = ShapeType::object("typeof module");

    let mut cursor = root.walk();
    for statement in root.children(&mut cursor) {
        if statement.kind() != "export_statement" {
            continue;
        }
        if has_child_of_kind(&statement, "default") {
            shape.add_property(PropertySymbol::new("default"));
            continue;
        }
        if let Some(declaration) = statement.child_by_field_name("declaration") {
            for name in declared_names(&declaration, src) {
                shape.add_property(PropertySymbol::new(name));
            }
            continue;
        }
        for specifier in export_specifiers(&statement) {
            let exported = specifier
                .child_by_field_name("alias")
                .or_else(|| specifier.child_by_field_name("name"));
            if let Some(name) = exported {
                shape.add_property(PropertySymbol::new(text(&name, src)));
            }
        }
        if has_child_of_kind(&statement, "*") {
            debug!("skipping star re-export; its names cannot be enumerated syntactically");
        }
    }

    shape
}

/// Names introduced by a declaration node.
fn declared_names(declaration: &Node<'_>, src: &[u8]) -> Vec<String> {
    match declaration.kind() {
        "function_declaration" | "generator_function_declaration" | "class_declaration" => {
            declaration
                .child_by_field_name("name")
                .map(|name| vec![text(&name, src).to_owned()])
                .unwrap_or_default()
        }
        "lexical_declaration" | "variable_declaration" => {
            let mut names = Vec::new();
            let mut cursor = declaration.walk();
            for child in declaration.children(&mut cursor) {
                if child.kind() == "variable_declarator" {
                    if let Some(name) = child.child_by_field_name("name") {
                        names.push(text(&name, src).to_owned());
                    }
                }
            }
            names
        }
        _ => Vec::new(),
    }
}

/// The shape of one expression, following identifiers to their top-level
/// declarations.
fn shape_of_expression(
    node: &Node<'_>,
    root: &Node<'_>,
    src: &[u8],
    depth: usize,
) -> InferenceResult<ShapeType> {
    match node.kind() {
        "function" | "function_expression" | "arrow_function" | "generator_function" => {
            Ok(ShapeType::function("function"))
        }
        "class" => Ok(ShapeType::class("class")),
        "object" => Ok(object_literal_shape(node, src)),
        "array" => Ok(ShapeType::array("array")),
        "string" | "template_string" => Ok(ShapeType::primitive(TypeFlag::String, "string")),
        "number" => Ok(ShapeType::primitive(TypeFlag::Number, "number")),
        "true" | "false" => Ok(ShapeType::primitive(TypeFlag::Boolean, "boolean")),
        "null" => Ok(ShapeType::primitive(TypeFlag::Null, "null")),
        "undefined" => Ok(ShapeType::primitive(TypeFlag::Undefined, "undefined")),
        "identifier" => {
            let name = text(node, src);
            if name == "undefined" {
                return Ok(ShapeType::primitive(TypeFlag::Undefined, "undefined"));
            }
            resolve_identifier(name, root, src, depth)
        }
        "parenthesized_expression" => match node.named_child(0) {
            Some(inner) => shape_of_expression(&inner, root, src, depth),
            None => Err(InferenceFailure::new("empty parenthesized expression")),
        },
        "assignment_expression" => match node.child_by_field_name("right") {
            Some(right) => shape_of_expression(&right, root, src, depth),
            None => Err(InferenceFailure::new("assignment without a right-hand side")),
        },
        "call_expression" => {
            let callee = node
                .child_by_field_name("function")
                .map(|f| text(&f, src).to_owned())
                .unwrap_or_default();
            if callee == "require" {
                Err(InferenceFailure::new(
                    "the export value is re-exported from another module via require()",
                ))
            } else {
                Err(InferenceFailure::new(
                    "could not analyze the result of a call expression",
                ))
            }
        }
        "new_expression" => Ok(ShapeType::object("object")),
        other => Err(InferenceFailure::new(format!(
            "could not analyze expression of kind '{other}'"
        ))),
    }
}

/// Properties of an object literal.
fn object_literal_shape(node: &Node<'_>, src: &[u8]) -> ShapeType {
    let mut shape = ShapeType::object("object");
    let mut cursor = node.walk();
    for member in node.children(&mut cursor) {
        match member.kind() {
            "pair" => {
                if let Some(key) = member.child_by_field_name("key") {
                    let name = text(&key, src).trim_matches(|c| c == '"' || c == '\'');
                    shape.add_property(PropertySymbol::new(name));
                }
            }
            "shorthand_property_identifier" => {
                shape.add_property(PropertySymbol::new(text(&member, src)));
            }
            "method_definition" => {
                if let Some(name) = member.child_by_field_name("name") {
                    shape.add_property(PropertySymbol::new(text(&name, src)));
                }
            }
            _ => {}
        }
    }
    shape
}

/// Resolves an identifier against the module's top-level declarations,
/// folding in any `name.prop = ...` augmentations.
fn resolve_identifier(
    name: &str,
    root: &Node<'_>,
    src: &[u8],
    depth: usize,
) -> InferenceResult<ShapeType> {
    if depth == 0 {
        return Err(InferenceFailure::new(format!(
            "gave up resolving '{name}': too many identifier hops"
        )));
    }

    let mut resolved: Option<ShapeType> = None;

    let mut cursor = root.walk();
    for statement in root.children(&mut cursor) {
        match statement.kind() {
            "function_declaration" | "generator_function_declaration" => {
                if declared_name_is(&statement, src, name) {
                    resolved = Some(ShapeType::function(name));
                    break;
                }
            }
            "class_declaration" => {
                if declared_name_is(&statement, src, name) {
                    resolved = Some(ShapeType::class(name));
                    break;
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                let mut declarators = statement.walk();
                for child in statement.children(&mut declarators) {
                    if child.kind() != "variable_declarator" || !declared_name_is(&child, src, name)
                    {
                        continue;
                    }
                    let Some(value) = child.child_by_field_name("value") else {
                        return Err(InferenceFailure::new(format!(
                            "'{name}' is declared without an initializer"
                        )));
                    };
                    resolved = Some(shape_of_expression(&value, root, src, depth - 1)?);
                }
                if resolved.is_some() {
                    break;
                }
            }
            _ => {}
        }
    }

    let Some(mut shape) = resolved else {
        return Err(InferenceFailure::new(format!(
            "could not resolve identifier '{name}' to a top-level declaration"
        )));
    };

    for property in property_augmentations(name, root, src) {
        shape.add_property(property);
    }
    Ok(shape)
}

/// Properties attached to a binding after its declaration
/// (`f.version = "1.0"` making `version` an export of `f`).
fn property_augmentations(name: &str, root: &Node<'_>, src: &[u8]) -> Vec<PropertySymbol> {
    let prefix = format!("{name}.");
    let mut properties = Vec::new();

    let mut cursor = root.walk();
    for statement in root.children(&mut cursor) {
        let Some(assignment) = statement_assignment(&statement) else {
            continue;
        };
        let Some(left) = assignment.child_by_field_name("left") else {
            continue;
        };
        if left.kind() != "member_expression" {
            continue;
        }
        if let Some(rest) = text(&left, src).strip_prefix(&prefix) {
            if !rest.is_empty() && !rest.contains('.') {
                properties.push(PropertySymbol::new(rest));
            }
        }
    }
    properties
}

/// The `export_specifier` nodes of an `export { .. }` clause.
fn export_specifiers<'tree>(statement: &Node<'tree>) -> Vec<Node<'tree>> {
    let mut specifiers = Vec::new();
    let mut cursor = statement.walk();
    for child in statement.children(&mut cursor) {
        if child.kind() != "export_clause" {
            continue;
        }
        let mut inner = child.walk();
        for specifier in child.children(&mut inner) {
            if specifier.kind() == "export_specifier" {
                specifiers.push(specifier);
            }
        }
    }
    specifiers
}

fn statement_assignment<'tree>(statement: &Node<'tree>) -> Option<Node<'tree>> {
    if statement.kind() != "expression_statement" {
        return None;
    }
    let expression = statement.named_child(0)?;
    (expression.kind() == "assignment_expression").then_some(expression)
}

fn declared_name_is(node: &Node<'_>, src: &[u8], expected: &str) -> bool {
    node.child_by_field_name("name")
        .is_some_and(|name| text(&name, src) == expected)
}

fn has_child_of_kind(node: &Node<'_>, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| child.kind() == kind);
    found
}
