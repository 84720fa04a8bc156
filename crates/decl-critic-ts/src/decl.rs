//! Export-type resolution for declaration files.
//!
//! Resolution happens in a scope: the whole file, or the body of the
//! ambient module named after the package when the declaration uses
//! ambient-module syntax. The whole-module convention resolves the entity
//! the `export =` assignment names; the named-exports convention builds the
//! module namespace from the exported value declarations. Declaration-side
//! properties carry the position of their first declaration node.

use decl_critic_core::{
    mangle_scoped, ExportStyle, InferenceFailure, InferenceResult, PropertySymbol, TypeFlag,
};
use tree_sitter::Node;

use crate::lower::{position, text};
use crate::shape::ShapeType;

/// Maximum type-alias hops before giving up.
const MAX_TYPE_DEPTH: usize = 4;

/// Resolves the export type asserted by a declaration file.
pub(crate) fn resolve_declaration_export(
    root: &Node<'_>,
    src: &[u8],
    style: ExportStyle,
    module_name: &str,
) -> InferenceResult<ShapeType> {
    let (scope, in_ambient_module) = declaration_scope(root, src, module_name)?;
    match style {
        ExportStyle::WholeModuleAssignment => resolve_export_equals(&scope, src),
        ExportStyle::NamedExports => Ok(namespace_shape(&scope, src, in_ambient_module)),
        ExportStyle::Unclassified => Err(InferenceFailure::new(
            "could not infer the export kind of the declaration file",
        )),
    }
}

/// The node whose children are the declaration's top-level statements.
///
/// With ambient-module syntax, that is the body of the module named after
/// the package; a file that declares ambient modules but none of that name
/// has no usable module symbol.
fn declaration_scope<'tree>(
    root: &Node<'tree>,
    src: &[u8],
    module_name: &str,
) -> InferenceResult<(Node<'tree>, bool)> {
    let ambient_modules = collect_ambient_modules(root);
    if ambient_modules.is_empty() {
        return Ok((*root, false));
    }

    let registry_name = mangle_scoped(module_name);
    for module in &ambient_modules {
        let Some(name) = ambient_module_name(module, src) else {
            continue;
        };
        if name == registry_name {
            return module
                .child_by_field_name("body")
                .or_else(|| find_child_of_kind(module, "statement_block"))
                .map(|body| (body, true))
                .ok_or_else(|| {
                    InferenceFailure::new(format!(
                        "ambient module '{registry_name}' has no body"
                    ))
                });
        }
    }

    Err(InferenceFailure::new(format!(
        "file has ambient module declarations, but none is named '{registry_name}'"
    )))
}

fn collect_ambient_modules<'tree>(root: &Node<'tree>) -> Vec<Node<'tree>> {
    let mut modules = Vec::new();
    let mut cursor = root.walk();
    for statement in root.children(&mut cursor) {
        if statement.kind() == "module" {
            modules.push(statement);
        } else if statement.kind() == "ambient_declaration" {
            if let Some(module) = find_child_of_kind(&statement, "module") {
                modules.push(module);
            }
        }
    }
    modules
}

fn ambient_module_name(module: &Node<'_>, src: &[u8]) -> Option<String> {
    let name = find_child_of_kind(module, "string")?;
    Some(
        text(&name, src)
            .trim_matches(|c| c == '"' || c == '\'')
            .to_owned(),
    )
}

/// The type of the entity an `export =` assignment names.
fn resolve_export_equals(scope: &Node<'_>, src: &[u8]) -> InferenceResult<ShapeType> {
    let mut cursor = scope.walk();
    for statement in scope.children(&mut cursor) {
        if statement.kind() != "export_statement" || !has_child_of_kind(&statement, "=") {
            continue;
        }
        let Some(target) = find_child_of_kind(&statement, "identifier") else {
            return Err(InferenceFailure::new(
                "the whole-module export assigns something other than a plain identifier",
            ));
        };
        return resolve_value_entity(text(&target, src), scope, src);
    }
    Err(InferenceFailure::new(
        "could not find the whole-module export symbol",
    ))
}

/// Resolves every value declaration of `name` in scope and merges them:
/// overloaded functions accumulate call signatures, and a namespace merged
/// onto a function or class contributes its members as properties.
fn resolve_value_entity(
    name: &str,
    scope: &Node<'_>,
    src: &[u8],
) -> InferenceResult<ShapeType> {
    let mut merged: Option<ShapeType> = None;
    let mut type_only_match = false;

    let mut cursor = scope.walk();
    for statement in scope.children(&mut cursor) {
        let declaration = unwrap_declaration(&statement);
        match declaration.kind() {
            "function_signature" | "function_declaration" => {
                if declared_name_is(&declaration, src, name) {
                    merge_into(&mut merged, ShapeType::function(name));
                }
            }
            "class_declaration" => {
                if declared_name_is(&declaration, src, name) {
                    merge_into(&mut merged, class_shape(&declaration, src, name));
                }
            }
            "internal_module" => {
                if declared_name_is(&declaration, src, name) {
                    if let Some(body) = declaration.child_by_field_name("body") {
                        merge_into(&mut merged, namespace_shape(&body, src, true));
                    }
                }
            }
            "enum_declaration" => {
                if declared_name_is(&declaration, src, name) {
                    merge_into(&mut merged, enum_shape(&declaration, src, name));
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                let mut declarators = declaration.walk();
                for child in declaration.children(&mut declarators) {
                    if child.kind() == "variable_declarator" && declared_name_is(&child, src, name)
                    {
                        merge_into(&mut merged, variable_shape(&child, scope, src)?);
                    }
                }
            }
            "interface_declaration" | "type_alias_declaration" => {
                if declared_name_is(&declaration, src, name) {
                    type_only_match = true;
                }
            }
            _ => {}
        }
    }

    match merged {
        Some(shape) => Ok(shape),
        None if type_only_match => Err(InferenceFailure::new(format!(
            "'{name}' only names a type, not a value"
        ))),
        None => Err(InferenceFailure::new(format!(
            "could not resolve '{name}' to a declaration in scope"
        ))),
    }
}

fn merge_into(merged: &mut Option<ShapeType>, shape: ShapeType) {
    match merged {
        Some(existing) => existing.merge(shape),
        None => *merged = Some(shape),
    }
}

/// The module-namespace shape: one property per exported value declaration.
/// Inside ambient-module and namespace bodies, bare declarations are
/// implicitly exported; at the top level of a module they are not.
fn namespace_shape(scope: &Node<'_>, src: &[u8], implicit_exports: bool) -> ShapeType {
    let mut shape = ShapeType::object("typeof module");

    let mut cursor = scope.walk();
    for statement in scope.children(&mut cursor) {
        if statement.kind() == "export_statement" {
            if has_child_of_kind(&statement, "=") {
                continue;
            }
            if has_child_of_kind(&statement, "default") {
                shape.add_property(
                    PropertySymbol::new("default").with_position(position(&statement)),
                );
                continue;
            }
            for specifier in clause_specifiers(&statement) {
                let exported = specifier
                    .child_by_field_name("alias")
                    .or_else(|| specifier.child_by_field_name("name"));
                if let Some(name) = exported {
                    shape.add_property(
                        PropertySymbol::new(text(&name, src)).with_position(position(&specifier)),
                    );
                }
            }
            if let Some(declaration) = export_declaration(&statement) {
                add_declared_values(&declaration, src, &mut shape);
            }
            continue;
        }

        if implicit_exports {
            let declaration = unwrap_declaration(&statement);
            add_declared_values(&declaration, src, &mut shape);
        }
    }

    shape
}

/// The declaration an export statement carries, if any.
fn export_declaration<'tree>(statement: &Node<'tree>) -> Option<Node<'tree>> {
    if let Some(declaration) = statement.child_by_field_name("declaration") {
        return Some(declaration);
    }
    // Fallback when the grammar exposes no field: take the first named
    // child that is a declaration.
    let mut cursor = statement.walk();
    let found = statement.named_children(&mut cursor).find(|child| {
        matches!(
            child.kind(),
            "function_signature"
                | "function_declaration"
                | "class_declaration"
                | "enum_declaration"
                | "internal_module"
                | "lexical_declaration"
                | "variable_declaration"
                | "interface_declaration"
                | "type_alias_declaration"
        )
    });
    found
}

/// Adds the value names a declaration introduces. Interfaces and type
/// aliases declare no value and contribute nothing.
fn add_declared_values(declaration: &Node<'_>, src: &[u8], shape: &mut ShapeType) {
    match declaration.kind() {
        "function_signature" | "function_declaration" | "class_declaration"
        | "enum_declaration" | "internal_module" => {
            if let Some(name) = declaration.child_by_field_name("name") {
                shape.add_property(
                    PropertySymbol::new(text(&name, src)).with_position(position(declaration)),
                );
            }
        }
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = declaration.walk();
            for child in declaration.children(&mut cursor) {
                if child.kind() != "variable_declarator" {
                    continue;
                }
                if let Some(name) = child.child_by_field_name("name") {
                    shape.add_property(
                        PropertySymbol::new(text(&name, src)).with_position(position(&child)),
                    );
                }
            }
        }
        _ => {}
    }
}

/// The static side of a class: one construct signature plus its static
/// members.
fn class_shape(declaration: &Node<'_>, src: &[u8], name: &str) -> ShapeType {
    let mut shape = ShapeType::class(name);
    let Some(body) = declaration.child_by_field_name("body") else {
        return shape;
    };
    let mut cursor = body.walk();
    for member in body.children(&mut cursor) {
        if !has_child_of_kind(&member, "static") {
            continue;
        }
        if let Some(member_name) = member.child_by_field_name("name") {
            shape.add_property(
                PropertySymbol::new(text(&member_name, src)).with_position(position(&member)),
            );
        }
    }
    shape
}

/// An enum value: an object whose properties are the enum members.
fn enum_shape(declaration: &Node<'_>, src: &[u8], name: &str) -> ShapeType {
    let mut shape = ShapeType::object(format!("typeof {name}"));
    let Some(body) = declaration.child_by_field_name("body") else {
        return shape;
    };
    let mut cursor = body.walk();
    for member in body.children(&mut cursor) {
        match member.kind() {
            "property_identifier" => {
                shape.add_property(
                    PropertySymbol::new(text(&member, src)).with_position(position(&member)),
                );
            }
            "enum_assignment" => {
                if let Some(member_name) = member.child_by_field_name("name") {
                    shape.add_property(
                        PropertySymbol::new(text(&member_name, src))
                            .with_position(position(&member)),
                    );
                }
            }
            _ => {}
        }
    }
    shape
}

/// The declared type of a variable declarator.
fn variable_shape(
    declarator: &Node<'_>,
    scope: &Node<'_>,
    src: &[u8],
) -> InferenceResult<ShapeType> {
    let Some(annotation) = find_child_of_kind(declarator, "type_annotation") else {
        return Err(InferenceFailure::new(
            "variable declaration carries no type annotation",
        ));
    };
    let Some(ty) = annotation.named_child(0) else {
        return Err(InferenceFailure::new("empty type annotation"));
    };
    shape_of_type(&ty, scope, src, MAX_TYPE_DEPTH)
}

/// The shape of a type node.
fn shape_of_type(
    ty: &Node<'_>,
    scope: &Node<'_>,
    src: &[u8],
    depth: usize,
) -> InferenceResult<ShapeType> {
    match ty.kind() {
        "predefined_type" => predefined_shape(text(ty, src)),
        "function_type" => Ok(ShapeType::function(text(ty, src))),
        "constructor_type" => Ok(ShapeType::class(text(ty, src))),
        "array_type" | "tuple_type" => Ok(ShapeType::array(text(ty, src))),
        "generic_type" => {
            let name = ty
                .child_by_field_name("name")
                .map(|n| text(&n, src).to_owned())
                .unwrap_or_default();
            if name == "Array" || name == "ReadonlyArray" {
                Ok(ShapeType::array(text(ty, src)))
            } else {
                Err(InferenceFailure::new(format!(
                    "could not analyze generic type '{name}'"
                )))
            }
        }
        "object_type" | "interface_body" => Ok(members_shape(ty, src)),
        "parenthesized_type" => match ty.named_child(0) {
            Some(inner) => shape_of_type(&inner, scope, src, depth),
            None => Err(InferenceFailure::new("empty parenthesized type")),
        },
        "type_identifier" => resolve_type_name(text(ty, src), scope, src, depth),
        "union_type" | "intersection_type" => Err(InferenceFailure::new(
            "could not analyze a compound type",
        )),
        "literal_type" => match ty.named_child(0).map(|n| n.kind().to_owned()).as_deref() {
            Some("string") => Ok(ShapeType::primitive(TypeFlag::String, "string")),
            Some("number" | "unary_expression") => {
                Ok(ShapeType::primitive(TypeFlag::Number, "number"))
            }
            Some("true" | "false") => Ok(ShapeType::primitive(TypeFlag::Boolean, "boolean")),
            _ => Err(InferenceFailure::new("could not analyze a literal type")),
        },
        other => Err(InferenceFailure::new(format!(
            "could not analyze type of kind '{other}'"
        ))),
    }
}

fn predefined_shape(name: &str) -> InferenceResult<ShapeType> {
    match name {
        "string" => Ok(ShapeType::primitive(TypeFlag::String, "string")),
        "number" => Ok(ShapeType::primitive(TypeFlag::Number, "number")),
        "boolean" => Ok(ShapeType::primitive(TypeFlag::Boolean, "boolean")),
        "object" => Ok(ShapeType::object("object")),
        "any" => Ok(ShapeType::primitive(TypeFlag::Any, "any")),
        "unknown" => Ok(ShapeType::primitive(TypeFlag::Unknown, "unknown")),
        "void" | "undefined" => Ok(ShapeType::primitive(TypeFlag::Undefined, "undefined")),
        other => Err(InferenceFailure::new(format!(
            "could not analyze predefined type '{other}'"
        ))),
    }
}

/// Members of an object type or interface body.
fn members_shape(body: &Node<'_>, src: &[u8]) -> ShapeType {
    let mut shape = ShapeType::object("object");
    let mut cursor = body.walk();
    for member in body.children(&mut cursor) {
        match member.kind() {
            "property_signature" | "method_signature" => {
                if let Some(name) = member.child_by_field_name("name") {
                    shape.add_property(
                        PropertySymbol::new(text(&name, src)).with_position(position(&member)),
                    );
                }
            }
            "call_signature" => shape.call_signatures += 1,
            "construct_signature" => shape.construct_signatures += 1,
            _ => {}
        }
    }
    shape
}

/// Resolves a type name against the interfaces and aliases in scope.
fn resolve_type_name(
    name: &str,
    scope: &Node<'_>,
    src: &[u8],
    depth: usize,
) -> InferenceResult<ShapeType> {
    if depth == 0 {
        return Err(InferenceFailure::new(format!(
            "gave up resolving type '{name}': too many alias hops"
        )));
    }

    let mut cursor = scope.walk();
    for statement in scope.children(&mut cursor) {
        let declaration = unwrap_declaration(&statement);
        match declaration.kind() {
            "interface_declaration" => {
                if declared_name_is(&declaration, src, name) {
                    if let Some(body) = declaration.child_by_field_name("body") {
                        let mut shape = members_shape(&body, src);
                        shape.rendered = name.to_owned();
                        return Ok(shape);
                    }
                }
            }
            "type_alias_declaration" => {
                if declared_name_is(&declaration, src, name) {
                    if let Some(value) = declaration.child_by_field_name("value") {
                        return shape_of_type(&value, scope, src, depth - 1);
                    }
                }
            }
            "class_declaration" => {
                if declared_name_is(&declaration, src, name) {
                    // The instance side, as a plain object.
                    return Ok(ShapeType::object(name));
                }
            }
            _ => {}
        }
    }

    Err(InferenceFailure::new(format!(
        "could not resolve type '{name}' in scope"
    )))
}

/// Peels `export` and `declare` wrappers off a statement.
fn unwrap_declaration<'tree>(statement: &Node<'tree>) -> Node<'tree> {
    let mut node = *statement;
    loop {
        match node.kind() {
            "export_statement" => {
                let Some(declaration) = export_declaration(&node) else {
                    return node;
                };
                node = declaration;
            }
            "ambient_declaration" => {
                let Some(inner) = node.named_child(0) else {
                    return node;
                };
                node = inner;
            }
            _ => return node,
        }
    }
}

fn declared_name_is(node: &Node<'_>, src: &[u8], expected: &str) -> bool {
    node.child_by_field_name("name")
        .is_some_and(|name| text(&name, src) == expected)
}

fn clause_specifiers<'tree>(statement: &Node<'tree>) -> Vec<Node<'tree>> {
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

fn find_child_of_kind<'tree>(node: &Node<'tree>, kind: &str) -> Option<Node<'tree>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|child| child.kind() == kind);
    found
}

fn has_child_of_kind(node: &Node<'_>, kind: &str) -> bool {
    find_child_of_kind(node, kind).is_some()
}
