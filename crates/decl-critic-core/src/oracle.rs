//! Type oracle capability interface.
//!
//! The analyzer never parses or type-checks modules itself. It asks an
//! oracle to produce a simplified syntax tree and to resolve the type of a
//! module's top-level export value, then reasons about the answers. Keeping
//! the oracle behind a trait makes the analyzer testable with canned types
//! and lets the inference engine be swapped without touching the comparator.

use crate::classify::ExportStyle;
use crate::types::{InferenceResult, Position, PropertySymbol};

/// Type flags an oracle can report for an export type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFlag {
    /// Inference produced `any`.
    Any,
    /// Inference produced `unknown`.
    Unknown,
    /// The export is `null`.
    Null,
    /// The export is `undefined`.
    Undefined,
    /// An object type.
    Object,
    /// A boolean primitive.
    Boolean,
    /// A string primitive.
    String,
    /// A number primitive.
    Number,
}

/// One inferred or declared type, queryable for its structure.
///
/// Handles are opaque references into the oracle that produced them and are
/// only valid for the analysis call they were created in.
pub trait TypeHandle {
    /// The type's named properties, unique by name.
    fn properties(&self) -> Vec<PropertySymbol>;

    /// Number of call signatures.
    fn call_signature_count(&self) -> usize;

    /// Number of construct signatures.
    fn construct_signature_count(&self) -> usize;

    /// Whether the type has indexed-element and length semantics.
    fn is_array_like(&self) -> bool;

    /// The flags the oracle inferred for this type.
    fn flags(&self) -> Vec<TypeFlag>;

    /// Renders the type for diagnostics.
    fn render(&self) -> String;

    /// Whether the type is usable as a call target or constructor.
    fn is_callable_or_constructable(&self) -> bool {
        self.call_signature_count() > 0 || self.construct_signature_count() > 0
    }

    /// Whether a flag is present.
    fn has_flag(&self, flag: TypeFlag) -> bool {
        self.flags().contains(&flag)
    }

    /// Whether the type is too weak to analyze (`any`, `unknown`, `null`,
    /// or `undefined`).
    fn is_bad_type(&self) -> bool {
        self.flags().iter().any(|flag| {
            matches!(
                flag,
                TypeFlag::Any | TypeFlag::Unknown | TypeFlag::Null | TypeFlag::Undefined
            )
        })
    }
}

impl core::fmt::Debug for dyn TypeHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Type alias for boxed type handles.
pub type TypeHandleBox = Box<dyn TypeHandle>;

/// Syntactic category of a node in the simplified module tree.
///
/// Only the categories the classifier's predicates care about are
/// distinguished; everything else lowers to [`NodeKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The module root.
    Module,
    /// A property access expression, text holds the dotted path.
    PropertyAccess,
    /// An identifier reference.
    Identifier,
    /// A whole-module export assignment in a declaration (`export =`).
    ExportEquals,
    /// A default-export assignment.
    ExportDefault,
    /// An export declaration (`export { .. }`, re-exports).
    ExportDeclaration,
    /// A declaration carrying an export modifier.
    ExportedDeclaration,
    /// An ambient module declaration naming a package.
    AmbientModule,
    /// Anything else.
    Other,
}

/// One node of the simplified syntax tree an oracle produces from a module.
///
/// Child order is the source order; traversals over it are deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    /// Syntactic category.
    pub kind: NodeKind,
    /// Source text of the node, where the predicates need it.
    pub text: String,
    /// Location of the node in the module's text, when tracked.
    pub position: Option<Position>,
    /// Children, in source order.
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// Creates a node of the given kind with no text and no children.
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            text: String::new(),
            position: None,
            children: Vec::new(),
        }
    }

    /// Sets the node's source text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Sets the node's position.
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Appends a child node.
    #[must_use]
    pub fn with_child(mut self, child: SyntaxNode) -> Self {
        self.children.push(child);
        self
    }
}

/// Which syntax dialect a module was parsed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleDialect {
    /// Executable source, dynamic export rewriting allowed.
    Source,
    /// Declaration file.
    Declaration,
}

/// A parsed module: its raw text plus the simplified tree.
///
/// The raw text and dialect are kept alongside the tree because
/// style-specific type resolution and the textual default-export fallback
/// both read them.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    /// The module's full source text.
    pub source: String,
    /// How the module was parsed.
    pub dialect: ModuleDialect,
    /// Root of the simplified tree, kind [`NodeKind::Module`].
    pub root: SyntaxNode,
}

/// Errors an oracle can raise while parsing.
///
/// These are fatal to the analysis call: a module that cannot be parsed at
/// all yields no descriptor and no findings.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The module text could not be parsed.
    #[error("failed to parse module: {message}")]
    Parse {
        /// Parser error message.
        message: String,
    },

    /// The oracle does not support the requested syntax dialect.
    #[error("unsupported module dialect: {0}")]
    Unsupported(String),
}

/// A component able to parse a module and answer structural questions about
/// its export value.
pub trait TypeOracle {
    /// Parses module source text into a simplified syntax tree.
    ///
    /// `allow_dynamic_syntax` selects the executable-module dialect (source
    /// modules with dynamic export rewriting) over the declaration dialect.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] when the text cannot be parsed at all; this
    /// aborts the analysis rather than producing findings.
    fn parse(&self, source: &str, allow_dynamic_syntax: bool) -> Result<SyntaxTree, OracleError>;

    /// Resolves the type of the module's top-level export value.
    ///
    /// The export style decides how the oracle locates that value: the
    /// whole-module convention resolves the conventional whole-module-export
    /// symbol, named exports resolve the module namespace itself, and for
    /// declarations using ambient-module syntax the oracle must first locate
    /// the ambient module named `module_name`.
    ///
    /// # Errors
    ///
    /// Returns an [`InferenceFailure`](crate::types::InferenceFailure) when
    /// no usable type can be produced; downstream checks that depend on the
    /// type are suppressed, not failed.
    fn resolve_export_type(
        &self,
        tree: &SyntaxTree,
        style: ExportStyle,
        module_name: &str,
    ) -> InferenceResult<TypeHandleBox>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain {
        flags: Vec<TypeFlag>,
        calls: usize,
    }

    impl TypeHandle for Plain {
        fn properties(&self) -> Vec<PropertySymbol> {
            Vec::new()
        }
        fn call_signature_count(&self) -> usize {
            self.calls
        }
        fn construct_signature_count(&self) -> usize {
            0
        }
        fn is_array_like(&self) -> bool {
            false
        }
        fn flags(&self) -> Vec<TypeFlag> {
            self.flags.clone()
        }
        fn render(&self) -> String {
            "plain".to_owned()
        }
    }

    #[test]
    fn bad_type_detection() {
        let any = Plain {
            flags: vec![TypeFlag::Any],
            calls: 0,
        };
        assert!(any.is_bad_type());

        let object = Plain {
            flags: vec![TypeFlag::Object],
            calls: 0,
        };
        assert!(!object.is_bad_type());
    }

    #[test]
    fn callable_from_call_signatures() {
        let callable = Plain {
            flags: vec![TypeFlag::Object],
            calls: 2,
        };
        assert!(callable.is_callable_or_constructable());
    }

    #[test]
    fn node_builder_preserves_child_order() {
        let root = SyntaxNode::new(NodeKind::Module)
            .with_child(SyntaxNode::new(NodeKind::Identifier).with_text("a"))
            .with_child(SyntaxNode::new(NodeKind::Identifier).with_text("b"));
        let names: Vec<&str> = root.children.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }
}
