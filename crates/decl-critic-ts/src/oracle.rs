//! The tree-sitter backed oracle.
//!
//! A syntactic best-effort implementation of the oracle interface: no type
//! checking, just reading shapes off the tree. Source modules parse with
//! the JavaScript grammar, declaration files with the TypeScript grammar.

use decl_critic_core::{
    ExportStyle, InferenceFailure, InferenceResult, ModuleDialect, OracleError, SyntaxTree,
    TypeHandleBox, TypeOracle,
};
use tracing::debug;
use tree_sitter::{Language, Parser};

use crate::decl::resolve_declaration_export;
use crate::lower::lower_module;
use crate::source::resolve_source_export;

/// A [`TypeOracle`] that answers from syntax alone.
pub struct SyntacticOracle {
    source_language: Language,
    declaration_language: Language,
}

impl SyntacticOracle {
    /// Creates an oracle with the JavaScript and TypeScript grammars.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source_language: tree_sitter_javascript::LANGUAGE.into(),
            declaration_language: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        }
    }

    fn parse_cst(
        &self,
        source: &str,
        dialect: ModuleDialect,
    ) -> Result<tree_sitter::Tree, OracleError> {
        let language = match dialect {
            ModuleDialect::Source => &self.source_language,
            ModuleDialect::Declaration => &self.declaration_language,
        };
        let mut parser = Parser::new();
        parser
            .set_language(language)
            .map_err(|error| OracleError::Unsupported(error.to_string()))?;
        let tree = parser.parse(source, None).ok_or_else(|| OracleError::Parse {
            message: "parser produced no tree".to_owned(),
        })?;
        if tree.root_node().has_error() {
            // Real-world modules routinely contain constructs the grammar
            // only partially recovers; resolution stays best-effort.
            debug!("module parsed with recoverable syntax errors");
        }
        Ok(tree)
    }
}

impl Default for SyntacticOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeOracle for SyntacticOracle {
    fn parse(&self, source: &str, allow_dynamic_syntax: bool) -> Result<SyntaxTree, OracleError> {
        let dialect = if allow_dynamic_syntax {
            ModuleDialect::Source
        } else {
            ModuleDialect::Declaration
        };
        let cst = self.parse_cst(source, dialect)?;
        let root = lower_module(&cst.root_node(), source.as_bytes());
        Ok(SyntaxTree {
            source: source.to_owned(),
            dialect,
            root,
        })
    }

    fn resolve_export_type(
        &self,
        tree: &SyntaxTree,
        style: ExportStyle,
        module_name: &str,
    ) -> InferenceResult<TypeHandleBox> {
        let cst = self
            .parse_cst(&tree.source, tree.dialect)
            .map_err(|error| InferenceFailure::new(error.to_string()))?;
        let root = cst.root_node();
        let src = tree.source.as_bytes();

        match tree.dialect {
            ModuleDialect::Source => resolve_source_export(&root, src, style)
                .map(|shape| Box::new(shape) as TypeHandleBox),
            ModuleDialect::Declaration => {
                resolve_declaration_export(&root, src, style, module_name)
                    .map(|shape| Box::new(shape) as TypeHandleBox)
            }
        }
    }
}
