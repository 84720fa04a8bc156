//! Descriptor construction.
//!
//! Glue between the oracle and the comparator: parses each side, classifies
//! its export style, resolves its export type, and runs the judge and the
//! default-export detector where they apply.

use tracing::debug;

use crate::classify::{classify_exports, ExportStyle};
use crate::descriptor::{DeclarationModule, SourceModule};
use crate::detect::DefaultExportDetector;
use crate::judge::needs_whole_module_export;
use crate::oracle::{OracleError, TypeOracle};

/// Builds the source-side descriptor for one analysis.
///
/// The export style is computed first and independently; type resolution is
/// style-specific. The export-equals verdict is only evaluated for a
/// whole-module module whose type resolved, and is absent otherwise.
///
/// # Errors
///
/// Returns [`OracleError`] when the module cannot be parsed at all.
pub fn inspect_source(
    oracle: &dyn TypeOracle,
    source_text: &str,
    module_name: &str,
    detector: &DefaultExportDetector,
) -> Result<SourceModule, OracleError> {
    let tree = oracle.parse(source_text, true)?;
    let export_style = classify_exports(&tree);
    debug!(%export_style, module = module_name, "classified source module");

    let export_type = oracle.resolve_export_type(&tree, export_style, module_name);

    let export_equals = match (&export_type, export_style) {
        (Ok(ty), ExportStyle::WholeModuleAssignment) => {
            Some(needs_whole_module_export(ty.as_ref()))
        }
        _ => None,
    };

    let exposes_default = detector.source_exposes_default(source_text, module_name);

    Ok(SourceModule {
        export_style,
        export_type,
        export_equals,
        exposes_default,
    })
}

/// Builds the declaration-side descriptor for one analysis.
///
/// # Errors
///
/// Returns [`OracleError`] when the declaration cannot be parsed at all.
pub fn inspect_declaration(
    oracle: &dyn TypeOracle,
    declaration_text: &str,
    module_name: &str,
    detector: &DefaultExportDetector,
) -> Result<DeclarationModule, OracleError> {
    let tree = oracle.parse(declaration_text, false)?;
    let export_style = classify_exports(&tree);
    debug!(%export_style, module = module_name, "classified declaration");

    let export_type = oracle.resolve_export_type(&tree, export_style, module_name);
    let default_export = detector.declaration_default_export(&export_type, declaration_text);

    Ok(DeclarationModule {
        export_style,
        export_type,
        default_export,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{
        NodeKind, SyntaxNode, SyntaxTree, TypeFlag, TypeHandle, TypeHandleBox,
    };
    use crate::types::{InferenceFailure, InferenceResult, PropertySymbol};

    struct FnType;

    impl TypeHandle for FnType {
        fn properties(&self) -> Vec<PropertySymbol> {
            Vec::new()
        }
        fn call_signature_count(&self) -> usize {
            1
        }
        fn construct_signature_count(&self) -> usize {
            0
        }
        fn is_array_like(&self) -> bool {
            false
        }
        fn flags(&self) -> Vec<TypeFlag> {
            vec![TypeFlag::Object]
        }
        fn render(&self) -> String {
            "() => void".to_owned()
        }
    }

    /// Classifies from the raw text and resolves a canned function type for
    /// whole-module modules only.
    struct StubOracle;

    impl TypeOracle for StubOracle {
        fn parse(&self, source: &str, allow_dynamic_syntax: bool) -> Result<SyntaxTree, OracleError> {
            let mut root = SyntaxNode::new(NodeKind::Module);
            if source.contains("module.exports") {
                root = root.with_child(
                    SyntaxNode::new(NodeKind::PropertyAccess).with_text("module.exports"),
                );
            } else if source.contains("export ") {
                root = root.with_child(SyntaxNode::new(NodeKind::ExportedDeclaration));
            }
            Ok(SyntaxTree {
                source: source.to_owned(),
                dialect: if allow_dynamic_syntax {
                    crate::oracle::ModuleDialect::Source
                } else {
                    crate::oracle::ModuleDialect::Declaration
                },
                root,
            })
        }

        fn resolve_export_type(
            &self,
            _tree: &SyntaxTree,
            style: ExportStyle,
            _module_name: &str,
        ) -> InferenceResult<TypeHandleBox> {
            match style {
                ExportStyle::WholeModuleAssignment => Ok(Box::new(FnType)),
                ExportStyle::NamedExports => Ok(Box::new(FnType)),
                ExportStyle::Unclassified => Err(InferenceFailure::new(
                    "could not infer the export type because the export style is unclassified",
                )),
            }
        }
    }

    #[test]
    fn whole_module_source_gets_export_equals_verdict() {
        let source = inspect_source(
            &StubOracle,
            "module.exports = function () {};",
            "pkg",
            &DefaultExportDetector::new(),
        )
        .unwrap();
        assert_eq!(source.export_style, ExportStyle::WholeModuleAssignment);
        let verdict = source.export_equals.unwrap().unwrap();
        assert!(verdict.reason.contains("called"));
    }

    #[test]
    fn named_export_source_has_no_export_equals() {
        let source = inspect_source(
            &StubOracle,
            "export function foo() {}",
            "pkg",
            &DefaultExportDetector::new(),
        )
        .unwrap();
        assert_eq!(source.export_style, ExportStyle::NamedExports);
        assert!(source.export_equals.is_none());
    }

    #[test]
    fn unclassified_source_fails_type_resolution_without_export_equals() {
        let source = inspect_source(
            &StubOracle,
            "var x = 1;",
            "pkg",
            &DefaultExportDetector::new(),
        )
        .unwrap();
        assert_eq!(source.export_style, ExportStyle::Unclassified);
        assert!(source.export_type.is_err());
        assert!(source.export_equals.is_none());
    }

    #[test]
    fn source_default_detection_uses_raw_text() {
        let source = inspect_source(
            &StubOracle,
            "module.exports = require('./impl');",
            "pkg",
            &DefaultExportDetector::new(),
        )
        .unwrap();
        assert!(source.exposes_default);
    }
}
