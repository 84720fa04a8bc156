//! Module shape comparison.
//!
//! Diffs the inferred shape of a source module against the shape asserted
//! by its declaration. All checks are independent and all are evaluated;
//! findings come out in a stable order: export-equals, callability,
//! properties, default export.

use tracing::debug;

use crate::classify::ExportStyle;
use crate::descriptor::{DeclarationModule, SourceModule};
use crate::judge::ExportEqualsJudgement;
use crate::oracle::TypeHandle;
use crate::types::{CriticFinding, ErrorKind, InferenceFailure};

/// Properties excluded from comparison on both sides, plus any name with a
/// leading underscore. Fixed, not configurable.
const IGNORED_PROPERTIES: &[&str] = &["__esModule", "prototype", "default"];

/// The outcome of one comparison.
///
/// A suppressed shape check is an inference failure, not a finding; it is
/// carried separately so diagnostics can surface it without polluting the
/// finding list.
#[derive(Debug)]
pub struct Comparison {
    /// Structural disagreements, in check order.
    pub findings: Vec<CriticFinding>,
    /// Why the callability and property checks were suppressed, if they were.
    pub shape_check_failure: Option<InferenceFailure>,
}

/// Compares a source descriptor against a declaration descriptor.
#[must_use]
pub fn compare(source: &SourceModule, declaration: &DeclarationModule) -> Comparison {
    let mut findings = Vec::new();

    check_export_equals(source, declaration, &mut findings);
    let shape_check_failure = check_shapes(source, declaration, &mut findings).err();
    check_default_export(source, declaration, &mut findings);

    debug!(
        count = findings.len(),
        suppressed = shape_check_failure.is_some(),
        "shape comparison finished"
    );

    Comparison {
        findings,
        shape_check_failure,
    }
}

/// If the source demands the whole-module convention and the declaration
/// does not use it, the declaration cannot be faithful.
fn check_export_equals(
    source: &SourceModule,
    declaration: &DeclarationModule,
    findings: &mut Vec<CriticFinding>,
) {
    let Some(Ok(verdict)) = &source.export_equals else {
        return;
    };
    if verdict.judgement == ExportEqualsJudgement::Required
        && declaration.export_style != ExportStyle::WholeModuleAssignment
    {
        findings.push(CriticFinding::new(
            ErrorKind::NeedsWholeModuleExport,
            format!(
                "Declaration should use the whole-module 'export =' convention. \
                 Reason: {}.",
                verdict.reason
            ),
        ));
    }
}

/// Callability and property checks, suppressed as a unit when either side's
/// type failed to resolve or resolved to a disqualified flag set.
fn check_shapes(
    source: &SourceModule,
    declaration: &DeclarationModule,
    findings: &mut Vec<CriticFinding>,
) -> Result<(), InferenceFailure> {
    let source_type = source.export_type.as_ref().map_err(|_| {
        InferenceFailure::new("could not get the type of the source module's exports")
    })?;
    let declaration_type = declaration.export_type.as_ref().map_err(|_| {
        InferenceFailure::new("could not get the type of the declaration module's exports")
    })?;
    if source_type.is_bad_type() {
        return Err(InferenceFailure::new(
            "could not infer a meaningful type for the source module's exports",
        ));
    }
    if declaration_type.is_bad_type() {
        return Err(InferenceFailure::new(
            "could not infer a meaningful type for the declaration module's exports",
        ));
    }

    check_callability(source_type.as_ref(), declaration_type.as_ref(), findings);
    check_properties(source_type.as_ref(), declaration_type.as_ref(), findings);
    Ok(())
}

/// Symmetric callability check; both directions evaluated independently.
fn check_callability(
    source_type: &dyn TypeHandle,
    declaration_type: &dyn TypeHandle,
    findings: &mut Vec<CriticFinding>,
) {
    let source_callable = source_type.is_callable_or_constructable();
    let declaration_callable = declaration_type.is_callable_or_constructable();

    if source_callable && !declaration_callable {
        findings.push(CriticFinding::new(
            ErrorKind::SourceIsCallable,
            "Source module can be called or instantiated, but the declaration module cannot.",
        ));
    }
    if declaration_callable && !source_callable {
        findings.push(CriticFinding::new(
            ErrorKind::DeclarationIsCallable,
            "Declaration module can be called or instantiated, but the source module cannot.",
        ));
    }
}

/// Symmetric difference of the two property-name sets, after the fixed
/// ignore rule.
fn check_properties(
    source_type: &dyn TypeHandle,
    declaration_type: &dyn TypeHandle,
    findings: &mut Vec<CriticFinding>,
) {
    let source_properties = source_type.properties();
    let declaration_properties = declaration_type.properties();

    for property in &source_properties {
        if ignore_property(&property.name) {
            continue;
        }
        if !declaration_properties.iter().any(|p| p.name == property.name) {
            findings.push(CriticFinding::new(
                ErrorKind::SourcePropertyNotDeclared,
                format!(
                    "Source module exports property named '{}', which is missing from \
                     the declaration's exports.",
                    property.name
                ),
            ));
        }
    }

    for property in &declaration_properties {
        if ignore_property(&property.name) {
            continue;
        }
        if !source_properties.iter().any(|p| p.name == property.name) {
            let mut finding = CriticFinding::new(
                ErrorKind::DeclaredPropertyNotInSource,
                format!(
                    "Declaration module exports property named '{}', which is missing \
                     from the source's exports.",
                    property.name
                ),
            );
            if let Some(position) = property.declaration_position {
                finding = finding.with_position(position);
            }
            findings.push(finding);
        }
    }
}

/// The declaration asserts a default export the source does not expose.
fn check_default_export(
    source: &SourceModule,
    declaration: &DeclarationModule,
    findings: &mut Vec<CriticFinding>,
) {
    let Some(assertion) = &declaration.default_export else {
        return;
    };
    if source.exposes_default {
        return;
    }
    let mut finding = CriticFinding::new(
        ErrorKind::NoDefaultExport,
        "Declaration specifies 'export default' but the source does not mention \
         'default' anywhere.\n\nThe most common way to resolve this error is to use \
         'export =' instead of 'export default'.",
    );
    if let Some(position) = assertion.position {
        finding = finding.with_position(position);
    }
    findings.push(finding);
}

/// The fixed ignore rule for property comparison.
fn ignore_property(name: &str) -> bool {
    name.starts_with('_') || IGNORED_PROPERTIES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{DefaultExportAssertion, DefaultExportOrigin};
    use crate::judge::ExportEqualsVerdict;
    use crate::oracle::{TypeFlag, TypeHandleBox};
    use crate::types::{InferenceFailure, Position, PropertySymbol};

    #[derive(Default)]
    struct Canned {
        properties: Vec<PropertySymbol>,
        calls: usize,
        constructs: usize,
        flags: Vec<TypeFlag>,
    }

    impl TypeHandle for Canned {
        fn properties(&self) -> Vec<PropertySymbol> {
            self.properties.clone()
        }
        fn call_signature_count(&self) -> usize {
            self.calls
        }
        fn construct_signature_count(&self) -> usize {
            self.constructs
        }
        fn is_array_like(&self) -> bool {
            false
        }
        fn flags(&self) -> Vec<TypeFlag> {
            self.flags.clone()
        }
        fn render(&self) -> String {
            "canned".to_owned()
        }
    }

    fn object_with(properties: Vec<PropertySymbol>) -> TypeHandleBox {
        Box::new(Canned {
            properties,
            flags: vec![TypeFlag::Object],
            ..Canned::default()
        })
    }

    fn source(export_type: TypeHandleBox) -> SourceModule {
        SourceModule {
            export_style: ExportStyle::NamedExports,
            export_type: Ok(export_type),
            export_equals: None,
            exposes_default: false,
        }
    }

    fn declaration(export_type: TypeHandleBox) -> DeclarationModule {
        DeclarationModule {
            export_style: ExportStyle::NamedExports,
            export_type: Ok(export_type),
            default_export: None,
        }
    }

    #[test]
    fn matching_shapes_produce_no_findings() {
        let comparison = compare(
            &source(object_with(vec![PropertySymbol::new("foo")])),
            &declaration(object_with(vec![PropertySymbol::new("foo")])),
        );
        assert!(comparison.findings.is_empty());
        assert!(comparison.shape_check_failure.is_none());
    }

    #[test]
    fn source_property_missing_from_declaration() {
        let comparison = compare(
            &source(object_with(vec![PropertySymbol::new("foo")])),
            &declaration(object_with(Vec::new())),
        );
        assert_eq!(comparison.findings.len(), 1);
        let finding = &comparison.findings[0];
        assert_eq!(finding.kind, ErrorKind::SourcePropertyNotDeclared);
        assert!(finding.message.contains("'foo'"));
        assert!(finding.position.is_none());
    }

    #[test]
    fn declared_property_missing_from_source_carries_position() {
        let comparison = compare(
            &source(object_with(Vec::new())),
            &declaration(object_with(vec![
                PropertySymbol::new("foo").with_position(Position::new(67, 11)),
            ])),
        );
        assert_eq!(comparison.findings.len(), 1);
        let finding = &comparison.findings[0];
        assert_eq!(finding.kind, ErrorKind::DeclaredPropertyNotInSource);
        assert_eq!(finding.position, Some(Position::new(67, 11)));
    }

    #[test]
    fn ignored_properties_never_compared() {
        let comparison = compare(
            &source(object_with(vec![
                PropertySymbol::new("__esModule"),
                PropertySymbol::new("prototype"),
                PropertySymbol::new("default"),
                PropertySymbol::new("_private"),
            ])),
            &declaration(object_with(Vec::new())),
        );
        assert!(comparison.findings.is_empty());
    }

    #[test]
    fn callability_checked_both_directions() {
        let callable = Box::new(Canned {
            calls: 1,
            flags: vec![TypeFlag::Object],
            ..Canned::default()
        });
        let comparison = compare(&source(callable), &declaration(object_with(Vec::new())));
        assert_eq!(comparison.findings.len(), 1);
        assert_eq!(comparison.findings[0].kind, ErrorKind::SourceIsCallable);

        let constructable = Box::new(Canned {
            constructs: 1,
            flags: vec![TypeFlag::Object],
            ..Canned::default()
        });
        let comparison = compare(&source(object_with(Vec::new())), &declaration(constructable));
        assert_eq!(comparison.findings.len(), 1);
        assert_eq!(comparison.findings[0].kind, ErrorKind::DeclarationIsCallable);
    }

    #[test]
    fn failed_source_type_suppresses_shape_checks() {
        let src = SourceModule {
            export_style: ExportStyle::WholeModuleAssignment,
            export_type: Err(InferenceFailure::new("no symbol")),
            export_equals: None,
            exposes_default: false,
        };
        let comparison = compare(
            &src,
            &declaration(object_with(vec![PropertySymbol::new("foo")])),
        );
        assert!(comparison.findings.is_empty());
        let failure = comparison.shape_check_failure.unwrap();
        assert!(failure.reason.contains("source module"));
    }

    #[test]
    fn bad_declaration_type_suppresses_shape_checks() {
        let bad = Box::new(Canned {
            flags: vec![TypeFlag::Any],
            ..Canned::default()
        });
        let comparison = compare(
            &source(object_with(vec![PropertySymbol::new("foo")])),
            &declaration(bad),
        );
        assert!(comparison.findings.is_empty());
        assert!(comparison.shape_check_failure.is_some());
    }

    #[test]
    fn export_equals_mismatch_embeds_reason() {
        let src = SourceModule {
            export_style: ExportStyle::WholeModuleAssignment,
            export_type: Ok(object_with(Vec::new())),
            export_equals: Some(Ok(ExportEqualsVerdict {
                judgement: ExportEqualsJudgement::Required,
                reason: "the module's export value can be called as a function".to_owned(),
            })),
            exposes_default: false,
        };
        let comparison = compare(&src, &declaration(object_with(Vec::new())));
        assert_eq!(comparison.findings.len(), 1);
        let finding = &comparison.findings[0];
        assert_eq!(finding.kind, ErrorKind::NeedsWholeModuleExport);
        assert!(finding.message.contains("can be called as a function"));
    }

    #[test]
    fn export_equals_satisfied_by_whole_module_declaration() {
        let src = SourceModule {
            export_style: ExportStyle::WholeModuleAssignment,
            export_type: Ok(object_with(Vec::new())),
            export_equals: Some(Ok(ExportEqualsVerdict {
                judgement: ExportEqualsJudgement::Required,
                reason: "callable".to_owned(),
            })),
            exposes_default: false,
        };
        let decl = DeclarationModule {
            export_style: ExportStyle::WholeModuleAssignment,
            export_type: Ok(object_with(Vec::new())),
            default_export: None,
        };
        let comparison = compare(&src, &decl);
        assert!(comparison.findings.is_empty());
    }

    #[test]
    fn default_export_mismatch_carries_assertion_position() {
        let mut decl = declaration(object_with(Vec::new()));
        decl.default_export = Some(DefaultExportAssertion {
            position: Some(Position::new(29, 12)),
            origin: DefaultExportOrigin::TextualFallback,
        });
        let comparison = compare(&source(object_with(Vec::new())), &decl);
        assert_eq!(comparison.findings.len(), 1);
        let finding = &comparison.findings[0];
        assert_eq!(finding.kind, ErrorKind::NoDefaultExport);
        assert_eq!(finding.position, Some(Position::new(29, 12)));
    }

    #[test]
    fn default_export_satisfied_by_source_evidence() {
        let mut decl = declaration(object_with(Vec::new()));
        decl.default_export = Some(DefaultExportAssertion {
            position: None,
            origin: DefaultExportOrigin::TypeEvidence,
        });
        let mut src = source(object_with(Vec::new()));
        src.exposes_default = true;
        let comparison = compare(&src, &decl);
        assert!(comparison.findings.is_empty());
    }

    #[test]
    fn findings_come_out_in_check_order() {
        let mut src = SourceModule {
            export_style: ExportStyle::WholeModuleAssignment,
            export_type: Ok(Box::new(Canned {
                properties: vec![PropertySymbol::new("foo")],
                calls: 1,
                flags: vec![TypeFlag::Object],
                ..Canned::default()
            })),
            export_equals: Some(Ok(ExportEqualsVerdict {
                judgement: ExportEqualsJudgement::Required,
                reason: "callable".to_owned(),
            })),
            exposes_default: false,
        };
        src.exposes_default = false;
        let mut decl = declaration(object_with(vec![PropertySymbol::new("bar")]));
        decl.default_export = Some(DefaultExportAssertion {
            position: None,
            origin: DefaultExportOrigin::TypeEvidence,
        });

        let kinds: Vec<ErrorKind> = compare(&src, &decl)
            .findings
            .into_iter()
            .map(|f| f.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                ErrorKind::NeedsWholeModuleExport,
                ErrorKind::SourceIsCallable,
                ErrorKind::SourcePropertyNotDeclared,
                ErrorKind::DeclaredPropertyNotInSource,
                ErrorKind::NoDefaultExport,
            ]
        );
    }
}
