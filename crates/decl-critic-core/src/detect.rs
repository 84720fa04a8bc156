//! Default-export detection.
//!
//! The primary signal is type evidence: a resolved declaration type exposing
//! a property literally named `default`. When declaration-side resolution
//! failed, a textual fallback decides whether to still raise a mismatch.
//! On the source side, pure syntactic inference cannot see through dynamic
//! export rewriting, so detection scans for a curated set of literal markers
//! and a name allow-list of modules known to really ship a default export.
//! The fallback deliberately over-approximates.

use serde::{Deserialize, Serialize};

use crate::oracle::TypeHandleBox;
use crate::types::{InferenceResult, Position};

/// The property name that represents a default export.
const DEFAULT_PROPERTY: &str = "default";
/// The declaration syntax asserting a default export.
const EXPORT_DEFAULT_TOKEN: &str = "export default";
/// The declaration syntax for the whole-module convention.
const EXPORT_EQUALS_TOKEN: &str = "export =";

/// Which path produced a default-export assertion.
///
/// Textual evidence is less trustworthy than type evidence; callers can
/// tell the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultExportOrigin {
    /// A resolved type exposed a `default` property.
    TypeEvidence,
    /// The declaration text mentioned `export default` while type
    /// resolution had failed.
    TextualFallback,
}

/// A declaration's assertion that the module has a default export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultExportAssertion {
    /// Position of the assertion in the declaration file, when known.
    pub position: Option<Position>,
    /// Which path produced this assertion.
    pub origin: DefaultExportOrigin,
}

/// Detects default exports on both sides of a comparison.
///
/// The marker and allow lists are hand-curated from observed cases and are
/// fields rather than constants so deployments can extend them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultExportDetector {
    /// Literal substrings whose presence in the source text counts as
    /// evidence of a (possibly rewritten) default export.
    pub markers: Vec<String>,
    /// Module names known to expose a real default export that the markers
    /// miss. Matched by substring.
    pub known_default_exporters: Vec<String>,
}

impl Default for DefaultExportDetector {
    fn default() -> Self {
        Self {
            markers: vec![
                DEFAULT_PROPERTY.to_owned(),
                "__esModule".to_owned(),
                "react-side-effect".to_owned(),
                "@flow".to_owned(),
                "module.exports = require".to_owned(),
            ],
            known_default_exporters: vec![
                "react-native".to_owned(),
                "ember-feature-flags".to_owned(),
                "material-ui-datatables".to_owned(),
            ],
        }
    }
}

impl DefaultExportDetector {
    /// Creates a detector with the curated default lists.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides whether a source module plausibly exposes a default member.
    ///
    /// Absence of every marker is a negative verdict here, but callers only
    /// use that to confirm an assertion made by the declaration side.
    #[must_use]
    pub fn source_exposes_default(&self, source_text: &str, module_name: &str) -> bool {
        if self
            .known_default_exporters
            .iter()
            .any(|name| module_name.contains(name.as_str()))
        {
            return true;
        }
        self.markers
            .iter()
            .any(|marker| source_text.contains(marker.as_str()))
    }

    /// Finds the declaration's default-export assertion, if any.
    ///
    /// With a successfully resolved declaration type, only a property
    /// literally named `default` counts; absence is inconclusive, not
    /// negative. When resolution failed, the textual fallback looks for an
    /// `export default` token in a declaration that is neither using the
    /// whole-module convention nor ambient-module syntax.
    #[must_use]
    pub fn declaration_default_export(
        &self,
        export_type: &InferenceResult<TypeHandleBox>,
        declaration_text: &str,
    ) -> Option<DefaultExportAssertion> {
        match export_type {
            Ok(ty) => ty
                .properties()
                .into_iter()
                .find(|property| property.name == DEFAULT_PROPERTY)
                .map(|property| DefaultExportAssertion {
                    position: property.declaration_position,
                    origin: DefaultExportOrigin::TypeEvidence,
                }),
            Err(_) => {
                let start = declaration_text.find(EXPORT_DEFAULT_TOKEN)?;
                if declaration_text.contains(EXPORT_EQUALS_TOKEN)
                    || has_ambient_module_syntax(declaration_text)
                {
                    return None;
                }
                Some(DefaultExportAssertion {
                    position: Some(Position::new(start, EXPORT_DEFAULT_TOKEN.len())),
                    origin: DefaultExportOrigin::TextualFallback,
                })
            }
        }
    }
}

/// Whether the declaration text uses ambient-module syntax.
fn has_ambient_module_syntax(text: &str) -> bool {
    text.contains("declare module '") || text.contains("declare module \"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{TypeFlag, TypeHandle};
    use crate::types::{InferenceFailure, PropertySymbol};

    struct WithProperties(Vec<PropertySymbol>);

    impl TypeHandle for WithProperties {
        fn properties(&self) -> Vec<PropertySymbol> {
            self.0.clone()
        }
        fn call_signature_count(&self) -> usize {
            0
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
            "{}".to_owned()
        }
    }

    #[test]
    fn source_marker_detection() {
        let detector = DefaultExportDetector::new();
        assert!(detector.source_exposes_default("exports.default = thing;", "pkg"));
        assert!(detector.source_exposes_default("Object.defineProperty(exports, \"__esModule\", { value: true });", "pkg"));
        assert!(detector.source_exposes_default("module.exports = require('./lib');", "pkg"));
        assert!(!detector.source_exposes_default("module.exports.foo = 1;", "pkg"));
    }

    #[test]
    fn source_allow_list_matches_by_substring() {
        let detector = DefaultExportDetector::new();
        assert!(detector.source_exposes_default("", "react-native-maps"));
        assert!(detector.source_exposes_default("", "ember-feature-flags"));
        assert!(!detector.source_exposes_default("", "left-pad"));
    }

    #[test]
    fn type_evidence_wins_when_type_resolved() {
        let detector = DefaultExportDetector::new();
        let ty: TypeHandleBox = Box::new(WithProperties(vec![
            PropertySymbol::new("default").with_position(Position::new(10, 14)),
        ]));
        let assertion = detector
            .declaration_default_export(&Ok(ty), "irrelevant")
            .unwrap();
        assert_eq!(assertion.origin, DefaultExportOrigin::TypeEvidence);
        assert_eq!(assertion.position, Some(Position::new(10, 14)));
    }

    #[test]
    fn resolved_type_without_default_is_inconclusive() {
        let detector = DefaultExportDetector::new();
        let ty: TypeHandleBox = Box::new(WithProperties(vec![PropertySymbol::new("foo")]));
        // Even though the raw text mentions the token, type evidence rules.
        assert!(detector
            .declaration_default_export(&Ok(ty), "export default foo;")
            .is_none());
    }

    #[test]
    fn textual_fallback_finds_token_position() {
        let detector = DefaultExportDetector::new();
        let text = "declare const x: number;\nexport default x;\n";
        let assertion = detector
            .declaration_default_export(&Err(InferenceFailure::new("no type")), text)
            .unwrap();
        assert_eq!(assertion.origin, DefaultExportOrigin::TextualFallback);
        let position = assertion.position.unwrap();
        assert_eq!(position.start, text.find("export default").unwrap());
        assert_eq!(position.length, "export default".len());
    }

    #[test]
    fn textual_fallback_suppressed_by_export_equals() {
        let detector = DefaultExportDetector::new();
        let text = "export = x;\nexport default x;\n";
        assert!(detector
            .declaration_default_export(&Err(InferenceFailure::new("no type")), text)
            .is_none());
    }

    #[test]
    fn textual_fallback_suppressed_by_ambient_module() {
        let detector = DefaultExportDetector::new();
        let text = "declare module \"pkg\" {\n  export default function f(): void;\n}\n";
        assert!(detector
            .declaration_default_export(&Err(InferenceFailure::new("no type")), text)
            .is_none());
    }

    #[test]
    fn custom_marker_list_is_honored() {
        let detector = DefaultExportDetector {
            markers: vec!["my-marker".to_owned()],
            known_default_exporters: Vec::new(),
        };
        assert!(detector.source_exposes_default("// my-marker", "pkg"));
        assert!(!detector.source_exposes_default("exports.default = 1;", "pkg"));
    }
}
