//! Module descriptors.
//!
//! One descriptor per side of a comparison, built once per analysis and
//! immutable afterward. The two sides carry different data, so they are two
//! types rather than one struct with optional fields: the export-equals
//! verdict only exists for whole-module source modules, and only the
//! declaration side tracks a positioned default-export assertion.

use crate::classify::ExportStyle;
use crate::detect::DefaultExportAssertion;
use crate::judge::ExportEqualsVerdict;
use crate::oracle::TypeHandleBox;
use crate::types::InferenceResult;

/// The inferred shape of a source module.
pub struct SourceModule {
    /// How the module exposes its public surface.
    pub export_style: ExportStyle,
    /// The inferred type of the top-level export value.
    pub export_type: InferenceResult<TypeHandleBox>,
    /// Whether a faithful declaration must use the whole-module convention.
    /// Present only when `export_style` is whole-module assignment and the
    /// export type resolved.
    pub export_equals: Option<InferenceResult<ExportEqualsVerdict>>,
    /// Whether the module plausibly exposes a default member.
    pub exposes_default: bool,
}

/// The asserted shape of a declaration file.
pub struct DeclarationModule {
    /// Which export convention the declaration uses.
    pub export_style: ExportStyle,
    /// The declared type of the top-level export value.
    pub export_type: InferenceResult<TypeHandleBox>,
    /// The declaration's default-export assertion, if it makes one.
    pub default_export: Option<DefaultExportAssertion>,
}
