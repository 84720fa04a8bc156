//! Core types for audit findings and inference results.

use miette::{Diagnostic, SourceSpan};
use serde::{Deserialize, Serialize};

/// A location inside the declaration file.
///
/// Offsets are 0-based character offsets into the declaration's source text.
/// Positions never point into the source module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Start offset of the span.
    pub start: usize,
    /// Length of the span.
    pub length: usize,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }
}

/// An exported property as seen by an oracle.
///
/// Declaration-side symbols carry the position of their first declaration
/// node so findings can point at them; source-side symbols usually do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySymbol {
    /// Property name, unique within one export type.
    pub name: String,
    /// Position of the first declaration of this property, if tracked.
    pub declaration_position: Option<Position>,
}

impl PropertySymbol {
    /// Creates a symbol without a tracked declaration position.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declaration_position: None,
        }
    }

    /// Attaches the position of the property's first declaration node.
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.declaration_position = Some(position);
        self
    }
}

/// The closed set of finding kinds the analyzer can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Declaration is for a distributed package but no registry package matches.
    NoMatchingPackage,
    /// Declaration's requested version does not exist in the registry.
    NoMatchingVersion,
    /// Declaration is marked non-distributed but a registry package of that name exists.
    NonDistributedHasMatchingPackage,
    /// Declaration must use the whole-module-export convention to be faithful.
    NeedsWholeModuleExport,
    /// Declaration asserts a default export the source does not expose.
    NoDefaultExport,
    /// Source exports a property the declaration does not declare.
    SourcePropertyNotDeclared,
    /// Declaration declares a property the source does not export.
    DeclaredPropertyNotInSource,
    /// Source module is callable or constructable, declaration is not.
    SourceIsCallable,
    /// Declaration module is callable or constructable, source is not.
    DeclarationIsCallable,
}

/// Default enablement per kind. The strict shape checks are off by default
/// because source-side type inference is often incomplete; re-enabling them
/// is a configuration change, not a code change.
const DEFAULT_ENABLEMENT: &[(ErrorKind, bool)] = &[
    (ErrorKind::NoMatchingPackage, true),
    (ErrorKind::NoMatchingVersion, true),
    (ErrorKind::NonDistributedHasMatchingPackage, true),
    (ErrorKind::NeedsWholeModuleExport, true),
    (ErrorKind::NoDefaultExport, true),
    (ErrorKind::SourcePropertyNotDeclared, false),
    (ErrorKind::DeclaredPropertyNotInSource, false),
    (ErrorKind::SourceIsCallable, false),
    (ErrorKind::DeclarationIsCallable, false),
];

impl ErrorKind {
    /// All kinds, in reporting order.
    pub const ALL: [ErrorKind; 9] = [
        ErrorKind::NoMatchingPackage,
        ErrorKind::NoMatchingVersion,
        ErrorKind::NonDistributedHasMatchingPackage,
        ErrorKind::NeedsWholeModuleExport,
        ErrorKind::NoDefaultExport,
        ErrorKind::SourcePropertyNotDeclared,
        ErrorKind::DeclaredPropertyNotInSource,
        ErrorKind::SourceIsCallable,
        ErrorKind::DeclarationIsCallable,
    ];

    /// Canonical name of this kind.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::NoMatchingPackage => "NoMatchingPackage",
            Self::NoMatchingVersion => "NoMatchingVersion",
            Self::NonDistributedHasMatchingPackage => "NonDistributedHasMatchingPackage",
            Self::NeedsWholeModuleExport => "NeedsWholeModuleExport",
            Self::NoDefaultExport => "NoDefaultExport",
            Self::SourcePropertyNotDeclared => "SourcePropertyNotDeclared",
            Self::DeclaredPropertyNotInSource => "DeclaredPropertyNotInSource",
            Self::SourceIsCallable => "SourceIsCallable",
            Self::DeclarationIsCallable => "DeclarationIsCallable",
        }
    }

    /// Looks up a kind from a free-form name, case-insensitively.
    ///
    /// Returns `None` for unrecognized names; callers treat that as a
    /// configuration error rather than ignoring the entry.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    /// Whether findings of this kind are reported absent an explicit override.
    #[must_use]
    pub fn default_enabled(self) -> bool {
        DEFAULT_ENABLEMENT
            .iter()
            .find(|(kind, _)| *kind == self)
            .map_or(false, |(_, enabled)| *enabled)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A structural disagreement between a declaration and its source module.
///
/// Findings are data, never errors: a failed analysis aborts the call
/// instead of producing findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticFinding {
    /// The kind of disagreement.
    pub kind: ErrorKind,
    /// Human-readable message, including remediation advice where known.
    pub message: String,
    /// Location in the declaration file, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl CriticFinding {
    /// Creates a finding without a position.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            position: None,
        }
    }

    /// Attaches a declaration-file position to this finding.
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

impl std::fmt::Display for CriticFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(position) = self.position {
            write!(f, " (at offset {}, length {})", position.start, position.length)?;
        }
        Ok(())
    }
}

/// The oracle could not produce a usable answer.
///
/// Distinct from a [`CriticFinding`]: a failure suppresses the checks that
/// depended on the failed value and is surfaced only through diagnostic
/// output, never through the finding list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("{reason}")]
pub struct InferenceFailure {
    /// Why the oracle gave up.
    pub reason: String,
}

impl InferenceFailure {
    /// Creates a failure with the given reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Outcome of one oracle inference: a usable value or the reason there is none.
pub type InferenceResult<T> = Result<T, InferenceFailure>;

/// Converts a [`CriticFinding`] to a miette diagnostic for rich display
/// against the declaration's source text.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{message}")]
pub struct FindingDiagnostic {
    message: String,
    #[label("{label}")]
    span: Option<SourceSpan>,
    label: String,
}

impl From<&CriticFinding> for FindingDiagnostic {
    fn from(finding: &CriticFinding) -> Self {
        Self {
            message: finding.message.clone(),
            span: finding
                .position
                .map(|p| SourceSpan::from((p.start, p.length))),
            label: finding.kind.name().to_owned(),
        }
    }
}
