//! # decl-critic-core
//!
//! Core framework for auditing hand-written declaration files against the
//! runtime-observable shape of the module they describe.
//!
//! The crate is organized around a type-oracle capability interface: an
//! oracle parses a module into a simplified syntax tree and resolves the
//! type of its top-level export value, and everything else reasons about
//! the answers:
//!
//! - [`classify_exports`] decides which export convention a module uses
//! - [`needs_whole_module_export`] judges whether a declaration must use
//!   the whole-module-export convention
//! - [`DefaultExportDetector`] finds default-export assertions and evidence
//! - [`compare`] diffs the two descriptors into [`CriticFinding`]s
//! - [`KindFilter`] applies per-kind enablement on top of fixed defaults
//! - [`resolve_version`] picks a published version for a `major.minor`
//!   request
//!
//! All state lives for the duration of one comparison; there is no
//! cross-call cache and no synchronization, so independent analyses can run
//! concurrently as long as each gets its own oracle.

mod classify;
mod compare;
mod descriptor;
mod detect;
mod filter;
mod header;
mod inspect;
mod judge;
mod names;
mod oracle;
mod types;
mod version;

pub use classify::{classify_exports, ExportStyle};
pub use compare::{compare, Comparison};
pub use descriptor::{DeclarationModule, SourceModule};
pub use detect::{DefaultExportAssertion, DefaultExportDetector, DefaultExportOrigin};
pub use filter::{ConfigError, KindFilter};
pub use header::{parse_header, Header};
pub use inspect::{inspect_declaration, inspect_source};
pub use judge::{needs_whole_module_export, ExportEqualsJudgement, ExportEqualsVerdict};
pub use names::{declaration_name, mangle_scoped, unmangle_scoped, DEFAULT_PACKAGE_NAME};
pub use oracle::{
    ModuleDialect, NodeKind, OracleError, SyntaxNode, SyntaxTree, TypeFlag, TypeHandle,
    TypeHandleBox, TypeOracle,
};
pub use types::{
    CriticFinding, ErrorKind, FindingDiagnostic, InferenceFailure, InferenceResult, Position,
    PropertySymbol,
};
pub use version::{resolve_version, MajorMinor, RegistryVersions, VersionResolution};
