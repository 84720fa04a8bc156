//! # decl-critic
//!
//! Audits a hand-written declaration file against the real,
//! runtime-observable shape of the module it describes, flagging
//! structural drift: missing exports, wrong call or construct capability,
//! and misuse of the whole-module-export convention.
//!
//! This is the facade crate; it composes the analyzer core, the
//! tree-sitter oracle, and the registry adapter into one pipeline.
//!
//! ```no_run
//! use decl_critic::{Critic, SyntacticOracle};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), decl_critic::CriticError> {
//! let critic = Critic::new(Box::new(SyntacticOracle::new()));
//! let outcome = critic.critique(
//!     Path::new("types/left-pad/index.d.ts"),
//!     Some(Path::new("sources/left-pad/index.js")),
//! )?;
//! for finding in &outcome.findings {
//!     println!("{finding}");
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod critique;

pub use config::{ConfigFileError, CriticConfig, DetectorConfig};
pub use critique::{Critic, CriticError, CritiqueOutcome, ExportsDiagnostics, SourceCheck};

// Re-export the pieces callers compose.
pub use decl_critic_core::*;
pub use decl_critic_registry::{
    ensure_tools_available, LookupCache, NpmCliRegistry, PackageLookup, Registry, RegistryError,
};
pub use decl_critic_ts::SyntacticOracle;
