//! # decl-critic-ts
//!
//! Tree-sitter backed type oracle for decl-critic.
//!
//! This oracle is syntactic and best-effort: it reads export shapes off the
//! parse tree (assignments to the conventional exports binding, exported
//! declarations, `export =` targets and their declared types) and answers
//! the analyzer's structural questions from what the syntax shows. Anything
//! it cannot see - dynamic rewriting, cross-module re-exports, compound
//! types - is an inference failure, which the analyzer treats as "skip the
//! dependent check", never as a finding.
//!
//! Source modules parse with the JavaScript grammar; declaration files
//! parse with the TypeScript grammar.

mod decl;
mod lower;
mod oracle;
mod shape;
mod source;

pub use oracle::SyntacticOracle;
