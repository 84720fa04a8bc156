//! Finding filtering by kind enablement.
//!
//! Each kind carries a fixed default; a caller-supplied override map wins
//! verbatim where it has an entry. Overrides are keyed by kind name,
//! case-insensitively, and an unrecognized name is a configuration error
//! rather than a silently ignored entry.

use std::collections::HashMap;

use crate::types::{CriticFinding, ErrorKind};

/// Errors in caller-supplied filter configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An override named a kind that does not exist.
    #[error("unknown finding kind '{name}'")]
    UnknownKind {
        /// The unrecognized name as supplied.
        name: String,
    },
}

/// A possibly-partial override of which finding kinds are reported.
#[derive(Debug, Clone, Default)]
pub struct KindFilter {
    overrides: HashMap<ErrorKind, bool>,
}

impl KindFilter {
    /// Creates a filter with no overrides; every kind keeps its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a filter from name/enabled pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownKind`] for any name that does not
    /// resolve to a kind.
    pub fn from_names<'a, I>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let mut overrides = HashMap::new();
        for (name, enabled) in entries {
            let kind = ErrorKind::from_name(name).ok_or_else(|| ConfigError::UnknownKind {
                name: name.to_owned(),
            })?;
            overrides.insert(kind, enabled);
        }
        Ok(Self { overrides })
    }

    /// Sets an explicit override for one kind.
    #[must_use]
    pub fn with_kind(mut self, kind: ErrorKind, enabled: bool) -> Self {
        self.overrides.insert(kind, enabled);
        self
    }

    /// Whether findings of `kind` are retained under this filter.
    #[must_use]
    pub fn is_enabled(&self, kind: ErrorKind) -> bool {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_enabled())
    }

    /// Retains the findings whose kind is enabled, preserving order.
    #[must_use]
    pub fn apply(&self, findings: Vec<CriticFinding>) -> Vec<CriticFinding> {
        findings
            .into_iter()
            .filter(|finding| self.is_enabled(finding.kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_overrides() {
        let filter = KindFilter::new();
        assert!(filter.is_enabled(ErrorKind::NeedsWholeModuleExport));
        assert!(!filter.is_enabled(ErrorKind::SourceIsCallable));
    }

    #[test]
    fn override_wins_over_default() {
        let filter = KindFilter::new()
            .with_kind(ErrorKind::SourceIsCallable, true)
            .with_kind(ErrorKind::NoDefaultExport, false);
        assert!(filter.is_enabled(ErrorKind::SourceIsCallable));
        assert!(!filter.is_enabled(ErrorKind::NoDefaultExport));
    }

    #[test]
    fn from_names_is_case_insensitive() {
        let filter =
            KindFilter::from_names([("sourcepropertynotdeclared", true)]).unwrap();
        assert!(filter.is_enabled(ErrorKind::SourcePropertyNotDeclared));
    }

    #[test]
    fn from_names_rejects_unknown_kind() {
        let error = KindFilter::from_names([("NotAKind", true)]).unwrap_err();
        assert!(matches!(error, ConfigError::UnknownKind { name } if name == "NotAKind"));
    }

    #[test]
    fn apply_preserves_order_of_retained_findings() {
        let filter = KindFilter::new().with_kind(ErrorKind::SourceIsCallable, true);
        let findings = vec![
            CriticFinding::new(ErrorKind::SourceIsCallable, "first"),
            CriticFinding::new(ErrorKind::DeclarationIsCallable, "dropped"),
            CriticFinding::new(ErrorKind::NoDefaultExport, "second"),
        ];
        let retained = filter.apply(findings);
        let messages: Vec<&str> = retained.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, ["first", "second"]);
    }
}
