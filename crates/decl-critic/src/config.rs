//! TOML configuration for the critic.
//!
//! ```toml
//! sources_dir = "sources"
//! cache_snapshot = "sources/.decl-critic/lookups.json"
//!
//! [kinds]
//! SourcePropertyNotDeclared = true
//! NoDefaultExport = false
//!
//! [detector]
//! markers = ["default", "__esModule"]
//! known_default_exporters = ["react-native"]
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use decl_critic_core::{ConfigError, DefaultExportDetector, KindFilter};
use serde::{Deserialize, Serialize};

/// Top-level configuration for decl-critic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CriticConfig {
    /// Directory downloaded packages are extracted into.
    #[serde(default)]
    pub sources_dir: Option<PathBuf>,

    /// Path of the registry lookup cache snapshot.
    #[serde(default)]
    pub cache_snapshot: Option<PathBuf>,

    /// Per-kind enablement overrides, keyed by kind name.
    #[serde(default)]
    pub kinds: HashMap<String, bool>,

    /// Default-export heuristic overrides.
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Names exempt from the non-distributed conflict check.
    #[serde(default)]
    pub known_squatters: Option<Vec<String>>,
}

/// Overrides for the hand-curated detector lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Replaces the marker list when present.
    #[serde(default)]
    pub markers: Option<Vec<String>>,

    /// Replaces the known-default-exporter list when present.
    #[serde(default)]
    pub known_default_exporters: Option<Vec<String>>,
}

/// Errors loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// The unreadable path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The TOML is invalid.
    #[error("failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },
}

impl CriticConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigFileError`] when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigFileError::Parse`] when the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigFileError> {
        toml::from_str(content).map_err(|error| ConfigFileError::Parse {
            message: error.to_string(),
        })
    }

    /// Builds the kind filter from the configured overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an override names an unknown kind.
    pub fn kind_filter(&self) -> Result<KindFilter, ConfigError> {
        KindFilter::from_names(
            self.kinds
                .iter()
                .map(|(name, enabled)| (name.as_str(), *enabled)),
        )
    }

    /// Builds the detector, with configured list overrides applied.
    #[must_use]
    pub fn detector(&self) -> DefaultExportDetector {
        let mut detector = DefaultExportDetector::new();
        if let Some(markers) = &self.detector.markers {
            detector.markers = markers.clone();
        }
        if let Some(names) = &self.detector.known_default_exporters {
            detector.known_default_exporters = names.clone();
        }
        detector
    }
}
