//! The critique pipeline.
//!
//! Ties the pieces together: derive the package name from the declaration
//! path, check the registry story told by the header, locate or download
//! the source module, build both descriptors, compare them, and filter the
//! findings. Fatal problems (unreadable files, missing tools, unusable
//! registry output) abort the call; inference failures only suppress the
//! checks that needed them and surface through the diagnostics.

use std::path::{Path, PathBuf};

use decl_critic_core::{
    compare, declaration_name, inspect_declaration, inspect_source, mangle_scoped, parse_header,
    resolve_version, ConfigError, CriticFinding, DefaultExportDetector, ErrorKind, ExportStyle,
    ExportEqualsVerdict, InferenceFailure, InferenceResult, KindFilter, OracleError,
    TypeOracle, VersionResolution,
};
use decl_critic_registry::{locate_entry_point, PackageLookup, Registry, RegistryError};
use tracing::{info, warn};

/// Directory packages are downloaded into when no source path is supplied.
const DEFAULT_SOURCES_DIR: &str = "sources";

/// Package names that collide with registry squatters; a non-distributed
/// declaration by one of these names is not a conflict.
const KNOWN_SQUATTERS: &[&str] = &[
    "atom",
    "ember__string",
    "fancybox",
    "jsqrcode",
    "node",
    "geojson",
    "titanium",
];

/// Fatal errors: configuration problems that abort the whole analysis.
/// Structural disagreements are never reported this way.
#[derive(Debug, thiserror::Error)]
pub enum CriticError {
    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The unreadable path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A module could not be parsed at all.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// Registry interaction failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Caller-supplied configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No source module was supplied and no registry is configured to
    /// download one.
    #[error("no source module available for '{name}': pass a source path or configure a registry")]
    NoSource {
        /// The package whose source is missing.
        name: String,
    },
}

/// Everything the analyzer inferred on the way to its findings, rendered
/// for debug output. Inference failures live here, not in the finding list.
#[derive(Debug, Clone)]
pub struct ExportsDiagnostics {
    /// The source module's export style.
    pub source_style: ExportStyle,
    /// The source export type, rendered, or why it could not be inferred.
    pub source_type: InferenceResult<String>,
    /// The export-equals verdict, when one was evaluated.
    pub source_export_equals: Option<InferenceResult<ExportEqualsVerdict>>,
    /// The declaration's export style.
    pub declaration_style: ExportStyle,
    /// The declared export type, rendered, or why it could not be inferred.
    pub declaration_type: InferenceResult<String>,
    /// Why the callability and property checks were suppressed, if they were.
    pub shape_check_failure: Option<InferenceFailure>,
}

impl ExportsDiagnostics {
    /// Formats the diagnostics for `--debug` output.
    #[must_use]
    pub fn format(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!("Inferred source module structure: {}", self.source_style));
        lines.push(match &self.source_type {
            Ok(rendered) => format!("Inferred source export type: {rendered}"),
            Err(failure) => format!("Could not infer source export type. Reason: {failure}"),
        });
        if let Some(verdict) = &self.source_export_equals {
            lines.push(match verdict {
                Ok(verdict) => format!(
                    "Whole-module export convention {}: {}",
                    verdict.judgement, verdict.reason
                ),
                Err(failure) => format!("Could not judge export convention. Reason: {failure}"),
            });
        }
        lines.push(format!(
            "Inferred declaration structure: {}",
            self.declaration_style
        ));
        lines.push(match &self.declaration_type {
            Ok(rendered) => format!("Inferred declaration export type: {rendered}"),
            Err(failure) => {
                format!("Could not infer declaration export type. Reason: {failure}")
            }
        });
        if let Some(failure) = &self.shape_check_failure {
            lines.push(format!("Shape comparison skipped. Reason: {failure}"));
        }
        lines.join("\n")
    }
}

/// The result of comparing one declaration against one source module.
pub struct SourceCheck {
    /// Unfiltered findings, in check order.
    pub findings: Vec<CriticFinding>,
    /// What was inferred along the way.
    pub diagnostics: ExportsDiagnostics,
}

/// The result of a full critique run.
#[derive(Debug)]
pub struct CritiqueOutcome {
    /// Findings that survived the kind filter.
    pub findings: Vec<CriticFinding>,
    /// Diagnostics of the source comparison, when one ran.
    pub diagnostics: Option<ExportsDiagnostics>,
}

/// The analyzer: one oracle, a detector, a kind filter, and optionally a
/// registry for the package-level checks and the auto-download path.
///
/// Holds no cross-call state; independent critiques can run concurrently
/// on separate instances.
pub struct Critic {
    oracle: Box<dyn TypeOracle>,
    detector: DefaultExportDetector,
    filter: KindFilter,
    registry: Option<Box<dyn Registry>>,
    known_squatters: Vec<String>,
    sources_dir: PathBuf,
}

impl Critic {
    /// Creates a critic with default detector, filter, and no registry.
    #[must_use]
    pub fn new(oracle: Box<dyn TypeOracle>) -> Self {
        Self {
            oracle,
            detector: DefaultExportDetector::new(),
            filter: KindFilter::new(),
            registry: None,
            known_squatters: KNOWN_SQUATTERS.iter().map(|s| (*s).to_owned()).collect(),
            sources_dir: PathBuf::from(DEFAULT_SOURCES_DIR),
        }
    }

    /// Replaces the kind filter.
    #[must_use]
    pub fn with_filter(mut self, filter: KindFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Replaces the default-export detector.
    #[must_use]
    pub fn with_detector(mut self, detector: DefaultExportDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Attaches a registry, enabling package-level checks and download.
    #[must_use]
    pub fn with_registry(mut self, registry: Box<dyn Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replaces the squatter allow-list.
    #[must_use]
    pub fn with_known_squatters(mut self, names: Vec<String>) -> Self {
        self.known_squatters = names;
        self
    }

    /// Changes where downloaded packages are extracted.
    #[must_use]
    pub fn with_sources_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sources_dir = dir.into();
        self
    }

    /// Runs the full critique of one declaration.
    ///
    /// With a source path, the registry (when configured) is only consulted
    /// for the package-level checks; without one, the declared version is
    /// resolved and the published source is downloaded.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError`] for configuration problems; structural
    /// disagreements come back as findings.
    pub fn critique(
        &self,
        declaration_path: &Path,
        source_path: Option<&Path>,
    ) -> Result<CritiqueOutcome, CriticError> {
        let declaration_text = read_file(declaration_path)?;
        let header = parse_header(&declaration_text);
        let name = declaration_name(declaration_path);
        info!(package = name.as_str(), "critiquing declaration");

        let mut findings = Vec::new();
        let mut diagnostics = None;

        let non_distributed = header.as_ref().is_some_and(|h| h.non_distributed);
        if non_distributed {
            if let Some(registry) = &self.registry {
                if registry.lookup(&name)?.exists() && !self.is_known_squatter(&name) {
                    findings.push(non_distributed_conflict(&name));
                }
            }
            match source_path {
                Some(source) => {
                    let check = self.check_source(&name, declaration_path, source)?;
                    findings.extend(check.findings);
                    diagnostics = Some(check.diagnostics);
                }
                None => warn!(
                    package = name.as_str(),
                    "declaration is for a non-distributed package; supply a source path to \
                     check it against the real module"
                ),
            }
            return Ok(CritiqueOutcome {
                findings: self.filter.apply(findings),
                diagnostics,
            });
        }

        let resolved_source: PathBuf;
        let source = match source_path {
            Some(source) => source,
            None => {
                resolved_source = self.download_source(&name, header.as_ref(), &mut findings)?;
                if !findings.is_empty() {
                    // Package-level check failed; there is no source to compare.
                    return Ok(CritiqueOutcome {
                        findings: self.filter.apply(findings),
                        diagnostics: None,
                    });
                }
                resolved_source.as_path()
            }
        };

        if source_path.is_some() {
            // The registry story is still checked when a source was supplied
            // explicitly, without downloading anything.
            self.check_package(&name, header.as_ref(), &mut findings)?;
        }

        if findings.is_empty() {
            let check = self.check_source(&name, declaration_path, source)?;
            findings.extend(check.findings);
            diagnostics = Some(check.diagnostics);
        }

        Ok(CritiqueOutcome {
            findings: self.filter.apply(findings),
            diagnostics,
        })
    }

    /// Compares one declaration against one source module. Findings are
    /// not filtered here; `critique` applies the filter once at the end.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError`] when either file cannot be read or parsed.
    pub fn check_source(
        &self,
        name: &str,
        declaration_path: &Path,
        source_path: &Path,
    ) -> Result<SourceCheck, CriticError> {
        let declaration_text = read_file(declaration_path)?;
        let source_text = read_file(source_path)?;

        let source = inspect_source(self.oracle.as_ref(), &source_text, name, &self.detector)?;
        let declaration =
            inspect_declaration(self.oracle.as_ref(), &declaration_text, name, &self.detector)?;

        let source_style = source.export_style;
        let source_type = render_type(&source.export_type);
        let source_export_equals = source.export_equals.clone();
        let declaration_style = declaration.export_style;
        let declaration_type = render_type(&declaration.export_type);

        let comparison = compare(&source, &declaration);

        Ok(SourceCheck {
            findings: comparison.findings,
            diagnostics: ExportsDiagnostics {
                source_style,
                source_type,
                source_export_equals,
                declaration_style,
                declaration_type,
                shape_check_failure: comparison.shape_check_failure,
            },
        })
    }

    /// Package-level checks against the registry, when one is configured.
    fn check_package(
        &self,
        name: &str,
        header: Option<&decl_critic_core::Header>,
        findings: &mut Vec<CriticFinding>,
    ) -> Result<(), CriticError> {
        let Some(registry) = &self.registry else {
            return Ok(());
        };
        match registry.lookup(name)? {
            PackageLookup::NotFound => findings.push(no_matching_package(name)),
            PackageLookup::Found(info) => {
                let requested = header.and_then(|h| h.version);
                if let VersionResolution::NotFound {
                    requested,
                    versions,
                    latest,
                } = resolve_version(requested, &info)
                {
                    findings.push(no_matching_version(name, requested, &versions, latest));
                }
            }
        }
        Ok(())
    }

    /// Resolves the declared version and downloads the published source,
    /// returning the path of its entry file.
    fn download_source(
        &self,
        name: &str,
        header: Option<&decl_critic_core::Header>,
        findings: &mut Vec<CriticFinding>,
    ) -> Result<PathBuf, CriticError> {
        let Some(registry) = &self.registry else {
            return Err(CriticError::NoSource {
                name: name.to_owned(),
            });
        };

        let info = match registry.lookup(name)? {
            PackageLookup::NotFound => {
                findings.push(no_matching_package(name));
                return Ok(PathBuf::new());
            }
            PackageLookup::Found(info) => info,
        };

        let requested = header.and_then(|h| h.version);
        let version = match resolve_version(requested, &info) {
            VersionResolution::Resolved(version) => version,
            VersionResolution::NotFound {
                requested,
                versions,
                latest,
            } => {
                findings.push(no_matching_version(name, requested, &versions, latest));
                return Ok(PathBuf::new());
            }
        };

        let package_dir = registry.fetch_and_extract(name, &version, &self.sources_dir)?;
        Ok(locate_entry_point(&package_dir)?)
    }

    fn is_known_squatter(&self, name: &str) -> bool {
        self.known_squatters.iter().any(|squatter| squatter == name)
    }
}

fn read_file(path: &Path) -> Result<String, CriticError> {
    std::fs::read_to_string(path).map_err(|source| CriticError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn render_type(
    export_type: &InferenceResult<decl_critic_core::TypeHandleBox>,
) -> InferenceResult<String> {
    export_type
        .as_ref()
        .map(|ty| ty.render())
        .map_err(Clone::clone)
}

fn no_matching_package(name: &str) -> CriticFinding {
    CriticFinding::new(
        ErrorKind::NoMatchingPackage,
        format!(
            "Declaration file must have a matching package in the registry.\n\
             To resolve this error, either:\n\
             1. Change the name to match a published package.\n\
             2. Mark the declaration as non-distributed in its header, and add -browser \
             to the end of the name to make sure it does not conflict with existing \
             packages:\n\n{name}-browser"
        ),
    )
}

fn non_distributed_conflict(name: &str) -> CriticFinding {
    CriticFinding::new(
        ErrorKind::NonDistributedHasMatchingPackage,
        format!(
            "The non-distributed package '{name}' conflicts with the existing registry \
             package '{registry_name}'.\nTry adding -browser to the end of the name to \
             get\n\n{name}-browser",
            registry_name = mangle_scoped(name)
        ),
    )
}

fn no_matching_version(
    name: &str,
    requested: Option<decl_critic_core::MajorMinor>,
    versions: &[String],
    latest: Option<String>,
) -> CriticFinding {
    let requested = requested.map_or_else(
        || "no version found in the header".to_owned(),
        |v| v.to_string(),
    );
    let latest = latest.unwrap_or_default();
    CriticFinding::new(
        ErrorKind::NoMatchingVersion,
        format!(
            "The declaration for '{name}' must match a version that exists in the \
             registry.\nYou should copy the major and minor version from the published \
             package.\n\nTo resolve this error, change the version in the header, \
             {requested},\nto match one in the registry: {versions}.\n\nFor example, if \
             you're trying to match the latest version, use {latest}.",
            versions = versions.join(", ")
        ),
    )
}
