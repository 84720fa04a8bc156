//! npm registry adapter.
//!
//! Lookups and downloads shell out to the `npm` and `tar` commands rather
//! than speaking the registry protocol; the adapter owns the subprocess
//! plumbing and hands structured data back. Lookups go through an explicit
//! cache object so batch drivers can snapshot them between runs.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use decl_critic_core::{mangle_scoped, RegistryVersions};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::LookupCache;

/// Error code npm uses when a package does not exist.
const NPM_NOT_FOUND: &str = "E404";
/// Tools that must be on PATH before any registry work.
const REQUIRED_TOOLS: &[&str] = &["npm", "tar"];

/// Errors from registry interaction.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A required external tool is not installed.
    #[error("required tool '{name}' is not available; install it and retry")]
    MissingTool {
        /// The missing command.
        name: String,
    },

    /// A subprocess failed.
    #[error("command '{command}' failed: {details}")]
    CommandFailed {
        /// The command that failed.
        command: String,
        /// Stderr or status details.
        details: String,
    },

    /// Subprocess output was not the JSON we expect.
    #[error("unexpected output from '{command}': {details}")]
    MalformedOutput {
        /// The command whose output was malformed.
        command: String,
        /// What was wrong.
        details: String,
    },

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A downloaded package has no usable entry point.
    #[error("could not find an entry point under '{package_dir}' with main '{main}'")]
    EntryPointNotFound {
        /// The extracted package directory.
        package_dir: String,
        /// The `main` field that failed to resolve.
        main: String,
    },
}

/// Result of looking up a package name in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageLookup {
    /// No package of that name exists.
    NotFound,
    /// The package exists, with its published versions and tags.
    Found(RegistryVersions),
}

impl PackageLookup {
    /// Whether the package exists in the registry.
    #[must_use]
    pub fn exists(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// The registry operations the analyzer's driver needs.
pub trait Registry: Send + Sync {
    /// Looks up a package by its repository directory name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] for subprocess or protocol failures; a
    /// missing package is [`PackageLookup::NotFound`], not an error.
    fn lookup(&self, repo_name: &str) -> Result<PackageLookup, RegistryError>;

    /// Downloads and extracts one published version, returning the path of
    /// the extracted package directory.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when download or extraction fails.
    fn fetch_and_extract(
        &self,
        repo_name: &str,
        version: &str,
        out_dir: &Path,
    ) -> Result<PathBuf, RegistryError>;
}

/// Fails fast when `npm` or `tar` is missing; callers treat this as a
/// fatal configuration error, not a finding.
pub fn ensure_tools_available() -> Result<(), RegistryError> {
    for tool in REQUIRED_TOOLS {
        let available = Command::new(tool)
            .arg("--version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .is_ok();
        if !available {
            return Err(RegistryError::MissingTool {
                name: (*tool).to_owned(),
            });
        }
    }
    Ok(())
}

/// Registry adapter backed by the `npm` CLI.
pub struct NpmCliRegistry {
    cache: Mutex<LookupCache>,
}

impl NpmCliRegistry {
    /// Creates an adapter with an in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cache(LookupCache::in_memory())
    }

    /// Creates an adapter around an explicit cache object.
    #[must_use]
    pub fn with_cache(cache: LookupCache) -> Self {
        Self {
            cache: Mutex::new(cache),
        }
    }

    /// Writes the cache snapshot back to disk, when it has a backing file.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] when the snapshot cannot be written.
    pub fn save_cache(&self) -> Result<(), RegistryError> {
        match self.cache.lock() {
            Ok(cache) => cache.save(),
            Err(_) => Ok(()),
        }
    }
}

impl Default for NpmCliRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry for NpmCliRegistry {
    fn lookup(&self, repo_name: &str) -> Result<PackageLookup, RegistryError> {
        let registry_name = mangle_scoped(repo_name);

        if let Ok(cache) = self.cache.lock() {
            if let Some(cached) = cache.get(&registry_name) {
                debug!(package = registry_name.as_str(), "registry lookup served from cache");
                return Ok(cached.clone());
            }
        }

        info!(package = registry_name.as_str(), "looking up package in registry");
        let output = Command::new("npm")
            .args(["info", &registry_name, "--json", "--silent", "versions", "dist-tags"])
            .output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let lookup = parse_lookup_output(&stdout, output.status.success())?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(registry_name, lookup.clone());
        }
        Ok(lookup)
    }

    fn fetch_and_extract(
        &self,
        repo_name: &str,
        version: &str,
        out_dir: &Path,
    ) -> Result<PathBuf, RegistryError> {
        let registry_name = mangle_scoped(repo_name);
        let full_name = format!("{registry_name}@{version}");

        info!(package = full_name.as_str(), "downloading package");
        let output = Command::new("npm")
            .args(["pack", &full_name, "--json", "--silent"])
            .output()?;
        if !output.status.success() {
            return Err(RegistryError::CommandFailed {
                command: format!("npm pack {full_name}"),
                details: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        let tarball = parse_pack_output(&String::from_utf8_lossy(&output.stdout))?;

        let package_dir = out_dir.join(repo_name);
        std::fs::create_dir_all(&package_dir)?;

        let status = Command::new("tar")
            .args(["-xz", "-f", &tarball, "-C"])
            .arg(&package_dir)
            .status()?;
        if !status.success() {
            return Err(RegistryError::CommandFailed {
                command: format!("tar -xz -f {tarball}"),
                details: format!("exit status {status}"),
            });
        }
        std::fs::remove_file(&tarball)?;

        Ok(package_dir.join("package"))
    }
}

/// Parses `npm info --json` output into a lookup result.
///
/// npm reports a missing package as an error object with code `E404` and a
/// nonzero status, and flattens a single-element version list to a bare
/// string.
fn parse_lookup_output(stdout: &str, status_ok: bool) -> Result<PackageLookup, RegistryError> {
    let command = "npm info";
    let value: serde_json::Value =
        serde_json::from_str(stdout).map_err(|error| RegistryError::MalformedOutput {
            command: command.to_owned(),
            details: error.to_string(),
        })?;

    if let Some(error) = value.get("error") {
        let code = error.get("code").and_then(|c| c.as_str()).unwrap_or("");
        if code == NPM_NOT_FOUND {
            return Ok(PackageLookup::NotFound);
        }
        let summary = error.get("summary").and_then(|s| s.as_str()).unwrap_or("");
        return Err(RegistryError::CommandFailed {
            command: command.to_owned(),
            details: format!("{code}: {summary}"),
        });
    }
    if !status_ok {
        return Err(RegistryError::CommandFailed {
            command: command.to_owned(),
            details: "nonzero exit status without an error payload".to_owned(),
        });
    }

    let versions = match value.get("versions") {
        Some(serde_json::Value::Array(list)) => list
            .iter()
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect(),
        Some(serde_json::Value::String(single)) => vec![single.clone()],
        _ => Vec::new(),
    };
    let tags = value
        .get("dist-tags")
        .and_then(|t| t.as_object())
        .map(|object| {
            object
                .iter()
                .filter_map(|(tag, v)| v.as_str().map(|v| (tag.clone(), v.to_owned())))
                .collect()
        })
        .unwrap_or_default();

    Ok(PackageLookup::Found(RegistryVersions { versions, tags }))
}

/// Parses `npm pack --json` output into the tarball filename.
fn parse_pack_output(stdout: &str) -> Result<String, RegistryError> {
    let command = "npm pack";
    let value: serde_json::Value =
        serde_json::from_str(stdout).map_err(|error| RegistryError::MalformedOutput {
            command: command.to_owned(),
            details: error.to_string(),
        })?;
    value
        .as_array()
        .and_then(|entries| entries.first())
        .and_then(|entry| entry.get("filename"))
        .and_then(|f| f.as_str())
        .map(str::to_owned)
        .ok_or_else(|| RegistryError::MalformedOutput {
            command: command.to_owned(),
            details: "no filename in pack output".to_owned(),
        })
}
