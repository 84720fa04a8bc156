//! Version resolution against a registry's published version list.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// The tag registries use for the newest stable release.
const LATEST_TAG: &str = "latest";

/// A requested `major.minor` version pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorMinor {
    /// Major version.
    pub major: u64,
    /// Minor version.
    pub minor: u64,
}

impl MajorMinor {
    /// Creates a version pair.
    #[must_use]
    pub fn new(major: u64, minor: u64) -> Self {
        Self { major, minor }
    }
}

impl std::fmt::Display for MajorMinor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A registry's published versions and named tags for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryVersions {
    /// Published version strings, assumed ordered oldest to newest.
    pub versions: Vec<String>,
    /// Named tags, e.g. `latest`.
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

/// Outcome of resolving a version request against a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionResolution {
    /// The best matching published version.
    Resolved(String),
    /// Nothing satisfied the request. Carries the full version list and the
    /// latest version so callers can build a useful error message.
    NotFound {
        /// The request that failed, when one was made.
        requested: Option<MajorMinor>,
        /// Every published version.
        versions: Vec<String>,
        /// The newest published version, if any.
        latest: Option<String>,
    },
}

/// Resolves a version request against the registry's version list.
///
/// With a requested `major.minor`, selects the maximum version `v` with
/// `major.minor.0 <= v < (major+1).0.0` under semver ordering, which keeps
/// pre-releases of in-range versions eligible. Without a request, prefers
/// the registry's `latest` tag and falls back to the last list entry.
#[must_use]
pub fn resolve_version(
    requested: Option<MajorMinor>,
    registry: &RegistryVersions,
) -> VersionResolution {
    match requested {
        Some(target) => resolve_range(target, registry),
        None => {
            if let Some(tagged) = registry.tags.get(LATEST_TAG) {
                return VersionResolution::Resolved(tagged.clone());
            }
            match registry.versions.last() {
                Some(last) => VersionResolution::Resolved(last.clone()),
                None => VersionResolution::NotFound {
                    requested: None,
                    versions: Vec::new(),
                    latest: None,
                },
            }
        }
    }
}

fn resolve_range(target: MajorMinor, registry: &RegistryVersions) -> VersionResolution {
    let lower = semver::Version::new(target.major, target.minor, 0);
    let upper = semver::Version::new(target.major + 1, 0, 0);

    let mut best: Option<(semver::Version, &str)> = None;
    for raw in &registry.versions {
        let Ok(parsed) = semver::Version::parse(raw) else {
            debug!(version = raw.as_str(), "skipping unparsable registry version");
            continue;
        };
        if parsed < lower || parsed >= upper {
            continue;
        }
        let better = best
            .as_ref()
            .map_or(true, |(current, _)| parsed > *current);
        if better {
            best = Some((parsed, raw));
        }
    }

    match best {
        Some((_, raw)) => VersionResolution::Resolved(raw.to_owned()),
        None => VersionResolution::NotFound {
            requested: Some(target),
            versions: registry.versions.clone(),
            latest: registry.versions.last().cloned(),
        },
    }
}
