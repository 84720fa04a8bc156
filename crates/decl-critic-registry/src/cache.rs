//! Registry lookup cache.
//!
//! An explicit cache object, never ambient global state: the adapter is
//! handed one, and batch drivers load and save its JSON snapshot at the
//! boundaries of a run so repeated checks of the same packages skip the
//! network.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::npm::{PackageLookup, RegistryError};

/// A cache of package lookups, optionally backed by a snapshot file.
#[derive(Debug, Default)]
pub struct LookupCache {
    path: Option<PathBuf>,
    entries: HashMap<String, PackageLookup>,
}

impl LookupCache {
    /// An empty cache with no backing file.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads a cache from a snapshot file.
    ///
    /// A missing file yields an empty cache bound to that path; it will be
    /// created on [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the file exists but cannot be read
    /// or parsed.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        if !path.exists() {
            return Ok(Self {
                path: Some(path.to_path_buf()),
                entries: HashMap::new(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let entries: HashMap<String, PackageLookup> =
            serde_json::from_str(&content).map_err(|error| RegistryError::MalformedOutput {
                command: format!("cache snapshot {}", path.display()),
                details: error.to_string(),
            })?;
        debug!(entries = entries.len(), path = %path.display(), "loaded lookup cache");
        Ok(Self {
            path: Some(path.to_path_buf()),
            entries,
        })
    }

    /// Writes the snapshot back to its backing file, if any.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] when the snapshot cannot be written.
    pub fn save(&self) -> Result<(), RegistryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string(&self.entries).map_err(|error| {
            RegistryError::MalformedOutput {
                command: "cache serialization".to_owned(),
                details: error.to_string(),
            }
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// A cached lookup, if present.
    #[must_use]
    pub fn get(&self, registry_name: &str) -> Option<&PackageLookup> {
        self.entries.get(registry_name)
    }

    /// Records a lookup result.
    pub fn insert(&mut self, registry_name: String, lookup: PackageLookup) {
        self.entries.insert(registry_name, lookup);
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decl_critic_core::RegistryVersions;

    #[test]
    fn snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lookups.json");

        let mut cache = LookupCache::load(&path).unwrap();
        assert!(cache.is_empty());
        cache.insert("left-pad".to_owned(), PackageLookup::NotFound);
        cache.insert(
            "jquery".to_owned(),
            PackageLookup::Found(RegistryVersions {
                versions: vec!["3.3.1".to_owned()],
                tags: HashMap::new(),
            }),
        );
        cache.save().unwrap();

        let reloaded = LookupCache::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("left-pad"), Some(&PackageLookup::NotFound));
        assert!(reloaded.get("jquery").is_some_and(PackageLookup::exists));
    }

    #[test]
    fn in_memory_cache_saves_to_nowhere() {
        let mut cache = LookupCache::in_memory();
        cache.insert("x".to_owned(), PackageLookup::NotFound);
        cache.save().unwrap();
    }
}
