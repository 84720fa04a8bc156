//! Package entry-point resolution.
//!
//! Published packages name their entry file in `package.json`'s `main`
//! field, with a long tail of sloppy values: missing extension, a
//! directory, or no field at all. Resolution tries the conventional
//! candidates in order.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::npm::RegistryError;

/// Entry file assumed when `main` is absent or unresolvable directly.
const DEFAULT_ENTRY: &str = "index.js";
/// Extension tried when `main` omits it.
const JS_EXT: &str = ".js";

/// Finds the path of a package's entry file.
///
/// # Errors
///
/// Returns [`RegistryError::EntryPointNotFound`] when no candidate exists,
/// and [`RegistryError::Io`] when `package.json` cannot be read.
pub fn locate_entry_point(package_dir: &Path) -> Result<PathBuf, RegistryError> {
    let manifest = std::fs::read_to_string(package_dir.join("package.json"))?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest).map_err(|error| RegistryError::MalformedOutput {
            command: format!("{}/package.json", package_dir.display()),
            details: error.to_string(),
        })?;
    let main = manifest.get("main").and_then(|m| m.as_str());

    let Some(main) = main else {
        let fallback = package_dir.join(DEFAULT_ENTRY);
        return existing_file(&fallback).ok_or_else(|| RegistryError::EntryPointNotFound {
            package_dir: package_dir.display().to_string(),
            main: String::new(),
        });
    };

    let candidates = [
        package_dir.join(main),
        package_dir.join(format!("{main}{JS_EXT}")),
        package_dir.join(main).join(DEFAULT_ENTRY),
        package_dir.join(DEFAULT_ENTRY),
    ];
    for candidate in &candidates {
        if let Some(found) = existing_file(candidate) {
            debug!(entry = %found.display(), "resolved package entry point");
            return Ok(found);
        }
    }

    Err(RegistryError::EntryPointNotFound {
        package_dir: package_dir.display().to_string(),
        main: main.to_owned(),
    })
}

fn existing_file(path: &Path) -> Option<PathBuf> {
    path.is_file().then(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(main: Option<&str>, files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let manifest = match main {
            Some(main) => format!(r#"{{"name": "pkg", "main": "{main}"}}"#),
            None => r#"{"name": "pkg"}"#.to_owned(),
        };
        std::fs::write(dir.path().join("package.json"), manifest).unwrap();
        for file in files {
            let path = dir.path().join(file);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, "module.exports = {};\n").unwrap();
        }
        dir
    }

    #[test]
    fn resolves_exact_main() {
        let dir = package(Some("lib/app.js"), &["lib/app.js"]);
        let entry = locate_entry_point(dir.path()).unwrap();
        assert!(entry.ends_with("lib/app.js"));
    }

    #[test]
    fn appends_missing_extension() {
        let dir = package(Some("lib/app"), &["lib/app.js"]);
        let entry = locate_entry_point(dir.path()).unwrap();
        assert!(entry.ends_with("lib/app.js"));
    }

    #[test]
    fn main_directory_falls_to_its_index() {
        let dir = package(Some("lib"), &["lib/index.js"]);
        let entry = locate_entry_point(dir.path()).unwrap();
        assert!(entry.ends_with("lib/index.js"));
    }

    #[test]
    fn missing_main_uses_default_entry() {
        let dir = package(None, &["index.js"]);
        let entry = locate_entry_point(dir.path()).unwrap();
        assert!(entry.ends_with("index.js"));
    }

    #[test]
    fn unresolvable_main_falls_back_to_default_entry() {
        let dir = package(Some("dist/nothing.js"), &["index.js"]);
        let entry = locate_entry_point(dir.path()).unwrap();
        assert!(entry.ends_with("index.js"));
    }

    #[test]
    fn no_candidate_is_an_error() {
        let dir = package(Some("dist/nothing.js"), &[]);
        let error = locate_entry_point(dir.path()).unwrap_err();
        assert!(matches!(error, RegistryError::EntryPointNotFound { .. }));
    }
}
