//! Package name derivation and scoped-name mangling.
//!
//! Declaration repositories keep one directory per package with the
//! declaration at `<name>/index.d.ts`, and encode registry scopes with a
//! double underscore (`babel__core` for `@babel/core`).

use std::path::Path;

/// Name used when a declaration path carries no package name at all.
pub const DEFAULT_PACKAGE_NAME: &str = "decl-critic";

/// Extension of declaration files.
const DECLARATION_EXT: &str = ".d.ts";
/// Basename that defers to the parent directory for the package name.
const INDEX_BASENAME: &str = "index";
/// The scope separator used in repository directory names.
const SCOPE_SEPARATOR: &str = "__";

/// Derives the package name from a declaration file path.
///
/// `.../<name>/index.d.ts` yields `<name>`; a declaration not named
/// `index` yields its own basename; a bare `index.d.ts` with no parent
/// directory yields [`DEFAULT_PACKAGE_NAME`].
#[must_use]
pub fn declaration_name(declaration_path: &Path) -> String {
    let file_name = declaration_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let base = file_name.strip_suffix(DECLARATION_EXT).unwrap_or(file_name);

    if !base.is_empty() && base != INDEX_BASENAME {
        return base.to_owned();
    }

    declaration_path
        .parent()
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map_or_else(|| DEFAULT_PACKAGE_NAME.to_owned(), str::to_owned)
}

/// Converts a repository directory name to the registry package name.
///
/// A name containing a double underscore maps to a scoped name; any other
/// name is unchanged.
#[must_use]
pub fn mangle_scoped(repo_name: &str) -> String {
    if repo_name.contains(SCOPE_SEPARATOR) {
        return format!("@{}", repo_name.replacen(SCOPE_SEPARATOR, "/", 1));
    }
    repo_name.to_owned()
}

/// Converts a registry package name back to the repository directory name.
///
/// The inverse of [`mangle_scoped`] on scoped names; unscoped names are
/// unchanged.
#[must_use]
pub fn unmangle_scoped(registry_name: &str) -> String {
    match registry_name.strip_prefix('@') {
        Some(rest) => rest.replacen('/', SCOPE_SEPARATOR, 1),
        None => registry_name.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_declaration_takes_parent_name() {
        assert_eq!(
            declaration_name(Path::new("/home/dt/types/jquery/index.d.ts")),
            "jquery"
        );
        assert_eq!(declaration_name(Path::new("jquery/index.d.ts")), "jquery");
    }

    #[test]
    fn non_index_declaration_uses_its_basename() {
        assert_eq!(
            declaration_name(Path::new("types/lodash/lodash.d.ts")),
            "lodash"
        );
    }

    #[test]
    fn bare_index_falls_back_to_default_name() {
        assert_eq!(declaration_name(Path::new("index.d.ts")), DEFAULT_PACKAGE_NAME);
        assert_eq!(declaration_name(Path::new("./index.d.ts")), DEFAULT_PACKAGE_NAME);
        assert_eq!(declaration_name(Path::new("")), DEFAULT_PACKAGE_NAME);
    }

    #[test]
    fn mangles_scoped_names() {
        assert_eq!(mangle_scoped("babel__core"), "@babel/core");
        assert_eq!(mangle_scoped("content-type"), "content-type");
    }

    #[test]
    fn unmangles_scoped_names() {
        assert_eq!(unmangle_scoped("@babel/core"), "babel__core");
        assert_eq!(unmangle_scoped("content-type"), "content-type");
    }

    #[test]
    fn mangle_round_trips_valid_scoped_forms() {
        for scoped in ["@babel/core", "@types/node", "@a/b"] {
            assert_eq!(mangle_scoped(&unmangle_scoped(scoped)), scoped);
        }
    }
}
