//! End-to-end critiques of small declaration/source pairs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use decl_critic::{
    Critic, CriticError, ErrorKind, PackageLookup, Registry, RegistryError, RegistryVersions,
    SyntacticOracle,
};

struct Fixture {
    _dir: tempfile::TempDir,
    declaration: PathBuf,
    source: PathBuf,
}

/// Writes a `<name>/index.d.ts` declaration and a source file.
fn fixture(name: &str, declaration: &str, source: &str) -> Fixture {
    let dir = tempfile::tempdir().expect("create temp dir");
    let package_dir = dir.path().join(name);
    std::fs::create_dir_all(&package_dir).expect("create package dir");

    let declaration_path = package_dir.join("index.d.ts");
    std::fs::write(&declaration_path, declaration).expect("write declaration");

    let source_path = package_dir.join("index.js");
    std::fs::write(&source_path, source).expect("write source");

    Fixture {
        _dir: dir,
        declaration: declaration_path,
        source: source_path,
    }
}

fn critic() -> Critic {
    Critic::new(Box::new(SyntacticOracle::new()))
}

struct MockRegistry {
    lookup: PackageLookup,
}

impl Registry for MockRegistry {
    fn lookup(&self, _repo_name: &str) -> Result<PackageLookup, RegistryError> {
        Ok(self.lookup.clone())
    }

    fn fetch_and_extract(
        &self,
        repo_name: &str,
        _version: &str,
        _out_dir: &Path,
    ) -> Result<PathBuf, RegistryError> {
        Err(RegistryError::CommandFailed {
            command: format!("mock fetch {repo_name}"),
            details: "downloads are not available in tests".to_owned(),
        })
    }
}

fn found(versions: &[&str], latest: Option<&str>) -> PackageLookup {
    let mut tags = HashMap::new();
    if let Some(latest) = latest {
        tags.insert("latest".to_owned(), latest.to_owned());
    }
    PackageLookup::Found(RegistryVersions {
        versions: versions.iter().map(|v| (*v).to_owned()).collect(),
        tags,
    })
}

#[test]
fn matching_named_exports_produce_no_findings() {
    let fixture = fixture(
        "greeter",
        "export function foo(): void;\n",
        "export function foo() {}\n",
    );
    let check = critic()
        .check_source("greeter", &fixture.declaration, &fixture.source)
        .expect("check source");
    assert!(check.findings.is_empty(), "found: {:?}", check.findings);
}

#[test]
fn source_only_property_is_reported_once() {
    let fixture = fixture(
        "plain",
        "export {};\n",
        "exports.foo = 1;\n",
    );
    let check = critic()
        .check_source("plain", &fixture.declaration, &fixture.source)
        .expect("check source");
    assert_eq!(check.findings.len(), 1);
    let finding = &check.findings[0];
    assert_eq!(finding.kind, ErrorKind::SourcePropertyNotDeclared);
    assert!(finding.message.contains("'foo'"));
}

#[test]
fn callable_source_demands_whole_module_declaration() {
    let fixture = fixture(
        "calc",
        "export function foo(): void;\n",
        "module.exports = function () {};\n",
    );
    let check = critic()
        .check_source("calc", &fixture.declaration, &fixture.source)
        .expect("check source");

    let first = &check.findings[0];
    assert_eq!(first.kind, ErrorKind::NeedsWholeModuleExport);
    assert!(first.message.contains("can be called"));

    let kinds: Vec<ErrorKind> = check.findings.iter().map(|f| f.kind).collect();
    assert!(kinds.contains(&ErrorKind::SourceIsCallable));
}

#[test]
fn default_filter_keeps_only_the_convention_finding() {
    let fixture = fixture(
        "calc",
        "export function foo(): void;\n",
        "module.exports = function () {};\n",
    );
    let outcome = critic()
        .critique(&fixture.declaration, Some(&fixture.source))
        .expect("critique");
    let kinds: Vec<ErrorKind> = outcome.findings.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![ErrorKind::NeedsWholeModuleExport]);
}

#[test]
fn default_export_without_source_evidence_is_flagged() {
    let declaration = "declare function f(): void;\nexport default f;\n";
    let fixture = fixture("widget", declaration, "exports.foo = 1;\n");
    let check = critic()
        .check_source("widget", &fixture.declaration, &fixture.source)
        .expect("check source");

    let finding = check
        .findings
        .iter()
        .find(|f| f.kind == ErrorKind::NoDefaultExport)
        .expect("expected a default-export finding");
    let position = finding.position.expect("finding should carry a position");
    assert_eq!(position.start, declaration.find("export default").unwrap());
}

#[test]
fn default_export_with_source_marker_is_accepted() {
    let fixture = fixture(
        "widget",
        "declare function f(): void;\nexport default f;\n",
        "Object.defineProperty(exports, \"__esModule\", { value: true });\nexports.default = 1;\n",
    );
    let check = critic()
        .check_source("widget", &fixture.declaration, &fixture.source)
        .expect("check source");
    assert!(check
        .findings
        .iter()
        .all(|f| f.kind != ErrorKind::NoDefaultExport));
}

#[test]
fn missing_registry_package_is_the_only_finding() {
    let fixture = fixture(
        "parseltongue",
        "export function speak(): void;\n",
        "export function speak() {}\n",
    );
    let outcome = critic()
        .with_registry(Box::new(MockRegistry {
            lookup: PackageLookup::NotFound,
        }))
        .critique(&fixture.declaration, Some(&fixture.source))
        .expect("critique");
    let kinds: Vec<ErrorKind> = outcome.findings.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![ErrorKind::NoMatchingPackage]);
}

#[test]
fn unmatched_header_version_reports_the_version_list() {
    let declaration = "// Type definitions for mylib 3.0\nexport function go(): void;\n";
    let fixture = fixture("mylib", declaration, "export function go() {}\n");
    let outcome = critic()
        .with_registry(Box::new(MockRegistry {
            lookup: found(&["1.0.0", "1.1.0", "2.0.0"], Some("2.0.0")),
        }))
        .critique(&fixture.declaration, Some(&fixture.source))
        .expect("critique");

    assert_eq!(outcome.findings.len(), 1);
    let finding = &outcome.findings[0];
    assert_eq!(finding.kind, ErrorKind::NoMatchingVersion);
    assert!(finding.message.contains("1.0.0, 1.1.0, 2.0.0"));
    assert!(finding.message.contains("2.0.0"));
}

#[test]
fn matching_header_version_passes_cleanly() {
    let declaration = "// Type definitions for mylib 1.1\nexport function go(): void;\n";
    let fixture = fixture("mylib", declaration, "export function go() {}\n");
    let outcome = critic()
        .with_registry(Box::new(MockRegistry {
            lookup: found(&["1.0.0", "1.1.0", "2.0.0"], Some("2.0.0")),
        }))
        .critique(&fixture.declaration, Some(&fixture.source))
        .expect("critique");
    assert!(outcome.findings.is_empty(), "found: {:?}", outcome.findings);
}

#[test]
fn non_distributed_name_conflict_is_reported() {
    let declaration =
        "// Type definitions for non-npm package taken 1.0\nexport function go(): void;\n";
    let fixture = fixture("taken", declaration, "export function go() {}\n");
    let outcome = critic()
        .with_registry(Box::new(MockRegistry {
            lookup: found(&["1.0.0"], Some("1.0.0")),
        }))
        .critique(&fixture.declaration, Some(&fixture.source))
        .expect("critique");
    let kinds: Vec<ErrorKind> = outcome.findings.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![ErrorKind::NonDistributedHasMatchingPackage]);
}

#[test]
fn known_squatters_are_exempt_from_the_conflict_check() {
    let declaration =
        "// Type definitions for non-npm package atom 1.0\nexport function go(): void;\n";
    let fixture = fixture("atom", declaration, "export function go() {}\n");
    let outcome = critic()
        .with_registry(Box::new(MockRegistry {
            lookup: found(&["1.0.0"], Some("1.0.0")),
        }))
        .critique(&fixture.declaration, Some(&fixture.source))
        .expect("critique");
    assert!(outcome.findings.is_empty());
}

#[test]
fn no_source_and_no_registry_is_a_configuration_error() {
    let fixture = fixture("lost", "export function go(): void;\n", "");
    let error = critic()
        .critique(&fixture.declaration, None)
        .expect_err("should fail without a source");
    assert!(matches!(error, CriticError::NoSource { .. }));
}

#[test]
fn unreadable_declaration_is_fatal() {
    let error = critic()
        .critique(Path::new("/nonexistent/index.d.ts"), None)
        .expect_err("should fail on a missing declaration");
    assert!(matches!(error, CriticError::Io { .. }));
}

#[test]
fn diagnostics_surface_inference_failures_separately() {
    let fixture = fixture(
        "dynamic",
        "export function go(): void;\n",
        "module.exports = require('./impl');\n",
    );
    let check = critic()
        .check_source("dynamic", &fixture.declaration, &fixture.source)
        .expect("check source");

    // The suppressed shape comparison produces no findings of its own.
    assert!(check
        .findings
        .iter()
        .all(|f| f.kind != ErrorKind::SourcePropertyNotDeclared));
    assert!(check.diagnostics.shape_check_failure.is_some());
    assert!(check.diagnostics.source_type.is_err());
    let debug = check.diagnostics.format();
    assert!(debug.contains("Could not infer source export type"));
}
