//! Declaration header parsing.
//!
//! Crowd-sourced declaration files open with a conventional comment line:
//!
//! ```text
//! // Type definitions for foo 1.2
//! // Type definitions for non-npm package bar-browser 0.3
//! ```
//!
//! The header names the library, optionally marks it as not distributed
//! through the registry, and requests a `major.minor` version. A `0.0`
//! version means no particular version was requested.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::version::MajorMinor;

/// A parsed declaration header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// The library name as written in the header.
    pub library_name: String,
    /// Whether the header marks the package as not registry-distributed.
    pub non_distributed: bool,
    /// The requested version, absent when the header says `0.0`.
    pub version: Option<MajorMinor>,
}

fn header_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^//\s*Type definitions for\s+(?P<nonnpm>non-npm package\s+)?(?P<name>.+?)\s+(?P<major>\d+)\.(?P<minor>\d+)\s*$",
        )
        .expect("header pattern is a valid regex")
    })
}

/// Parses the header from a declaration's source text.
///
/// Scans the leading comment lines for the conventional first line and
/// returns `None` when no well-formed header is present; a missing header
/// is ordinary, not an error.
#[must_use]
pub fn parse_header(declaration_text: &str) -> Option<Header> {
    for line in declaration_text.lines() {
        if let Some(captures) = header_pattern().captures(line.trim_end()) {
            let major: u64 = captures["major"].parse().ok()?;
            let minor: u64 = captures["minor"].parse().ok()?;
            let version = if major == 0 && minor == 0 {
                None
            } else {
                Some(MajorMinor::new(major, minor))
            };
            return Some(Header {
                library_name: captures["name"].to_owned(),
                non_distributed: captures.name("nonnpm").is_some(),
                version,
            });
        }
        // The header must sit in the leading comment block.
        if !line.trim_start().starts_with("//") && !line.trim().is_empty() {
            return None;
        }
    }
    None
}
