//! # decl-critic-registry
//!
//! Registry collaborators for decl-critic: package lookup and download via
//! the `npm` CLI, an explicit lookup cache with an on-disk snapshot, and
//! entry-point resolution for extracted packages.
//!
//! The analyzer treats all of this as blocking external collaborators; it
//! does not retry, and callers that want timeouts or backoff wrap these
//! calls themselves.

mod cache;
mod entry;
mod npm;

pub use cache::LookupCache;
pub use entry::locate_entry_point;
pub use npm::{
    ensure_tools_available, NpmCliRegistry, PackageLookup, Registry, RegistryError,
};
