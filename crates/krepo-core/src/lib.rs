//! Core library for krepo.
//!
//! Turns a directory of add-on packages into a Kodi repository: picks the
//! current archive of every package directory, normalizes its `addon.xml`,
//! expands binary add-ons into one catalog entry per platform and writes
//! `addons.xml` with its checksum. Also pulls new releases from a forge and
//! files them under the naming convention the generator expects.

pub mod catalog;
pub mod config;
pub mod expand;
pub mod forges;
pub mod generate;
pub mod ingest;
pub mod io;
pub mod metadata;
pub mod reporter;
pub mod summary;
pub mod walk;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::RepoConfig;
pub use generate::generate;
pub use reporter::{NullReporter, Reporter};
pub use summary::{PackageOutcome, RunSummary, SkipReason};

/// User Agent string for forge requests
pub const USER_AGENT: &str = concat!("krepo/", env!("CARGO_PKG_VERSION"));
