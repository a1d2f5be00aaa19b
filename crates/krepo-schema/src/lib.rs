//! Shared types for krepo.
//!
//! Everything in here is pure: filename grammar, platform identifiers and
//! version ordering. Nothing touches the filesystem.

pub mod naming;
pub mod platform;
pub mod types;
pub mod version;

// Re-exports
pub use naming::ArchiveName;
pub use platform::Platform;
pub use types::*;
pub use version::ArchiveVersion;

/// Name of the metadata document inside every add-on folder.
pub const METADATA_FILENAME: &str = "addon.xml";

/// Extension of every distributable archive.
pub const ARCHIVE_EXTENSION: &str = ".zip";

/// Extension point that carries assets, platform and path information.
pub const METADATA_POINT: &str = "xbmc.addon.metadata";
