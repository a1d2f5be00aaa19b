//! Filesystem and archive IO.

pub mod archive;
pub mod checksum;
pub mod pack;

pub use archive::{AddonArchive, ArchiveError};
pub use checksum::md5_file;
