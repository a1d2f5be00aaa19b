//! The seam between ingestion and a concrete forge.

use std::path::Path;

use async_trait::async_trait;
use krepo_schema::naming::is_archive;
use thiserror::Error;

use super::RepoRef;

/// Errors raised by a forge.
#[derive(Error, Debug)]
pub enum ForgeError {
    /// Transport or body decoding failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Writing a download failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Non-success response.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The repository has no published release.
    #[error("No published release for {0}")]
    NotFound(String),
}

/// Represents a release found in a remote source
#[derive(Debug, Clone)]
pub struct ReleaseInfo {
    /// Tag as published (`v21.4.4`).
    pub tag_name: String,
    /// Every attached asset, archives or not.
    pub assets: Vec<AssetInfo>,
}

impl ReleaseInfo {
    /// The tag without its leading `v`s (`v1.2.0` -> `1.2.0`).
    pub fn version(&self) -> &str {
        self.tag_name.trim_start_matches('v')
    }

    /// Assets that are add-on archives.
    pub fn archives(&self) -> impl Iterator<Item = &AssetInfo> {
        self.assets.iter().filter(|a| is_archive(&a.name))
    }
}

/// Represents an asset attached to a release
#[derive(Debug, Clone)]
pub struct AssetInfo {
    /// Asset file name.
    pub name: String,
    /// Direct download URL.
    pub download_url: String,
}

/// A forge that publishes add-on releases (e.g. GitHub)
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Identifier for this source instance (e.g. "github:https://api.github.com")
    fn key(&self) -> String;

    /// Fetch the latest published release of a repository.
    async fn latest_release(&self, repo: &RepoRef) -> Result<ReleaseInfo, ForgeError>;

    /// Download an asset to `dest`, returning the number of bytes written.
    async fn download(&self, asset: &AssetInfo, dest: &Path) -> Result<u64, ForgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> AssetInfo {
        AssetInfo {
            name: name.to_string(),
            download_url: format!("https://example.invalid/{name}"),
        }
    }

    #[test]
    fn test_version_and_archives() {
        let release = ReleaseInfo {
            tag_name: "v21.4.4".to_string(),
            assets: vec![asset("a-linux-x64.zip"), asset("checksums.txt"), asset("a.zip")],
        };
        assert_eq!(release.version(), "21.4.4");
        let names: Vec<&str> = release.archives().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["a-linux-x64.zip", "a.zip"]);

        let plain = ReleaseInfo {
            tag_name: "1.0".to_string(),
            assets: Vec::new(),
        };
        assert_eq!(plain.version(), "1.0");
    }
}
