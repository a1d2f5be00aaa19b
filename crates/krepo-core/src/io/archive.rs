//! Add-on archive introspection
//!
//! An add-on archive holds exactly one root folder named after the add-on,
//! with `addon.xml` directly inside it (`plugin.video.foo/addon.xml`).
//! Metadata at any other depth means the archive has no metadata; that is
//! not an error.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use krepo_schema::{AddonId, METADATA_FILENAME};
use regex::Regex;
use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

static ID_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"id="([^"]+)""#).expect("valid regex"));

/// Errors raised while reading an add-on archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The file could not be opened, or an entry could not be read or written.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Not a readable zip.
    #[error("Archive error: {0}")]
    Zip(#[from] ZipError),
}

/// An opened add-on archive.
pub struct AddonArchive {
    path: PathBuf,
    archive: ZipArchive<File>,
    root: Option<String>,
}

impl std::fmt::Debug for AddonArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddonArchive")
            .field("path", &self.path)
            .field("root", &self.root)
            .field("entries", &self.archive.len())
            .finish()
    }
}

impl AddonArchive {
    /// Open an archive and locate its metadata root folder.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not a valid zip.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::open(path)?;
        let archive = ZipArchive::new(file)?;
        let root = archive.file_names().find_map(metadata_root).map(str::to_string);

        tracing::debug!(
            "Opened {} ({} entries, root {:?})",
            path.display(),
            archive.len(),
            root
        );

        Ok(Self {
            path: path.to_path_buf(),
            archive,
            root,
        })
    }

    /// Path of the archive on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The root folder including its trailing `/`, if metadata was found.
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Read the embedded `addon.xml`.
    ///
    /// Returns `Ok(None)` if the archive has no metadata at the expected depth.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry exists but cannot be read.
    pub fn read_metadata(&mut self) -> Result<Option<String>, ArchiveError> {
        let Some(root) = self.root.clone() else {
            return Ok(None);
        };
        let bytes = self.read_entry(&format!("{root}{METADATA_FILENAME}"))?;
        Ok(bytes.map(|b| String::from_utf8_lossy(&b).into_owned()))
    }

    /// Copy declared assets from the archive root into `dest_dir`.
    ///
    /// Asset paths are relative to the add-on folder and may use either
    /// separator. Assets missing from the archive, unreadable, or pointing
    /// outside `dest_dir` are skipped. Returns the paths written.
    pub fn extract_assets<'a, I>(&mut self, assets: I, dest_dir: &Path) -> Vec<PathBuf>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let Some(root) = self.root.clone() else {
            return Vec::new();
        };

        let mut written = Vec::new();
        for asset in assets {
            let asset = asset.trim().replace('\\', "/");
            if asset.is_empty() {
                continue;
            }
            let Some(relative) = safe_relative(&asset) else {
                tracing::debug!("Skipping asset outside package directory: {asset}");
                continue;
            };

            match self.extract_one(&format!("{root}{asset}"), &dest_dir.join(relative)) {
                Ok(Some(path)) => written.push(path),
                Ok(None) => tracing::trace!("Asset {asset} not in {}", self.path.display()),
                Err(e) => tracing::debug!("Failed to extract {asset}: {e}"),
            }
        }
        written
    }

    fn extract_one(&mut self, name: &str, dest: &Path) -> Result<Option<PathBuf>, ArchiveError> {
        let Some(bytes) = self.read_entry(name)? else {
            return Ok(None);
        };
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, bytes)?;
        Ok(Some(dest.to_path_buf()))
    }

    fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>, ArchiveError> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if file.is_dir() {
            return Ok(None);
        }
        let mut buf = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
        file.read_to_end(&mut buf)?;
        Ok(Some(buf))
    }
}

/// Read only the add-on identity from an archive.
///
/// Uses the same single-root lookup as [`AddonArchive::open`] and a plain
/// `id="..."` match, so malformed metadata still yields an identity.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened or read.
pub fn read_identity(path: &Path) -> Result<Option<AddonId>, ArchiveError> {
    let mut archive = AddonArchive::open(path)?;
    let Some(text) = archive.read_metadata()? else {
        return Ok(None);
    };
    Ok(ID_ATTRIBUTE
        .captures(&text)
        .map(|caps| AddonId::new(&caps[1])))
}

/// `<root>/` for an entry named `<root>/addon.xml`, else `None`.
fn metadata_root(name: &str) -> Option<&str> {
    let root = name.strip_suffix(METADATA_FILENAME)?;
    (root.ends_with('/') && root.matches('/').count() == 1 && root.len() > 1).then_some(root)
}

/// Relative path made only of normal components.
fn safe_relative(asset: &str) -> Option<PathBuf> {
    let path = Path::new(asset);
    path.components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then(|| path.to_path_buf())
}
