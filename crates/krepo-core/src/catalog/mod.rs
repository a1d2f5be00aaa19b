//! Catalog aggregation.
//!
//! `addons.xml` is always regenerated in full from the entries pushed in
//! package-directory order, followed by the repository's own descriptors.
//! The checksum is computed from the bytes read back from disk.

pub mod descriptor;
pub mod listing;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use krepo_schema::{AddonId, AddonVersion, Platform};

use crate::io::md5_file;
use crate::metadata::strip_declaration;

pub use descriptor::SelfDescriptor;
pub use listing::write_listing;

/// Catalog document name.
pub const CATALOG_FILE: &str = "addons.xml";

/// Checksum file name.
pub const CHECKSUM_FILE: &str = "addons.xml.md5";

/// Declaration written at the top of the catalog.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// One `<addon>` element of the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Add-on identity.
    pub id: AddonId,
    /// Add-on version.
    pub version: AddonVersion,
    /// Set for per-platform entries of binary add-ons.
    pub platform: Option<Platform>,
    /// `<package-dir>/<archive>` for per-platform entries.
    pub path: Option<String>,
    /// Declaration-free XML of the entry.
    pub xml: String,
}

impl CatalogEntry {
    /// A generic entry; the declaration is stripped from `xml`.
    pub fn new(id: AddonId, version: AddonVersion, xml: &str) -> Self {
        Self {
            id,
            version,
            platform: None,
            path: None,
            xml: strip_declaration(xml).to_string(),
        }
    }

    /// Mark this entry as the build for one platform.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform, path: impl Into<String>) -> Self {
        self.platform = Some(platform);
        self.path = Some(path.into());
        self
    }
}

/// The files written by [`Catalog::write`].
#[derive(Debug, Clone)]
pub struct WrittenCatalog {
    /// `addons.xml`
    pub path: PathBuf,
    /// `addons.xml.md5`
    pub checksum_path: PathBuf,
    /// Lowercase hex MD5 of the catalog as written.
    pub checksum: String,
    /// Number of `<addon>` elements written.
    pub entries: usize,
}

/// Ordered catalog entries.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; order is preserved.
    pub fn push(&mut self, entry: CatalogEntry) {
        tracing::debug!(
            "Catalog entry {} {}{}",
            entry.id,
            entry.version,
            entry
                .platform
                .map(|p| format!(" ({p})"))
                .unwrap_or_default()
        );
        self.entries.push(entry);
    }

    /// Entries in push order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry was pushed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The full catalog document.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(
            self.entries.iter().map(|e| e.xml.len() + 1).sum::<usize>() + 128,
        );
        out.push_str(XML_DECLARATION);
        out.push_str("\n<addons>\n");
        for entry in &self.entries {
            out.push_str(entry.xml.trim());
            out.push('\n');
        }
        out.push_str("</addons>\n");
        out
    }

    /// Write `addons.xml` and `addons.xml.md5` into `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be written or the catalog
    /// cannot be read back for hashing.
    pub fn write(&self, root: &Path) -> Result<WrittenCatalog> {
        let path = root.join(CATALOG_FILE);
        fs::write(&path, self.render())
            .with_context(|| format!("Failed to write {}", path.display()))?;

        let checksum =
            md5_file(&path).with_context(|| format!("Failed to hash {}", path.display()))?;

        let checksum_path = root.join(CHECKSUM_FILE);
        fs::write(&checksum_path, &checksum)
            .with_context(|| format!("Failed to write {}", checksum_path.display()))?;

        tracing::info!("Wrote {} ({} entries, md5 {checksum})", path.display(), self.len());

        Ok(WrittenCatalog {
            path,
            checksum_path,
            checksum,
            entries: self.len(),
        })
    }
}

impl Extend<CatalogEntry> for Catalog {
    fn extend<T: IntoIterator<Item = CatalogEntry>>(&mut self, iter: T) {
        for entry in iter {
            self.push(entry);
        }
    }
}

/// Stored and recomputed catalog checksums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Contents of `addons.xml.md5`, trimmed.
    pub expected: String,
    /// MD5 of `addons.xml` as it is on disk now.
    pub actual: String,
}

impl Verification {
    /// Whether the stored checksum matches, ignoring case.
    pub fn is_match(&self) -> bool {
        self.expected.eq_ignore_ascii_case(&self.actual)
    }
}

/// Read the stored checksum, if any.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn read_checksum(root: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(root.join(CHECKSUM_FILE)) {
        Ok(text) => Ok(Some(text.trim().to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Recompute the catalog checksum and compare it with the stored one.
///
/// # Errors
///
/// Returns an error if either file is missing or unreadable.
pub fn verify(root: &Path) -> Result<Verification> {
    let expected = read_checksum(root)
        .with_context(|| format!("Failed to read {CHECKSUM_FILE}"))?
        .with_context(|| format!("No {CHECKSUM_FILE} in {}", root.display()))?;
    let catalog = root.join(CATALOG_FILE);
    let actual =
        md5_file(&catalog).with_context(|| format!("Failed to hash {}", catalog.display()))?;
    Ok(Verification { expected, actual })
}
