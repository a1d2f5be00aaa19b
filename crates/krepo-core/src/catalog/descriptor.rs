//! The repository's own add-on.
//!
//! A repository is itself installed as an add-on whose `addon.xml` sits at
//! the repository root. It is packaged into `<id>/<id>-<version>.zip`, copied
//! to the root for direct download and listed in the catalog like any other
//! add-on. A mirror variant with proxied URLs is derived from the same text.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use krepo_schema::{AddonId, AddonVersion, ArchiveName, METADATA_FILENAME, Platform};

use super::CatalogEntry;
use crate::config::MirrorConfig;
use crate::io::pack::{PackEntry, pack_entries};
use crate::metadata::{AddonMetadata, addon_attribute_range};

/// Images bundled with the repository add-on when present at the root.
pub const DESCRIPTOR_IMAGES: [&str; 3] = ["icon.png", "icon.jpg", "fanart.jpg"];

/// What to do with an image already present in `<root>/<id>/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePolicy {
    /// Copy over it.
    Overwrite,
    /// Leave it alone.
    KeepExisting,
}

/// A repository add-on descriptor.
#[derive(Debug, Clone)]
pub struct SelfDescriptor {
    /// Identity from the `id` attribute.
    pub id: AddonId,
    /// Version from the `version` attribute.
    pub version: AddonVersion,
    /// Display name from the `name` attribute.
    pub name: Option<String>,
    text: String,
}

/// Archives written by [`SelfDescriptor::package`].
#[derive(Debug, Clone)]
pub struct PackagedDescriptor {
    /// `<root>/<id>/<id>-<version>.zip`
    pub archive: PathBuf,
    /// `<root>/<id>-<version>.zip`
    pub flat_copy: PathBuf,
}

impl SelfDescriptor {
    /// Build a descriptor from `addon.xml` text; `None` without id and version.
    pub fn from_text(text: &str) -> Option<Self> {
        let meta = AddonMetadata::normalize(text);
        let (id, version) = meta.identity()?;
        Some(Self {
            id: id.clone(),
            version: version.clone(),
            name: meta.name().map(str::to_string),
            text: text.to_string(),
        })
    }

    /// Load `<root>/addon.xml`.
    ///
    /// Returns `Ok(None)` if there is no such file or it has no identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = root.join(METADATA_FILENAME);
        if !path.is_file() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let descriptor = Self::from_text(&text);
        if descriptor.is_none() {
            tracing::warn!("{} has no id/version, skipping repository add-on", path.display());
        }
        Ok(descriptor)
    }

    /// The mirror variant: distinct identity and name, proxied host URLs.
    pub fn mirror(&self, config: &MirrorConfig) -> Option<Self> {
        let mut text = self.text.clone();
        set_addon_attribute(&mut text, "id", &config.mirror_id(&self.id));
        if let Some(name) = &self.name {
            set_addon_attribute(&mut text, "name", &config.mirror_name(name));
        }
        let text = proxy_urls(&text, &config.host_prefix, &config.proxy_prefix);

        let mirror = Self::from_text(&text)?;
        if mirror.id == self.id {
            tracing::warn!("Mirror of {} kept the same identity, skipping", self.id);
            return None;
        }
        Some(mirror)
    }

    /// The raw `addon.xml` text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// `<id>-<version>.zip`
    pub fn archive_name(&self) -> String {
        ArchiveName::new(self.id.clone(), self.version.clone(), Platform::Generic).file_name()
    }

    /// Write the descriptor archive and its flat copy at the root.
    ///
    /// # Errors
    ///
    /// Returns an error if any file cannot be read, written or copied.
    pub fn package(&self, root: &Path, images: ImagePolicy) -> Result<PackagedDescriptor> {
        let dir = root.join(&self.id);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let mut entries = vec![PackEntry::bytes(
            format!("{}/{METADATA_FILENAME}", self.id),
            self.text.as_bytes(),
        )];

        for image in DESCRIPTOR_IMAGES {
            let source = root.join(image);
            if !source.is_file() {
                continue;
            }
            entries.push(PackEntry::file(format!("{}/{image}", self.id), &source)?);

            let dest = dir.join(image);
            if images == ImagePolicy::KeepExisting && dest.exists() {
                continue;
            }
            fs::copy(&source, &dest)
                .with_context(|| format!("Failed to copy {} to {}", image, dest.display()))?;
        }

        let name = self.archive_name();
        let archive = dir.join(&name);
        pack_entries(&archive, &entries)?;

        let flat_copy = root.join(&name);
        fs::copy(&archive, &flat_copy)
            .with_context(|| format!("Failed to copy {} to the root", archive.display()))?;

        tracing::info!("Packaged repository add-on {}", archive.display());
        Ok(PackagedDescriptor { archive, flat_copy })
    }

    /// The catalog entry for this descriptor.
    pub fn entry(&self) -> CatalogEntry {
        CatalogEntry::new(self.id.clone(), self.version.clone(), &self.text)
    }
}

/// Prefix every occurrence of `host` with `proxy`.
///
/// Occurrences that already carry the proxy are left alone, so applying
/// this twice changes nothing.
pub fn proxy_urls(text: &str, host: &str, proxy: &str) -> String {
    if host.is_empty() {
        return text.to_string();
    }
    let proxied = format!("{proxy}{host}");
    text.split(proxied.as_str())
        .map(|segment| segment.replace(host, &proxied))
        .collect::<Vec<_>>()
        .join(&proxied)
}

/// Replace an `<addon>` attribute value in place, escaping `value`.
fn set_addon_attribute(text: &mut String, key: &str, value: &str) {
    if let Some(range) = addon_attribute_range(text, key) {
        text.replace_range(range, &escape_attribute(value));
    }
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}
