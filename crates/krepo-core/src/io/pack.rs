//! Zip packing for locally developed add-ons and the repository add-on.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Bytes and name of one entry to pack.
#[derive(Debug, Clone)]
pub struct PackEntry {
    /// Name inside the archive (`/` separated).
    pub name: String,
    /// Entry contents.
    pub data: Vec<u8>,
}

impl PackEntry {
    /// Entry from in-memory bytes.
    pub fn bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Entry read from a file on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn file(name: impl Into<String>, path: &Path) -> Result<Self> {
        let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::bytes(name, data))
    }
}

/// Write `entries` into a new deflate-compressed zip at `output`.
///
/// # Errors
///
/// Returns an error if the archive cannot be created or written.
pub fn pack_entries(output: &Path, entries: &[PackEntry]) -> Result<()> {
    let file =
        File::create(output).with_context(|| format!("Failed to create {}", output.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        zip.start_file(entry.name.as_str(), options)?;
        zip.write_all(&entry.data)?;
    }
    zip.finish()
        .with_context(|| format!("Failed to finalize {}", output.display()))?;
    Ok(())
}

/// Whether a file is left out of a packed add-on.
fn is_excluded(name: &str) -> bool {
    name.starts_with('.')
        || Path::new(name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip") || ext.eq_ignore_ascii_case("pyc"))
}

/// Zip an add-on source directory so entries are named
/// `<dirname>/<relative path>`.
///
/// Archives, compiled python and dot-files are skipped, as are hidden
/// subdirectories. Returns the archive names written, in order.
///
/// # Errors
///
/// Returns an error if the directory cannot be walked or the archive cannot
/// be written.
pub fn pack_directory(source_dir: &Path, output: &Path) -> Result<Vec<String>> {
    let dir_name = source_dir
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid add-on directory: {}", source_dir.display()))?;

    let mut entries = Vec::new();
    let walker = WalkDir::new(source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || is_excluded(&entry.file_name().to_string_lossy()) {
            continue;
        }
        let relative: PathBuf = entry.path().strip_prefix(source_dir)?.to_path_buf();
        let name = std::iter::once(dir_name.to_string())
            .chain(relative.iter().map(|c| c.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join("/");
        entries.push(PackEntry::file(name, entry.path())?);
    }

    pack_entries(output, &entries)?;
    tracing::info!("Created {}", output.display());
    Ok(entries.into_iter().map(|e| e.name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::AddonArchive;

    #[test]
    fn test_pack_directory_layout() {
        let dir = tempfile::tempdir().unwrap();
        let addon = dir.path().join("plugin.local");
        fs::create_dir_all(addon.join("resources/lib")).unwrap();
        fs::create_dir_all(addon.join(".git")).unwrap();
        fs::write(addon.join("addon.xml"), "<addon id=\"plugin.local\" version=\"0.1\"/>").unwrap();
        fs::write(addon.join("resources/lib/main.py"), "print()").unwrap();
        fs::write(addon.join("resources/lib/main.pyc"), "bytecode").unwrap();
        fs::write(addon.join(".hidden"), "x").unwrap();
        fs::write(addon.join(".git/HEAD"), "ref").unwrap();
        fs::write(addon.join("plugin.local-0.0.9.zip"), "old").unwrap();

        let output = addon.join("plugin.local-0.1.zip");
        let names = pack_directory(&addon, &output).unwrap();

        assert_eq!(
            names,
            ["plugin.local/addon.xml", "plugin.local/resources/lib/main.py"]
        );

        let mut archive = AddonArchive::open(&output).unwrap();
        assert_eq!(archive.root(), Some("plugin.local/"));
        assert!(archive.read_metadata().unwrap().is_some());
    }

    #[test]
    fn test_pack_entries() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.zip");
        pack_entries(
            &output,
            &[
                PackEntry::bytes("repo/addon.xml", "<addon/>"),
                PackEntry::bytes("repo/icon.png", vec![1u8, 2, 3]),
            ],
        )
        .unwrap();

        let archive = zip::ZipArchive::new(File::open(&output).unwrap()).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"repo/addon.xml"));
        assert!(names.contains(&"repo/icon.png"));
    }
}
