//! Catalog generation.
//!
//! Walks the package directories in name order, admits each one whose
//! current archive (or loose `addon.xml`) yields an identity, then appends
//! the repository add-on and its mirror and writes the catalog.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use krepo_schema::naming::is_archive;
use krepo_schema::version::select_current;
use krepo_schema::{ArchiveName, METADATA_FILENAME, Platform};

use crate::catalog::descriptor::{ImagePolicy, SelfDescriptor};
use crate::catalog::{Catalog, CatalogEntry, write_listing};
use crate::config::RepoConfig;
use crate::expand::{expand, platform_archives};
use crate::io::AddonArchive;
use crate::io::pack::pack_directory;
use crate::metadata::AddonMetadata;
use crate::reporter::Reporter;
use crate::summary::{PackageOutcome, RunSummary, SkipReason};
use crate::walk::{list_files, package_dirs};

/// What one package directory produced.
#[derive(Debug)]
pub struct ProcessedPackage {
    /// Admitted or skipped, with details.
    pub outcome: PackageOutcome,
    /// Entries to append to the catalog; empty when skipped.
    pub entries: Vec<CatalogEntry>,
}

impl ProcessedPackage {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            outcome: PackageOutcome::Skipped(reason),
            entries: Vec::new(),
        }
    }
}

/// Regenerate `addons.xml`, `addons.xml.md5` and `index.html` under `root`.
///
/// Package failures are recorded in the summary and never abort the run.
///
/// # Errors
///
/// Returns an error if the root cannot be listed or the catalog or its
/// checksum cannot be written.
pub fn generate(root: &Path, config: &RepoConfig, reporter: &dyn Reporter) -> Result<RunSummary> {
    let start = Instant::now();
    let mut summary = RunSummary::default();
    let mut catalog = Catalog::new();

    let descriptor = match SelfDescriptor::load(root) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            reporter.warning(&format!("repository add-on: {e:#}"));
            None
        }
    };
    let mirror = descriptor
        .as_ref()
        .filter(|_| config.mirror.enabled)
        .and_then(|d| d.mirror(&config.mirror));
    let reserved: Vec<&str> = descriptor
        .iter()
        .chain(mirror.iter())
        .map(|d| d.id.as_str())
        .collect();

    reporter.section("Scanning packages");
    for dir in package_dirs(root)? {
        let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!("Skipping non UTF-8 directory {}", dir.display());
            continue;
        };

        let processed = if reserved.contains(&name) {
            ProcessedPackage::skipped(SkipReason::SelfDescriptor)
        } else {
            process_package(&dir, name)
        };

        match &processed.outcome {
            PackageOutcome::Admitted {
                id,
                version,
                entries,
                ..
            } => {
                tracing::info!("Admitted {name}: {id} {version} ({entries} entries)");
                reporter.admitted(name, id, version, *entries);
            }
            PackageOutcome::Skipped(reason) => {
                if *reason == SkipReason::SelfDescriptor {
                    tracing::debug!("Skipping {name}: {reason}");
                } else {
                    tracing::warn!("Skipping {name}: {reason}");
                }
                reporter.skipped(name, reason);
            }
        }

        catalog.extend(processed.entries);
        summary.record(name, processed.outcome);
    }

    if let Some(descriptor) = &descriptor {
        reporter.section("Packaging repository add-on");
        let variants = std::iter::once((descriptor, ImagePolicy::Overwrite))
            .chain(mirror.iter().map(|m| (m, ImagePolicy::KeepExisting)));
        for (variant, images) in variants {
            match variant.package(root, images) {
                Ok(packaged) => {
                    reporter.info(&format!("{} {}", variant.id, variant.version));
                    summary.descriptors.push(packaged.archive);
                    catalog.push(variant.entry());
                }
                Err(e) => reporter.warning(&format!("{}: {e:#}", variant.id)),
            }
        }
    }

    let written = catalog.write(root)?;
    reporter.success(&format!(
        "{} ({} entries, md5 {})",
        written.path.display(),
        written.entries,
        written.checksum
    ));
    summary.entries = written.entries;
    summary.checksum = Some(written.checksum);
    summary.catalog = Some(written.path);

    if let Some(descriptor) = &descriptor {
        match write_listing(root, &config.listing, &descriptor.id) {
            Ok(path) => summary.listing = Some(path),
            Err(e) => reporter.warning(&format!("index.html: {e:#}")),
        }
    }

    summary.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    reporter.summary(summary.admitted(), "indexed", start.elapsed().as_secs_f64());
    Ok(summary)
}

/// Admit one package directory or say why not.
pub fn process_package(dir: &Path, dir_name: &str) -> ProcessedPackage {
    let files = match list_files(dir) {
        Ok(files) => files,
        Err(e) => {
            return ProcessedPackage::skipped(SkipReason::Archive {
                archive: dir_name.to_string(),
                message: format!("{e:#}"),
            });
        }
    };

    let archives: Vec<&str> = files
        .iter()
        .map(String::as_str)
        .filter(|f| is_archive(f))
        .collect();

    match select_current(archives.iter().copied()) {
        Some(current) => from_archive(dir, dir_name, current, &archives),
        None if files.iter().any(|f| f == METADATA_FILENAME) => from_loose_metadata(dir, dir_name),
        None => ProcessedPackage::skipped(SkipReason::Empty),
    }
}

fn from_archive(dir: &Path, dir_name: &str, current: &str, archives: &[&str]) -> ProcessedPackage {
    tracing::debug!("{dir_name}: current archive {current}");
    let archive_error = |message: String| {
        ProcessedPackage::skipped(SkipReason::Archive {
            archive: current.to_string(),
            message,
        })
    };

    let mut archive = match AddonArchive::open(&dir.join(current)) {
        Ok(archive) => archive,
        Err(e) => return archive_error(e.to_string()),
    };
    let text = match archive.read_metadata() {
        Ok(Some(text)) => text,
        Ok(None) => return ProcessedPackage::skipped(SkipReason::NoMetadata),
        Err(e) => return archive_error(e.to_string()),
    };

    let meta = AddonMetadata::normalize(&text);
    let Some((id, version)) = meta.identity() else {
        return ProcessedPackage::skipped(SkipReason::MissingIdentity);
    };

    let extracted = archive.extract_assets(meta.assets(), dir);
    tracing::debug!("{dir_name}: extracted {} assets", extracted.len());

    let platforms = platform_archives(archives.iter().copied(), id, version);
    let entries = expand(&meta, dir_name, &platforms);

    ProcessedPackage {
        outcome: PackageOutcome::Admitted {
            id: id.clone(),
            version: version.clone(),
            entries: entries.len(),
            archive: Some(current.to_string()),
            packed: false,
        },
        entries,
    }
}

fn from_loose_metadata(dir: &Path, dir_name: &str) -> ProcessedPackage {
    let path = dir.join(METADATA_FILENAME);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            return ProcessedPackage::skipped(SkipReason::Archive {
                archive: METADATA_FILENAME.to_string(),
                message: e.to_string(),
            });
        }
    };

    let meta = AddonMetadata::normalize(&text);
    let Some((id, version)) = meta.identity() else {
        return ProcessedPackage::skipped(SkipReason::MissingIdentity);
    };

    let archive = ArchiveName::new(id.clone(), version.clone(), Platform::Generic).file_name();
    let packed = match pack_directory(dir, &dir.join(&archive)) {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("Failed to pack {dir_name}: {e:#}");
            false
        }
    };

    let entries = expand(&meta, dir_name, &[]);
    ProcessedPackage {
        outcome: PackageOutcome::Admitted {
            id: id.clone(),
            version: version.clone(),
            entries: entries.len(),
            archive: packed.then_some(archive),
            packed,
        },
        entries,
    }
}
