//! Release ingestion.
//!
//! Pulls the latest release of every listed source and files its add-on
//! archives under `<id>/<id>-<version>[-<platform>].zip`, the layout the
//! generator reads. Superseded archives are left in place.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use krepo_schema::{AddonId, AddonVersion, ArchiveName, Platform};
use serde::Serialize;

use crate::forges::{RepoRef, ReleaseSource};
use crate::io::archive::read_identity;
use crate::reporter::Reporter;

/// Prefix of the per-source scratch directory under the repository root.
pub const SCRATCH_PREFIX: &str = ".krepo-dl-";

/// An archive moved into its package directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiledArchive {
    /// Release asset name.
    pub asset: String,
    /// Identity read from the archive's `addon.xml`.
    pub id: AddonId,
    /// Platform classified from the asset name.
    pub platform: Platform,
    /// Where the archive now lives.
    pub dest: PathBuf,
}

/// Result of ingesting one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    /// The release was queried and every archive downloaded.
    Ingested {
        /// Release tag without its leading `v`.
        version: String,
        /// Archives filed into package directories.
        filed: Vec<FiledArchive>,
        /// Assets left out, with the reason.
        skipped: Vec<(String, String)>,
    },
    /// The source was skipped.
    Failed {
        /// Error chain, outermost first.
        error: String,
    },
}

/// Outcome of one entry of the source list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    /// The entry as written in the source list.
    pub source: String,
    /// What happened to it.
    #[serde(flatten)]
    pub outcome: SourceOutcome,
}

/// Everything an ingestion run did, in source order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestSummary {
    /// One report per source.
    pub sources: Vec<SourceReport>,
}

impl IngestSummary {
    /// Archives filed across all sources.
    pub fn filed(&self) -> impl Iterator<Item = &FiledArchive> {
        self.sources
            .iter()
            .filter_map(|s| match &s.outcome {
                SourceOutcome::Ingested { filed, .. } => Some(filed),
                SourceOutcome::Failed { .. } => None,
            })
            .flatten()
    }

    /// Number of sources that failed.
    pub fn failed(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| matches!(s.outcome, SourceOutcome::Failed { .. }))
            .count()
    }
}

/// Parse a source list: one entry per line, blank lines and `#` comments
/// ignored.
pub fn parse_sources(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read and parse a source list file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_sources(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read source list {}", path.display()))?;
    Ok(parse_sources(&text))
}

/// Ingest every source in turn. A failing source never stops the others.
pub async fn ingest_all(
    root: &Path,
    sources: &[String],
    forge: &dyn ReleaseSource,
    reporter: &dyn Reporter,
) -> IngestSummary {
    let start = Instant::now();
    let mut summary = IngestSummary::default();

    for source in sources {
        reporter.section(&format!("Checking {source}"));
        let outcome = match ingest_one(root, source, forge, reporter).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Source {source} failed: {e:#}");
                reporter.error(&format!("{source}: {e:#}"));
                SourceOutcome::Failed {
                    error: format!("{e:#}"),
                }
            }
        };
        summary.sources.push(SourceReport {
            source: source.clone(),
            outcome,
        });
    }

    reporter.summary(summary.filed().count(), "filed", start.elapsed().as_secs_f64());
    summary
}

/// Ingest the latest release of one source.
///
/// Downloads happen in a scratch directory inside `root` that is removed
/// when this returns, whatever the outcome.
///
/// # Errors
///
/// Returns an error if the source is malformed, the release cannot be
/// queried, or any archive fails to download.
pub async fn ingest_one(
    root: &Path,
    source: &str,
    forge: &dyn ReleaseSource,
    reporter: &dyn Reporter,
) -> Result<SourceOutcome> {
    let Some(repo) = RepoRef::parse(source) else {
        bail!("not a repository reference");
    };

    tracing::debug!("Querying {} for {repo}", forge.key());
    let release = forge
        .latest_release(&repo)
        .await
        .with_context(|| format!("Failed to query latest release of {repo}"))?;
    let version = release.version().to_string();
    if version.is_empty() {
        bail!("release tag {:?} has no version", release.tag_name);
    }
    reporter.info(&format!("latest version {version}"));

    let scratch = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempdir_in(root)
        .with_context(|| format!("Failed to create scratch directory in {}", root.display()))?;

    let mut downloaded = Vec::new();
    for asset in release.archives() {
        let Some(file_name) = Path::new(&asset.name).file_name() else {
            continue;
        };
        let path = scratch.path().join(file_name);
        let bytes = forge
            .download(asset, &path)
            .await
            .with_context(|| format!("Failed to download {}", asset.name))?;
        tracing::debug!("Downloaded {} ({bytes} bytes)", asset.name);
        downloaded.push((asset.name.clone(), path));
    }

    let version = AddonVersion::new(version);
    let mut filed = Vec::new();
    let mut skipped = Vec::new();
    for (asset, path) in downloaded {
        match file_archive(root, &asset, &path, &version) {
            Ok(archive) => {
                reporter.filed(&asset, &archive.dest);
                filed.push(archive);
            }
            Err(e) => {
                tracing::warn!("Skipping {asset}: {e:#}");
                reporter.warning(&format!("{asset}: {e:#}"));
                skipped.push((asset, format!("{e:#}")));
            }
        }
    }

    Ok(SourceOutcome::Ingested {
        version: version.to_string(),
        filed,
        skipped,
    })
}

fn file_archive(root: &Path, asset: &str, path: &Path, version: &AddonVersion) -> Result<FiledArchive> {
    let id = read_identity(path)
        .with_context(|| format!("Failed to read {asset}"))?
        .context("no add-on identity in archive")?;
    if !is_safe_id(&id) {
        bail!("unusable add-on identity {id:?}");
    }

    let platform = Platform::classify(asset);
    let name = ArchiveName::new(id.clone(), version.clone(), platform);
    let dest_dir = root.join(&id);
    fs::create_dir_all(&dest_dir)
        .with_context(|| format!("Failed to create {}", dest_dir.display()))?;

    let dest = dest_dir.join(name.file_name());
    move_file(path, &dest)
        .with_context(|| format!("Failed to move {asset} to {}", dest.display()))?;
    tracing::info!("Filed {asset} as {}", dest.display());

    Ok(FiledArchive {
        asset: asset.to_string(),
        id,
        platform,
        dest,
    })
}

fn is_safe_id(id: &str) -> bool {
    !id.is_empty() && !id.starts_with('.') && !id.contains(['/', '\\'])
}

/// Move a file, replacing `to`. Falls back to copy and remove across
/// filesystems.
///
/// # Errors
///
/// Returns an error if neither rename nor copy succeeds.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if to.exists() {
        fs::remove_file(to)?;
    }
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GithubConfig;
    use crate::forges::GithubForge;
    use crate::reporter::NullReporter;
    use crate::testutil::{addon_xml, write_zip};
    use mockito::{Mock, Server, ServerGuard};

    fn zip_bytes(dir: &Path, id: &str, version: &str) -> Vec<u8> {
        let path = dir.join(format!("{id}.fixture.zip"));
        let xml = addon_xml(id, version, "");
        write_zip(&path, &[(format!("{id}/addon.xml").as_str(), xml.as_bytes())]);
        fs::read(path).unwrap()
    }

    fn forge(server: &ServerGuard) -> GithubForge {
        GithubForge::new(&GithubConfig {
            api_url: server.url(),
            token: None,
            timeout_secs: 5,
        })
        .unwrap()
    }

    async fn release(server: &mut ServerGuard, repo: &str, tag: &str, assets: &[&str]) -> Mock {
        let assets: Vec<String> = assets
            .iter()
            .map(|name| {
                format!(
                    r#"{{"name": "{name}", "browser_download_url": "{}/dl/{name}"}}"#,
                    server.url()
                )
            })
            .collect();
        server
            .mock("GET", format!("/repos/{repo}/releases/latest").as_str())
            .with_status(200)
            .with_body(format!(r#"{{"tag_name": "{tag}", "assets": [{}]}}"#, assets.join(",")))
            .create_async()
            .await
    }

    async fn asset(server: &mut ServerGuard, name: &str, body: Vec<u8>) -> Mock {
        server
            .mock("GET", format!("/dl/{name}").as_str())
            .with_status(200)
            .with_body(body)
            .create_async()
            .await
    }

    fn no_scratch_left(root: &Path) -> bool {
        fs::read_dir(root)
            .unwrap()
            .filter_map(std::result::Result::ok)
            .all(|e| !e.file_name().to_string_lossy().starts_with(SCRATCH_PREFIX))
    }

    #[test]
    fn test_parse_sources() {
        let text = "\n# binary add-ons\nhttps://github.com/xbmc/inputstream.adaptive\n   \n  owner/plugin  \n";
        assert_eq!(
            parse_sources(text),
            ["https://github.com/xbmc/inputstream.adaptive", "owner/plugin"]
        );
    }

    #[test]
    fn test_move_file_replaces_destination() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("from.zip");
        let to = dir.path().join("to.zip");
        fs::write(&from, "new").unwrap();
        fs::write(&to, "old").unwrap();

        move_file(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_ingest_renames_and_files_archives() {
        let fixtures = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let mut server = Server::new_async().await;

        let _release = release(
            &mut server,
            "xbmc/inputstream.adaptive",
            "v21.4.4",
            &[
                "inputstream.adaptive-21.4.4-Omega-linux-x64.zip",
                "inputstream.adaptive-21.4.4-Omega-android-arm64-v8a.zip",
                "CHANGELOG.txt",
            ],
        )
        .await;
        let body = zip_bytes(fixtures.path(), "inputstream.adaptive", "21.4.4");
        let _a = asset(&mut server, "inputstream.adaptive-21.4.4-Omega-linux-x64.zip", body.clone()).await;
        let _b = asset(&mut server, "inputstream.adaptive-21.4.4-Omega-android-arm64-v8a.zip", body).await;

        let sources = vec!["https://github.com/xbmc/inputstream.adaptive".to_string()];
        let summary = ingest_all(root.path(), &sources, &forge(&server), &NullReporter).await;

        assert_eq!(summary.failed(), 0);
        let dests: Vec<&Path> = summary.filed().map(|f| f.dest.as_path()).collect();
        let dir = root.path().join("inputstream.adaptive");
        assert_eq!(
            dests,
            [
                dir.join("inputstream.adaptive-21.4.4-linux-x86_64.zip").as_path(),
                dir.join("inputstream.adaptive-21.4.4-android-aarch64.zip").as_path(),
            ]
        );
        for dest in dests {
            assert_eq!(read_identity(dest).unwrap().unwrap(), "inputstream.adaptive");
        }
        assert!(no_scratch_left(root.path()));
    }

    #[tokio::test]
    async fn test_failing_source_does_not_stop_later_ones() {
        let fixtures = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let mut server = Server::new_async().await;

        let _gone = server
            .mock("GET", "/repos/owner/gone/releases/latest")
            .with_status(404)
            .create_async()
            .await;
        let _release = release(&mut server, "owner/plugin.good", "1.0.0", &["plugin.good-1.0.0.zip"]).await;
        let _asset = asset(
            &mut server,
            "plugin.good-1.0.0.zip",
            zip_bytes(fixtures.path(), "plugin.good", "1.0.0"),
        )
        .await;

        let sources = vec![
            "owner/gone".to_string(),
            "not a source".to_string(),
            "owner/plugin.good".to_string(),
        ];
        let summary = ingest_all(root.path(), &sources, &forge(&server), &NullReporter).await;

        assert_eq!(summary.failed(), 2);
        assert!(matches!(summary.sources[2].outcome, SourceOutcome::Ingested { .. }));
        assert!(root.path().join("plugin.good/plugin.good-1.0.0.zip").is_file());
    }

    #[tokio::test]
    async fn test_archive_without_identity_is_skipped() {
        let fixtures = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let mut server = Server::new_async().await;

        let bogus = fixtures.path().join("bogus.zip");
        write_zip(&bogus, &[("readme.txt", b"hi".as_slice())]);

        let _release = release(&mut server, "owner/mixed", "v2.0", &["bogus.zip", "plugin.m-2.0.zip"]).await;
        let _bogus = asset(&mut server, "bogus.zip", fs::read(&bogus).unwrap()).await;
        let _good = asset(
            &mut server,
            "plugin.m-2.0.zip",
            zip_bytes(fixtures.path(), "plugin.m", "2.0"),
        )
        .await;

        let outcome = ingest_one(root.path(), "owner/mixed", &forge(&server), &NullReporter)
            .await
            .unwrap();
        let SourceOutcome::Ingested { version, filed, skipped } = outcome else {
            panic!("source failed");
        };
        assert_eq!(version, "2.0");
        assert_eq!(filed.len(), 1);
        assert_eq!(filed[0].platform, Platform::Generic);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].0, "bogus.zip");
        assert!(no_scratch_left(root.path()));
    }

    #[tokio::test]
    async fn test_download_failure_fails_source_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let mut server = Server::new_async().await;

        let _release = release(&mut server, "owner/broken", "1.0", &["broken-1.0.zip"]).await;
        let _asset = server
            .mock("GET", "/dl/broken-1.0.zip")
            .with_status(500)
            .create_async()
            .await;

        let result = ingest_one(root.path(), "owner/broken", &forge(&server), &NullReporter).await;
        assert!(result.is_err());
        assert!(no_scratch_left(root.path()));
        assert!(!root.path().join("broken").exists());
    }
}
