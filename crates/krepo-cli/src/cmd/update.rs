//! `krepo update`

use std::path::Path;

use anyhow::{Context, Result};
use krepo_core::Reporter;
use krepo_core::forges::github::GithubForge;
use krepo_core::ingest::{ingest_all, read_sources};

use super::load_config;
use crate::ui::Output;

/// Pull the latest release of every listed source into the repository.
///
/// Failing sources are reported and skipped; the command itself only fails
/// when the source list or the forge client cannot be set up.
pub async fn update(
    root: &Path,
    sources: Option<&Path>,
    token: Option<String>,
    generate: bool,
    quiet: bool,
) -> Result<()> {
    let mut config = load_config(root)?;
    if token.is_some() {
        config.github.token = token;
    }

    let list = sources.map_or_else(|| config.sources_path(root), Path::to_path_buf);
    let sources = read_sources(&list)?;
    let output = Output::quiet(quiet);
    if sources.is_empty() {
        output.warning(&format!("No sources listed in {}", list.display()));
    }

    let forge = GithubForge::new(&config.github).context("Failed to create GitHub client")?;
    let summary = ingest_all(root, &sources, &forge, &output).await;
    if summary.failed() > 0 {
        output.warning(&format!("{} of {} sources failed", summary.failed(), summary.sources.len()));
    }

    if generate {
        super::generate::run(root, &config, &output)?;
    }
    Ok(())
}
