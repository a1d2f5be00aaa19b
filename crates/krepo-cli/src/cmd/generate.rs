//! `krepo generate`

use std::path::Path;

use anyhow::Result;
use krepo_core::{NullReporter, RepoConfig, Reporter, RunSummary};

use super::load_config;
use crate::ui::Output;

/// Regenerate the catalog, its checksum and the listing page.
///
/// With `json` the console output is replaced by the run summary so stdout
/// stays machine readable.
pub fn generate(root: &Path, json: bool, quiet: bool) -> Result<()> {
    let config = load_config(root)?;
    if json {
        let summary = run(root, &config, &NullReporter)?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        run(root, &config, &Output::quiet(quiet))?;
    }
    Ok(())
}

/// Shared by `generate` and `update --generate`.
pub(crate) fn run(root: &Path, config: &RepoConfig, reporter: &dyn Reporter) -> Result<RunSummary> {
    tracing::info!("Generating catalog in {}", root.display());
    krepo_core::generate(root, config, reporter)
}
