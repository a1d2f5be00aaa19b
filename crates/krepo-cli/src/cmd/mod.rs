//! Subcommand implementations.

pub mod generate;
pub mod platforms;
pub mod update;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result};
use krepo_core::RepoConfig;

/// Load `krepo.toml` from the root and apply environment overrides.
pub fn load_config(root: &Path) -> Result<RepoConfig> {
    let mut config = RepoConfig::load(root)
        .with_context(|| format!("Failed to load configuration from {}", root.display()))?;
    config.apply_env();
    tracing::debug!("Configuration: {config:?}");
    Ok(config)
}
