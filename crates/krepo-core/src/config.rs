//! Repository configuration.
//!
//! Loaded from `krepo.toml` in the repository root when present, then
//! overridden from the environment. Every field has a default so an empty
//! (or missing) file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// Path of `krepo.toml`.
        path: PathBuf,
        /// Underlying read error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`RepoConfig`].
    #[error("Invalid configuration in {path}: {source}")]
    Parse {
        /// Path of `krepo.toml`.
        path: PathBuf,
        /// Parser error with its location.
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level configuration for one repository root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Newline-delimited list of release sources, relative to the root.
    pub sources_file: PathBuf,
    /// Mirror self-descriptor settings.
    pub mirror: MirrorConfig,
    /// `index.html` settings.
    pub listing: ListingConfig,
    /// Forge API settings.
    pub github: GithubConfig,
}

/// How the mirror variant of the repository add-on is derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Generate the mirror variant at all.
    pub enabled: bool,
    /// Explicit mirror identity; defaults to `<id><id_suffix>`.
    pub id: Option<String>,
    /// Explicit mirror display name; defaults to `<name><name_suffix>`.
    pub name: Option<String>,
    /// Appended to the primary identity when `id` is unset.
    pub id_suffix: String,
    /// Appended to the primary display name when `name` is unset.
    pub name_suffix: String,
    /// External host whose URLs get proxied.
    pub host_prefix: String,
    /// Prepended to every occurrence of `host_prefix`.
    pub proxy_prefix: String,
}

/// Static text of the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Page title and heading.
    pub title: String,
    /// Inserted verbatim as HTML.
    pub description: String,
}

/// Forge API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// REST API base URL, without trailing `/`.
    pub api_url: String,
    /// Never read from or written to the config file.
    #[serde(skip)]
    pub token: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            sources_file: PathBuf::from("sources.txt"),
            mirror: MirrorConfig::default(),
            listing: ListingConfig::default(),
            github: GithubConfig::default(),
        }
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            id: None,
            name: None,
            id_suffix: ".ghproxy".to_string(),
            name_suffix: " (GHProxy)".to_string(),
            host_prefix: "https://raw.githubusercontent.com".to_string(),
            proxy_prefix: "https://gh-proxy.org/".to_string(),
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            title: "Kodi Add-on Repository".to_string(),
            description: "Install one of the repository add-ons below from the Kodi file manager."
                .to_string(),
        }
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            token: None,
            timeout_secs: 300,
        }
    }
}

impl RepoConfig {
    /// Name of the configuration file inside the repository root.
    pub const FILE_NAME: &'static str = "krepo.toml";

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this schema.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load `<root>/krepo.toml`, falling back to defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(Self::FILE_NAME);
        if !path.exists() {
            tracing::debug!("No {} in {}, using defaults", Self::FILE_NAME, root.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Recognized keys: `KREPO_PROXY_PREFIX`, `KREPO_HOST_PREFIX`,
    /// `KREPO_GITHUB_API`, `GITHUB_TOKEN` (then `GH_TOKEN`).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = lookup("KREPO_PROXY_PREFIX") {
            self.mirror.proxy_prefix = v;
        }
        if let Some(v) = lookup("KREPO_HOST_PREFIX") {
            self.mirror.host_prefix = v;
        }
        if let Some(v) = lookup("KREPO_GITHUB_API") {
            self.github.api_url = v;
        }
        if let Some(token) = lookup("GITHUB_TOKEN").or_else(|| lookup("GH_TOKEN")) {
            self.github.token = Some(token);
        }
    }

    /// Absolute location of the source list.
    pub fn sources_path(&self, root: &Path) -> PathBuf {
        root.join(&self.sources_file)
    }
}

impl MirrorConfig {
    /// Mirror identity for a repository add-on identity.
    pub fn mirror_id(&self, id: &str) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("{id}{}", self.id_suffix))
    }

    /// Mirror display name for a repository add-on name.
    pub fn mirror_name(&self, name: &str) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{name}{}", self.name_suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = RepoConfig::parse("").unwrap();
        assert_eq!(config, RepoConfig::default());
        assert_eq!(config.sources_file, PathBuf::from("sources.txt"));
        assert!(config.mirror.enabled);
    }

    #[test]
    fn test_partial_override() {
        let config = RepoConfig::parse(
            r#"
            sources_file = "upstream.txt"

            [mirror]
            id = "repository.example.cn"
            proxy_prefix = "https://mirror.example.org/"

            [listing]
            title = "Example Repo"
            "#,
        )
        .unwrap();

        assert_eq!(config.sources_file, PathBuf::from("upstream.txt"));
        assert_eq!(config.mirror.mirror_id("repository.example"), "repository.example.cn");
        assert_eq!(config.mirror.proxy_prefix, "https://mirror.example.org/");
        // untouched fields keep their defaults
        assert_eq!(config.mirror.host_prefix, "https://raw.githubusercontent.com");
        assert_eq!(config.listing.title, "Example Repo");
        assert_eq!(config.github.timeout_secs, 300);
    }

    #[test]
    fn test_token_is_not_read_from_file() {
        let config = RepoConfig::parse("[github]\ntoken = \"secret\"\n");
        // unknown-to-serde (skipped) field is ignored, not an error
        assert_eq!(config.unwrap().github.token, None);
    }

    #[test]
    fn test_mirror_defaults() {
        let mirror = MirrorConfig::default();
        assert_eq!(mirror.mirror_id("repository.foo"), "repository.foo.ghproxy");
        assert_eq!(
            mirror.mirror_name("Foo repository"),
            "Foo repository (GHProxy)"
        );
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("KREPO_PROXY_PREFIX", "https://proxy.test/"),
            ("GH_TOKEN", "gh-token"),
            ("KREPO_GITHUB_API", "  "),
        ]
        .into_iter()
        .collect();

        let mut config = RepoConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| (*v).to_string()));

        assert_eq!(config.mirror.proxy_prefix, "https://proxy.test/");
        assert_eq!(config.github.token.as_deref(), Some("gh-token"));
        // blank values are ignored
        assert_eq!(config.github.api_url, "https://api.github.com");
    }

    #[test]
    fn test_load_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(RepoConfig::load(dir.path()).unwrap(), RepoConfig::default());

        std::fs::write(dir.path().join(RepoConfig::FILE_NAME), "mirror = 3").unwrap();
        let err = RepoConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
