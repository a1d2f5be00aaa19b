//! GitHub releases over the REST API.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use super::RepoRef;
use super::traits::{AssetInfo, ForgeError, ReleaseInfo, ReleaseSource};
use crate::config::GithubConfig;

#[derive(Debug, Deserialize)]
struct GithubRelease {
    tag_name: String,
    #[serde(default)]
    assets: Vec<GithubAsset>,
}

#[derive(Debug, Deserialize)]
struct GithubAsset {
    name: String,
    browser_download_url: String,
}

impl From<GithubRelease> for ReleaseInfo {
    fn from(release: GithubRelease) -> Self {
        Self {
            tag_name: release.tag_name,
            assets: release
                .assets
                .into_iter()
                .map(|a| AssetInfo {
                    name: a.name,
                    download_url: a.browser_download_url,
                })
                .collect(),
        }
    }
}

/// GitHub REST client.
#[derive(Debug, Clone)]
pub struct GithubForge {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GithubForge {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &GithubConfig) -> Result<Self, ForgeError> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn api_get(&self, url: &str) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn check_status(url: &str, response: Response) -> Result<Response, ForgeError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(ForgeError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        })
    }
}

#[async_trait]
impl ReleaseSource for GithubForge {
    fn key(&self) -> String {
        format!("github:{}", self.api_url)
    }

    async fn latest_release(&self, repo: &RepoRef) -> Result<ReleaseInfo, ForgeError> {
        let url = format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_url, repo.owner, repo.repo
        );
        tracing::debug!("GET {url}");

        let response = self.api_get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ForgeError::NotFound(repo.to_string()));
        }
        let release: GithubRelease = check_status(&url, response)?.json().await?;
        Ok(release.into())
    }

    async fn download(&self, asset: &AssetInfo, dest: &Path) -> Result<u64, ForgeError> {
        tracing::debug!("Downloading {} to {}", asset.download_url, dest.display());
        let response = self.client.get(&asset.download_url).send().await?;
        let response = check_status(&asset.download_url, response)?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}
