//! Forge adapters that publish add-on releases.

/// GitHub REST API adapter.
pub mod github;
/// Shared traits and types for forge adapters.
pub mod traits;

pub use github::GithubForge;
pub use traits::{AssetInfo, ForgeError, ReleaseInfo, ReleaseSource};

/// A repository on a forge, `owner/repo`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    /// User or organization.
    pub owner: String,
    /// Repository name.
    pub repo: String,
}

impl RepoRef {
    /// Parse `https://github.com/owner/repo`, `github.com/owner/repo` or
    /// `owner/repo`. A trailing `/` or `.git` is ignored.
    pub fn parse(source: &str) -> Option<Self> {
        let source = source.trim();
        let path = ["https://github.com/", "http://github.com/", "github.com/"]
            .iter()
            .find_map(|prefix| source.strip_prefix(prefix))
            .unwrap_or(source);
        let path = path.trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);

        let (owner, repo) = path.split_once('/')?;
        let valid = |s: &str| !s.is_empty() && !s.contains(['/', ' ', ':']);
        (valid(owner) && valid(repo)).then(|| Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl std::str::FromStr for RepoRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid repository reference: {s}"))
    }
}
