//! Per-package outcomes of a generation run.

use std::path::PathBuf;

use krepo_schema::{AddonId, AddonVersion};
use serde::Serialize;
use thiserror::Error;

/// Why a package directory contributed nothing to the catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Neither an archive nor a loose `addon.xml`.
    #[error("no archives and no addon.xml")]
    Empty,

    /// The current archive has no `<top>/addon.xml`.
    #[error("current archive has no addon.xml at its root")]
    NoMetadata,

    /// The current archive (or loose metadata) could not be read.
    #[error("cannot read {archive}: {message}")]
    Archive {
        /// File that failed.
        archive: String,
        /// Error text.
        message: String,
    },

    /// Neither the parse nor the textual fallback found id and version.
    #[error("addon.xml has no id or version")]
    MissingIdentity,

    /// Generated folder of the repository add-on or its mirror.
    #[error("holds the repository add-on")]
    SelfDescriptor,
}

/// Result of processing one package directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PackageOutcome {
    /// The directory contributed catalog entries.
    Admitted {
        /// Identity from the metadata.
        id: AddonId,
        /// Version from the metadata.
        version: AddonVersion,
        /// Catalog entries contributed (one per platform for binary add-ons).
        entries: usize,
        /// Archive the metadata was read from, if any.
        archive: Option<String>,
        /// Whether the archive was packed from a loose `addon.xml`.
        packed: bool,
    },
    /// The directory contributed nothing.
    Skipped(SkipReason),
}

impl PackageOutcome {
    /// Whether this is [`PackageOutcome::Admitted`].
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted { .. })
    }
}

/// Outcome of one package directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageReport {
    /// Package directory name.
    pub dir: String,
    /// What happened to it.
    #[serde(flatten)]
    pub outcome: PackageOutcome,
}

/// Everything a generation run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// One report per package directory, in processing order.
    pub packages: Vec<PackageReport>,
    /// Repository add-on archives written (primary and mirror).
    pub descriptors: Vec<PathBuf>,
    /// `addons.xml`, once written.
    pub catalog: Option<PathBuf>,
    /// Lowercase hex MD5 of `addons.xml`.
    pub checksum: Option<String>,
    /// Total catalog entries, descriptors included.
    pub entries: usize,
    /// `index.html`, if a repository add-on exists and the page was written.
    pub listing: Option<PathBuf>,
    /// Wall-clock time of the run.
    pub duration_ms: u64,
}

impl RunSummary {
    /// Append the outcome of one directory.
    pub fn record(&mut self, dir: impl Into<String>, outcome: PackageOutcome) {
        self.packages.push(PackageReport {
            dir: dir.into(),
            outcome,
        });
    }

    /// Number of admitted package directories.
    pub fn admitted(&self) -> usize {
        self.packages
            .iter()
            .filter(|r| r.outcome.is_admitted())
            .count()
    }

    /// Skipped directories with their reasons.
    pub fn skipped(&self) -> impl Iterator<Item = (&str, &SkipReason)> {
        self.packages.iter().filter_map(|r| match &r.outcome {
            PackageOutcome::Skipped(reason) => Some((r.dir.as_str(), reason)),
            PackageOutcome::Admitted { .. } => None,
        })
    }

    /// Outcome recorded for `dir`, if any.
    pub fn outcome(&self, dir: &str) -> Option<&PackageOutcome> {
        self.packages
            .iter()
            .find(|r| r.dir == dir)
            .map(|r| &r.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RunSummary {
        let mut summary = RunSummary::default();
        summary.record(
            "plugin.a",
            PackageOutcome::Admitted {
                id: "plugin.a".into(),
                version: "1.0".into(),
                entries: 1,
                archive: Some("plugin.a-1.0.zip".to_string()),
                packed: false,
            },
        );
        summary.record("broken", PackageOutcome::Skipped(SkipReason::MissingIdentity));
        summary.record("empty", PackageOutcome::Skipped(SkipReason::Empty));
        summary
    }

    #[test]
    fn test_counts() {
        let summary = summary();
        assert_eq!(summary.admitted(), 1);
        let skipped: Vec<_> = summary.skipped().map(|(dir, _)| dir).collect();
        assert_eq!(skipped, ["broken", "empty"]);
        assert_eq!(
            summary.outcome("empty"),
            Some(&PackageOutcome::Skipped(SkipReason::Empty))
        );
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(summary()).unwrap();
        let packages = json["packages"].as_array().unwrap();

        assert_eq!(packages[0]["dir"], "plugin.a");
        assert_eq!(packages[0]["status"], "admitted");
        assert_eq!(packages[0]["id"], "plugin.a");
        assert_eq!(packages[1]["status"], "skipped");
        assert_eq!(packages[1]["reason"], "missing_identity");
    }

    #[test]
    fn test_reason_messages() {
        let reason = SkipReason::Archive {
            archive: "a-1.0.zip".to_string(),
            message: "invalid Zip archive".to_string(),
        };
        assert_eq!(reason.to_string(), "cannot read a-1.0.zip: invalid Zip archive");
    }
}
