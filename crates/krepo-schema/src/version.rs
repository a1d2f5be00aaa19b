//! Filename version extraction.
//!
//! Archive filenames carry their version as one `-` separated segment
//! (`plugin.video.foo-1.10.2.zip`, `plugin.video.foo-1.10.2-linux-x86_64.zip`).
//! There is no version-ordering law for add-ons, so ordering is defined here:
//!
//! - A segment matching `\d+(\.\d+)+` followed by an optional lowercase
//!   alphanumeric suffix yields [`ArchiveVersion::Ordinal`]. The suffix is
//!   dropped (`1.2.3a` orders equal to `1.2.3`).
//! - Anything else yields [`ArchiveVersion::Unparsed`] carrying the raw
//!   filename, which orders lexicographically.
//! - Every `Ordinal` ranks above every `Unparsed`.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

use crate::ARCHIVE_EXTENSION;

static VERSION_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)+)[a-z0-9]*$").expect("valid regex"));

/// Version extracted from an archive filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveVersion {
    /// Numeric components, compared element-wise (`1.10` > `1.9`).
    Ordinal(Vec<u64>),
    /// No version segment found; holds the raw filename.
    Unparsed(String),
}

impl ArchiveVersion {
    /// Extract the version from an archive filename. Never fails.
    pub fn from_filename(filename: &str) -> Self {
        let base = filename.strip_suffix(ARCHIVE_EXTENSION).unwrap_or(filename);

        base.split('-')
            .find_map(parse_segment)
            .map_or_else(|| Self::Unparsed(filename.to_string()), Self::Ordinal)
    }

    /// Whether a numeric version was found.
    pub fn is_ordinal(&self) -> bool {
        matches!(self, Self::Ordinal(_))
    }
}

fn parse_segment(segment: &str) -> Option<Vec<u64>> {
    let caps = VERSION_SEGMENT.captures(segment)?;
    caps[1]
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect()
}

impl Ord for ArchiveVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Ordinal(a), Self::Ordinal(b)) => a.cmp(b),
            (Self::Ordinal(_), Self::Unparsed(_)) => Ordering::Greater,
            (Self::Unparsed(_), Self::Ordinal(_)) => Ordering::Less,
            (Self::Unparsed(a), Self::Unparsed(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for ArchiveVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for ArchiveVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ordinal(parts) => {
                let parts: Vec<String> = parts.iter().map(u64::to_string).collect();
                write!(f, "{}", parts.join("."))
            }
            Self::Unparsed(raw) => write!(f, "{raw}"),
        }
    }
}

/// Pick the archive that represents a package's current state.
///
/// Highest [`ArchiveVersion`] wins. Equal versions (platform variants of
/// one release) are broken by the greater raw filename so the choice is
/// the same on every run.
pub fn select_current<'a, I>(filenames: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    filenames
        .into_iter()
        .map(|name| (ArchiveVersion::from_filename(name), name))
        .max_by(|(va, a), (vb, b)| va.cmp(vb).then_with(|| a.cmp(b)))
        .map(|(_, name)| name)
}
