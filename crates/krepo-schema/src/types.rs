//! Identity and version newtypes.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Stable identifier of an add-on (e.g. `plugin.video.example`).
///
/// Identifiers are kept verbatim: they double as directory names on disk
/// and as the prefix of every archive filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddonId(String);

impl AddonId {
    /// Create a new identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AddonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for AddonId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for AddonId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for AddonId {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl Borrow<str> for AddonId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for AddonId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AddonId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<&str> for AddonId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AddonId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Free-form add-on version string.
///
/// Not guaranteed to be SemVer. Ordering between archives goes through
/// [`crate::ArchiveVersion`], never through this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddonVersion(String);

impl AddonVersion {
    /// Create a new version string.
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Return the version as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AddonVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for AddonVersion {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for AddonVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for AddonVersion {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AddonVersion {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<&str> for AddonVersion {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AddonVersion {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_verbatim() {
        let id = AddonId::new("plugin.video.Example");
        assert_eq!(id.as_str(), "plugin.video.Example");
        assert_eq!(id, "plugin.video.Example");
        assert_ne!(id, "plugin.video.example");
    }

    #[test]
    fn test_id_as_path() {
        let id = AddonId::from("script.module.foo");
        let dir = std::path::Path::new("repo").join(&id);
        assert_eq!(dir, std::path::Path::new("repo/script.module.foo"));
    }
}
