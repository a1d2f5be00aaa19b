//! Archive filename convention.
//!
//! `<identity>-<version>.zip` for generic add-ons and
//! `<identity>-<version>-<platform>.zip` for binary add-ons. The platform
//! form is positional: only a filename that starts with exactly
//! `<identity>-<version>-` carries a platform fragment.

use crate::{ARCHIVE_EXTENSION, AddonId, AddonVersion, Platform};

/// The destination name of an archive in a package directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
    /// Add-on identity.
    pub id: AddonId,
    /// Add-on version.
    pub version: AddonVersion,
    /// Target platform; [`Platform::Generic`] omits the suffix.
    pub platform: Platform,
}

impl ArchiveName {
    /// Build a name for the given identity, version and platform.
    pub fn new(id: AddonId, version: AddonVersion, platform: Platform) -> Self {
        Self {
            id,
            version,
            platform,
        }
    }

    /// Render the filename.
    ///
    /// ```
    /// use krepo_schema::{ArchiveName, Platform};
    ///
    /// let name = ArchiveName::new("plugin.foo".into(), "1.0.0".into(), Platform::LinuxAarch64);
    /// assert_eq!(name.file_name(), "plugin.foo-1.0.0-linux-aarch64.zip");
    /// ```
    pub fn file_name(&self) -> String {
        if self.platform.is_generic() {
            format!("{}-{}{ARCHIVE_EXTENSION}", self.id, self.version)
        } else {
            format!(
                "{}-{}-{}{ARCHIVE_EXTENSION}",
                self.id, self.version, self.platform
            )
        }
    }
}

impl std::fmt::Display for ArchiveName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// Whether a filename carries the archive extension.
#[allow(clippy::case_sensitive_file_extension_comparisons)]
pub fn is_archive(filename: &str) -> bool {
    filename.ends_with(ARCHIVE_EXTENSION)
}

/// Filename without the archive extension.
pub fn stem(filename: &str) -> &str {
    filename.strip_suffix(ARCHIVE_EXTENSION).unwrap_or(filename)
}

/// The raw platform fragment of `<id>-<version>-<fragment>.zip`.
///
/// Returns `None` unless the filename matches that shape exactly.
pub fn platform_fragment<'a>(filename: &'a str, id: &str, version: &str) -> Option<&'a str> {
    let rest = filename.strip_suffix(ARCHIVE_EXTENSION)?;
    let fragment = rest
        .strip_prefix(id)?
        .strip_prefix('-')?
        .strip_prefix(version)?
        .strip_prefix('-')?;
    (!fragment.is_empty()).then_some(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_name() {
        let name = ArchiveName::new("plugin.foo".into(), "2.1".into(), Platform::Generic);
        assert_eq!(name.file_name(), "plugin.foo-2.1.zip");
    }

    #[test]
    fn test_platform_fragment() {
        assert_eq!(
            platform_fragment("inputstream.x-1.2.0-windows-x86_64.zip", "inputstream.x", "1.2.0"),
            Some("windows-x86_64")
        );
        // Different version
        assert_eq!(
            platform_fragment("inputstream.x-1.1.0-windows-x86_64.zip", "inputstream.x", "1.2.0"),
            None
        );
        // Generic archive
        assert_eq!(platform_fragment("inputstream.x-1.2.0.zip", "inputstream.x", "1.2.0"), None);
        // Not an archive
        assert_eq!(
            platform_fragment("inputstream.x-1.2.0-linux-x86_64.tar", "inputstream.x", "1.2.0"),
            None
        );
    }

    #[test]
    fn test_stem() {
        assert_eq!(stem("a-1.0.zip"), "a-1.0");
        assert_eq!(stem("a-1.0"), "a-1.0");
        assert!(is_archive("a-1.0.zip"));
        assert!(!is_archive("addon.xml"));
    }
}
