//! Platform identifiers for binary add-ons.
//!
//! Release assets use their own naming (`linux-x64`, `android-arm64-v8a`,
//! ...). Kodi expects a fixed set of normalized identifiers. The mapping
//! between the two is a static, ordered table: the release-asset fragments
//! are consulted first, then the normalized identifiers themselves, and the
//! first match wins.
//!
//! # Example
//!
//! ```
//! use krepo_schema::Platform;
//!
//! assert_eq!(Platform::classify("inputstream.foo-linux-x64.zip"), Platform::LinuxX86_64);
//! assert_eq!(Platform::classify("plugin.video.foo-1.0.0.zip"), Platform::Generic);
//! ```

use serde::{Deserialize, Serialize};

/// Normalized OS/architecture tag, or the generic sentinel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum Platform {
    /// Android on 64-bit ARM.
    #[serde(rename = "android-aarch64")]
    AndroidAarch64,
    /// Android on 32-bit ARM.
    #[serde(rename = "android-armv7")]
    AndroidArmv7,
    /// Linux on 32-bit ARM.
    #[serde(rename = "linux-armv7")]
    LinuxArmv7,
    /// Linux on 64-bit ARM.
    #[serde(rename = "linux-aarch64")]
    LinuxAarch64,
    /// Linux on `x86_64`.
    #[serde(rename = "linux-x86_64")]
    LinuxX86_64,
    /// Linux on 32-bit x86.
    #[serde(rename = "linux-i686")]
    LinuxI686,
    /// Windows on `x86_64`.
    #[serde(rename = "windows-x86_64")]
    WindowsX86_64,
    /// Windows on 32-bit x86.
    #[serde(rename = "windows-i686")]
    WindowsI686,
    /// macOS on Intel.
    #[serde(rename = "osx-x86_64")]
    OsxX86_64,
    /// macOS on Apple Silicon.
    #[serde(rename = "osx-arm64")]
    OsxArm64,
    /// iOS on 64-bit ARM.
    #[serde(rename = "ios-arm64")]
    IosArm64,
    /// No binary specialization (pure-python add-ons).
    #[default]
    #[serde(rename = "all")]
    Generic,
}

/// Release-asset naming fragments, in consultation order.
pub const RELEASE_FRAGMENTS: &[(&str, Platform)] = &[
    ("android-arm64-v8a", Platform::AndroidAarch64),
    ("android-armeabi-v7a", Platform::AndroidArmv7),
    ("linux-arm32", Platform::LinuxArmv7),
    ("linux-arm64", Platform::LinuxAarch64),
    ("linux-x64", Platform::LinuxX86_64),
    ("linux-x86", Platform::LinuxI686),
    ("windows-x64", Platform::WindowsX86_64),
    ("windows-x86", Platform::WindowsI686),
    ("osx-x86_64", Platform::OsxX86_64),
    ("osx-arm64", Platform::OsxArm64),
    ("ios-arm64", Platform::IosArm64),
];

impl Platform {
    /// Every specific platform, in the order normalized identifiers are
    /// consulted. [`Platform::Generic`] is not included.
    pub const ALL: [Platform; 11] = [
        Self::AndroidAarch64,
        Self::AndroidArmv7,
        Self::LinuxArmv7,
        Self::LinuxAarch64,
        Self::LinuxX86_64,
        Self::LinuxI686,
        Self::WindowsX86_64,
        Self::WindowsI686,
        Self::OsxX86_64,
        Self::OsxArm64,
        Self::IosArm64,
    ];

    /// Convert to the identifier Kodi expects in `<platform>`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AndroidAarch64 => "android-aarch64",
            Self::AndroidArmv7 => "android-armv7",
            Self::LinuxArmv7 => "linux-armv7",
            Self::LinuxAarch64 => "linux-aarch64",
            Self::LinuxX86_64 => "linux-x86_64",
            Self::LinuxI686 => "linux-i686",
            Self::WindowsX86_64 => "windows-x86_64",
            Self::WindowsI686 => "windows-i686",
            Self::OsxX86_64 => "osx-x86_64",
            Self::OsxArm64 => "osx-arm64",
            Self::IosArm64 => "ios-arm64",
            Self::Generic => "all",
        }
    }

    /// Whether this is the generic sentinel.
    pub fn is_generic(&self) -> bool {
        matches!(self, Self::Generic)
    }

    /// Classify a filename (or a bare fragment) against the static table.
    ///
    /// A table entry matches only where it is not followed by an
    /// alphanumeric or `_`, so the release fragment `linux-x86` never claims
    /// a `linux-x86_64` filename. What precedes an entry is not checked:
    /// `_`-separated names like `foo_21.0_linux-x64.zip` still classify.
    pub fn classify(filename: &str) -> Self {
        let f = filename.to_lowercase();

        RELEASE_FRAGMENTS
            .iter()
            .find(|(fragment, _)| ends_token(&f, fragment))
            .map(|(_, platform)| *platform)
            .or_else(|| {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|platform| ends_token(&f, platform.as_str()))
            })
            .unwrap_or(Self::Generic)
    }

    /// The full classification table in consultation order, as
    /// `(pattern, platform)` pairs.
    pub fn table() -> impl Iterator<Item = (&'static str, Platform)> {
        RELEASE_FRAGMENTS
            .iter()
            .copied()
            .chain(Self::ALL.into_iter().map(|p| (p.as_str(), p)))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn ends_token(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        haystack[start + needle.len()..]
            .chars()
            .next()
            .is_none_or(|c| !is_word_char(c))
    })
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_lowercase();
        if s == "all" || s == "generic" {
            return Ok(Self::Generic);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown platform: {s}"))
    }
}
