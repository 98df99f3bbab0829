//! Target platform monikers
//!
//! A platform is identified by a family (`.NETFramework`), a version (`4.5`)
//! and an optional profile (`Client`). Two textual forms are accepted:
//!
//! - long form: `.NETFramework,Version=v4.5,Profile=Client`
//! - short form: `net45-client`
//!
//! The absence of a platform is the [`PlatformMoniker::Unspecified`]
//! sentinel, which renders as nothing in package paths and manifests.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameworkError {
    #[error("Unknown platform identifier '{identifier}' in '{text}'")]
    UnknownIdentifier { identifier: String, text: String },

    #[error("Invalid platform version in '{0}'")]
    InvalidVersion(String),

    #[error("Malformed platform moniker '{0}'")]
    Malformed(String),
}

/// Short abbreviation, canonical identifier. Lookup is case-insensitive.
const IDENTIFIERS: &[(&str, &str)] = &[
    ("net", ".NETFramework"),
    ("netframework", ".NETFramework"),
    (".net", ".NETFramework"),
    ("netcore", ".NETCore"),
    ("winrt", ".NETCore"),
    ("netmf", ".NETMicroFramework"),
    ("sl", "Silverlight"),
    ("silverlight", "Silverlight"),
    ("portable", ".NETPortable"),
    ("wp", "WindowsPhone"),
    ("windowsphone", "WindowsPhone"),
    ("wpa", "WindowsPhoneApp"),
    ("win", "Windows"),
    ("windows", "Windows"),
    ("netstandard", ".NETStandard"),
    ("netcoreapp", ".NETCoreApp"),
    ("monoandroid", "MonoAndroid"),
    ("monotouch", "MonoTouch"),
    ("monomac", "MonoMac"),
    ("xamarin.ios", "Xamarin.iOS"),
    ("native", "native"),
];

/// Canonical identifier, short abbreviation used when rendering
const SHORT_IDENTIFIERS: &[(&str, &str)] = &[
    (".NETFramework", "net"),
    (".NETCore", "win"),
    (".NETMicroFramework", "netmf"),
    ("Silverlight", "sl"),
    (".NETPortable", "portable"),
    ("WindowsPhone", "wp"),
    ("WindowsPhoneApp", "wpa"),
    ("Windows", "win"),
    (".NETStandard", "netstandard"),
    (".NETCoreApp", "netcoreapp"),
];

/// Short abbreviation, canonical profile
const PROFILES: &[(&str, &str)] = &[
    ("client", "Client"),
    ("full", "Full"),
    ("cf", "CompactFramework"),
    ("wp", "WindowsPhone"),
    ("wp71", "WindowsPhone71"),
];

/// Families whose short names keep dotted versions (`netstandard1.3`)
const DOTTED_FAMILIES: &[&str] = &[".NETStandard", ".NETCoreApp"];

/// A known compilation target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameworkName {
    identifier: String,
    version: Vec<u32>,
    profile: Option<String>,
}

impl FrameworkName {
    pub fn new(identifier: &str, version: &[u32], profile: Option<&str>) -> Self {
        Self {
            identifier: canonical_identifier(identifier)
                .map(str::to_string)
                .unwrap_or_else(|| identifier.to_string()),
            version: normalize_version(version.to_vec()),
            profile: profile
                .filter(|p| !p.is_empty())
                .map(|p| canonical_profile(p).to_string()),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn version(&self) -> &[u32] {
        &self.version
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Short folder name, e.g. `net45`, `net40-client`, `netstandard2.0`
    pub fn short_name(&self) -> String {
        let mut name = SHORT_IDENTIFIERS
            .iter()
            .find(|(long, _)| *long == self.identifier)
            .map(|(_, short)| short.to_string())
            .unwrap_or_else(|| self.identifier.clone());

        if self.version.iter().any(|&n| n > 0) {
            if DOTTED_FAMILIES.contains(&self.identifier.as_str()) {
                name.push_str(&dotted(&self.version));
            } else {
                for n in &self.version {
                    name.push_str(&n.to_string());
                }
            }
        }

        if let Some(profile) = &self.profile {
            let short = PROFILES
                .iter()
                .find(|(_, long)| long.eq_ignore_ascii_case(profile))
                .map(|(short, _)| *short)
                .unwrap_or(profile.as_str());
            name.push('-');
            name.push_str(short);
        }

        name
    }

    /// Long form, e.g. `.NETFramework,Version=v4.5,Profile=Client`
    pub fn full_name(&self) -> String {
        let mut name = format!("{},Version=v{}", self.identifier, dotted(&self.version));
        if let Some(profile) = &self.profile {
            name.push_str(",Profile=");
            name.push_str(profile);
        }
        name
    }
}

impl fmt::Display for FrameworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// A target platform, or the sentinel for "no platform constraint"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlatformMoniker {
    #[default]
    Unspecified,
    Framework(FrameworkName),
}

impl PlatformMoniker {
    /// Parse a short name. Empty input yields the unspecified sentinel.
    pub fn parse_short(text: &str) -> Result<Self, FrameworkError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Self::Unspecified);
        }

        let (name, profile) = match trimmed.split_once('-') {
            Some((name, profile)) => (name, Some(profile)),
            None => (trimmed, None),
        };

        let split = name
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(name.len());
        let (letters, digits) = name.split_at(split);

        let identifier = canonical_identifier(letters).ok_or_else(|| {
            FrameworkError::UnknownIdentifier {
                identifier: letters.to_string(),
                text: text.to_string(),
            }
        })?;

        let version = parse_compact_version(digits)
            .ok_or_else(|| FrameworkError::InvalidVersion(text.to_string()))?;

        if profile.is_some_and(str::is_empty) {
            return Err(FrameworkError::Malformed(text.to_string()));
        }

        Ok(Self::Framework(FrameworkName::new(
            identifier, &version, profile,
        )))
    }

    /// Parse the long `Identifier,Version=vX.Y[,Profile=P]` form
    pub fn parse_long(text: &str) -> Result<Self, FrameworkError> {
        let malformed = || FrameworkError::Malformed(text.to_string());

        let mut parts = text.split(',').map(str::trim);
        let identifier = parts.next().filter(|s| !s.is_empty()).ok_or_else(malformed)?;

        let mut version = None;
        let mut profile = None;
        for part in parts {
            let (key, value) = part.split_once('=').ok_or_else(malformed)?;
            match key.trim().to_ascii_lowercase().as_str() {
                "version" => {
                    let value = value.trim();
                    let value = value
                        .strip_prefix('v')
                        .or_else(|| value.strip_prefix('V'))
                        .unwrap_or(value);
                    version = Some(
                        parse_dotted_version(value)
                            .ok_or_else(|| FrameworkError::InvalidVersion(text.to_string()))?,
                    );
                }
                "profile" => profile = Some(value.trim()),
                _ => return Err(malformed()),
            }
        }

        let version = version.ok_or_else(malformed)?;

        if identifier.eq_ignore_ascii_case("any") {
            return Ok(Self::Unspecified);
        }

        Ok(Self::Framework(FrameworkName::new(
            identifier, &version, profile,
        )))
    }

    /// Parse either form: text containing a comma is treated as long form
    pub fn parse(text: &str) -> Result<Self, FrameworkError> {
        if text.contains(',') {
            Self::parse_long(text)
        } else {
            Self::parse_short(text)
        }
    }

    pub fn is_unspecified(&self) -> bool {
        matches!(self, Self::Unspecified)
    }

    /// Short name, or `None` for the sentinel
    pub fn short_name(&self) -> Option<String> {
        match self {
            Self::Unspecified => None,
            Self::Framework(name) => Some(name.short_name()),
        }
    }

    pub fn framework(&self) -> Option<&FrameworkName> {
        match self {
            Self::Unspecified => None,
            Self::Framework(name) => Some(name),
        }
    }
}

impl fmt::Display for PlatformMoniker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => Ok(()),
            Self::Framework(name) => write!(f, "{}", name),
        }
    }
}

impl From<FrameworkName> for PlatformMoniker {
    fn from(value: FrameworkName) -> Self {
        Self::Framework(value)
    }
}

fn canonical_identifier(text: &str) -> Option<&'static str> {
    IDENTIFIERS
        .iter()
        .find(|(short, long)| short.eq_ignore_ascii_case(text) || long.eq_ignore_ascii_case(text))
        .map(|(_, long)| *long)
}

fn canonical_profile(text: &str) -> &str {
    PROFILES
        .iter()
        .find(|(short, long)| short.eq_ignore_ascii_case(text) || long.eq_ignore_ascii_case(text))
        .map(|(_, long)| *long)
        .unwrap_or(text)
}

/// `45` is 4.5, `403` is 4.0.3, `1.3` is 1.3, empty is 0.0
fn parse_compact_version(digits: &str) -> Option<Vec<u32>> {
    if digits.is_empty() {
        return Some(vec![0, 0]);
    }
    if digits.contains('.') {
        return parse_dotted_version(digits);
    }
    digits.chars().map(|c| c.to_digit(10)).collect()
}

fn parse_dotted_version(text: &str) -> Option<Vec<u32>> {
    if text.is_empty() {
        return None;
    }
    let parts: Option<Vec<u32>> = text.split('.').map(|p| p.parse().ok()).collect();
    parts.filter(|p| p.len() <= 4)
}

/// Pad to major.minor and drop trailing zero components after minor
fn normalize_version(mut version: Vec<u32>) -> Vec<u32> {
    while version.len() < 2 {
        version.push(0);
    }
    while version.len() > 2 && version.last() == Some(&0) {
        version.pop();
    }
    version
}

fn dotted(version: &[u32]) -> String {
    version
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("net45", ".NETFramework,Version=v4.5")]
    #[case("net40-client", ".NETFramework,Version=v4.0,Profile=Client")]
    #[case("net403", ".NETFramework,Version=v4.0.3")]
    #[case("sl5", "Silverlight,Version=v5.0")]
    #[case("netstandard1.3", ".NETStandard,Version=v1.3")]
    #[case("winrt45", ".NETCore,Version=v4.5")]
    #[case("portable-net45+win8", ".NETPortable,Version=v0.0,Profile=net45+win8")]
    #[case("MonoAndroid10", "MonoAndroid,Version=v1.0")]
    fn test_parse_short(#[case] short: &str, #[case] long: &str) {
        let moniker = PlatformMoniker::parse_short(short).unwrap();
        assert_eq!(moniker.framework().unwrap().full_name(), long);
    }

    #[rstest]
    #[case(".NETFramework,Version=v4.5", "net45")]
    #[case(".NETFramework,Version=v4.0,Profile=Client", "net40-client")]
    #[case(".NETFramework,Version=v4.5.1", "net451")]
    #[case(".NETStandard,Version=v2.0", "netstandard2.0")]
    #[case("Silverlight,Version=v5.0", "sl50")]
    #[case("WindowsPhone,Version=v8.0", "wp80")]
    fn test_short_name_from_long(#[case] long: &str, #[case] short: &str) {
        let moniker = PlatformMoniker::parse_long(long).unwrap();
        assert_eq!(moniker.short_name().as_deref(), Some(short));
    }

    #[test]
    fn test_empty_short_name_is_unspecified() {
        assert_eq!(
            PlatformMoniker::parse_short("  ").unwrap(),
            PlatformMoniker::Unspecified
        );
        assert_eq!(PlatformMoniker::Unspecified.to_string(), "");
        assert_eq!(PlatformMoniker::Unspecified.short_name(), None);
    }

    #[test]
    fn test_any_framework_is_unspecified() {
        let moniker = PlatformMoniker::parse_long("Any,Version=v1.0").unwrap();
        assert!(moniker.is_unspecified());
    }

    #[test]
    fn test_equality_ignores_spelling() {
        let a = PlatformMoniker::parse("net45").unwrap();
        let b = PlatformMoniker::parse(".netframework,Version=v4.5.0").unwrap();
        assert_eq!(a, b);

        let client = PlatformMoniker::parse("net45-client").unwrap();
        assert_ne!(a, client);
    }

    #[rstest]
    #[case("foo45")]
    #[case("net4x")]
    #[case("net45-")]
    fn test_parse_short_rejects(#[case] text: &str) {
        assert!(PlatformMoniker::parse_short(text).is_err());
    }

    #[rstest]
    #[case(".NETFramework")]
    #[case(".NETFramework,Version=vx")]
    #[case(",Version=v4.5")]
    #[case(".NETFramework,Flavor=v4.5")]
    fn test_parse_long_rejects(#[case] text: &str) {
        assert!(PlatformMoniker::parse_long(text).is_err());
    }
}
