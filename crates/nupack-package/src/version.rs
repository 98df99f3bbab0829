//! Package versions and version range specifications
//!
//! Versions follow the package feed's dotted scheme (`1.0`, `2.8.2`,
//! `1.1.20-beta`, up to four numeric components). Ranges use the interval
//! notation understood by package consumers:
//!
//! | text          | meaning            |
//! |---------------|--------------------|
//! | `1.0`         | `>= 1.0`           |
//! | `[1.0]`       | exactly `1.0`      |
//! | `(1.0,)`      | `> 1.0`            |
//! | `(,2.0]`      | `<= 2.0`           |
//! | `[1.0,2.0)`   | `>= 1.0 && < 2.0`  |

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum number of numeric components in a version
const MAX_COMPONENTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    #[error("Invalid pre-release label in '{version}': {reason}")]
    InvalidPrerelease { version: String, reason: String },

    #[error("Invalid version range '{0}'")]
    InvalidSpec(String),
}

/// A package version such as `1.0`, `4.5.24` or `1.1.20-beta`
///
/// Comparison is numeric per component (missing components count as zero),
/// so `1.0` and `1.0.0` are equal. A release sorts above any pre-release
/// with the same numbers. The original text is kept for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageVersion {
    numbers: [u64; MAX_COMPONENTS],
    components: usize,
    pre: Option<semver::Prerelease>,
    original: String,
}

impl PackageVersion {
    /// Parse a version string
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(VersionError::InvalidVersion(text.to_string()));
        }

        let (release, label) = match trimmed.split_once('-') {
            Some((release, label)) => (release, Some(label)),
            None => (trimmed, None),
        };

        let parts: Vec<&str> = release.split('.').collect();
        if parts.len() > MAX_COMPONENTS {
            return Err(VersionError::InvalidVersion(text.to_string()));
        }

        let mut numbers = [0u64; MAX_COMPONENTS];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return Err(VersionError::InvalidVersion(text.to_string()));
            }
            *slot = part
                .parse()
                .map_err(|_| VersionError::InvalidVersion(text.to_string()))?;
        }

        let pre = match label {
            Some("") => {
                return Err(VersionError::InvalidPrerelease {
                    version: text.to_string(),
                    reason: "empty label".to_string(),
                })
            }
            Some(label) => Some(semver::Prerelease::new(label).map_err(|e| {
                VersionError::InvalidPrerelease {
                    version: text.to_string(),
                    reason: e.to_string(),
                }
            })?),
            None => None,
        };

        Ok(Self {
            numbers,
            components: parts.len(),
            pre,
            original: trimmed.to_string(),
        })
    }

    /// Major component
    pub fn major(&self) -> u64 {
        self.numbers[0]
    }

    /// Minor component (zero when omitted)
    pub fn minor(&self) -> u64 {
        self.numbers[1]
    }

    /// Number of numeric components as written
    pub fn component_count(&self) -> usize {
        self.components
    }

    /// Pre-release label, if any
    pub fn prerelease(&self) -> Option<&str> {
        self.pre.as_ref().map(|p| p.as_str())
    }

    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numbers
            .cmp(&other.numbers)
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl FromStr for PackageVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PackageVersion {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PackageVersion> for String {
    fn from(value: PackageVersion) -> Self {
        value.original
    }
}

/// A version range with optional bounds
///
/// The default value has no bounds and matches every version.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionSpec {
    pub min: Option<PackageVersion>,
    pub min_inclusive: bool,
    pub max: Option<PackageVersion>,
    pub max_inclusive: bool,
}

impl VersionSpec {
    /// `>= version`
    pub fn at_least(version: PackageVersion) -> Self {
        Self {
            min: Some(version),
            min_inclusive: true,
            max: None,
            max_inclusive: false,
        }
    }

    /// `== version`
    pub fn exactly(version: PackageVersion) -> Self {
        Self {
            min: Some(version.clone()),
            min_inclusive: true,
            max: Some(version),
            max_inclusive: true,
        }
    }

    /// `min <= v <= max` with both ends inclusive
    pub fn between(min: PackageVersion, max: PackageVersion) -> Self {
        Self {
            min: Some(min),
            min_inclusive: true,
            max: Some(max),
            max_inclusive: true,
        }
    }

    /// Parse a range in interval notation, or a bare version meaning `>=`
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let value = text.trim();

        if let Ok(version) = PackageVersion::parse(value) {
            return Ok(Self::at_least(version));
        }

        let invalid = || VersionError::InvalidSpec(text.to_string());

        if value.len() < 3 {
            return Err(invalid());
        }

        let min_inclusive = match value.chars().next() {
            Some('[') => true,
            Some('(') => false,
            _ => return Err(invalid()),
        };
        let max_inclusive = match value.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(invalid()),
        };

        let inner = &value[1..value.len() - 1];
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() > 2 || parts.iter().all(|p| p.is_empty()) {
            return Err(invalid());
        }

        let mut spec = Self {
            min: None,
            min_inclusive,
            max: None,
            max_inclusive,
        };

        if parts.len() == 1 {
            // "[1.0]" pins an exact version; "(1.0)" means nothing
            if !(min_inclusive && max_inclusive) {
                return Err(invalid());
            }
            let version = PackageVersion::parse(parts[0])?;
            spec.min = Some(version.clone());
            spec.max = Some(version);
            return Ok(spec);
        }

        if !parts[0].is_empty() {
            spec.min = Some(PackageVersion::parse(parts[0])?);
        }
        if !parts[1].is_empty() {
            spec.max = Some(PackageVersion::parse(parts[1])?);
        }

        if let (Some(min), Some(max)) = (&spec.min, &spec.max) {
            if min > max {
                return Err(invalid());
            }
        }

        Ok(spec)
    }

    /// True when neither bound is set
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// True when the range pins a single version
    pub fn is_exact(&self) -> bool {
        match (&self.min, &self.max) {
            (Some(min), Some(max)) => min == max && self.min_inclusive && self.max_inclusive,
            _ => false,
        }
    }

    /// Check whether a version falls inside the range
    pub fn satisfies(&self, version: &PackageVersion) -> bool {
        let above_min = match &self.min {
            Some(min) if self.min_inclusive => version >= min,
            Some(min) => version > min,
            None => true,
        };
        let below_max = match &self.max {
            Some(max) if self.max_inclusive => version <= max,
            Some(max) => version < max,
            None => true,
        };
        above_min && below_max
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(min), None, true, false) =
            (&self.min, &self.max, self.min_inclusive, self.max_inclusive)
        {
            return write!(f, "{}", min);
        }

        if self.is_exact() {
            if let Some(min) = &self.min {
                return write!(f, "[{}]", min);
            }
        }

        let open = if self.min_inclusive { '[' } else { '(' };
        let close = if self.max_inclusive { ']' } else { ')' };
        let min = self.min.as_ref().map(ToString::to_string).unwrap_or_default();
        let max = self.max.as_ref().map(ToString::to_string).unwrap_or_default();
        write!(f, "{}{}, {}{}", open, min, max, close)
    }
}

impl FromStr for VersionSpec {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionSpec {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VersionSpec> for String {
    fn from(value: VersionSpec) -> Self {
        value.to_string()
    }
}
