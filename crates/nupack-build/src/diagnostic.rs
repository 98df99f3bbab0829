//! Diagnostics reported by a pack invocation
//!
//! Problems are collected rather than returned on first failure, so a single
//! run reports every missing field, unresolved platform and bad token.
//! Each pushed diagnostic is also emitted as a tracing event.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable diagnostic codes
pub mod codes {
    /// Required manifest field is empty after merging
    pub const MISSING_REQUIRED_FIELD: &str = "NP0001";
    /// No platform could be determined for a platform-partitioned output
    pub const UNRESOLVED_PLATFORM: &str = "NP0002";
    /// Replacement token matches several property bags with different values
    pub const AMBIGUOUS_TOKEN: &str = "NP0003";
    /// Replacement token matches no property
    pub const UNDEFINED_TOKEN: &str = "NP0004";
    /// Dependency version text does not parse
    pub const INVALID_DEPENDENCY_VERSION: &str = "NP0005";
    /// No explicit version and none found in project sources
    pub const NO_VERSION: &str = "NP0006";
    /// Property extraction failed for a library
    pub const PROPERTY_EXTRACTION_FAILED: &str = "NP0007";
    /// Invalid manifest content, template or I/O failure
    pub const MANIFEST_ERROR: &str = "NP0008";
}

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A single reported problem or note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Stable code, e.g. "NP0001"
    pub code: String,
    pub message: String,
}

impl Diagnostic {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    pub fn info(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, message)
    }

    fn new(severity: Severity, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // error[NP0001]: Missing required field: authors
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}

/// Ordered collection of diagnostics for one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and emit it as a tracing event
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => {
                tracing::error!(code = %diagnostic.code, "{}", diagnostic.message)
            }
            Severity::Warning => {
                tracing::warn!(code = %diagnostic.code, "{}", diagnostic.message)
            }
            Severity::Info => {
                tracing::info!(code = %diagnostic.code, "{}", diagnostic.message)
            }
        }
        self.items.push(diagnostic);
    }

    pub fn error(&mut self, code: &str, message: impl Into<String>) {
        self.push(Diagnostic::error(code, message));
    }

    pub fn warning(&mut self, code: &str, message: impl Into<String>) {
        self.push(Diagnostic::warning(code, message));
    }

    pub fn info(&mut self, code: &str, message: impl Into<String>) {
        self.push(Diagnostic::info(code, message));
    }

    /// Whether any error-level diagnostic was recorded
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.with_severity(Severity::Error).count()
    }

    /// Diagnostics of one severity, in report order
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.severity == severity)
    }

    /// Codes of all diagnostics, in report order
    pub fn codes(&self) -> Vec<&str> {
        self.items.iter().map(|d| d.code.as_str()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Move every diagnostic of `other` into `self`, preserving order
    pub fn append(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Format as JSON for hosts that consume structured build logs
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
