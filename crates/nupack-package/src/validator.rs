//! Package manifest validation
//!
//! Every check runs and every problem is reported; nothing short-circuits
//! on the first failure.

use crate::manifest::{ManifestMetadata, MetadataField};
use crate::version::PackageVersion;

/// Maximum length of a package id
const MAX_ID_LENGTH: usize = 100;

/// Validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required metadata field is empty
    MissingField(MetadataField),
    /// Package id has invalid characters or length
    InvalidId { id: String, reason: String },
    /// Package version does not parse
    InvalidVersion { version: String, reason: String },
}

impl ValidationError {
    /// The metadata field the error is about
    pub fn field(&self) -> MetadataField {
        match self {
            ValidationError::MissingField(field) => *field,
            ValidationError::InvalidId { .. } => MetadataField::Id,
            ValidationError::InvalidVersion { .. } => MetadataField::Version,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingField(field) => {
                write!(f, "Missing required field: {}", field)
            }
            ValidationError::InvalidId { id, reason } => {
                write!(f, "Invalid package id '{}': {}", id, reason)
            }
            ValidationError::InvalidVersion { version, reason } => {
                write!(f, "Invalid package version '{}': {}", version, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Package manifest validator
pub struct Validator;

impl Validator {
    /// Run every metadata check
    pub fn validate(metadata: &ManifestMetadata) -> Result<(), Vec<ValidationError>> {
        let mut errors = Self::missing_fields(metadata);

        if !metadata.id.is_empty() {
            if let Err(e) = Self::validate_id(&metadata.id) {
                errors.push(e);
            }
        }

        if !metadata.version.is_empty() {
            if let Err(e) = PackageVersion::parse(&metadata.version) {
                errors.push(ValidationError::InvalidVersion {
                    version: metadata.version.clone(),
                    reason: e.to_string(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Check only that required fields are present
    pub fn validate_required(metadata: &ManifestMetadata) -> Result<(), Vec<ValidationError>> {
        let errors = Self::missing_fields(metadata);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn missing_fields(metadata: &ManifestMetadata) -> Vec<ValidationError> {
        MetadataField::REQUIRED
            .into_iter()
            .filter(|field| metadata.get(*field).trim().is_empty())
            .map(ValidationError::MissingField)
            .collect()
    }

    /// Validate package id format
    pub fn validate_id(id: &str) -> Result<(), ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidId {
            id: id.to_string(),
            reason: reason.to_string(),
        };

        if id.len() > MAX_ID_LENGTH {
            return Err(invalid("exceeds maximum length of 100 characters"));
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
        {
            return Err(invalid("only letters, digits, '.', '-' and '_' are allowed"));
        }

        if id.starts_with('.') || id.ends_with('.') || id.contains("..") {
            return Err(invalid("dots must separate non-empty segments"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(id: &str, version: &str, authors: &str, description: &str) -> ManifestMetadata {
        ManifestMetadata {
            id: id.to_string(),
            version: version.to_string(),
            authors: authors.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_complete_metadata_is_valid() {
        assert!(Validator::validate(&metadata("Contoso.Lib", "1.0.0", "me", "lib")).is_ok());
    }

    #[test]
    fn test_reports_every_missing_field() {
        let errors = Validator::validate_required(&metadata("", "", "", "")).unwrap_err();
        let fields: Vec<_> = errors.iter().map(ValidationError::field).collect();
        assert_eq!(fields, MetadataField::REQUIRED.to_vec());
    }

    #[test]
    fn test_id_and_version_only_reports_two() {
        let errors = Validator::validate(&metadata("Pkg", "1.0.0", "", "")).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::MissingField(MetadataField::Authors),
                ValidationError::MissingField(MetadataField::Description),
            ]
        );
        assert_eq!(errors[0].to_string(), "Missing required field: authors");
    }

    #[test]
    fn test_whitespace_counts_as_missing() {
        let errors = Validator::validate_required(&metadata("Pkg", "1.0", "  ", "d")).unwrap_err();
        assert_eq!(errors, vec![ValidationError::MissingField(MetadataField::Authors)]);
    }

    #[test]
    fn test_invalid_id_and_version() {
        let errors = Validator::validate(&metadata("bad id", "one", "me", "d")).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field(), MetadataField::Id);
        assert_eq!(errors[1].field(), MetadataField::Version);
    }

    #[test]
    fn test_id_rules() {
        assert!(Validator::validate_id("Microsoft.Bcl.Immutable").is_ok());
        assert!(Validator::validate_id("a_b-c").is_ok());
        assert!(Validator::validate_id(".leading").is_err());
        assert!(Validator::validate_id("double..dot").is_err());
        assert!(Validator::validate_id(&"x".repeat(101)).is_err());
    }
}
