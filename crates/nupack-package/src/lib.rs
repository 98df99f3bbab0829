//! Nupack package manifests
//!
//! The data side of turning build outputs into a distributable package:
//! platform monikers, version ranges, dependency aggregation, the nuspec
//! manifest model and its XML form, validation, and assembly of the final
//! manifest from a template plus generated values.

pub mod aggregate;
pub mod builder;
pub mod framework;
pub mod manifest;
pub mod nuspec;
pub mod persist;
pub mod validator;
pub mod version;

pub use aggregate::{
    aggregate, combine, group_framework_assemblies, group_references, AggregatedDependency,
    DependencyDeclaration, DependencyGroup, FrameworkAssembly, ReferenceDeclaration,
    ReferenceGroup,
};
pub use builder::{ManifestBuilder, ManifestOverrides};
pub use framework::{FrameworkError, FrameworkName, PlatformMoniker};
pub use manifest::{ManifestFile, ManifestMetadata, MetadataField, PackageManifest};
pub use persist::{write_if_changed, WriteOutcome};
pub use validator::{ValidationError, Validator};
pub use version::{PackageVersion, VersionError, VersionSpec};

use std::path::{Path, PathBuf};

/// Package management errors
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("Failed to parse manifest XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Version error: {0}")]
    Version(#[from] VersionError),

    #[error("Platform error: {0}")]
    Framework(#[from] FrameworkError),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl PackageError {
    /// Create an I/O error with path context
    pub fn io(path: impl AsRef<Path>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.as_ref().to_path_buf(),
            error,
        }
    }
}

impl From<Vec<ValidationError>> for PackageError {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Validation(errors)
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, PackageError>;
