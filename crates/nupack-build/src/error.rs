/// Pack task error types
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Cannot determine the target platform of '{file}' for the '{area}' area")]
    UnresolvedPlatform { file: String, area: String },

    #[error("The replacement token '{token}' is ambiguous")]
    AmbiguousToken { token: String },

    #[error("Unknown package area '{0}': expected root, content, build, lib or tools")]
    UnknownArea(String),

    #[error("Unable to determine a package version: no project has a Properties/AssemblyInfo.cs with an AssemblyVersion")]
    NoVersion,

    #[error("Failed to extract properties from '{path}': {reason}")]
    PropertyExtraction { path: PathBuf, reason: String },

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Package error: {0}")]
    Package(#[from] nupack_package::PackageError),

    #[error("Build failed with {0} error(s)")]
    BuildFailed(usize),
}

impl BuildError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create an unresolved platform error
    pub fn unresolved_platform(file: impl Into<String>, area: impl ToString) -> Self {
        Self::UnresolvedPlatform {
            file: file.into(),
            area: area.to_string(),
        }
    }

    /// Create a property extraction error
    pub fn property_extraction(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::PropertyExtraction {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
