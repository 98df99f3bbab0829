//! Nupack Configuration System
//!
//! Configuration for a pack invocation comes from three places:
//! - Project configuration (nupack.toml)
//! - Global user configuration (~/.nupack/config.toml)
//! - Environment variables (NUPACK_*)
//!
//! # Configuration Hierarchy
//!
//! Later sources override earlier ones:
//! 1. Global defaults (~/.nupack/config.toml), only for fields the project leaves unset
//! 2. Project config (./nupack.toml)
//! 3. Environment variables (NUPACK_VERSION, NUPACK_ID, NUPACK_RELEASE_NOTES)
//!
//! # Example
//!
//! ```no_run
//! use nupack_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! let overrides = config.overrides();
//! ```

pub mod global;
pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Missing required field '{field}' in {file}")]
    MissingField { field: String, file: PathBuf },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid package version: {0}")]
    InvalidVersion(String),

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Name of the project configuration file
pub const PROJECT_CONFIG_FILE: &str = "nupack.toml";

// Re-export main types
pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader};
pub use project::{PackageSection, PathsConfig, ProjectConfig};
