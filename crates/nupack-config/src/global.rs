//! Global Configuration (~/.nupack/config.toml)
//!
//! User-level defaults applied to every package whose project
//! configuration leaves the field unset.

use crate::{ConfigError, ConfigResult};
use nupack_package::MetadataField;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.nupack/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default manifest values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub owners: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,

    /// Locale of the package content, e.g. "en-US"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })
    }

    /// Get the global config file path (~/.nupack/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".nupack").join("config.toml"))
    }

    /// Defaults that are set, paired with the metadata field they fill
    pub fn default_fields(&self) -> Vec<(MetadataField, &str)> {
        let Some(defaults) = &self.defaults else {
            return Vec::new();
        };
        [
            (MetadataField::Authors, &defaults.authors),
            (MetadataField::Owners, &defaults.owners),
            (MetadataField::Copyright, &defaults.copyright),
            (MetadataField::Language, &defaults.language),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
        .collect()
    }

    /// Merge another global config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &GlobalConfig) {
        let Some(theirs) = &other.defaults else {
            return;
        };
        let ours = self.defaults.get_or_insert_with(DefaultsConfig::default);
        for (slot, value) in [
            (&mut ours.authors, &theirs.authors),
            (&mut ours.owners, &theirs.owners),
            (&mut ours.copyright, &theirs.copyright),
            (&mut ours.language, &theirs.language),
        ] {
            if value.is_some() {
                slot.clone_from(value);
            }
        }
    }
}
