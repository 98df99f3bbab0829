//! Project Configuration (nupack.toml)
//!
//! Scalar manifest overrides and the template/output paths of a pack
//! invocation, stored in `nupack.toml` next to the package project.

use crate::{ConfigError, ConfigResult};
use nupack_package::{MetadataField, PackageVersion, Validator};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration from nupack.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Manifest metadata overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageSection>,

    /// Template and output locations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<PathsConfig>,
}

/// `[package]`: every field is optional and only overrides when set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PackageSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owners: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_client_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_license_acceptance: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub development_dependency: Option<bool>,
}

impl PackageSection {
    /// Text fields that are set, paired with the metadata field they override
    pub fn text_fields(&self) -> Vec<(MetadataField, &str)> {
        [
            (MetadataField::Id, &self.id),
            (MetadataField::Version, &self.version),
            (MetadataField::Title, &self.title),
            (MetadataField::Authors, &self.authors),
            (MetadataField::Owners, &self.owners),
            (MetadataField::Description, &self.description),
            (MetadataField::Summary, &self.summary),
            (MetadataField::Tags, &self.tags),
            (MetadataField::ProjectUrl, &self.project_url),
            (MetadataField::IconUrl, &self.icon_url),
            (MetadataField::LicenseUrl, &self.license_url),
            (MetadataField::Copyright, &self.copyright),
            (MetadataField::Language, &self.language),
            (MetadataField::ReleaseNotes, &self.release_notes),
            (MetadataField::MinClientVersion, &self.min_client_version),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
        .collect()
    }
}

/// `[paths]`, relative to the directory holding nupack.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Starting manifest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,

    /// Where the generated manifest is written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let Some(package) = &self.package else {
            return Ok(());
        };

        if let Some(version) = package.version.as_deref().filter(|v| is_concrete(v)) {
            PackageVersion::parse(version)
                .map_err(|e| ConfigError::InvalidVersion(e.to_string()))?;
        }

        if let Some(id) = package.id.as_deref().filter(|id| !id.is_empty()) {
            Validator::validate_id(id).map_err(|e| ConfigError::InvalidValue {
                field: "package.id".to_string(),
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }

    pub fn package_id(&self) -> Option<&str> {
        self.package.as_ref().and_then(|p| p.id.as_deref())
    }

    pub fn package_version(&self) -> Option<&str> {
        self.package.as_ref().and_then(|p| p.version.as_deref())
    }

    pub fn package_mut(&mut self) -> &mut PackageSection {
        self.package.get_or_insert_with(PackageSection::default)
    }

    pub fn template_path(&self) -> Option<&Path> {
        self.paths.as_ref().and_then(|p| p.template.as_deref())
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.paths.as_ref().and_then(|p| p.output.as_deref())
    }
}

/// Whether a version is a real value rather than empty or the `$version$` placeholder
fn is_concrete(version: &str) -> bool {
    !version.trim().is_empty() && version.trim() != "$version$"
}
