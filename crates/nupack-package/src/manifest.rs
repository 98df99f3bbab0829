//! Package manifest model (.nuspec)

use crate::aggregate::{DependencyGroup, FrameworkAssembly, ReferenceGroup};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Complete package descriptor: metadata plus the files to pack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub metadata: ManifestMetadata,
    #[serde(default)]
    pub files: Vec<ManifestFile>,
}

impl PackageManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a manifest from nuspec XML
    pub fn from_xml(content: &str) -> crate::Result<Self> {
        crate::nuspec::read(content)
    }

    /// Load a manifest from a nuspec file
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| crate::PackageError::io(path, e))?;
        Self::from_xml(&content)
    }

    /// Serialize to canonical nuspec XML
    pub fn to_xml(&self) -> String {
        crate::nuspec::write(self)
    }
}

/// Scalar metadata plus dependency, reference and framework assembly sets
///
/// Text fields use the empty string for "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestMetadata {
    pub min_client_version: String,
    pub id: String,
    pub version: String,
    pub title: String,
    pub authors: String,
    pub owners: String,
    pub license_url: String,
    pub project_url: String,
    pub icon_url: String,
    pub require_license_acceptance: bool,
    pub development_dependency: bool,
    pub description: String,
    pub summary: String,
    pub release_notes: String,
    pub copyright: String,
    pub language: String,
    pub tags: String,
    pub dependency_groups: Vec<DependencyGroup>,
    pub framework_assemblies: Vec<FrameworkAssembly>,
    pub reference_groups: Vec<ReferenceGroup>,
}

impl ManifestMetadata {
    pub fn get(&self, field: MetadataField) -> &str {
        match field {
            MetadataField::MinClientVersion => &self.min_client_version,
            MetadataField::Id => &self.id,
            MetadataField::Version => &self.version,
            MetadataField::Title => &self.title,
            MetadataField::Authors => &self.authors,
            MetadataField::Owners => &self.owners,
            MetadataField::LicenseUrl => &self.license_url,
            MetadataField::ProjectUrl => &self.project_url,
            MetadataField::IconUrl => &self.icon_url,
            MetadataField::Description => &self.description,
            MetadataField::Summary => &self.summary,
            MetadataField::ReleaseNotes => &self.release_notes,
            MetadataField::Copyright => &self.copyright,
            MetadataField::Language => &self.language,
            MetadataField::Tags => &self.tags,
        }
    }

    pub fn get_mut(&mut self, field: MetadataField) -> &mut String {
        match field {
            MetadataField::MinClientVersion => &mut self.min_client_version,
            MetadataField::Id => &mut self.id,
            MetadataField::Version => &mut self.version,
            MetadataField::Title => &mut self.title,
            MetadataField::Authors => &mut self.authors,
            MetadataField::Owners => &mut self.owners,
            MetadataField::LicenseUrl => &mut self.license_url,
            MetadataField::ProjectUrl => &mut self.project_url,
            MetadataField::IconUrl => &mut self.icon_url,
            MetadataField::Description => &mut self.description,
            MetadataField::Summary => &mut self.summary,
            MetadataField::ReleaseNotes => &mut self.release_notes,
            MetadataField::Copyright => &mut self.copyright,
            MetadataField::Language => &mut self.language,
            MetadataField::Tags => &mut self.tags,
        }
    }
}

/// Identifies a scalar text field of [`ManifestMetadata`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetadataField {
    MinClientVersion,
    Id,
    Version,
    Title,
    Authors,
    Owners,
    LicenseUrl,
    ProjectUrl,
    IconUrl,
    Description,
    Summary,
    ReleaseNotes,
    Copyright,
    Language,
    Tags,
}

impl MetadataField {
    /// Every text field, in nuspec element order
    pub const ALL: [MetadataField; 15] = [
        MetadataField::MinClientVersion,
        MetadataField::Id,
        MetadataField::Version,
        MetadataField::Title,
        MetadataField::Authors,
        MetadataField::Owners,
        MetadataField::LicenseUrl,
        MetadataField::ProjectUrl,
        MetadataField::IconUrl,
        MetadataField::Description,
        MetadataField::Summary,
        MetadataField::ReleaseNotes,
        MetadataField::Copyright,
        MetadataField::Language,
        MetadataField::Tags,
    ];

    /// Fields that must be non-empty in a finished manifest
    pub const REQUIRED: [MetadataField; 4] = [
        MetadataField::Id,
        MetadataField::Version,
        MetadataField::Authors,
        MetadataField::Description,
    ];

    /// Element (or attribute) name in nuspec XML
    pub fn xml_name(self) -> &'static str {
        match self {
            MetadataField::MinClientVersion => "minClientVersion",
            MetadataField::Id => "id",
            MetadataField::Version => "version",
            MetadataField::Title => "title",
            MetadataField::Authors => "authors",
            MetadataField::Owners => "owners",
            MetadataField::LicenseUrl => "licenseUrl",
            MetadataField::ProjectUrl => "projectUrl",
            MetadataField::IconUrl => "iconUrl",
            MetadataField::Description => "description",
            MetadataField::Summary => "summary",
            MetadataField::ReleaseNotes => "releaseNotes",
            MetadataField::Copyright => "copyright",
            MetadataField::Language => "language",
            MetadataField::Tags => "tags",
        }
    }

    pub fn from_xml_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.xml_name() == name)
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }

    /// Prose fields whose whitespace and line breaks are part of the value
    pub fn is_free_text(self) -> bool {
        matches!(
            self,
            MetadataField::Title
                | MetadataField::Description
                | MetadataField::Summary
                | MetadataField::ReleaseNotes
                | MetadataField::Copyright
        )
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.xml_name())
    }
}

/// A file entry: source on disk, target path inside the package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
    pub source: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub exclude: String,
}

impl ManifestFile {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            exclude: String::new(),
        }
    }

    pub fn with_exclude(mut self, exclude: impl Into<String>) -> Self {
        self.exclude = exclude.into();
        self
    }
}
