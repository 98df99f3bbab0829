//! Manifest assembly: template + overrides + generated sets
//!
//! Each scalar field is merged by an entry of [`TEXT_MERGE_RULES`]; an
//! override only replaces a field when it is non-empty, so a template value
//! is never erased. Flags are OR-ed. Files are appended to the template's
//! file list and dependency, reference and framework assembly sets are
//! appended to the template's group for the same platform.

use crate::aggregate::{DependencyGroup, FrameworkAssembly, ReferenceGroup};
use crate::framework::PlatformMoniker;
use crate::manifest::{ManifestFile, ManifestMetadata, MetadataField, PackageManifest};
use crate::validator::{ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Merge function for one text field: `(existing, override) -> merged`
pub type TextMerge = fn(&str, Option<&str>) -> String;

/// One merge rule per text field
pub const TEXT_MERGE_RULES: [(MetadataField, TextMerge); 15] = [
    (MetadataField::MinClientVersion, replace_unless_empty),
    (MetadataField::Id, replace_unless_empty),
    (MetadataField::Version, replace_unless_empty),
    (MetadataField::Title, replace_unless_empty),
    (MetadataField::Authors, replace_unless_empty),
    (MetadataField::Owners, replace_unless_empty),
    (MetadataField::LicenseUrl, replace_unless_empty),
    (MetadataField::ProjectUrl, replace_unless_empty),
    (MetadataField::IconUrl, replace_unless_empty),
    (MetadataField::Description, replace_unless_empty),
    (MetadataField::Summary, replace_unless_empty),
    (MetadataField::ReleaseNotes, replace_unless_empty),
    (MetadataField::Copyright, replace_unless_empty),
    (MetadataField::Language, replace_unless_empty),
    (MetadataField::Tags, replace_unless_empty),
];

/// Keep the existing value unless the override carries text
pub fn replace_unless_empty(existing: &str, replacement: Option<&str>) -> String {
    match replacement {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => existing.to_string(),
    }
}

/// Values layered on top of the starting manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestOverrides {
    text: BTreeMap<MetadataField, String>,
    pub require_license_acceptance: bool,
    pub development_dependency: bool,
    pub files: Vec<ManifestFile>,
    pub dependency_groups: Vec<DependencyGroup>,
    pub reference_groups: Vec<ReferenceGroup>,
    pub framework_assemblies: Vec<FrameworkAssembly>,
}

impl ManifestOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a text field override
    pub fn with(mut self, field: MetadataField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: MetadataField, value: impl Into<String>) {
        self.text.insert(field, value.into());
    }

    pub fn get(&self, field: MetadataField) -> Option<&str> {
        self.text.get(&field).map(String::as_str)
    }

    /// Fill a field only if nothing has set it yet
    pub fn set_default(&mut self, field: MetadataField, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            return;
        }
        let slot = self.text.entry(field).or_default();
        if slot.is_empty() {
            *slot = value;
        }
    }
}

/// Builds the final manifest from an optional template
#[derive(Debug, Clone, Default)]
pub struct ManifestBuilder {
    template: PackageManifest,
}

impl ManifestBuilder {
    /// Start from an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already loaded manifest
    pub fn with_template(template: PackageManifest) -> Self {
        Self { template }
    }

    /// Start from a nuspec file, or from nothing when no path is given
    pub fn from_template_file(path: Option<&Path>) -> crate::Result<Self> {
        match path {
            Some(path) => Ok(Self::with_template(PackageManifest::from_file(path)?)),
            None => Ok(Self::new()),
        }
    }

    /// Merge the overrides into the template
    pub fn merge(self, overrides: &ManifestOverrides) -> PackageManifest {
        let mut manifest = self.template;
        merge_metadata(&mut manifest.metadata, overrides);
        manifest.files.extend(overrides.files.iter().cloned());
        manifest
    }

    /// Merge, then check that required fields ended up non-empty
    pub fn build(self, overrides: &ManifestOverrides) -> Result<PackageManifest, Vec<ValidationError>> {
        let manifest = self.merge(overrides);
        Validator::validate(&manifest.metadata)?;
        Ok(manifest)
    }
}

fn merge_metadata(metadata: &mut ManifestMetadata, overrides: &ManifestOverrides) {
    for (field, rule) in TEXT_MERGE_RULES {
        let merged = rule(metadata.get(field), overrides.get(field));
        *metadata.get_mut(field) = merged;
    }

    metadata.require_license_acceptance |= overrides.require_license_acceptance;
    metadata.development_dependency |= overrides.development_dependency;

    for group in &overrides.dependency_groups {
        match find_group(&mut metadata.dependency_groups, &group.platform, |g| &g.platform) {
            Some(existing) => existing.dependencies.extend(group.dependencies.iter().cloned()),
            None => metadata.dependency_groups.push(group.clone()),
        }
    }

    for group in &overrides.reference_groups {
        match find_group(&mut metadata.reference_groups, &group.platform, |g| &g.platform) {
            Some(existing) => existing.files.extend(group.files.iter().cloned()),
            None => metadata.reference_groups.push(group.clone()),
        }
    }

    metadata
        .framework_assemblies
        .extend(overrides.framework_assemblies.iter().cloned());
}

fn find_group<'a, G>(
    groups: &'a mut [G],
    platform: &PlatformMoniker,
    key: impl Fn(&G) -> &PlatformMoniker,
) -> Option<&'a mut G> {
    groups.iter_mut().find(|g| key(g) == platform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AggregatedDependency;

    fn template() -> PackageManifest {
        let mut manifest = PackageManifest::new();
        manifest.metadata.id = "Template".to_string();
        manifest.metadata.authors = "Immo".to_string();
        manifest.metadata.description = "From template".to_string();
        manifest.metadata.development_dependency = true;
        manifest.files.push(ManifestFile::new("Readme.txt", ""));
        manifest
    }

    #[test]
    fn test_empty_override_keeps_template_value() {
        let overrides = ManifestOverrides::new()
            .with(MetadataField::Id, "")
            .with(MetadataField::Version, "2.0.0");
        let manifest = ManifestBuilder::with_template(template()).merge(&overrides);

        assert_eq!(manifest.metadata.id, "Template");
        assert_eq!(manifest.metadata.version, "2.0.0");
    }

    #[test]
    fn test_non_empty_override_replaces() {
        let overrides = ManifestOverrides::new().with(MetadataField::Authors, "Pavol");
        let manifest = ManifestBuilder::with_template(template()).merge(&overrides);
        assert_eq!(manifest.metadata.authors, "Pavol");
    }

    #[test]
    fn test_flags_are_never_downgraded() {
        let overrides = ManifestOverrides {
            development_dependency: false,
            require_license_acceptance: true,
            ..Default::default()
        };
        let manifest = ManifestBuilder::with_template(template()).merge(&overrides);
        assert!(manifest.metadata.development_dependency);
        assert!(manifest.metadata.require_license_acceptance);
    }

    #[test]
    fn test_files_are_appended() {
        let overrides = ManifestOverrides {
            files: vec![ManifestFile::new("/out/A.dll", "lib/net45/A.dll")],
            ..Default::default()
        };
        let manifest = ManifestBuilder::with_template(template()).merge(&overrides);
        let sources: Vec<_> = manifest.files.iter().map(|f| f.source.as_str()).collect();
        assert_eq!(sources, vec!["Readme.txt", "/out/A.dll"]);
    }

    #[test]
    fn test_groups_append_to_matching_platform() {
        let net45 = PlatformMoniker::parse_short("net45").unwrap();
        let mut base = template();
        base.metadata.dependency_groups.push(DependencyGroup {
            platform: net45.clone(),
            dependencies: vec![AggregatedDependency { id: "A".into(), version: None }],
        });

        let overrides = ManifestOverrides {
            dependency_groups: vec![
                DependencyGroup {
                    platform: net45,
                    dependencies: vec![AggregatedDependency { id: "B".into(), version: None }],
                },
                DependencyGroup {
                    platform: PlatformMoniker::Unspecified,
                    dependencies: vec![AggregatedDependency { id: "C".into(), version: None }],
                },
            ],
            ..Default::default()
        };

        let manifest = ManifestBuilder::with_template(base).merge(&overrides);
        let groups = &manifest.metadata.dependency_groups;
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].dependencies.len(), 2);
        assert!(groups[1].platform.is_unspecified());
    }

    #[test]
    fn test_build_reports_missing_fields() {
        let overrides = ManifestOverrides::new()
            .with(MetadataField::Id, "NoRequiredParameters")
            .with(MetadataField::Version, "1.0.0");
        let errors = ManifestBuilder::new().build(&overrides).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field().to_string()).collect();
        assert_eq!(fields, vec!["authors", "description"]);
    }

    #[test]
    fn test_template_satisfies_required_fields() {
        let overrides = ManifestOverrides::new().with(MetadataField::Version, "1.0.0");
        assert!(ManifestBuilder::with_template(template()).build(&overrides).is_ok());
    }

    #[test]
    fn test_set_default_does_not_override() {
        let mut overrides = ManifestOverrides::new().with(MetadataField::Authors, "Project");
        overrides.set_default(MetadataField::Authors, "Global");
        overrides.set_default(MetadataField::Owners, "Global");
        assert_eq!(overrides.get(MetadataField::Authors), Some("Project"));
        assert_eq!(overrides.get(MetadataField::Owners), Some("Global"));
    }

    #[test]
    fn test_every_field_has_a_rule() {
        let fields: Vec<_> = TEXT_MERGE_RULES.iter().map(|(f, _)| *f).collect();
        assert_eq!(fields, MetadataField::ALL.to_vec());
    }
}
