//! One pack invocation, end to end
//!
//! Property templates are expanded, build outputs classified and
//! deduplicated, dependencies aggregated, and the result merged into the
//! template manifest. The manifest is written only when no error was
//! reported and its content changed.

use crate::diagnostic::{codes, Diagnostics};
use crate::error::{BuildError, BuildResult};
use crate::expand::{expand_properties, Library, PropertyBagTable, PropertyExtractor, PropertyTemplate};
use crate::registry::register;
use crate::targets::{classify_all, BuildOutput, ClassifiedFile, DeclaredPlatform};
use crate::version_gen::discover_version;
use nupack_package::{
    aggregate, group_framework_assemblies, group_references, write_if_changed, DependencyDeclaration,
    FrameworkAssembly, ManifestBuilder, ManifestOverrides, MetadataField, PackageManifest,
    PlatformMoniker, ReferenceDeclaration, ValidationError, Validator, VersionSpec, WriteOutcome,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A dependency as declared by a referenced project, version still as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyInput {
    pub id: String,
    /// Version range text; empty means any version
    pub version: String,
    pub platform: DeclaredPlatform,
}

impl DependencyInput {
    pub fn new(id: impl Into<String>, version: impl Into<String>, platform: DeclaredPlatform) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            platform,
        }
    }
}

/// An assembly reference or framework assembly with its declared platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceInput {
    pub name: String,
    pub platform: DeclaredPlatform,
}

impl ReferenceInput {
    pub fn new(name: impl Into<String>, platform: DeclaredPlatform) -> Self {
        Self {
            name: name.into(),
            platform,
        }
    }
}

/// Where to look for a version when none is configured
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDiscovery {
    pub assembly_name: String,
    pub project_files: Vec<PathBuf>,
}

/// Inputs of one pack invocation
#[derive(Debug, Clone, Default)]
pub struct PackTask {
    /// Starting manifest; `None` starts from an empty one
    pub template: Option<PathBuf>,
    pub output: PathBuf,
    pub overrides: ManifestOverrides,
    pub build_outputs: Vec<BuildOutput>,
    pub dependencies: Vec<DependencyInput>,
    pub references: Vec<ReferenceInput>,
    pub framework_references: Vec<ReferenceInput>,
    pub libraries: Vec<Library>,
    /// Templates whose expanded values override metadata fields of the same name
    pub property_templates: Vec<PropertyTemplate>,
    pub version_discovery: Option<VersionDiscovery>,
}

/// Everything a pack invocation produced
#[derive(Debug, Clone, Default)]
pub struct PackOutcome {
    pub diagnostics: Diagnostics,
    /// `None` when nothing was attempted because of errors
    pub write: Option<WriteOutcome>,
    pub files: Vec<ClassifiedFile>,
    pub manifest: Option<PackageManifest>,
}

impl PackOutcome {
    pub fn is_success(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    /// The generated manifest, or `BuildFailed` when any error was reported
    pub fn into_result(self) -> BuildResult<PackageManifest> {
        match self.manifest {
            Some(manifest) if !self.diagnostics.has_errors() => Ok(manifest),
            _ => Err(BuildError::BuildFailed(self.diagnostics.error_count())),
        }
    }
}

impl PackTask {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            ..Default::default()
        }
    }

    /// Run the task; `extractor` supplies the properties of `libraries`
    pub fn run(&self, extractor: &dyn PropertyExtractor) -> PackOutcome {
        let mut outcome = PackOutcome::default();
        let diagnostics = &mut outcome.diagnostics;
        let mut overrides = self.overrides.clone();

        // Property templates
        if !self.property_templates.is_empty() {
            let table = PropertyBagTable::from_libraries(&self.libraries, extractor, diagnostics);
            for property in expand_properties(&self.property_templates, &table, diagnostics) {
                match metadata_field(&property.name) {
                    Some(field) if !property.value.is_empty() => overrides.set(field, property.value),
                    Some(_) => {}
                    None => tracing::debug!(name = %property.name, "Expanded property is not a metadata field"),
                }
            }
        }

        // Version
        if let Some(discovery) = &self.version_discovery {
            let explicit = overrides.get(MetadataField::Version);
            match discover_version(&discovery.assembly_name, explicit, &discovery.project_files) {
                Ok(generated) => overrides.set(MetadataField::Version, generated.version),
                Err(error) => diagnostics.error(codes::NO_VERSION, error.to_string()),
            }
        }

        // Files
        let files = register(classify_all(&self.build_outputs, diagnostics));
        overrides.files.extend(files.iter().map(ClassifiedFile::to_manifest_file));
        outcome.files = files;

        // Dependencies and references
        let declarations = self.dependency_declarations(diagnostics);
        overrides.dependency_groups.extend(aggregate(&declarations));

        let references: Vec<ReferenceDeclaration> = resolve_references(&self.references, diagnostics)
            .map(|(file, platform)| ReferenceDeclaration { file, platform })
            .collect();
        overrides.reference_groups.extend(group_references(&references));

        let framework: Vec<FrameworkAssembly> = resolve_references(&self.framework_references, diagnostics)
            .map(|(assembly_name, platform)| FrameworkAssembly { assembly_name, platform })
            .collect();
        overrides
            .framework_assemblies
            .extend(group_framework_assemblies(&framework));

        // Merge and validate
        let builder = match ManifestBuilder::from_template_file(self.template.as_deref()) {
            Ok(builder) => builder,
            Err(error) => {
                diagnostics.error(codes::MANIFEST_ERROR, BuildError::from(error).to_string());
                return outcome;
            }
        };
        let manifest = builder.merge(&overrides);

        if let Err(errors) = Validator::validate(&manifest.metadata) {
            for error in errors {
                let code = match error {
                    ValidationError::MissingField(_) => codes::MISSING_REQUIRED_FIELD,
                    _ => codes::MANIFEST_ERROR,
                };
                diagnostics.error(code, error.to_string());
            }
        }

        // Persist
        if !diagnostics.has_errors() {
            match write_if_changed(&manifest, &self.output) {
                Ok(write) => outcome.write = Some(write),
                Err(error) => diagnostics.error(codes::MANIFEST_ERROR, BuildError::from(error).to_string()),
            }
        }

        outcome.manifest = Some(manifest);
        outcome
    }

    fn dependency_declarations(&self, diagnostics: &mut Diagnostics) -> Vec<DependencyDeclaration> {
        let mut declarations = Vec::with_capacity(self.dependencies.len());

        for input in &self.dependencies {
            let platform = match input.platform.resolve() {
                Ok(platform) => platform,
                Err(error) => {
                    diagnostics.error(
                        codes::UNRESOLVED_PLATFORM,
                        format!("Cannot determine the target platform of dependency '{}': {}", input.id, error),
                    );
                    continue;
                }
            };

            let version = match input.version.trim() {
                "" => None,
                text => match VersionSpec::parse(text) {
                    Ok(spec) => Some(spec),
                    Err(error) => {
                        diagnostics.warning(
                            codes::INVALID_DEPENDENCY_VERSION,
                            format!("Ignoring version of dependency '{}': {}", input.id, error),
                        );
                        None
                    }
                },
            };

            declarations.push(DependencyDeclaration::new(input.id.clone(), version, platform));
        }

        declarations
    }
}

/// Resolve reference platforms, reporting the ones that cannot be resolved
fn resolve_references<'a>(
    inputs: &'a [ReferenceInput],
    diagnostics: &'a mut Diagnostics,
) -> impl Iterator<Item = (String, PlatformMoniker)> + 'a {
    inputs.iter().filter_map(move |input| match input.platform.resolve() {
        Ok(platform) => Some((input.name.clone(), platform)),
        Err(error) => {
            diagnostics.error(
                codes::UNRESOLVED_PLATFORM,
                format!("Cannot determine the target platform of reference '{}': {}", input.name, error),
            );
            None
        }
    })
}

/// Metadata field named by an expanded property, ignoring case
fn metadata_field(name: &str) -> Option<MetadataField> {
    MetadataField::ALL
        .into_iter()
        .find(|field| field.xml_name().eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_field_lookup() {
        assert_eq!(metadata_field("Title"), Some(MetadataField::Title));
        assert_eq!(metadata_field("releasenotes"), Some(MetadataField::ReleaseNotes));
        assert_eq!(metadata_field("NuSpecFile"), None);
    }
}
