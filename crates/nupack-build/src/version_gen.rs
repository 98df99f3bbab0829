//! Package version discovery
//!
//! An explicit version wins. Otherwise the first project with a
//! `Properties/AssemblyInfo.cs` declaring `AssemblyVersion("...")` supplies it.

use crate::error::{BuildError, BuildResult};
use std::path::{Path, PathBuf};

/// Placeholder left in templates when no version was configured
pub const VERSION_PLACEHOLDER: &str = "$version$";

const ATTRIBUTE: &str = "AssemblyVersion(";

/// Discovered version and the names derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVersion {
    pub version: String,
    /// Project the version was read from, `None` when explicit
    pub source_project: Option<String>,
    /// `<assemblyName>.<version>`
    pub target_name: String,
}

pub fn discover_version(
    assembly_name: &str,
    explicit: Option<&str>,
    project_files: &[PathBuf],
) -> BuildResult<GeneratedVersion> {
    if let Some(version) = explicit.map(str::trim).filter(|v| is_explicit(v)) {
        tracing::debug!(version, "Using explicitly provided version");
        return Ok(generated(assembly_name, version, None));
    }

    for project in project_files {
        let Some(version) = read_assembly_version(project)? else {
            continue;
        };
        let project_name = project
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::info!(version = %version, project = %project_name, "Generated version from main project");
        return Ok(generated(assembly_name, &version, Some(project_name)));
    }

    Err(BuildError::NoVersion)
}

fn is_explicit(version: &str) -> bool {
    !version.is_empty() && version != VERSION_PLACEHOLDER
}

fn generated(assembly_name: &str, version: &str, source_project: Option<String>) -> GeneratedVersion {
    GeneratedVersion {
        version: version.to_string(),
        source_project,
        target_name: format!("{}.{}", assembly_name, version),
    }
}

/// Version declared next to `project`, if any
fn read_assembly_version(project: &Path) -> BuildResult<Option<String>> {
    let Some(dir) = project.parent() else {
        return Ok(None);
    };
    let info = dir.join("Properties").join("AssemblyInfo.cs");
    if !info.is_file() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&info).map_err(|e| BuildError::io(&info, e))?;
    Ok(assembly_version(&content))
}

/// Text-scan C# source for `AssemblyVersion("x")`, skipping line comments
pub fn assembly_version(source: &str) -> Option<String> {
    source
        .lines()
        .map(str::trim_start)
        .filter(|line| !line.starts_with("//"))
        .find_map(attribute_value)
}

fn attribute_value(line: &str) -> Option<String> {
    let start = line.find(ATTRIBUTE)? + ATTRIBUTE.len();
    let rest = line[start..].trim_start().strip_prefix('"')?;
    let end = rest.find('"')?;
    let value = rest[..end].trim();

    let closed = rest[end + 1..].trim_start().starts_with(')');
    (closed && !value.is_empty()).then(|| value.to_string())
}
