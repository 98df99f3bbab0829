/// Build outputs and their placement inside the package
use crate::diagnostic::{codes, Diagnostics};
use crate::error::{BuildError, BuildResult};
use nupack_package::{FrameworkError, ManifestFile, PlatformMoniker};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Destination root inside the package
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageArea {
    /// Package root, no subfolder
    Root,
    /// `content/`, never platform-partitioned
    Content,
    /// `build/<platform>/`
    Build,
    /// `lib/<platform>/`
    #[default]
    Lib,
    /// `tools/<platform>/`
    Tools,
}

impl PackageArea {
    /// Folder name of the area, `None` for the root
    pub fn dir_name(&self) -> Option<&'static str> {
        match self {
            Self::Root => None,
            Self::Content => Some("content"),
            Self::Build => Some("build"),
            Self::Lib => Some("lib"),
            Self::Tools => Some("tools"),
        }
    }

    /// Whether files in this area are placed under a platform folder
    pub fn is_platform_partitioned(&self) -> bool {
        matches!(self, Self::Build | Self::Lib | Self::Tools)
    }
}

impl std::fmt::Display for PackageArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name().unwrap_or("root"))
    }
}

impl FromStr for PackageArea {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "lib" => Ok(Self::Lib),
            "root" => Ok(Self::Root),
            "content" => Ok(Self::Content),
            "build" => Ok(Self::Build),
            "tools" => Ok(Self::Tools),
            _ => Err(BuildError::UnknownArea(s.to_string())),
        }
    }
}

/// Platform information as the host supplied it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclaredPlatform {
    /// No platform at all
    #[default]
    Unspecified,
    /// Short identifier such as `net45`
    ShortName(String),
    /// Long moniker such as `.NETFramework,Version=v4.5`
    Moniker(String),
}

impl DeclaredPlatform {
    pub fn short(text: impl Into<String>) -> Self {
        Self::ShortName(text.into())
    }

    pub fn moniker(text: impl Into<String>) -> Self {
        Self::Moniker(text.into())
    }

    /// Resolve to a structured moniker
    ///
    /// An empty short name is the unspecified sentinel; an empty long
    /// moniker is malformed.
    pub fn resolve(&self) -> Result<PlatformMoniker, FrameworkError> {
        match self {
            Self::Unspecified => Ok(PlatformMoniker::Unspecified),
            Self::ShortName(text) => PlatformMoniker::parse_short(text),
            Self::Moniker(text) => PlatformMoniker::parse_long(text),
        }
    }
}

/// A file produced by the build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOutput {
    pub source_path: PathBuf,
    pub platform: DeclaredPlatform,
    /// Replaces the file name inside the package
    pub target_path: Option<String>,
    pub area: PackageArea,
    pub exclude: Option<String>,
    /// Host metadata carried through classification untouched
    pub metadata: BTreeMap<String, String>,
}

impl BuildOutput {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            ..Default::default()
        }
    }

    pub fn with_platform(mut self, platform: DeclaredPlatform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_area(mut self, area: PackageArea) -> Self {
        self.area = area;
        self
    }

    pub fn with_target_path(mut self, target_path: impl Into<String>) -> Self {
        self.target_path = Some(target_path.into());
        self
    }

    pub fn with_exclude(mut self, exclude: impl Into<String>) -> Self {
        self.exclude = Some(exclude.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Name of the file inside the package
    fn package_file_name(&self) -> String {
        match self.target_path.as_deref().map(normalize_relative) {
            Some(name) if !name.is_empty() => name,
            _ => file_name(&self.source_path),
        }
    }
}

/// A build output with its package destination computed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedFile {
    /// Package-relative path, `/`-separated
    pub destination: String,
    pub source: PathBuf,
    pub exclude: Option<String>,
    pub platform: PlatformMoniker,
    pub area: PackageArea,
    pub metadata: BTreeMap<String, String>,
}

impl ClassifiedFile {
    /// Short platform name, empty for the unspecified sentinel
    pub fn platform_short_name(&self) -> String {
        self.platform.short_name().unwrap_or_default()
    }

    /// The `<file>` entry written to the manifest
    pub fn to_manifest_file(&self) -> ManifestFile {
        let file = ManifestFile::new(self.source.to_string_lossy(), self.destination.clone());
        match &self.exclude {
            Some(exclude) => file.with_exclude(exclude.clone()),
            None => file,
        }
    }
}

/// Assign a build output its destination inside the package
pub fn classify(output: &BuildOutput) -> BuildResult<ClassifiedFile> {
    let platform = match output.platform.resolve() {
        Ok(platform) => platform,
        Err(error) if output.area.is_platform_partitioned() => {
            tracing::debug!(file = %output.source_path.display(), %error, "Platform resolution failed");
            return Err(BuildError::unresolved_platform(
                output.source_path.display().to_string(),
                output.area,
            ));
        }
        // Root and content files ignore the platform
        Err(_) => PlatformMoniker::Unspecified,
    };

    let file_name = output.package_file_name();
    let destination = destination_path(output.area, &platform, &file_name);

    tracing::debug!(source = %output.source_path.display(), %destination, "Classified build output");

    Ok(ClassifiedFile {
        destination,
        source: output.source_path.clone(),
        exclude: output.exclude.clone(),
        platform,
        area: output.area,
        metadata: output.metadata.clone(),
    })
}

/// Classify every output, reporting each failure instead of stopping at the first
pub fn classify_all(outputs: &[BuildOutput], diagnostics: &mut Diagnostics) -> Vec<ClassifiedFile> {
    outputs
        .iter()
        .filter_map(|output| match classify(output) {
            Ok(file) => Some(file),
            Err(error) => {
                diagnostics.error(codes::UNRESOLVED_PLATFORM, error.to_string());
                None
            }
        })
        .collect()
}

/// `root`: name only; `content`: `content/name`; others: `area/platform/name`
pub fn destination_path(area: PackageArea, platform: &PlatformMoniker, file_name: &str) -> String {
    let mut segments = Vec::with_capacity(3);
    if let Some(dir) = area.dir_name() {
        segments.push(dir.to_string());
    }
    if area.is_platform_partitioned() {
        if let Some(short) = platform.short_name() {
            segments.push(short);
        }
    }
    segments.push(file_name.to_string());
    segments.join("/")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| normalize_relative(&path.to_string_lossy()))
}

fn normalize_relative(path: &str) -> String {
    path.replace('\\', "/").trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PackageArea::Lib, "net45", "lib/net45/X.dll")]
    #[case(PackageArea::Build, "net40-client", "build/net40-client/X.dll")]
    #[case(PackageArea::Tools, "", "tools/X.dll")]
    #[case(PackageArea::Root, "net45", "X.dll")]
    #[case(PackageArea::Content, "net45", "content/X.dll")]
    fn test_destination_by_area(#[case] area: PackageArea, #[case] platform: &str, #[case] expected: &str) {
        let output = BuildOutput::new("/src/bin/X.dll")
            .with_area(area)
            .with_platform(DeclaredPlatform::short(platform));
        assert_eq!(classify(&output).unwrap().destination, expected);
    }

    #[test]
    fn test_long_moniker() {
        let output = BuildOutput::new("/src/bin/X.dll")
            .with_platform(DeclaredPlatform::moniker(".NETFramework,Version=v4.0,Profile=Client"));
        let file = classify(&output).unwrap();
        assert_eq!(file.destination, "lib/net40-client/X.dll");
        assert_eq!(file.platform_short_name(), "net40-client");
    }

    #[test]
    fn test_target_path_override_renames() {
        let output = BuildOutput::new("/src/bin/X.dll")
            .with_platform(DeclaredPlatform::short("net45"))
            .with_target_path("Renamed.dll");
        assert_eq!(classify(&output).unwrap().destination, "lib/net45/Renamed.dll");
    }

    #[test]
    fn test_unresolvable_platform_fails_for_lib() {
        let output = BuildOutput::new("/src/bin/X.dll").with_platform(DeclaredPlatform::moniker(""));
        let err = classify(&output).unwrap_err();
        assert!(matches!(err, BuildError::UnresolvedPlatform { .. }));
        assert!(err.to_string().contains("X.dll"));
    }

    #[test]
    fn test_unresolvable_platform_ignored_for_root() {
        let output = BuildOutput::new("/src/readme.txt")
            .with_area(PackageArea::Root)
            .with_platform(DeclaredPlatform::short("bogus42"));
        let file = classify(&output).unwrap();
        assert_eq!(file.destination, "readme.txt");
        assert!(file.platform.is_unspecified());
    }

    #[test]
    fn test_metadata_passes_through() {
        let output = BuildOutput::new("/src/bin/X.dll")
            .with_exclude("**/*.pdb")
            .with_metadata("SourceProjectFile", "X.csproj");
        let file = classify(&output).unwrap();
        assert_eq!(file.metadata.get("SourceProjectFile").map(String::as_str), Some("X.csproj"));
        assert_eq!(file.to_manifest_file().exclude, "**/*.pdb");
    }

    #[test]
    fn test_classify_all_collects_every_failure() {
        let outputs = vec![
            BuildOutput::new("/a.dll").with_platform(DeclaredPlatform::short("zz1")),
            BuildOutput::new("/b.dll").with_platform(DeclaredPlatform::short("net45")),
            BuildOutput::new("/c.dll").with_platform(DeclaredPlatform::moniker("")),
        ];
        let mut diagnostics = Diagnostics::new();
        let files = classify_all(&outputs, &mut diagnostics);

        assert_eq!(files.len(), 1);
        assert_eq!(diagnostics.codes(), vec!["NP0002", "NP0002"]);
    }

    #[rstest]
    #[case("LIB", PackageArea::Lib)]
    #[case("", PackageArea::Lib)]
    #[case("Content", PackageArea::Content)]
    #[case("tools", PackageArea::Tools)]
    fn test_area_parse(#[case] text: &str, #[case] expected: PackageArea) {
        assert_eq!(text.parse::<PackageArea>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_area() {
        assert!("bin".parse::<PackageArea>().is_err());
    }
}
