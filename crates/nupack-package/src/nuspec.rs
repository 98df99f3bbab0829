//! Nuspec XML reading and canonical writing
//!
//! Reading accepts any nuspec schema namespace and both the flat and the
//! grouped layouts for dependencies and references. Writing always produces
//! the same bytes for the same manifest, which is what lets the persistence
//! step skip unchanged files.

use crate::aggregate::{AggregatedDependency, DependencyGroup, FrameworkAssembly, ReferenceGroup};
use crate::framework::PlatformMoniker;
use crate::manifest::{ManifestFile, ManifestMetadata, MetadataField, PackageManifest};
use crate::version::{PackageVersion, VersionSpec};
use crate::{PackageError, Result};
use roxmltree::{Document, Node};

/// Schema namespaces by version; each adds features to the previous one
const NAMESPACES: [&str; 5] = [
    "http://schemas.microsoft.com/packaging/2010/07/nuspec.xsd",
    "http://schemas.microsoft.com/packaging/2011/08/nuspec.xsd",
    "http://schemas.microsoft.com/packaging/2011/10/nuspec.xsd",
    "http://schemas.microsoft.com/packaging/2012/06/nuspec.xsd",
    "http://schemas.microsoft.com/packaging/2013/01/nuspec.xsd",
];

const INDENT: &str = "  ";

/// Parse nuspec XML into a manifest
pub fn read(content: &str) -> Result<PackageManifest> {
    let doc = Document::parse(content)?;
    let root = doc.root_element();
    if root.tag_name().name() != "package" {
        return Err(PackageError::InvalidManifest(format!(
            "expected <package> root element, found <{}>",
            root.tag_name().name()
        )));
    }

    let mut manifest = PackageManifest::new();

    for child in elements(root) {
        match child.tag_name().name() {
            "metadata" => manifest.metadata = read_metadata(child)?,
            "files" => {
                manifest.files = elements(child)
                    .filter(|n| n.has_tag_name("file"))
                    .map(|n| ManifestFile {
                        source: attr(n, "src"),
                        target: attr(n, "target"),
                        exclude: attr(n, "exclude"),
                    })
                    .collect();
            }
            _ => {}
        }
    }

    Ok(manifest)
}

fn read_metadata(node: Node<'_, '_>) -> Result<ManifestMetadata> {
    let mut metadata = ManifestMetadata {
        min_client_version: attr(node, "minClientVersion"),
        ..Default::default()
    };

    for child in elements(node) {
        let name = child.tag_name().name();
        if let Some(field) = MetadataField::from_xml_name(name) {
            let text = child.text().unwrap_or_default();
            *metadata.get_mut(field) = if field.is_free_text() {
                text.to_string()
            } else {
                text.trim().to_string()
            };
            continue;
        }

        match name {
            "requireLicenseAcceptance" => {
                metadata.require_license_acceptance = parse_bool(child)?;
            }
            "developmentDependency" => {
                metadata.development_dependency = parse_bool(child)?;
            }
            "dependencies" => metadata.dependency_groups = read_dependency_groups(child)?,
            "references" => metadata.reference_groups = read_reference_groups(child)?,
            "frameworkAssemblies" => {
                metadata.framework_assemblies = read_framework_assemblies(child)?;
            }
            _ => {}
        }
    }

    Ok(metadata)
}

fn read_dependency_groups(node: Node<'_, '_>) -> Result<Vec<DependencyGroup>> {
    let mut groups = Vec::new();
    let mut flat = Vec::new();

    for child in elements(node) {
        match child.tag_name().name() {
            "group" => groups.push(DependencyGroup {
                platform: read_platform(child)?,
                dependencies: elements(child)
                    .filter(|n| n.has_tag_name("dependency"))
                    .map(read_dependency)
                    .collect::<Result<_>>()?,
            }),
            "dependency" => flat.push(read_dependency(child)?),
            _ => {}
        }
    }

    if !flat.is_empty() {
        groups.insert(
            0,
            DependencyGroup {
                platform: PlatformMoniker::Unspecified,
                dependencies: flat,
            },
        );
    }

    Ok(groups)
}

fn read_dependency(node: Node<'_, '_>) -> Result<AggregatedDependency> {
    let id = attr(node, "id");
    if id.is_empty() {
        return Err(PackageError::InvalidManifest(
            "<dependency> is missing the 'id' attribute".to_string(),
        ));
    }

    let version = match node.attribute("version").map(str::trim) {
        Some(text) if !text.is_empty() => Some(VersionSpec::parse(text)?),
        _ => None,
    };

    Ok(AggregatedDependency { id, version })
}

fn read_reference_groups(node: Node<'_, '_>) -> Result<Vec<ReferenceGroup>> {
    let mut groups = Vec::new();
    let mut flat = Vec::new();

    for child in elements(node) {
        match child.tag_name().name() {
            "group" => groups.push(ReferenceGroup {
                platform: read_platform(child)?,
                files: elements(child)
                    .filter(|n| n.has_tag_name("reference"))
                    .map(|n| attr(n, "file"))
                    .collect(),
            }),
            "reference" => flat.push(attr(child, "file")),
            _ => {}
        }
    }

    if !flat.is_empty() {
        groups.insert(
            0,
            ReferenceGroup {
                platform: PlatformMoniker::Unspecified,
                files: flat,
            },
        );
    }

    Ok(groups)
}

fn read_framework_assemblies(node: Node<'_, '_>) -> Result<Vec<FrameworkAssembly>> {
    let mut assemblies = Vec::new();

    for child in elements(node).filter(|n| n.has_tag_name("frameworkAssembly")) {
        let assembly_name = attr(child, "assemblyName");
        let frameworks = attr(child, "targetFramework");

        // One entry may list several frameworks separated by commas
        let platforms: Vec<PlatformMoniker> = frameworks
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PlatformMoniker::parse_short)
            .collect::<std::result::Result<_, _>>()?;

        if platforms.is_empty() {
            assemblies.push(FrameworkAssembly {
                assembly_name,
                platform: PlatformMoniker::Unspecified,
            });
        } else {
            for platform in platforms {
                assemblies.push(FrameworkAssembly {
                    assembly_name: assembly_name.clone(),
                    platform,
                });
            }
        }
    }

    Ok(assemblies)
}

fn read_platform(node: Node<'_, '_>) -> Result<PlatformMoniker> {
    Ok(PlatformMoniker::parse(&attr(node, "targetFramework"))?)
}

fn parse_bool(node: Node<'_, '_>) -> Result<bool> {
    match node.text().unwrap_or_default().trim() {
        "" => Ok(false),
        text if text.eq_ignore_ascii_case("true") => Ok(true),
        text if text.eq_ignore_ascii_case("false") => Ok(false),
        text => Err(PackageError::InvalidManifest(format!(
            "<{}> must be true or false, found '{}'",
            node.tag_name().name(),
            text
        ))),
    }
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

fn attr(node: Node<'_, '_>, name: &str) -> String {
    node.attribute(name).unwrap_or_default().to_string()
}

/// Lowest schema version able to express everything in the manifest
pub fn schema_version(manifest: &PackageManifest) -> usize {
    let metadata = &manifest.metadata;

    if metadata.development_dependency
        || !metadata.min_client_version.is_empty()
        || metadata.reference_groups.iter().any(|g| !g.platform.is_unspecified())
    {
        return 5;
    }
    if metadata.dependency_groups.iter().any(|g| !g.platform.is_unspecified()) {
        return 4;
    }
    if PackageVersion::parse(&metadata.version).is_ok_and(|v| v.is_prerelease()) {
        return 3;
    }
    if !metadata.copyright.is_empty()
        || !metadata.release_notes.is_empty()
        || !metadata.reference_groups.is_empty()
    {
        return 2;
    }
    1
}

/// Serialize a manifest to canonical nuspec XML
pub fn write(manifest: &PackageManifest) -> String {
    let metadata = &manifest.metadata;
    let mut out = XmlWriter::default();

    out.line(0, r#"<?xml version="1.0" encoding="utf-8"?>"#);
    out.open(
        0,
        "package",
        &[("xmlns", NAMESPACES[schema_version(manifest) - 1])],
    );

    out.open(
        1,
        "metadata",
        &[("minClientVersion", metadata.min_client_version.as_str())],
    );

    for field in MetadataField::ALL {
        if field == MetadataField::MinClientVersion {
            continue;
        }
        out.text_element(2, field.xml_name(), metadata.get(field));

        // Flags sit between iconUrl and description in the schema
        if field == MetadataField::IconUrl {
            out.text_element(
                2,
                "requireLicenseAcceptance",
                bool_text(metadata.require_license_acceptance),
            );
            if metadata.development_dependency {
                out.text_element(2, "developmentDependency", "true");
            }
        }
    }

    write_dependencies(&mut out, &metadata.dependency_groups);
    write_framework_assemblies(&mut out, &metadata.framework_assemblies);
    write_references(&mut out, &metadata.reference_groups);

    out.close(1, "metadata");

    if !manifest.files.is_empty() {
        out.open(1, "files", &[]);
        for file in &manifest.files {
            out.empty(
                2,
                "file",
                &[
                    ("src", file.source.as_str()),
                    ("target", file.target.as_str()),
                    ("exclude", file.exclude.as_str()),
                ],
            );
        }
        out.close(1, "files");
    }

    out.close(0, "package");
    out.finish()
}

fn write_dependencies(out: &mut XmlWriter, groups: &[DependencyGroup]) {
    if groups.is_empty() {
        return;
    }

    let dependency = |out: &mut XmlWriter, depth: usize, dep: &AggregatedDependency| {
        let version = dep.version.as_ref().map(ToString::to_string).unwrap_or_default();
        out.empty(
            depth,
            "dependency",
            &[("id", dep.id.as_str()), ("version", version.as_str())],
        );
    };

    out.open(2, "dependencies", &[]);
    if let [only] = groups {
        if only.platform.is_unspecified() {
            for dep in &only.dependencies {
                dependency(out, 3, dep);
            }
            out.close(2, "dependencies");
            return;
        }
    }

    for group in groups {
        let framework = group.platform.to_string();
        let attrs = [("targetFramework", framework.as_str())];
        if group.dependencies.is_empty() {
            out.empty(3, "group", &attrs);
            continue;
        }
        out.open(3, "group", &attrs);
        for dep in &group.dependencies {
            dependency(out, 4, dep);
        }
        out.close(3, "group");
    }
    out.close(2, "dependencies");
}

fn write_references(out: &mut XmlWriter, groups: &[ReferenceGroup]) {
    if groups.is_empty() {
        return;
    }

    out.open(2, "references", &[]);
    if let [only] = groups {
        if only.platform.is_unspecified() {
            for file in &only.files {
                out.empty(3, "reference", &[("file", file.as_str())]);
            }
            out.close(2, "references");
            return;
        }
    }

    for group in groups {
        let framework = group.platform.to_string();
        let attrs = [("targetFramework", framework.as_str())];
        if group.files.is_empty() {
            out.empty(3, "group", &attrs);
            continue;
        }
        out.open(3, "group", &attrs);
        for file in &group.files {
            out.empty(4, "reference", &[("file", file.as_str())]);
        }
        out.close(3, "group");
    }
    out.close(2, "references");
}

fn write_framework_assemblies(out: &mut XmlWriter, assemblies: &[FrameworkAssembly]) {
    if assemblies.is_empty() {
        return;
    }

    out.open(2, "frameworkAssemblies", &[]);
    for assembly in assemblies {
        let framework = assembly.platform.to_string();
        out.empty(
            3,
            "frameworkAssembly",
            &[
                ("assemblyName", assembly.assembly_name.as_str()),
                ("targetFramework", framework.as_str()),
            ],
        );
    }
    out.close(2, "frameworkAssemblies");
}

fn bool_text(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Minimal indenting writer; attributes with empty values are omitted
#[derive(Default)]
struct XmlWriter {
    buf: String,
}

impl XmlWriter {
    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.buf.push_str(INDENT);
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    fn start_tag(name: &str, attrs: &[(&str, &str)]) -> String {
        let mut tag = format!("<{}", name);
        for (key, value) in attrs.iter().filter(|(_, v)| !v.is_empty()) {
            tag.push_str(&format!(" {}=\"{}\"", key, escape(value, true)));
        }
        tag
    }

    fn open(&mut self, depth: usize, name: &str, attrs: &[(&str, &str)]) {
        let tag = Self::start_tag(name, attrs) + ">";
        self.line(depth, &tag);
    }

    fn empty(&mut self, depth: usize, name: &str, attrs: &[(&str, &str)]) {
        let tag = Self::start_tag(name, attrs) + " />";
        self.line(depth, &tag);
    }

    fn close(&mut self, depth: usize, name: &str) {
        self.line(depth, &format!("</{}>", name));
    }

    fn text_element(&mut self, depth: usize, name: &str, text: &str) {
        if text.is_empty() {
            return;
        }
        self.line(depth, &format!("<{0}>{1}</{0}>", name, escape(text, false)));
    }

    fn finish(self) -> String {
        self.buf
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if attribute => escaped.push_str("&quot;"),
            // Parsers normalize these away unless written as references
            '\r' => escaped.push_str("&#xD;"),
            '\n' if attribute => escaped.push_str("&#xA;"),
            '\t' if attribute => escaped.push_str("&#x9;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
