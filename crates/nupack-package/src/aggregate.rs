//! Dependency aggregation
//!
//! Dependency declarations arrive as a flat list of (id, range, platform)
//! triples, usually one per referencing project. They are grouped by
//! platform, then by package id, and repeated pairs collapse into a single
//! range whose bounds are the envelope of every contributing range.
//! Group order and the order of ids within a group follow first appearance.

use crate::framework::PlatformMoniker;
use crate::version::{PackageVersion, VersionSpec};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// A single dependency declared by one build input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDeclaration {
    pub id: String,
    pub version: Option<VersionSpec>,
    #[serde(default)]
    pub platform: PlatformMoniker,
}

impl DependencyDeclaration {
    pub fn new(id: impl Into<String>, version: Option<VersionSpec>, platform: PlatformMoniker) -> Self {
        Self {
            id: id.into(),
            version,
            platform,
        }
    }
}

/// One package id with its combined range. `None` means any version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedDependency {
    pub id: String,
    pub version: Option<VersionSpec>,
}

/// Dependencies scoped to one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGroup {
    #[serde(default)]
    pub platform: PlatformMoniker,
    pub dependencies: Vec<AggregatedDependency>,
}

/// An assembly reference exposed to consumers for one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDeclaration {
    pub file: String,
    #[serde(default)]
    pub platform: PlatformMoniker,
}

/// References scoped to one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceGroup {
    #[serde(default)]
    pub platform: PlatformMoniker,
    pub files: Vec<String>,
}

/// A framework-provided assembly required on one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkAssembly {
    pub assembly_name: String,
    #[serde(default)]
    pub platform: PlatformMoniker,
}

/// Group dependency declarations and combine repeated ranges
pub fn aggregate(declarations: &[DependencyDeclaration]) -> Vec<DependencyGroup> {
    let by_platform = group_ordered(declarations.iter().map(|d| (d.platform.clone(), d)));

    by_platform
        .into_iter()
        .map(|(platform, decls)| {
            let by_id = group_ordered(decls.into_iter().map(|d| (d.id.clone(), d)));
            let dependencies = by_id
                .into_iter()
                .map(|(id, decls)| AggregatedDependency {
                    version: combine_all(decls.iter().map(|d| d.version.as_ref())),
                    id,
                })
                .collect();

            DependencyGroup {
                platform,
                dependencies,
            }
        })
        .collect()
}

/// Group references by platform, dropping repeated files within a group
pub fn group_references(references: &[ReferenceDeclaration]) -> Vec<ReferenceGroup> {
    group_ordered(references.iter().map(|r| (r.platform.clone(), r.file.clone())))
        .into_iter()
        .map(|(platform, files)| ReferenceGroup {
            platform,
            files: dedup_preserving_order(files),
        })
        .collect()
}

/// Order framework assemblies by platform group, dropping repeats
pub fn group_framework_assemblies(references: &[FrameworkAssembly]) -> Vec<FrameworkAssembly> {
    group_ordered(
        references
            .iter()
            .map(|r| (r.platform.clone(), r.assembly_name.clone())),
    )
    .into_iter()
    .flat_map(|(platform, names)| {
        dedup_preserving_order(names)
            .into_iter()
            .map(move |assembly_name| FrameworkAssembly {
                assembly_name,
                platform: platform.clone(),
            })
    })
    .collect()
}

/// Left-fold ranges into their envelope; absent ranges are ignored
pub fn combine_all<'a>(specs: impl IntoIterator<Item = Option<&'a VersionSpec>>) -> Option<VersionSpec> {
    let mut combined = VersionSpec::default();
    for spec in specs.into_iter().flatten() {
        widen_min(&mut combined, spec);
        widen_max(&mut combined, spec);
    }

    if combined.is_unbounded() {
        None
    } else {
        Some(combined)
    }
}

/// Combine two optional ranges
pub fn combine(a: Option<&VersionSpec>, b: Option<&VersionSpec>) -> Option<VersionSpec> {
    combine_all([a, b])
}

fn widen_min(target: &mut VersionSpec, source: &VersionSpec) {
    let Some(source_min) = &source.min else {
        return;
    };

    match &target.min {
        None => {
            target.min = Some(source_min.clone());
            target.min_inclusive = source.min_inclusive;
        }
        Some(current) if source_min < current => {
            target.min = Some(source_min.clone());
            target.min_inclusive = source.min_inclusive;
        }
        Some(current) if source_min == current => {
            if is_preferred_spelling(source_min, current) {
                target.min = Some(source_min.clone());
            }
            target.min_inclusive = target.min_inclusive && source.min_inclusive;
        }
        Some(_) => {}
    }
}

fn widen_max(target: &mut VersionSpec, source: &VersionSpec) {
    let Some(source_max) = &source.max else {
        return;
    };

    match &target.max {
        None => {
            target.max = Some(source_max.clone());
            target.max_inclusive = source.max_inclusive;
        }
        Some(current) if source_max > current => {
            target.max = Some(source_max.clone());
            target.max_inclusive = source.max_inclusive;
        }
        Some(current) if source_max == current => {
            if is_preferred_spelling(source_max, current) {
                target.max = Some(source_max.clone());
            }
            target.max_inclusive = target.max_inclusive && source.max_inclusive;
        }
        Some(_) => {}
    }
}

/// Among equal versions spelled differently (`1.0` and `1.0.0`), the shortest
/// text wins, then the lexically smallest
fn is_preferred_spelling(candidate: &PackageVersion, current: &PackageVersion) -> bool {
    let (candidate, current) = (candidate.to_string(), current.to_string());
    (candidate.len(), &candidate) < (current.len(), &current)
}

fn group_ordered<K, V>(items: impl IntoIterator<Item = (K, V)>) -> Vec<(K, Vec<V>)>
where
    K: Eq + Hash + Clone,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<V>)> = Vec::new();

    for (key, value) in items {
        match index.get(&key) {
            Some(&i) => groups[i].1.push(value),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![value]));
            }
        }
    }

    groups
}

fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::PackageVersion;

    fn spec(text: &str) -> VersionSpec {
        VersionSpec::parse(text).unwrap()
    }

    fn net(short: &str) -> PlatformMoniker {
        PlatformMoniker::parse_short(short).unwrap()
    }

    fn decl(id: &str, version: Option<&str>, platform: &str) -> DependencyDeclaration {
        DependencyDeclaration::new(id, version.map(spec), net(platform))
    }

    #[test]
    fn test_overlapping_ranges_widen() {
        let combined = combine(Some(&spec("[1,2]")), Some(&spec("[1.5,3]"))).unwrap();
        assert_eq!(combined.min, Some(PackageVersion::parse("1").unwrap()));
        assert!(combined.min_inclusive);
        assert_eq!(combined.max, Some(PackageVersion::parse("3").unwrap()));
        assert!(combined.max_inclusive);
    }

    #[test]
    fn test_disjoint_ranges_still_widen() {
        let combined = combine(Some(&spec("[1.0,2.0]")), Some(&spec("[3.0,4.0)"))).unwrap();
        assert_eq!(combined.to_string(), "[1.0, 4.0)");
    }

    #[test]
    fn test_equal_bounds_and_inclusivity() {
        let combined = combine(Some(&spec("[1.0,2.0]")), Some(&spec("(1.0,2.0)"))).unwrap();
        assert!(!combined.min_inclusive);
        assert!(!combined.max_inclusive);

        let reversed = combine(Some(&spec("(1.0,2.0)")), Some(&spec("[1.0,2.0]"))).unwrap();
        assert_eq!(combined, reversed);
    }

    #[test]
    fn test_equal_bounds_keep_one_spelling() {
        let forward = combine(Some(&spec("[1.0,2.0]")), Some(&spec("[1.0.0,2.0]"))).unwrap();
        let backward = combine(Some(&spec("[1.0.0,2.0]")), Some(&spec("[1.0,2.0]"))).unwrap();
        assert_eq!(forward.to_string(), "[1.0, 2.0]");
        assert_eq!(backward.to_string(), "[1.0, 2.0]");

        let forward = combine(Some(&spec("[1.0,2.0.0]")), Some(&spec("[1.0,2.0]"))).unwrap();
        assert_eq!(forward.to_string(), "[1.0, 2.0]");
    }

    #[test]
    fn test_absent_range_is_unit() {
        let only = spec("[1.0,2.0)");
        assert_eq!(combine(None, Some(&only)), Some(only.clone()));
        assert_eq!(combine(Some(&only), None), Some(only));
        assert_eq!(combine(None, None), None);
    }

    #[test]
    fn test_min_only_and_max_only_combine() {
        let combined = combine(Some(&spec("1.0")), Some(&spec("(,2.0]"))).unwrap();
        assert_eq!(combined.to_string(), "[1.0, 2.0]");
    }

    #[test]
    fn test_aggregate_groups_by_platform_then_id() {
        let groups = aggregate(&[
            decl("B", Some("1.0"), "net45"),
            decl("A", Some("[0.2,1.0]"), "net40"),
            decl("A", Some("[0.5,0.9]"), "net40"),
            decl("B", None, "net45"),
            decl("C", None, "net40"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].platform, net("net45"));
        assert_eq!(groups[0].dependencies.len(), 1);
        assert_eq!(groups[0].dependencies[0].version, Some(spec("1.0")));

        assert_eq!(groups[1].platform, net("net40"));
        let ids: Vec<_> = groups[1].dependencies.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
        assert_eq!(groups[1].dependencies[0].version, Some(spec("[0.2,1.0]")));
        assert_eq!(groups[1].dependencies[1].version, None);
    }

    #[test]
    fn test_ids_group_case_sensitively() {
        let groups = aggregate(&[decl("Foo", None, "net45"), decl("foo", None, "net45")]);
        assert_eq!(groups[0].dependencies.len(), 2);
    }

    #[test]
    fn test_unspecified_platform_is_its_own_group() {
        let groups = aggregate(&[
            DependencyDeclaration::new("A", None, PlatformMoniker::Unspecified),
            decl("A", None, "net45"),
        ]);
        assert_eq!(groups.len(), 2);
        assert!(groups[0].platform.is_unspecified());
    }

    #[test]
    fn test_group_references() {
        let refs = [
            ReferenceDeclaration { file: "A.dll".into(), platform: net("net45") },
            ReferenceDeclaration { file: "B.dll".into(), platform: net("net40") },
            ReferenceDeclaration { file: "A.dll".into(), platform: net("net45") },
        ];
        let groups = group_references(&refs);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].files, vec!["A.dll".to_string()]);
    }

    #[test]
    fn test_group_framework_assemblies() {
        let refs = [
            FrameworkAssembly { assembly_name: "System.Xml".into(), platform: net("net45") },
            FrameworkAssembly { assembly_name: "System.Net".into(), platform: net("net40") },
            FrameworkAssembly { assembly_name: "System.Web".into(), platform: net("net45") },
        ];
        let names: Vec<_> = group_framework_assemblies(&refs)
            .into_iter()
            .map(|f| f.assembly_name)
            .collect();
        assert_eq!(names, vec!["System.Xml", "System.Web", "System.Net"]);
    }
}
