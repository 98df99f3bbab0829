//! Per-library property bags, addressable by several aliases
use super::{Resolution, VariableResolver};
use crate::diagnostic::{codes, Diagnostics};
use crate::error::BuildResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Property name to value, as extracted from one compiled library
pub type PropertyBag = BTreeMap<String, String>;

/// Source of library properties
///
/// How the properties are obtained (reading assembly attributes, a
/// sidecar file, a host callback) is up to the implementor.
pub trait PropertyExtractor {
    fn extract(&self, library: &Path) -> BuildResult<PropertyBag>;
}

impl<F> PropertyExtractor for F
where
    F: Fn(&Path) -> BuildResult<PropertyBag>,
{
    fn extract(&self, library: &Path) -> BuildResult<PropertyBag> {
        self(library)
    }
}

/// A compiled library whose properties feed template expansion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub path: PathBuf,
    /// Project file the library was built from, e.g. `src/Widgets/Widgets.csproj`
    pub source_project_file: PathBuf,
    /// Short platform name, e.g. `net45`
    pub target_framework: String,
}

impl Library {
    pub fn new(
        path: impl Into<PathBuf>,
        source_project_file: impl Into<PathBuf>,
        target_framework: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            source_project_file: source_project_file.into(),
            target_framework: target_framework.into(),
        }
    }

    /// Keys the library is registered under: stem, file name, and both with `.<framework>`
    pub fn aliases(&self) -> [String; 4] {
        let name = self
            .source_project_file
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = self
            .source_project_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tfm = &self.target_framework;
        [
            stem.clone(),
            name.clone(),
            format!("{}.{}", stem, tfm),
            format!("{}.{}", name, tfm),
        ]
    }
}

/// Case-insensitive table of property bags
///
/// Several bags may share a key; a lookup through that key is only
/// ambiguous when the bags disagree on the requested property.
#[derive(Debug, Clone, Default)]
pub struct PropertyBagTable {
    bags: HashMap<String, Vec<PropertyBag>>,
}

impl PropertyBagTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bag under one key
    pub fn insert(&mut self, key: &str, bag: PropertyBag) {
        self.bags.entry(key.to_lowercase()).or_default().push(bag);
    }

    /// Register a library's bag under all of its aliases
    pub fn insert_library(&mut self, library: &Library, bag: PropertyBag) {
        for alias in library.aliases() {
            tracing::debug!(%alias, library = %library.path.display(), "Registered property bag");
            self.insert(&alias, bag.clone());
        }
    }

    /// Extract and register every library
    ///
    /// A library whose properties cannot be extracted is reported as a
    /// warning and left out.
    pub fn from_libraries(
        libraries: &[Library],
        extractor: &dyn PropertyExtractor,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut table = Self::new();
        for library in libraries {
            match extractor.extract(&library.path) {
                Ok(bag) => table.insert_library(library, bag),
                Err(error) => diagnostics.warning(codes::PROPERTY_EXTRACTION_FAILED, error.to_string()),
            }
        }
        table
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.bags.contains_key(&key.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.bags.is_empty()
    }

    /// Look up `property` in every bag registered under `key`
    fn lookup(&self, key: &str, property: &str) -> Option<Resolution> {
        let bags = self.bags.get(&key.to_lowercase())?;
        let mut values = bags.iter().map(|bag| bag.get(property));
        let first = values.next()?;

        if values.any(|value| value != first) {
            return Some(Resolution::Ambiguous);
        }
        Some(match first {
            Some(value) => Resolution::Value(value.clone()),
            None => Resolution::Undefined,
        })
    }
}

impl VariableResolver for PropertyBagTable {
    /// Split `name` at each `_` in turn and use the first split whose key is known
    fn resolve(&self, name: &str) -> Resolution {
        for (index, _) in name.match_indices('_') {
            let (key, property) = (&name[..index], &name[index + 1..]);
            if key.is_empty() || property.is_empty() {
                continue;
            }
            if let Some(resolution) = self.lookup(key, property) {
                return resolution;
            }
        }
        Resolution::Undefined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildError;

    fn bag(pairs: &[(&str, &str)]) -> PropertyBag {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_aliases() {
        let library = Library::new("bin/Widgets.dll", "src/Widgets/Widgets.csproj", "net45");
        assert_eq!(
            library.aliases(),
            [
                "Widgets".to_string(),
                "Widgets.csproj".to_string(),
                "Widgets.net45".to_string(),
                "Widgets.csproj.net45".to_string(),
            ]
        );
    }

    #[test]
    fn test_key_is_case_insensitive() {
        let mut table = PropertyBagTable::new();
        table.insert("ClassLibrary", bag(&[("AssemblyTitle", "Title")]));
        assert_eq!(
            table.resolve("classlibrary_AssemblyTitle"),
            Resolution::Value("Title".to_string())
        );
    }

    #[test]
    fn test_underscore_in_key_and_property() {
        let mut table = PropertyBagTable::new();
        table.insert("My_Lib", bag(&[("Some_Prop", "v")]));
        assert_eq!(table.resolve("My_Lib_Some_Prop"), Resolution::Value("v".to_string()));
    }

    #[test]
    fn test_first_matching_key_wins() {
        let mut table = PropertyBagTable::new();
        table.insert("A", bag(&[("B_C", "short key")]));
        table.insert("A_B", bag(&[("C", "long key")]));
        assert_eq!(table.resolve("A_B_C"), Resolution::Value("short key".to_string()));
    }

    #[test]
    fn test_identical_bags_are_not_ambiguous() {
        let mut table = PropertyBagTable::new();
        table.insert("Lib", bag(&[("Version", "1.0"), ("Title", "a")]));
        table.insert("Lib", bag(&[("Version", "1.0"), ("Title", "b")]));
        assert_eq!(table.resolve("Lib_Version"), Resolution::Value("1.0".to_string()));
        assert_eq!(table.resolve("Lib_Title"), Resolution::Ambiguous);
        assert_eq!(table.resolve("Lib_Missing"), Resolution::Undefined);
    }

    #[test]
    fn test_unknown_key_is_undefined() {
        let table = PropertyBagTable::new();
        assert_eq!(table.resolve("Nope_Version"), Resolution::Undefined);
        assert_eq!(table.resolve("NoSeparator"), Resolution::Undefined);
    }

    #[test]
    fn test_extraction_failure_is_a_warning() {
        let extractor = |path: &Path| -> BuildResult<PropertyBag> {
            if path.ends_with("Broken.dll") {
                Err(BuildError::property_extraction(path, "bad image"))
            } else {
                Ok(bag(&[("AssemblyName", "Good")]))
            }
        };
        let libraries = vec![
            Library::new("bin/Broken.dll", "Broken.csproj", "net45"),
            Library::new("bin/Good.dll", "Good.csproj", "net45"),
        ];

        let mut diagnostics = Diagnostics::new();
        let table = PropertyBagTable::from_libraries(&libraries, &extractor, &mut diagnostics);

        assert!(!diagnostics.has_errors());
        assert_eq!(diagnostics.codes(), vec!["NP0007"]);
        assert!(table.contains_key("good.csproj.NET45"));
        assert!(!table.contains_key("Broken"));
    }
}
