//! Destination-path deduplication
//!
//! Paths compare case-insensitively; the first file registered for a path
//! wins and later ones are dropped.

use crate::targets::ClassifiedFile;
use std::collections::HashSet;

/// Accumulates classified files, keeping the first per destination
#[derive(Debug, Default)]
pub struct FileRegistry {
    seen: HashSet<String>,
    files: Vec<ClassifiedFile>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file; returns `false` when its destination is already taken
    pub fn insert(&mut self, file: ClassifiedFile) -> bool {
        if !self.seen.insert(destination_key(&file.destination)) {
            tracing::debug!(
                destination = %file.destination,
                source = %file.source.display(),
                "Skipping duplicate package path"
            );
            return false;
        }
        self.files.push(file);
        true
    }

    pub fn contains(&self, destination: &str) -> bool {
        self.seen.contains(&destination_key(destination))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[ClassifiedFile] {
        &self.files
    }

    pub fn into_files(self) -> Vec<ClassifiedFile> {
        self.files
    }
}

impl Extend<ClassifiedFile> for FileRegistry {
    fn extend<I: IntoIterator<Item = ClassifiedFile>>(&mut self, iter: I) {
        for file in iter {
            self.insert(file);
        }
    }
}

/// Deduplicate by destination, preserving first-occurrence order
pub fn register(files: impl IntoIterator<Item = ClassifiedFile>) -> Vec<ClassifiedFile> {
    let mut registry = FileRegistry::new();
    registry.extend(files);
    registry.into_files()
}

fn destination_key(destination: &str) -> String {
    destination.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::PackageArea;
    use nupack_package::PlatformMoniker;
    use std::collections::BTreeMap;

    fn file(destination: &str, source: &str) -> ClassifiedFile {
        ClassifiedFile {
            destination: destination.to_string(),
            source: source.into(),
            exclude: None,
            platform: PlatformMoniker::Unspecified,
            area: PackageArea::Lib,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn test_first_wins_case_insensitive() {
        let files = register(vec![
            file("lib/net45/A.dll", "/one/A.dll"),
            file("lib/net45/B.dll", "/one/B.dll"),
            file("LIB/NET45/a.DLL", "/two/A.dll"),
        ]);
        let sources: Vec<_> = files.iter().map(|f| f.source.to_string_lossy().into_owned()).collect();
        assert_eq!(sources, vec!["/one/A.dll", "/one/B.dll"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(register(Vec::new()).is_empty());
    }

    #[test]
    fn test_insert_reports_duplicates() {
        let mut registry = FileRegistry::new();
        assert!(registry.insert(file("tools/init.ps1", "/a")));
        assert!(!registry.insert(file("Tools/Init.ps1", "/b")));
        assert!(registry.contains("TOOLS/INIT.PS1"));
        assert_eq!(registry.len(), 1);
    }
}
