//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::ProjectConfig;
use crate::{ConfigError, ConfigResult, PROJECT_CONFIG_FILE};
use nupack_package::{ManifestOverrides, MetadataField};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variables and the metadata field each one replaces
const ENV_OVERRIDES: [(&str, MetadataField); 3] = [
    ("NUPACK_VERSION", MetadataField::Version),
    ("NUPACK_ID", MetadataField::Id),
    ("NUPACK_RELEASE_NOTES", MetadataField::ReleaseNotes),
];

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.nupack/config.toml) - fills unset fields only
/// 2. Project config (./nupack.toml) - overrides global
/// 3. Environment variables (NUPACK_*) - overrides project
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where nupack.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Read global defaults from `path` instead of the home directory
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find nupack.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        self.finish(project_config, project_root)
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let project_root = config_path.parent().map(|p| p.to_path_buf());
        self.finish(project_config, project_root)
    }

    fn finish(&mut self, project: ProjectConfig, project_root: Option<PathBuf>) -> ConfigResult<Config> {
        let global = match self.load_global_config() {
            Ok(global) => global,
            Err(error) => {
                tracing::warn!(%error, "Ignoring global configuration");
                GlobalConfig::default()
            }
        };

        let project = self.apply_env_overrides(project)?;

        Ok(Config {
            project,
            global,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config) or error if not found
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                tracing::debug!(path = %config_path.display(), "Found project configuration");
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration from ~/.nupack/config.toml
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = GlobalConfig::global_config_path()?;
                self.global_config_path = Some(path.clone());
                path
            }
        };

        // Global config is optional - if it doesn't exist, return default
        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Apply NUPACK_* environment variables to the project config
    ///
    /// Unset or empty variables leave the project value alone.
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        for (name, field) in ENV_OVERRIDES {
            let Some(value) = env::var(name).ok().filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            tracing::debug!(variable = name, %field, "Applying environment override");

            let package = config.package_mut();
            match field {
                MetadataField::Version => package.version = Some(value),
                MetadataField::Id => package.id = Some(value),
                MetadataField::ReleaseNotes => package.release_notes = Some(value),
                other => tracing::debug!(variable = name, field = %other, "No project setting for environment override"),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Get the global configuration directory (~/.nupack)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".nupack"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Get the package id
    pub fn package_id(&self) -> Option<&str> {
        self.project.package_id()
    }

    /// Check if this is a project (has nupack.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Template manifest path, resolved against the project root
    pub fn template_path(&self) -> Option<PathBuf> {
        self.project.template_path().map(|p| self.resolve(p))
    }

    /// Output manifest path, resolved against the project root
    pub fn output_path(&self) -> ConfigResult<PathBuf> {
        self.project
            .output_path()
            .map(|p| self.resolve(p))
            .ok_or_else(|| ConfigError::MissingField {
                field: "paths.output".to_string(),
                file: self
                    .project_root
                    .as_deref()
                    .unwrap_or_else(|| Path::new("."))
                    .join(PROJECT_CONFIG_FILE),
            })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.project_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Manifest overrides: project values, then global defaults for unset fields
    pub fn overrides(&self) -> ManifestOverrides {
        let mut overrides = ManifestOverrides::new();

        if let Some(package) = &self.project.package {
            for (field, value) in package.text_fields() {
                overrides.set(field, value);
            }
            overrides.require_license_acceptance = package.require_license_acceptance.unwrap_or(false);
            overrides.development_dependency = package.development_dependency.unwrap_or(false);
        }

        for (field, value) in self.global.default_fields() {
            overrides.set_default(field, value);
        }

        overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_path = dir.join(PROJECT_CONFIG_FILE);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    /// Loader that never reads the real home directory
    fn isolated_loader(dir: &Path) -> ConfigLoader {
        ConfigLoader::new().with_global_config_path(dir.join("no-global.toml"))
    }

    #[test]
    #[serial]
    fn test_load_project_config() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[package]
id = "Contoso.Widgets"
version = "1.0.0"
"#,
        );

        let config = isolated_loader(temp_dir.path())
            .load_from_directory(temp_dir.path())
            .unwrap();

        assert_eq!(config.package_id(), Some("Contoso.Widgets"));
        assert!(config.is_project());
    }

    #[test]
    #[serial]
    fn test_find_config_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[package]\nid = \"Parent\"\n");

        let sub_dir = temp_dir.path().join("src").join("Widgets");
        fs::create_dir_all(&sub_dir).unwrap();

        let config = isolated_loader(temp_dir.path())
            .load_from_directory(&sub_dir)
            .unwrap();

        assert_eq!(config.package_id(), Some("Parent"));
        assert_eq!(config.project_root(), Some(temp_dir.path()));
    }

    #[test]
    #[serial]
    fn test_paths_resolve_against_root() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_config_file(
            temp_dir.path(),
            "[paths]\ntemplate = \"Widgets.nuspec\"\noutput = \"obj/Widgets.nuspec\"\n",
        );

        let config = isolated_loader(temp_dir.path()).load_from_file(&path).unwrap();

        assert_eq!(config.template_path(), Some(temp_dir.path().join("Widgets.nuspec")));
        assert_eq!(config.output_path().unwrap(), temp_dir.path().join("obj/Widgets.nuspec"));
    }

    #[test]
    #[serial]
    fn test_missing_output_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_config_file(temp_dir.path(), "[package]\nid = \"Pkg\"\n");

        let config = isolated_loader(temp_dir.path()).load_from_file(&path).unwrap();
        let err = config.output_path().unwrap_err();
        assert!(err.to_string().contains("paths.output"));
    }

    #[test]
    #[serial]
    fn test_env_override_version() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[package]\nversion = \"1.0.0\"\n");

        env::set_var("NUPACK_VERSION", "2.0.0-beta");

        let config = isolated_loader(temp_dir.path()).load_from_directory(temp_dir.path());

        env::remove_var("NUPACK_VERSION");

        assert_eq!(config.unwrap().project.package_version(), Some("2.0.0-beta"));
    }

    #[test]
    #[serial]
    fn test_every_env_override_reaches_the_project() {
        for (name, field) in ENV_OVERRIDES {
            let value = match field {
                MetadataField::Version => "3.0.0",
                _ => "FromEnv",
            };
            env::set_var(name, value);
            let config = isolated_loader(Path::new("/nonexistent"))
                .apply_env_overrides(ProjectConfig::default());
            env::remove_var(name);

            let config = config.unwrap();
            let fields = config.package.as_ref().map(|p| p.text_fields()).unwrap_or_default();
            assert_eq!(fields, vec![(field, value)], "{}", name);
        }
    }

    #[test]
    #[serial]
    fn test_empty_env_var_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[package]\nid = \"FromFile\"\n");

        env::set_var("NUPACK_ID", "");

        let config = isolated_loader(temp_dir.path()).load_from_directory(temp_dir.path());

        env::remove_var("NUPACK_ID");

        assert_eq!(config.unwrap().package_id(), Some("FromFile"));
    }
}
