//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::{validate_log_level, GlobalConfig};
use crate::manifest::{ProjectManifest, SolutionManifest};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Solution manifest file name
pub const MANIFEST_FILE: &str = "stepgen.toml";

/// Fallback when neither the manifest nor the global config names protoc
const DEFAULT_PROTOC: &str = "protoc";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.stepgen/config.toml) - lowest priority
/// 2. Solution manifest (./stepgen.toml) - overrides global
/// 3. Environment variables (STEPGEN_*) - overrides both
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone)]
pub struct Config {
    /// Solution manifest
    pub manifest: SolutionManifest,

    /// Global configuration with environment overrides applied
    pub global: GlobalConfig,

    /// Directory containing stepgen.toml
    pub root: PathBuf,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use a specific global config file instead of ~/.stepgen/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find stepgen.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let manifest_path = Self::find_manifest(start_dir)?;
        self.load_from_file(&manifest_path)
    }

    /// Load configuration from a specific manifest file
    pub fn load_from_file(&mut self, manifest_path: &Path) -> ConfigResult<Config> {
        let manifest = SolutionManifest::load_from_file(manifest_path)?;
        let global = self.load_global_config()?;
        let global = Self::apply_env_overrides(global)?;

        let root = match manifest_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let config = Config {
            manifest,
            global,
            root,
        };
        config.validate()?;
        Ok(config)
    }

    /// Find the manifest by walking up the directory tree
    fn find_manifest(start_dir: &Path) -> ConfigResult<PathBuf> {
        let mut current = start_dir.to_path_buf();

        loop {
            let manifest_path = current.join(MANIFEST_FILE);
            if manifest_path.is_file() {
                return Ok(manifest_path);
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Err(ConfigError::NotFound(start_dir.join(MANIFEST_FILE))),
            }
        }
    }

    /// Load global configuration from ~/.stepgen/config.toml
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => match GlobalConfig::global_config_path() {
                Ok(path) => {
                    self.global_config_path = Some(path.clone());
                    path
                }
                // No home directory means no global config
                Err(ConfigError::HomeNotFound) => return Ok(GlobalConfig::default()),
                Err(e) => return Err(e),
            },
        };

        // Global config is optional - if it doesn't exist, return default
        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides to the global config
    ///
    /// Recognised: STEPGEN_QT_DIR, STEPGEN_PROTOC, STEPGEN_LOG_LEVEL
    fn apply_env_overrides(mut global: GlobalConfig) -> ConfigResult<GlobalConfig> {
        if let Ok(qt_dir) = env::var("STEPGEN_QT_DIR") {
            global.tools_mut().qt_dir = Some(PathBuf::from(qt_dir));
        }

        if let Ok(protoc) = env::var("STEPGEN_PROTOC") {
            global.tools_mut().protoc = Some(PathBuf::from(protoc));
        }

        if let Ok(level) = env::var("STEPGEN_LOG_LEVEL") {
            validate_log_level("STEPGEN_LOG_LEVEL", &level)?;
            global.logging_mut().level = Some(level.to_lowercase());
        }

        Ok(global)
    }

    /// Get the global configuration directory (~/.stepgen)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".stepgen"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Directory containing the manifest
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a manifest path against the manifest directory
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Absolute directory of a project
    pub fn project_root(&self, project: &ProjectManifest) -> PathBuf {
        self.resolve_path(project.directory())
    }

    /// Qt tool directory for a project (project `bin_dir` > global `qt_dir/bin`)
    pub fn qt_bin_dir(&self, project: &ProjectManifest) -> ConfigResult<PathBuf> {
        if let Some(bin_dir) = project.qt.as_ref().and_then(|qt| qt.bin_dir.as_ref()) {
            return Ok(self.resolve_path(bin_dir));
        }
        self.global
            .qt_dir()
            .map(|dir| dir.join("bin"))
            .ok_or_else(|| ConfigError::MissingField {
                field: format!("project.{}.qt.bin_dir", project.name),
                file: self.root.join(MANIFEST_FILE),
            })
    }

    /// Release and debug protoc executables for a project
    ///
    /// Manifest values win over the global config; the debug build falls back
    /// to the release one.
    pub fn protoc_executables(&self, project: &ProjectManifest) -> (PathBuf, PathBuf) {
        let section = project.proto.as_ref();

        let release = section
            .and_then(|p| p.release_executable.as_ref())
            .map(|p| self.resolve_path(p))
            .or_else(|| self.global.protoc().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROTOC));

        let debug = section
            .and_then(|p| p.debug_executable.as_ref())
            .map(|p| self.resolve_path(p))
            .or_else(|| self.global.protoc_debug().map(Path::to_path_buf))
            .unwrap_or_else(|| release.clone());

        (release, debug)
    }

    /// Effective log level from global config and environment
    pub fn log_level(&self) -> Option<&str> {
        self.global.log_level()
    }

    /// Cross-source validation that needs both manifest and global config
    pub fn validate(&self) -> ConfigResult<()> {
        for project in self.manifest.projects.iter().filter(|p| p.qt.is_some()) {
            self.qt_bin_dir(project)?;
        }
        Ok(())
    }
}
