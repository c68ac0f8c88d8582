//! Global Configuration (~/.stepgen/config.toml)
//!
//! Handles user-level tool locations and logging defaults.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.stepgen/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Code generator locations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsConfig>,

    /// Logging defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

/// Code generator locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// Qt installation root; tools are looked up in its `bin` directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qt_dir: Option<PathBuf>,

    /// protoc release build
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protoc: Option<PathBuf>,

    /// protoc debug build
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protoc_debug: Option<PathBuf>,
}

/// Logging defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(level) = self.log_level() {
            validate_log_level("logging.level", level)?;
        }
        Ok(())
    }

    /// Get the global config file path (~/.stepgen/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".stepgen").join("config.toml"))
    }

    pub fn qt_dir(&self) -> Option<&Path> {
        self.tools.as_ref().and_then(|t| t.qt_dir.as_deref())
    }

    pub fn protoc(&self) -> Option<&Path> {
        self.tools.as_ref().and_then(|t| t.protoc.as_deref())
    }

    pub fn protoc_debug(&self) -> Option<&Path> {
        self.tools.as_ref().and_then(|t| t.protoc_debug.as_deref())
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    /// Mutable access to the tools section, creating it if needed
    pub fn tools_mut(&mut self) -> &mut ToolsConfig {
        self.tools.get_or_insert_with(ToolsConfig::default)
    }

    /// Mutable access to the logging section, creating it if needed
    pub fn logging_mut(&mut self) -> &mut LoggingConfig {
        self.logging.get_or_insert_with(LoggingConfig::default)
    }

    /// Merge another global config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &GlobalConfig) {
        if other.tools.is_some() {
            self.tools = other.tools.clone();
        }
        if other.logging.is_some() {
            self.logging = other.logging.clone();
        }
    }
}

/// Validate a log level value
pub fn validate_log_level(field: &str, value: &str) -> ConfigResult<()> {
    if !matches!(
        value.to_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!(
                "must be one of trace, debug, info, warn, error, got '{}'",
                value
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_global_config() {
        let toml = r#"
[tools]
qt_dir = "C:/Qt/6.5/msvc2019_64"
protoc = "C:/tools/protoc.exe"

[logging]
level = "debug"
"#;
        let config: GlobalConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.qt_dir(), Some(Path::new("C:/Qt/6.5/msvc2019_64")));
        assert_eq!(config.protoc_debug(), None);
        assert_eq!(config.log_level(), Some("debug"));
    }

    #[test]
    fn test_invalid_log_level() {
        let config = GlobalConfig {
            logging: Some(LoggingConfig {
                level: Some("loud".to_string()),
            }),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = GlobalConfig::load_from_file(&temp.path().join("config.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base = GlobalConfig::default();
        base.tools_mut().qt_dir = Some(PathBuf::from("/qt/old"));
        let mut other = GlobalConfig::default();
        other.tools_mut().qt_dir = Some(PathBuf::from("/qt/new"));

        base.merge(&other);
        assert_eq!(base.qt_dir(), Some(Path::new("/qt/new")));
    }
}
