//! Stepgen Configuration System
//!
//! Provides configuration management for step generation including:
//! - Solution manifest (stepgen.toml)
//! - Global user configuration (~/.stepgen/config.toml)
//! - Path macros expanded per project and target
//! - Configuration precedence and merging
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.stepgen/config.toml)
//! 2. Solution manifest (./stepgen.toml)
//! 3. Environment variables (STEPGEN_*)
//! 4. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use stepgen_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! ```

pub mod global;
pub mod loader;
pub mod macros;
pub mod manifest;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Missing required field '{field}' in {file}")]
    MissingField { field: String, file: PathBuf },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader, MANIFEST_FILE};
pub use macros::PathMacros;
pub use manifest::{ProjectManifest, ProtoSection, QtSection, SolutionManifest, SolutionSection};
