//! Solution Manifest (stepgen.toml)
//!
//! Describes the projects of a solution, the target matrix they are generated
//! for and which code generators run on each project.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use stepgen_build::{AdditionalDefinition, DevEnv, Optimization, Platform, Target};

/// Solution manifest from stepgen.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SolutionManifest {
    /// Solution metadata and target matrix
    pub solution: SolutionSection,

    /// Projects, in declaration order
    #[serde(default, rename = "project")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<ProjectManifest>,
}

/// Solution metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SolutionSection {
    /// Solution name
    pub name: String,

    /// Platforms (default: win64)
    #[serde(default = "default_platforms")]
    pub platforms: Vec<Platform>,

    /// Development environments (default: vs2022)
    #[serde(default = "default_dev_envs")]
    pub dev_envs: Vec<DevEnv>,

    /// Optimization levels (default: debug, release)
    #[serde(default = "default_optimizations")]
    pub optimizations: Vec<Optimization>,
}

fn default_platforms() -> Vec<Platform> {
    vec![Platform::Win64]
}

fn default_dev_envs() -> Vec<DevEnv> {
    vec![DevEnv::Vs2022]
}

fn default_optimizations() -> Vec<Optimization> {
    vec![Optimization::Debug, Optimization::Release]
}

fn default_true() -> bool {
    true
}

/// One C++ project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectManifest {
    /// Project name, unique in the solution
    pub name: String,

    /// Project directory relative to the manifest (default: the name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Directories scanned for sources, relative to the project (default: the project directory)
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub source_roots: Vec<PathBuf>,

    /// Accepted source extensions
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,

    /// Files dropped from discovery, relative to the project
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<PathBuf>,

    /// Regexes of files ignored by every generator
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_regex: Vec<String>,

    /// Public dependencies (project names)
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    /// Public include paths, exported to dependents
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include_paths: Vec<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub private_include_paths: Vec<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub defines: Vec<String>,

    /// Defines exported to dependents
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub export_defines: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub precompiled_header: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub precompiled_source: Option<String>,

    /// Project file directory, may use path macros
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_dir: Option<String>,

    /// Intermediate directory, may use path macros
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intermediate_dir: Option<String>,

    /// Qt code generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qt: Option<QtSection>,

    /// Protocol buffer code generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proto: Option<ProtoSection>,
}

/// Qt moc/rcc/uic settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct QtSection {
    /// Directory holding moc, rcc and uic (default: `<tools.qt_dir>/bin`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin_dir: Option<PathBuf>,

    /// Suffix of the Qt executables (default: ".exe")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exe_suffix: Option<String>,

    /// Output folder for generated files, relative to the project
    pub shared_folder: String,

    /// Files never scanned for markers
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_regex: Vec<String>,

    /// Files whose generated output is not compiled on its own
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_from_compile_regex: Vec<String>,

    /// Extensions scanned for markers
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scan_extensions: Vec<String>,

    /// Create intermediate placeholder files (default: true)
    #[serde(default = "default_true")]
    pub placeholders: bool,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_defines: Vec<AdditionalDefinition>,
}

/// protoc settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProtoSection {
    /// Root of the schema tree, relative to the project
    pub source_folder: String,

    /// Root of the generated headers, relative to the project
    pub destination_folder: String,

    /// protoc release build (default: `tools.protoc`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_executable: Option<PathBuf>,

    /// protoc debug build (default: `tools.protoc_debug`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_executable: Option<PathBuf>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_regex: Vec<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_from_compile_regex: Vec<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_defines: Vec<AdditionalDefinition>,
}

impl SolutionManifest {
    /// Load the manifest from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let manifest: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        manifest.validate()?;
        Ok(manifest)
    }

    /// Validate names, dependencies and the target matrix
    pub fn validate(&self) -> ConfigResult<()> {
        if self.solution.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "solution name cannot be empty".to_string(),
            ));
        }
        if self.solution.platforms.is_empty()
            || self.solution.dev_envs.is_empty()
            || self.solution.optimizations.is_empty()
        {
            return Err(ConfigError::ValidationError(
                "target matrix is empty: platforms, dev_envs and optimizations need a value each"
                    .to_string(),
            ));
        }

        let mut names = HashSet::new();
        for project in &self.projects {
            if project.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "project name cannot be empty".to_string(),
                ));
            }
            if !names.insert(project.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate project '{}'",
                    project.name
                )));
            }
        }

        for project in &self.projects {
            for dep in &project.dependencies {
                if dep == &project.name {
                    return Err(ConfigError::InvalidValue {
                        field: format!("project.{}.dependencies", project.name),
                        reason: "a project cannot depend on itself".to_string(),
                    });
                }
                if !names.contains(dep.as_str()) {
                    return Err(ConfigError::InvalidValue {
                        field: format!("project.{}.dependencies", project.name),
                        reason: format!("unknown project '{}'", dep),
                    });
                }
            }
            if let Some(qt) = &project.qt {
                if qt.shared_folder.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: format!("project.{}.qt.shared_folder", project.name),
                        reason: "cannot be empty".to_string(),
                    });
                }
            }
            if let Some(proto) = &project.proto {
                if proto.source_folder.trim().is_empty()
                    || proto.destination_folder.trim().is_empty()
                {
                    return Err(ConfigError::InvalidValue {
                        field: format!("project.{}.proto", project.name),
                        reason: "source_folder and destination_folder cannot be empty"
                            .to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Every target of the solution matrix
    pub fn targets(&self) -> Vec<Target> {
        Target::matrix(
            &self.solution.platforms,
            &self.solution.dev_envs,
            &self.solution.optimizations,
        )
    }

    /// Get a project by name
    pub fn project(&self, name: &str) -> Option<&ProjectManifest> {
        self.projects.iter().find(|p| p.name == name)
    }
}

impl ProjectManifest {
    /// Project directory relative to the manifest
    pub fn directory(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_minimal_manifest() {
        let toml = r#"
[solution]
name = "darkness"
"#;
        let manifest: SolutionManifest = toml::from_str(toml).unwrap();
        manifest.validate().unwrap();

        assert_eq!(manifest.solution.platforms, vec![Platform::Win64]);
        assert_eq!(manifest.targets().len(), 2);
        assert!(manifest.projects.is_empty());
    }

    #[test]
    fn test_parse_full_project() {
        let toml = r#"
[solution]
name = "darkness"
platforms = ["win64"]
dev_envs = ["vs2019", "vs2022"]
optimizations = ["debug"]

[[project]]
name = "DarknessShared"
path = "darkness-shared"
source_roots = ["src", "protocols"]
extensions = ["cpp", "h", "proto"]
include_paths = ["include"]
export_defines = ["SHARED_API"]

[project.proto]
source_folder = "protocols"
destination_folder = "include/protocols"

[[project]]
name = "DarknessEditor"
dependencies = ["DarknessShared"]
precompiled_header = "pch.h"
precompiled_source = "pch.cpp"
intermediate_dir = "tmp/[target.name]"

[project.qt]
bin_dir = "C:/Qt/6.5/msvc2019_64/bin"
shared_folder = "moc"
exclude_regex = ["_fake\\.h$"]

[[project.qt.additional_defines]]
platforms = ["win64"]
dev_envs = ["vs2022"]
defines = ["WIN32", "_MSC_VER=1930"]
"#;
        let manifest: SolutionManifest = toml::from_str(toml).unwrap();
        manifest.validate().unwrap();

        assert_eq!(manifest.targets().len(), 2);
        let shared = manifest.project("DarknessShared").unwrap();
        assert_eq!(shared.directory(), PathBuf::from("darkness-shared"));
        assert_eq!(
            shared.proto.as_ref().unwrap().destination_folder,
            "include/protocols"
        );

        let editor = manifest.project("DarknessEditor").unwrap();
        assert_eq!(editor.directory(), PathBuf::from("DarknessEditor"));
        let qt = editor.qt.as_ref().unwrap();
        assert!(qt.placeholders);
        assert_eq!(qt.additional_defines[0].defines.len(), 2);
        assert_eq!(qt.additional_defines[0].dev_envs, vec![DevEnv::Vs2022]);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = r#"
[solution]
name = "s"
colour = "blue"
"#;
        assert!(toml::from_str::<SolutionManifest>(toml).is_err());
    }

    #[test]
    fn test_unknown_platform_rejected() {
        let toml = r#"
[solution]
name = "s"
platforms = ["amiga"]
"#;
        assert!(toml::from_str::<SolutionManifest>(toml).is_err());
    }

    #[test]
    fn test_duplicate_project_rejected() {
        let toml = r#"
[solution]
name = "s"

[[project]]
name = "a"

[[project]]
name = "a"
"#;
        let manifest: SolutionManifest = toml::from_str(toml).unwrap();
        assert!(matches!(
            manifest.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let toml = r#"
[solution]
name = "s"

[[project]]
name = "a"
dependencies = ["b"]
"#;
        let manifest: SolutionManifest = toml::from_str(toml).unwrap();
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("unknown project 'b'"));
    }

    #[test]
    fn test_self_dependency_rejected() {
        let toml = r#"
[solution]
name = "s"

[[project]]
name = "a"
dependencies = ["a"]
"#;
        let manifest: SolutionManifest = toml::from_str(toml).unwrap();
        assert!(matches!(
            manifest.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_empty_matrix_rejected() {
        let toml = r#"
[solution]
name = "s"
optimizations = []
"#;
        let manifest: SolutionManifest = toml::from_str(toml).unwrap();
        assert!(manifest.validate().is_err());
    }
}
