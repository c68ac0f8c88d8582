//! Host object model: projects and their per-target configurations
//!
//! Generation tools read and extend these objects. Configurations are
//! identified inside a project by their [`Target`].

use crate::error::{BuildError, BuildResult};
use crate::step::CustomBuildStep;
use crate::target::Target;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Source extensions accepted when a project does not list its own
pub const DEFAULT_SOURCE_EXTENSIONS: [&str; 7] = ["cpp", "cc", "c", "h", "hpp", "hxx", "inl"];

/// One project configuration (one target)
#[derive(Debug, Clone, Serialize)]
pub struct Configuration {
    pub target: Target,
    /// Directory the project file for this configuration is written to
    pub project_path: PathBuf,
    /// Directory for intermediate build files
    pub intermediate_path: PathBuf,
    /// Public include paths, also exported to dependents
    pub include_paths: Vec<PathBuf>,
    pub include_private_paths: Vec<PathBuf>,
    /// Include paths inherited from dependencies, filled by dependency resolution
    pub dependencies_include_paths: Vec<PathBuf>,
    pub defines: Vec<String>,
    /// Defines exported to dependents
    pub export_defines: Vec<String>,
    /// Names of public dependency projects
    pub dependencies: Vec<String>,
    pub precomp_header: Option<String>,
    pub precomp_source: Option<String>,
    /// Regexes of source files that are listed but never compiled
    pub source_files_build_exclude_regex: Vec<String>,
    pub custom_build_steps: Vec<CustomBuildStep>,
    resolved: bool,
}

impl Configuration {
    /// Create an empty configuration for a target
    pub fn new(target: Target) -> Self {
        Self {
            target,
            project_path: PathBuf::new(),
            intermediate_path: PathBuf::new(),
            include_paths: Vec::new(),
            include_private_paths: Vec::new(),
            dependencies_include_paths: Vec::new(),
            defines: Vec::new(),
            export_defines: Vec::new(),
            dependencies: Vec::new(),
            precomp_header: None,
            precomp_source: None,
            source_files_build_exclude_regex: Vec::new(),
            custom_build_steps: Vec::new(),
            resolved: false,
        }
    }

    pub fn with_project_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_path = path.into();
        self
    }

    pub fn with_intermediate_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.intermediate_path = path.into();
        self
    }

    pub fn with_include_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.include_paths = paths;
        self
    }

    pub fn with_private_include_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.include_private_paths = paths;
        self
    }

    pub fn with_defines(mut self, defines: Vec<String>) -> Self {
        self.defines = defines;
        self
    }

    pub fn with_export_defines(mut self, defines: Vec<String>) -> Self {
        self.export_defines = defines;
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Set the precompiled header and source file names
    pub fn with_precompiled(mut self, header: impl Into<String>, source: impl Into<String>) -> Self {
        self.precomp_header = Some(header.into());
        self.precomp_source = Some(source.into());
        self
    }

    /// Add a private include path unless it is already present
    pub fn add_private_include_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.include_private_paths.contains(&path) {
            self.include_private_paths.push(path);
        }
    }

    /// Add a build-exclude regex unless it is already present
    pub fn add_build_exclude(&mut self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        if !self.source_files_build_exclude_regex.contains(&pattern) {
            self.source_files_build_exclude_regex.push(pattern);
        }
    }

    /// Whether include paths and defines are final
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub(crate) fn mark_resolved(&mut self) {
        self.resolved = true;
    }
}

/// A C++ project
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub name: String,
    pub root: PathBuf,
    /// Directories scanned for sources, relative to `root` unless absolute
    pub source_roots: Vec<PathBuf>,
    /// Accepted extensions, lower case without the leading dot
    pub source_files_extensions: Vec<String>,
    /// Files dropped from discovery, relative to `root`
    pub source_files_exclude: Vec<PathBuf>,
    pub source_files_exclude_regex: Vec<String>,
    /// Final source file list, in discovery order
    pub resolved_source_files: Vec<PathBuf>,
    pub configurations: Vec<Configuration>,
    #[serde(skip)]
    discovered: bool,
}

impl Project {
    /// Create a project rooted at `root`, scanning the root itself
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            source_roots: vec![PathBuf::new()],
            source_files_extensions: DEFAULT_SOURCE_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            source_files_exclude: Vec::new(),
            source_files_exclude_regex: Vec::new(),
            resolved_source_files: Vec::new(),
            configurations: Vec::new(),
            discovered: false,
        }
    }

    pub fn with_source_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.source_roots = roots;
        self
    }

    /// Set accepted extensions; a leading dot is allowed
    pub fn with_extensions<S: AsRef<str>>(mut self, extensions: &[S]) -> Self {
        self.source_files_extensions = extensions
            .iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn with_exclude(mut self, files: Vec<PathBuf>) -> Self {
        self.source_files_exclude = files;
        self
    }

    pub fn with_exclude_regex(mut self, patterns: Vec<String>) -> Self {
        self.source_files_exclude_regex = patterns;
        self
    }

    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configurations.push(configuration);
        self
    }

    /// Use an explicit source list instead of walking the source roots
    pub fn with_source_files(mut self, files: Vec<PathBuf>) -> Self {
        self.resolved_source_files.clear();
        for file in files {
            self.add_source_file(file);
        }
        self.discovered = true;
        self
    }

    /// Whether the source list has been filled
    pub fn is_discovered(&self) -> bool {
        self.discovered
    }

    /// Walk the source roots and fill the resolved source list
    ///
    /// Returns the number of files found.
    pub fn discover_sources(&mut self) -> BuildResult<usize> {
        let mut found = Vec::new();

        for root in &self.source_roots {
            let dir = if root.is_absolute() {
                root.clone()
            } else {
                self.root.join(root)
            };
            if !dir.is_dir() {
                return Err(BuildError::SourceRootNotFound(dir));
            }

            for entry in WalkDir::new(&dir)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                if self.accepts_extension(path) && !self.is_listed_exclude(path) {
                    found.push(path.to_path_buf());
                }
            }
        }

        let before = self.resolved_source_files.len();
        for path in found {
            self.add_source_file(path);
        }
        self.discovered = true;

        let count = self.resolved_source_files.len() - before;
        debug!(project = %self.name, files = count, "discovered sources");
        Ok(count)
    }

    fn accepts_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_lowercase();
                self.source_files_extensions.iter().any(|x| *x == e)
            })
            .unwrap_or(false)
    }

    fn is_listed_exclude(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        self.source_files_exclude.iter().any(|x| x == relative)
    }

    /// Append a source file unless it is already listed
    pub fn add_source_file(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.resolved_source_files.contains(&path) {
            return false;
        }
        self.resolved_source_files.push(path);
        true
    }

    /// Get the configuration for a target
    pub fn configuration(&self, target: &Target) -> Option<&Configuration> {
        self.configurations.iter().find(|c| c.target == *target)
    }

    /// Get the configuration for a target, mutably
    pub fn configuration_mut(&mut self, target: &Target) -> Option<&mut Configuration> {
        self.configurations.iter_mut().find(|c| c.target == *target)
    }

    /// Lower-cased precompiled header and source names of every configuration
    pub fn precompiled_file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for conf in &self.configurations {
            for name in [&conf.precomp_header, &conf.precomp_source]
                .into_iter()
                .flatten()
            {
                let lower = name.to_lowercase();
                if !lower.is_empty() && !names.contains(&lower) {
                    names.push(lower);
                }
            }
        }
        names
    }

    /// Whether the file is the precompiled header or source of any configuration
    pub fn is_precompiled_file(&self, path: &Path) -> bool {
        let lower = path.to_string_lossy().to_lowercase();
        self.precompiled_file_names()
            .iter()
            .any(|name| lower.ends_with(name))
    }

    /// Total number of custom build steps across configurations
    pub fn step_count(&self) -> usize {
        self.configurations
            .iter()
            .map(|c| c.custom_build_steps.len())
            .sum()
    }
}
