//! Protocol buffer code generation steps
//!
//! Every `.proto` file gets one `protoc` step per configuration. Generated
//! headers mirror the schema tree: a file two directories below the schema
//! root lands two directories below the destination folder.

use crate::arguments::AdditionalDefinition;
use crate::error::{BuildError, BuildResult};
use crate::filter::{ExclusionFilter, PatternSet};
use crate::pipeline::{finalize_steps, GenerationTool};
use crate::project::Project;
use crate::step::CustomBuildStep;
use crate::table::StepTable;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Make a path absolute against the working directory and drop `.`/`..` lexically
fn full_path(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Longest shared leading run of path components
pub fn common_ancestor(a: &Path, b: &Path) -> PathBuf {
    a.components()
        .zip(b.components())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x.as_os_str())
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_proto(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("proto"))
        .unwrap_or(false)
}

/// `protoc` step generator
#[derive(Debug, Clone)]
pub struct ProtoTool {
    /// Root of the schema tree
    pub source_folder: PathBuf,
    /// Root of the generated header tree
    pub destination_folder: PathBuf,
    pub release_executable: PathBuf,
    pub debug_executable: PathBuf,
    pub exclude_regex: Vec<String>,
    pub exclude_from_compile_regex: Vec<String>,
    pub additional_defines: Vec<AdditionalDefinition>,
}

impl ProtoTool {
    pub fn new(
        source_folder: impl Into<PathBuf>,
        destination_folder: impl Into<PathBuf>,
        release_executable: impl Into<PathBuf>,
        debug_executable: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_folder: source_folder.into(),
            destination_folder: destination_folder.into(),
            release_executable: release_executable.into(),
            debug_executable: debug_executable.into(),
            exclude_regex: Vec::new(),
            exclude_from_compile_regex: Vec::new(),
            additional_defines: Vec::new(),
        }
    }

    pub fn with_exclude_regex(mut self, patterns: Vec<String>) -> Self {
        self.exclude_regex = patterns;
        self
    }

    pub fn with_exclude_from_compile_regex(mut self, patterns: Vec<String>) -> Self {
        self.exclude_from_compile_regex = patterns;
        self
    }

    pub fn with_additional_defines(mut self, defines: Vec<AdditionalDefinition>) -> Self {
        self.additional_defines = defines;
        self
    }

    /// The release compiler if present, else the debug one
    ///
    /// `protoc` is often built by the same solution, so neither may exist yet;
    /// the release path is used in that case.
    pub fn executable(&self) -> PathBuf {
        if self.release_executable.is_file() {
            self.release_executable.clone()
        } else if self.debug_executable.is_file() {
            self.debug_executable.clone()
        } else {
            warn!(
                release = %self.release_executable.display(),
                debug = %self.debug_executable.display(),
                "protoc not found, using release path"
            );
            self.release_executable.clone()
        }
    }

    /// Schema files of the project that pass exclusion
    pub fn select(&self, project: &Project) -> BuildResult<Vec<PathBuf>> {
        let filter = ExclusionFilter::new(project, &self.exclude_regex)?;
        Ok(filter
            .apply(&project.resolved_source_files)
            .into_iter()
            .filter(|f| is_proto(f))
            .collect())
    }

    /// Destination folder for a schema file, mirroring its place under the schema root
    pub fn mirrored_folder(&self, file: &Path) -> PathBuf {
        let file_dir = full_path(file.parent().unwrap_or_else(|| Path::new("")));
        let source_root = full_path(&self.source_folder);
        let common = common_ancestor(&file_dir, &source_root);
        let relative = file_dir.strip_prefix(&common).unwrap_or(Path::new(""));
        full_path(&self.destination_folder).join(relative)
    }
}

impl GenerationTool for ProtoTool {
    fn name(&self) -> &str {
        "protoc"
    }

    fn collect(&self, project: &mut Project) -> BuildResult<StepTable> {
        let files = self.select(project)?;
        let compile_excludes = PatternSet::compile(&self.exclude_from_compile_regex)?;
        info!(project = %project.name, files = files.len(), "selected schema files");
        for conf in &mut project.configurations {
            conf.add_private_include_path(&self.destination_folder);
        }
        if files.is_empty() {
            return Ok(StepTable::new());
        }

        let executable = self.executable();
        let mut folders = Vec::with_capacity(files.len());
        for file in &files {
            let folder = self.mirrored_folder(file);
            if !folder.is_dir() {
                fs::create_dir_all(&folder).map_err(|e| BuildError::io(&folder, e))?;
                debug!(path = %folder.display(), "created output folder");
            }
            folders.push(folder);
        }

        let mut table = StepTable::new();
        let mut generated = Vec::new();
        for conf in &mut project.configurations {
            let target = conf.target;

            for (file, folder) in files.iter().zip(&folders) {
                let step = CustomBuildStep::schema(&target, &executable, folder, file);
                if compile_excludes.is_match(file) {
                    conf.add_build_exclude(regex::escape(&file_name(&step.output)));
                }
                generated.push(step.output.clone());
                conf.custom_build_steps.push(step);
                table.push(target, conf.custom_build_steps.len() - 1);
            }
        }

        for path in generated {
            project.add_source_file(path);
        }
        Ok(table)
    }

    fn finalize(&self, table: &StepTable, project: &mut Project) -> BuildResult<()> {
        let updated = finalize_steps(project, table, &self.additional_defines)?;
        debug!(project = %project.name, steps = updated, "protoc arguments resolved");
        Ok(())
    }
}
