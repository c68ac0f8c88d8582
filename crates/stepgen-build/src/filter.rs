//! Source file exclusion
//!
//! Exclusion patterns are compiled once per run and matched case-insensitively
//! against the full path string. Exclusion always runs before content
//! classification, so an excluded file is never opened.

use crate::error::{BuildError, BuildResult};
use crate::project::Project;
use regex::{Regex, RegexBuilder};
use std::path::{Path, PathBuf};

/// A compiled, case-insensitive set of regular expressions
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    /// Compile every pattern, failing on the first invalid one
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> BuildResult<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p.as_ref())
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| BuildError::invalid_pattern(p.as_ref(), e))
            })
            .collect::<BuildResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Check whether any pattern matches the string
    pub fn is_match_str(&self, s: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(s))
    }

    /// Check whether any pattern matches the path
    pub fn is_match(&self, path: &Path) -> bool {
        self.is_match_str(&path.to_string_lossy())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Rejects files a generation tool must never process
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    patterns: PatternSet,
    /// Lower-cased precompiled header and source file names
    precompiled: Vec<String>,
}

impl ExclusionFilter {
    /// Build the filter from the project's exclusions plus the tool's own
    pub fn new<S: AsRef<str>>(project: &Project, tool_patterns: &[S]) -> BuildResult<Self> {
        let mut all: Vec<&str> = project
            .source_files_exclude_regex
            .iter()
            .map(String::as_str)
            .collect();
        all.extend(tool_patterns.iter().map(AsRef::as_ref));

        Ok(Self {
            patterns: PatternSet::compile(&all)?,
            precompiled: project.precompiled_file_names(),
        })
    }

    /// Check whether the file is a precompiled header or source of any configuration
    pub fn is_precompiled(&self, path: &Path) -> bool {
        let lower = path.to_string_lossy().to_lowercase();
        self.precompiled.iter().any(|name| lower.ends_with(name))
    }

    /// Check whether the file is rejected
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.patterns.is_match(path) || self.is_precompiled(path)
    }

    /// Keep the admitted files in order, dropping repeats
    pub fn apply(&self, files: &[PathBuf]) -> Vec<PathBuf> {
        let mut admitted: Vec<PathBuf> = Vec::with_capacity(files.len());
        for file in files {
            if !self.is_excluded(file) && !admitted.contains(file) {
                admitted.push(file.clone());
            }
        }
        admitted
    }
}
