//! Path macros
//!
//! Manifest paths may contain `[project.name]`, `[project.path]`,
//! `[target.name]`, `[target.platform]` and `[target.dev_env]`. Unknown macros
//! are left untouched; target macros stay untouched until a target is set.

use std::path::Path;
use stepgen_build::Target;

/// Values substituted into manifest paths
#[derive(Debug, Clone, Copy)]
pub struct PathMacros<'a> {
    project_name: &'a str,
    project_path: &'a Path,
    target: Option<Target>,
}

impl<'a> PathMacros<'a> {
    pub fn new(project_name: &'a str, project_path: &'a Path) -> Self {
        Self {
            project_name,
            project_path,
            target: None,
        }
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    /// Substitute every known macro in `template`
    pub fn expand(&self, template: &str) -> String {
        let mut expanded = template
            .replace("[project.name]", self.project_name)
            .replace("[project.path]", &self.project_path.to_string_lossy());

        if let Some(target) = &self.target {
            expanded = expanded
                .replace("[target.name]", target.name())
                .replace("[target.platform]", target.platform.name())
                .replace("[target.dev_env]", target.dev_env.name());
        }
        expanded
    }
}
