//! Generation pipeline
//!
//! Tools take part in two phases separated by dependency resolution:
//! `collect` registers steps and generated sources while file lists are still
//! open, `finalize` computes command-line arguments once include paths and
//! defines are final. [`Solution::generate`] enforces that order.

use crate::arguments::{AdditionalDefinition, ResolvedArguments};
use crate::dependency::resolve_dependencies;
use crate::error::{BuildError, BuildResult};
use crate::project::Project;
use crate::step::StepKind;
use crate::table::StepTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::info;

/// A custom build step generator
pub trait GenerationTool: Send + Sync {
    /// Tool name for logs and reports
    fn name(&self) -> &str;

    /// Register steps and generated source files
    fn collect(&self, project: &mut Project) -> BuildResult<StepTable>;

    /// Fill in the arguments of the steps registered by `collect`
    fn finalize(&self, table: &StepTable, project: &mut Project) -> BuildResult<()>;
}

/// Generation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Collect,
    ResolveDependencies,
    Finalize,
}

impl Phase {
    /// Get phase name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Collect => "collect",
            Self::ResolveDependencies => "resolve-dependencies",
            Self::Finalize => "finalize",
        }
    }

    /// Get all phases in execution order
    pub fn all() -> [Phase; 3] {
        [Self::Collect, Self::ResolveDependencies, Self::Finalize]
    }
}

/// Resolve each configuration in the table once and attach the bundle to its steps
///
/// Returns the number of steps updated.
pub fn finalize_steps(
    project: &mut Project,
    table: &StepTable,
    additional: &[AdditionalDefinition],
) -> BuildResult<usize> {
    let mut updated = 0;
    for entry in table.iter() {
        let project_name = project.name.clone();
        let conf = project.configuration_mut(&entry.target).ok_or_else(|| {
            BuildError::MissingConfiguration {
                project: project_name.clone(),
                target: entry.target.to_string(),
            }
        })?;
        if !conf.is_resolved() {
            return Err(BuildError::unresolved(project_name, entry.target));
        }

        let bundle = ResolvedArguments::resolve(conf, additional);
        for &index in &entry.steps {
            if let Some(step) = conf.custom_build_steps.get_mut(index) {
                step.apply_resolved(&bundle);
                updated += 1;
            }
        }
    }
    Ok(updated)
}

/// Generation statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationStats {
    pub projects: usize,
    /// Source files known before collection
    pub source_files: usize,
    /// Source files added by collection
    pub generated_files: usize,
    /// Steps per kind, keyed by tool name
    pub steps: BTreeMap<String, usize>,
    pub collect_time: Duration,
    pub finalize_time: Duration,
    pub total_time: Duration,
}

impl GenerationStats {
    pub fn total_steps(&self) -> usize {
        self.steps.values().sum()
    }
}

/// Projects of one solution and the tools attached to each
#[derive(Default)]
pub struct Solution {
    pub name: String,
    projects: Vec<Project>,
    tools: Vec<Vec<Box<dyn GenerationTool>>>,
}

impl Solution {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            projects: Vec::new(),
            tools: Vec::new(),
        }
    }

    /// Add a project with the tools that run on it, in order
    pub fn add_project(&mut self, project: Project, tools: Vec<Box<dyn GenerationTool>>) {
        self.projects.push(project);
        self.tools.push(tools);
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    pub fn into_projects(self) -> Vec<Project> {
        self.projects
    }

    /// Run discovery, collect, dependency resolution and finalize
    pub fn generate(&mut self) -> BuildResult<GenerationStats> {
        let start = Instant::now();
        let mut stats = GenerationStats {
            projects: self.projects.len(),
            ..Default::default()
        };

        for project in &mut self.projects {
            if !project.is_discovered() {
                project.discover_sources()?;
            }
            stats.source_files += project.resolved_source_files.len();
        }

        info!(solution = %self.name, phase = Phase::Collect.name(), "starting phase");
        let collect_start = Instant::now();
        let mut tables: Vec<Vec<StepTable>> = Vec::with_capacity(self.projects.len());
        for (project, tools) in self.projects.iter_mut().zip(&self.tools) {
            let before = project.resolved_source_files.len();
            let mut project_tables = Vec::with_capacity(tools.len());
            for tool in tools {
                let table = tool.collect(project)?;
                info!(
                    project = %project.name,
                    tool = tool.name(),
                    configurations = table.len(),
                    steps = table.step_count(),
                    "collected"
                );
                project_tables.push(table);
            }
            stats.generated_files += project.resolved_source_files.len() - before;
            tables.push(project_tables);
        }
        stats.collect_time = collect_start.elapsed();

        info!(solution = %self.name, phase = Phase::ResolveDependencies.name(), "starting phase");
        resolve_dependencies(&mut self.projects)?;

        info!(solution = %self.name, phase = Phase::Finalize.name(), "starting phase");
        let finalize_start = Instant::now();
        for ((project, tools), project_tables) in
            self.projects.iter_mut().zip(&self.tools).zip(&tables)
        {
            for (tool, table) in tools.iter().zip(project_tables) {
                tool.finalize(table, project)?;
            }
        }
        stats.finalize_time = finalize_start.elapsed();

        for kind in StepKind::all() {
            let count = self
                .projects
                .iter()
                .flat_map(|p| &p.configurations)
                .flat_map(|c| &c.custom_build_steps)
                .filter(|s| s.kind == kind)
                .count();
            if count > 0 {
                stats.steps.insert(kind.name().to_string(), count);
            }
        }
        stats.total_time = start.elapsed();
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Configuration;
    use crate::step::CustomBuildStep;
    use crate::target::{DevEnv, Optimization, Platform, Target};
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn target() -> Target {
        Target::new(Platform::Win64, DevEnv::Vs2022, Optimization::Debug)
    }

    /// Adds one uic step per configuration and records the phase order
    struct RecordingTool {
        calls: Arc<AtomicUsize>,
    }

    impl GenerationTool for RecordingTool {
        fn name(&self) -> &str {
            "recording"
        }

        fn collect(&self, project: &mut Project) -> BuildResult<StepTable> {
            assert_eq!(self.calls.fetch_add(1, Ordering::SeqCst), 0);
            let mut table = StepTable::new();
            for conf in &mut project.configurations {
                assert!(!conf.is_resolved());
                conf.custom_build_steps.push(CustomBuildStep::uic(
                    &conf.target,
                    Path::new("uic.exe"),
                    Path::new("/out"),
                    Path::new("/src/a.ui"),
                ));
                table.push(conf.target, conf.custom_build_steps.len() - 1);
            }
            Ok(table)
        }

        fn finalize(&self, table: &StepTable, project: &mut Project) -> BuildResult<()> {
            assert_eq!(self.calls.fetch_add(1, Ordering::SeqCst), 1);
            finalize_steps(project, table, &[]).map(|_| ())
        }
    }

    #[test]
    fn test_phase_order() {
        let phases = Phase::all();
        assert!(phases.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(Phase::ResolveDependencies.name(), "resolve-dependencies");
    }

    #[test]
    fn test_generate_runs_collect_before_finalize() {
        let calls = Arc::new(AtomicUsize::new(0));
        let project = Project::new("app", "/app")
            .with_source_files(vec![PathBuf::from("/src/a.ui")])
            .with_configuration(Configuration::new(target()));

        let mut solution = Solution::new("demo");
        solution.add_project(
            project,
            vec![Box::new(RecordingTool {
                calls: Arc::clone(&calls),
            })],
        );
        let stats = solution.generate().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(stats.projects, 1);
        assert_eq!(stats.steps.get("uic"), Some(&1));
        let step = &solution.projects()[0].configurations[0].custom_build_steps[0];
        assert!(step.is_resolved());
    }

    #[test]
    fn test_finalize_before_resolution_is_an_error() {
        let mut project = Project::new("app", "/app").with_configuration(Configuration::new(target()));
        let mut table = StepTable::new();
        table.ensure(target());

        let err = finalize_steps(&mut project, &table, &[]).unwrap_err();
        assert!(matches!(err, BuildError::UnresolvedConfiguration { .. }));
    }
}
