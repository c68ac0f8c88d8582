//! Generate command - produce custom build steps for every configuration

use crate::adapter;
use anyhow::{bail, Context, Result};
use colored::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use stepgen_build::arguments::relative_to;
use stepgen_build::{CustomBuildStep, GenerationStats, Project};
use stepgen_config::Config;

/// Generate command arguments
#[derive(Default)]
pub struct GenerateArgs {
    /// Only print this project
    pub project: Option<String>,
    /// JSON output
    pub json: bool,
    /// Render paths relative to each project directory
    pub relative: bool,
    /// Summary only
    pub quiet: bool,
}

#[derive(Serialize)]
struct StepReport {
    kind: &'static str,
    filter: String,
    source: PathBuf,
    output: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    intermediate: Option<PathBuf>,
    description: String,
    command_line: String,
}

#[derive(Serialize)]
struct ConfigurationReport {
    target: String,
    steps: Vec<StepReport>,
}

#[derive(Serialize)]
struct ProjectReport {
    name: String,
    configurations: Vec<ConfigurationReport>,
}

impl StepReport {
    fn new(step: &CustomBuildStep, base: Option<&Path>) -> Self {
        Self {
            kind: step.kind.name(),
            filter: step.filter.to_string(),
            source: relative_to(&step.source_file, base),
            output: relative_to(&step.output, base),
            intermediate: step
                .intermediate_file
                .as_ref()
                .map(|p| relative_to(p, base)),
            description: step.description.clone(),
            command_line: step.command_line(base),
        }
    }
}

impl ProjectReport {
    fn new(project: &Project, relative: bool) -> Self {
        let base = relative.then_some(project.root.as_path());
        Self {
            name: project.name.clone(),
            configurations: project
                .configurations
                .iter()
                .map(|conf| ConfigurationReport {
                    target: conf.target.to_string(),
                    steps: conf
                        .custom_build_steps
                        .iter()
                        .map(|step| StepReport::new(step, base))
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Run the generate command
pub fn run(config: &Config, args: GenerateArgs) -> Result<()> {
    let setups = adapter::load_projects(config)?;
    if let Some(name) = &args.project {
        if !setups.iter().any(|s| &s.project.name == name) {
            bail!("Project '{}' not found in {}", name, config.manifest.solution.name);
        }
    }

    let mut solution = adapter::into_solution(&config.manifest.solution.name, setups);
    let stats = solution.generate().context("Step generation failed")?;

    let reports: Vec<ProjectReport> = solution
        .projects()
        .iter()
        .filter(|p| args.project.as_ref().map_or(true, |name| &p.name == name))
        .map(|p| ProjectReport::new(p, args.relative))
        .collect();

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "success": true,
                "solution": solution.name,
                "projects": reports,
                "stats": {
                    "projects": stats.projects,
                    "source_files": stats.source_files,
                    "generated_files": stats.generated_files,
                    "steps": stats.steps,
                    "total_steps": stats.total_steps(),
                    "collect_time": stats.collect_time.as_secs_f64(),
                    "finalize_time": stats.finalize_time.as_secs_f64(),
                    "total_time": stats.total_time.as_secs_f64(),
                },
            }))?
        );
        return Ok(());
    }

    if !args.quiet {
        for report in &reports {
            print_project(report);
        }
    }
    print_summary(&solution.name, &stats);
    Ok(())
}

fn print_project(report: &ProjectReport) {
    println!("{} {}", "Project".bold(), report.name.as_str().cyan().bold());
    for conf in &report.configurations {
        println!("  {} ({} steps)", conf.target.as_str().bold(), conf.steps.len());
        for step in &conf.steps {
            println!(
                "    {:<6} {:<18} {} -> {}",
                step.kind.green(),
                step.filter.as_str().dimmed(),
                step.source.display(),
                step.output.display()
            );
            println!("           {}", step.command_line.as_str().dimmed());
        }
    }
    println!();
}

fn print_summary(solution: &str, stats: &GenerationStats) {
    println!("{}", "=".repeat(60));
    println!(
        "Generated {} steps for {} in {:.2}s",
        stats.total_steps(),
        solution,
        stats.total_time.as_secs_f64()
    );
    println!("{}", "=".repeat(60));
    println!("  Projects: {}", stats.projects);
    println!(
        "  Source files: {} (+{} generated)",
        stats.source_files, stats.generated_files
    );
    for (tool, count) in &stats.steps {
        println!("  {}: {}", tool, count);
    }
    println!("{}", "=".repeat(60));
}
