//! Scan command - classification only

use crate::adapter::{self, ProjectSetup};
use anyhow::{bail, Context, Result};
use colored::*;
use serde::Serialize;
use std::path::PathBuf;
use stepgen_config::Config;

/// Scan command arguments
pub struct ScanArgs {
    /// Only scan this project
    pub project: Option<String>,
    /// JSON output
    pub json: bool,
}

#[derive(Serialize, Default)]
struct ScanReport {
    name: String,
    source_files: usize,
    moc: Vec<PathBuf>,
    rcc: Vec<PathBuf>,
    uic: Vec<PathBuf>,
    protoc: Vec<PathBuf>,
}

fn scan_project(mut setup: ProjectSetup) -> Result<ScanReport> {
    let project = &mut setup.project;
    project
        .discover_sources()
        .with_context(|| format!("Failed to discover sources of '{}'", project.name))?;

    let mut report = ScanReport {
        name: project.name.clone(),
        source_files: project.resolved_source_files.len(),
        ..Default::default()
    };
    if let Some(moc) = &setup.moc {
        let classified = moc.classify(project)?;
        report.moc = classified.moc;
        report.rcc = classified.resources;
        report.uic = classified.forms;
    }
    if let Some(proto) = &setup.proto {
        report.protoc = proto.select(project)?;
    }
    Ok(report)
}

/// Run the scan command
pub fn run(config: &Config, args: ScanArgs) -> Result<()> {
    let setups: Vec<ProjectSetup> = adapter::load_projects(config)?
        .into_iter()
        .filter(|s| args.project.as_ref().map_or(true, |name| &s.project.name == name))
        .collect();
    if let (Some(name), true) = (&args.project, setups.is_empty()) {
        bail!("Project '{}' not found in {}", name, config.manifest.solution.name);
    }

    let reports = setups
        .into_iter()
        .map(scan_project)
        .collect::<Result<Vec<_>>>()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        println!(
            "{} {} ({} source files)",
            "Project".bold(),
            report.name.as_str().cyan().bold(),
            report.source_files
        );
        for (tool, files) in [
            ("moc", &report.moc),
            ("rcc", &report.rcc),
            ("uic", &report.uic),
            ("protoc", &report.protoc),
        ] {
            if files.is_empty() {
                continue;
            }
            println!("  {} ({})", tool.green(), files.len());
            for file in files {
                let shown = file.strip_prefix(&config.root).unwrap_or(file);
                println!("    {}", shown.display());
            }
        }
    }
    Ok(())
}
