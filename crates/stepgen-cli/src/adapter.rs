//! Manifest to project model
//!
//! Turns `stepgen.toml` into [`Project`]s with one configuration per target and
//! the generators attached to each project. Project-level paths are relative
//! to the project directory after macro expansion.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use stepgen_build::project::DEFAULT_SOURCE_EXTENSIONS;
use stepgen_build::{
    Configuration, GenerationTool, MocTool, Project, ProtoTool, QtExecutables, Solution, Target,
};
use stepgen_config::{Config, PathMacros, ProjectManifest, ProtoSection, QtSection};

/// A project with its generators, before generation
pub struct ProjectSetup {
    pub project: Project,
    pub moc: Option<MocTool>,
    pub proto: Option<ProtoTool>,
}

impl ProjectSetup {
    /// Generators in run order
    ///
    /// moc classifies by content, so it runs before any tool that registers
    /// outputs which do not exist on disk yet.
    pub fn tools(&self) -> Vec<Box<dyn GenerationTool>> {
        let mut tools: Vec<Box<dyn GenerationTool>> = Vec::new();
        if let Some(moc) = &self.moc {
            tools.push(Box::new(moc.clone()));
        }
        if let Some(proto) = &self.proto {
            tools.push(Box::new(proto.clone()));
        }
        tools
    }
}

/// Build every project of the manifest
pub fn load_projects(config: &Config) -> Result<Vec<ProjectSetup>> {
    let targets = config.manifest.targets();
    config
        .manifest
        .projects
        .iter()
        .map(|manifest| {
            project_setup(config, manifest, &targets)
                .with_context(|| format!("Invalid project '{}'", manifest.name))
        })
        .collect()
}

/// Assemble a solution ready for generation
pub fn into_solution(name: &str, setups: Vec<ProjectSetup>) -> Solution {
    let mut solution = Solution::new(name);
    for setup in setups {
        let tools = setup.tools();
        solution.add_project(setup.project, tools);
    }
    solution
}

/// Expand macros and anchor relative results at `base`
fn expand_path(macros: &PathMacros<'_>, base: &Path, value: &str) -> PathBuf {
    let expanded = PathBuf::from(macros.expand(value));
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

fn expand_all(macros: &PathMacros<'_>, base: &Path, values: &[String]) -> Vec<PathBuf> {
    values
        .iter()
        .map(|v| expand_path(macros, base, v))
        .collect()
}

fn extensions(manifest: &ProjectManifest) -> Vec<String> {
    if !manifest.extensions.is_empty() {
        return manifest.extensions.clone();
    }
    let mut extensions: Vec<String> = DEFAULT_SOURCE_EXTENSIONS
        .iter()
        .map(|e| e.to_string())
        .collect();
    if manifest.qt.is_some() {
        extensions.extend(["qrc".to_string(), "ui".to_string()]);
    }
    if manifest.proto.is_some() {
        extensions.push("proto".to_string());
    }
    extensions
}

fn configuration(
    manifest: &ProjectManifest,
    root: &Path,
    macros: PathMacros<'_>,
    target: Target,
) -> Configuration {
    let macros = macros.with_target(target);
    let mut conf = Configuration::new(target)
        .with_include_paths(expand_all(&macros, root, &manifest.include_paths))
        .with_private_include_paths(expand_all(&macros, root, &manifest.private_include_paths))
        .with_defines(manifest.defines.clone())
        .with_export_defines(manifest.export_defines.clone())
        .with_dependencies(manifest.dependencies.clone());

    if let Some(dir) = &manifest.project_dir {
        conf = conf.with_project_path(expand_path(&macros, root, dir));
    }
    if let Some(dir) = &manifest.intermediate_dir {
        conf = conf.with_intermediate_path(expand_path(&macros, root, dir));
    }
    conf.precomp_header = manifest.precompiled_header.clone();
    conf.precomp_source = manifest.precompiled_source.clone();
    conf
}

fn moc_tool(
    config: &Config,
    manifest: &ProjectManifest,
    qt: &QtSection,
    root: &Path,
    macros: &PathMacros<'_>,
) -> Result<MocTool> {
    let bin_dir = config.qt_bin_dir(manifest)?;
    let executables = match &qt.exe_suffix {
        Some(suffix) => QtExecutables::with_suffix(&bin_dir, suffix),
        None => QtExecutables::from_bin_dir(&bin_dir),
    };

    let mut tool = MocTool::new(&bin_dir, expand_path(macros, root, &qt.shared_folder))
        .with_executables(executables)
        .with_exclude_regex(qt.exclude_regex.clone())
        .with_exclude_from_compile_regex(qt.exclude_from_compile_regex.clone())
        .with_additional_defines(qt.additional_defines.clone())
        .with_placeholders(qt.placeholders);
    if !qt.scan_extensions.is_empty() {
        tool = tool.with_scan_extensions(&qt.scan_extensions);
    }
    Ok(tool)
}

fn proto_tool(
    config: &Config,
    manifest: &ProjectManifest,
    proto: &ProtoSection,
    root: &Path,
    macros: &PathMacros<'_>,
) -> ProtoTool {
    let (release, debug) = config.protoc_executables(manifest);
    ProtoTool::new(
        expand_path(macros, root, &proto.source_folder),
        expand_path(macros, root, &proto.destination_folder),
        release,
        debug,
    )
    .with_exclude_regex(proto.exclude_regex.clone())
    .with_exclude_from_compile_regex(proto.exclude_from_compile_regex.clone())
    .with_additional_defines(proto.additional_defines.clone())
}

fn project_setup(
    config: &Config,
    manifest: &ProjectManifest,
    targets: &[Target],
) -> Result<ProjectSetup> {
    let root = config.project_root(manifest);
    let macros = PathMacros::new(&manifest.name, &root);

    let mut project = Project::new(&manifest.name, &root)
        .with_extensions(&extensions(manifest))
        .with_exclude(manifest.exclude.clone())
        .with_exclude_regex(manifest.exclude_regex.clone());
    if !manifest.source_roots.is_empty() {
        project = project.with_source_roots(manifest.source_roots.clone());
    }
    for target in targets {
        project = project.with_configuration(configuration(manifest, &root, macros, *target));
    }

    let moc = manifest
        .qt
        .as_ref()
        .map(|qt| moc_tool(config, manifest, qt, &root, &macros))
        .transpose()?;
    let proto = manifest
        .proto
        .as_ref()
        .map(|proto| proto_tool(config, manifest, proto, &root, &macros));

    Ok(ProjectSetup {
        project,
        moc,
        proto,
    })
}
