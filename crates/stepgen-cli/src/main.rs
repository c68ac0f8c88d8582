use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use stepgen_config::{Config, ConfigLoader};

mod adapter;
mod commands;
mod logging;

/// Custom build step generator for Qt and Protocol Buffers code generators.
///
/// Scans the C++ projects of a solution, classifies the files each code
/// generator must process and produces per-configuration build step records
/// with fully resolved command lines.
///
/// EXAMPLES:
///     stepgen generate                       Generate steps for every project
///     stepgen generate --project editor      Show steps of one project
///     stepgen generate --json --relative     JSON output with relative paths
///     stepgen scan                           Show files each generator picks
///
/// ENVIRONMENT VARIABLES:
///     STEPGEN_QT_DIR     Qt installation root (tools in its bin directory)
///     STEPGEN_PROTOC     protoc executable
///     STEPGEN_LOG_LEVEL  Log level (trace, debug, info, warn, error)
///     STEPGEN_JSON       Set to 'true' for JSON output by default
///     RUST_LOG           Log filter when no level is configured
#[derive(Parser)]
#[command(name = "stepgen")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (debug level)
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate custom build steps for the solution
    ///
    /// Runs discovery, collection, dependency resolution and finalize over
    /// every project of stepgen.toml, then prints the step records of each
    /// configuration.
    ///
    /// EXAMPLES:
    ///     stepgen generate                          Human-readable listing
    ///     stepgen generate --manifest ../stepgen.toml
    ///     stepgen generate --project editor --json  One project as JSON
    #[command(visible_alias = "g")]
    Generate {
        /// Path to stepgen.toml (default: search from the current directory)
        #[arg(long, short = 'm')]
        manifest: Option<PathBuf>,
        /// Only print the steps of this project
        #[arg(long, short = 'p')]
        project: Option<String>,
        /// JSON output
        #[arg(long, env = "STEPGEN_JSON")]
        json: bool,
        /// Render paths relative to each project directory
        #[arg(long)]
        relative: bool,
    },

    /// Show which files each code generator would process
    ///
    /// Classification only; no steps are created and nothing is written.
    ///
    /// EXAMPLES:
    ///     stepgen scan                    Every project
    ///     stepgen scan --project shared   One project
    #[command(visible_alias = "s")]
    Scan {
        /// Path to stepgen.toml (default: search from the current directory)
        #[arg(long, short = 'm')]
        manifest: Option<PathBuf>,
        /// Only scan this project
        #[arg(long, short = 'p')]
        project: Option<String>,
        /// JSON output
        #[arg(long, env = "STEPGEN_JSON")]
        json: bool,
    },
}

/// Load stepgen.toml from an explicit path or by walking up from the current directory
fn load_config(manifest: Option<&Path>) -> Result<Config> {
    let mut loader = ConfigLoader::new();
    let config = match manifest {
        Some(path) => loader
            .load_from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => loader
            .load_from_directory(&std::env::current_dir()?)
            .context("Failed to load stepgen.toml")?,
    };
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let manifest = match &cli.command {
        Commands::Generate { manifest, .. } | Commands::Scan { manifest, .. } => manifest.clone(),
    };
    let config = load_config(manifest.as_deref())?;

    let level = logging::resolve_level(
        cli.log_level.as_deref(),
        cli.verbose,
        cli.quiet,
        config.log_level(),
    )?;
    logging::init(level.as_deref());
    tracing::debug!(
        root = %config.root().display(),
        projects = config.manifest.projects.len(),
        "loaded stepgen.toml"
    );

    match cli.command {
        Commands::Generate {
            project,
            json,
            relative,
            ..
        } => {
            let args = commands::generate::GenerateArgs {
                project,
                json,
                relative,
                quiet: cli.quiet,
            };
            commands::generate::run(&config, args)?;
        }
        Commands::Scan { project, json, .. } => {
            let args = commands::scan::ScanArgs { project, json };
            commands::scan::run(&config, args)?;
        }
    }

    Ok(())
}
