//! Custom build step synthesis for C++ projects
//!
//! Provides code generation steps for projects described to an IDE or
//! build-file generator:
//! - Qt moc steps for files declaring `Q_OBJECT` / `Q_GADGET`, plus rcc and uic
//! - protoc steps for `.proto` schemas, mirroring the schema tree
//! - Per-configuration argument resolution (defines, include paths, forced includes)
//! - Dependency propagation between projects
//! - A two-phase pipeline: collect, resolve dependencies, finalize

pub mod arguments;
pub mod dependency;
pub mod error;
pub mod filter;
pub mod moc;
pub mod pipeline;
pub mod placeholder;
pub mod project;
pub mod proto;
pub mod scan;
pub mod step;
pub mod table;
pub mod target;

// Re-export main types
pub use arguments::{AdditionalDefinition, ResolvedArguments};
pub use dependency::{resolve_dependencies, DependencyGraph, ProjectNode};
pub use error::{BuildError, BuildResult};
pub use filter::{ExclusionFilter, PatternSet};
pub use moc::{MocTool, QtClassification, QtExecutables};
pub use pipeline::{finalize_steps, GenerationStats, GenerationTool, Phase, Solution};
pub use placeholder::{ensure_placeholder, PlaceholderOutcome};
pub use project::{Configuration, Project};
pub use proto::ProtoTool;
pub use scan::{MarkerScanner, QT_MARKERS};
pub use step::{derive_output_path, CustomBuildStep, StepFilter, StepKind};
pub use table::{StepTable, StepTableEntry};
pub use target::{DevEnv, Optimization, Platform, Target};
