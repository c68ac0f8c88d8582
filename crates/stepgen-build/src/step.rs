//! Custom build step records
//!
//! A step describes one code generator invocation: what it reads, what it
//! writes, which executable runs with which arguments, and which build-file
//! flavour consumes it. Steps are created during collection with a partial
//! argument set and receive their resolved arguments once, during finalize.

use crate::arguments::{quote_path, relative_to, ResolvedArguments};
use crate::target::Target;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Code generator a step invokes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    /// Qt meta-object compiler (moc)
    MetaObjectCompile,
    /// Qt resource compiler (rcc)
    ResourceCompile,
    /// Qt UI compiler (uic)
    UiCompile,
    /// Protocol buffer compiler (protoc)
    SchemaCompile,
}

impl StepKind {
    /// Short tool name
    pub fn name(&self) -> &'static str {
        match self {
            Self::MetaObjectCompile => "moc",
            Self::ResourceCompile => "rcc",
            Self::UiCompile => "uic",
            Self::SchemaCompile => "protoc",
        }
    }

    /// Leading word of step descriptions
    pub fn verb(&self) -> &'static str {
        match self {
            Self::MetaObjectCompile => "Moc",
            Self::ResourceCompile => "Rcc",
            Self::UiCompile => "Uic",
            Self::SchemaCompile => "Proto compile",
        }
    }

    pub fn all() -> [StepKind; 4] {
        [
            Self::MetaObjectCompile,
            Self::ResourceCompile,
            Self::UiCompile,
            Self::SchemaCompile,
        ]
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which build-file flavour consumes a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepFilter {
    All,
    /// Only the FastBuild generator sees the step
    FastBuildOnly,
    /// Every generator except FastBuild sees the step
    ExcludeFastBuild,
}

impl fmt::Display for StepFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::All => "all",
            Self::FastBuildOnly => "fastbuild-only",
            Self::ExcludeFastBuild => "exclude-fastbuild",
        };
        write!(f, "{}", name)
    }
}

/// Whether the path is a C/C++ translation unit rather than a header
pub fn is_cpp_source(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_lowercase();
            matches!(e.as_str(), "cpp" | "cxx" | "cc" | "c")
        })
        .unwrap_or(false)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Compute the generated file path for a source file
///
/// Depends only on the source path, the step kind and the output folder.
pub fn derive_output_path(source: &Path, kind: StepKind, output_folder: &Path) -> PathBuf {
    let stem = file_stem(source);
    let name = match kind {
        StepKind::MetaObjectCompile if is_cpp_source(source) => format!("{}.moc", stem),
        StepKind::MetaObjectCompile => format!("moc_{}.cpp", stem),
        StepKind::ResourceCompile => format!("{}.rcc", stem),
        StepKind::UiCompile => format!("ui_{}.h", stem),
        StepKind::SchemaCompile => format!("{}.pb.h", stem),
    };
    output_folder.join(name)
}

/// A custom build step attached to one configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomBuildStep {
    pub kind: StepKind,
    pub filter: StepFilter,
    /// File that triggered the step
    pub source_file: PathBuf,
    /// Declared primary input
    pub key_input: PathBuf,
    pub output: PathBuf,
    /// Placeholder file standing in for a `.cpp` source in IDE projects
    pub intermediate_file: Option<PathBuf>,
    pub executable: PathBuf,
    /// Arguments with `[input]` and `[output]` placeholders
    pub arguments_template: String,
    pub description: String,
    pub additional_inputs: Vec<PathBuf>,
    pub force_includes: Vec<PathBuf>,
    /// Filled once during finalize
    pub resolved: Option<ResolvedArguments>,
}

impl CustomBuildStep {
    fn base(
        kind: StepKind,
        target: &Target,
        executable: &Path,
        source: &Path,
        output: PathBuf,
        template: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            filter: StepFilter::All,
            source_file: source.to_path_buf(),
            key_input: source.to_path_buf(),
            output,
            intermediate_file: None,
            executable: executable.to_path_buf(),
            arguments_template: template.into(),
            description: format!("{} {} {}", kind.verb(), target.name(), file_name(source)),
            additional_inputs: Vec::new(),
            force_includes: Vec::new(),
            resolved: None,
        }
    }

    /// Meta-object compile step
    ///
    /// For a `.cpp` source this is the FastBuild bootstrap record with an
    /// intermediate placeholder in `base_output`; pair it with
    /// [`CustomBuildStep::moc_project_variant`]. A header forces itself in.
    pub fn moc(
        target: &Target,
        executable: &Path,
        base_output: &Path,
        output_folder: &Path,
        source: &Path,
    ) -> Self {
        let output = derive_output_path(source, StepKind::MetaObjectCompile, output_folder);
        let mut step = Self::base(
            StepKind::MetaObjectCompile,
            target,
            executable,
            source,
            output,
            "[input] -o [output]",
        );

        if is_cpp_source(source) {
            step.filter = StepFilter::FastBuildOnly;
            step.intermediate_file = Some(base_output.join(format!("{}.inl", file_stem(source))));
        } else {
            step.force_includes.push(source.to_path_buf());
        }
        step
    }

    /// IDE-project counterpart of a `.cpp` bootstrap record
    ///
    /// The declared input becomes the intermediate placeholder and the
    /// original source is tracked as an additional input. Returns `None` for
    /// steps without an intermediate file.
    pub fn moc_project_variant(&self) -> Option<Self> {
        let intermediate = self.intermediate_file.clone()?;
        let mut step = self.clone();
        step.filter = StepFilter::ExcludeFastBuild;
        step.key_input = intermediate;
        step.additional_inputs = vec![self.source_file.clone()];
        Some(step)
    }

    /// Resource compile step for a `.qrc` file
    pub fn rcc(target: &Target, executable: &Path, output_folder: &Path, source: &Path) -> Self {
        let output = derive_output_path(source, StepKind::ResourceCompile, output_folder);
        Self::base(
            StepKind::ResourceCompile,
            target,
            executable,
            source,
            output,
            "-binary [input] -o [output]",
        )
    }

    /// UI compile step for a `.ui` file
    pub fn uic(target: &Target, executable: &Path, output_folder: &Path, source: &Path) -> Self {
        let output = derive_output_path(source, StepKind::UiCompile, output_folder);
        Self::base(
            StepKind::UiCompile,
            target,
            executable,
            source,
            output,
            "[input] -o [output]",
        )
    }

    /// Schema compile step for a `.proto` file
    ///
    /// `output_folder` must be the mirrored destination folder for the file.
    pub fn schema(target: &Target, executable: &Path, output_folder: &Path, source: &Path) -> Self {
        let output = derive_output_path(source, StepKind::SchemaCompile, output_folder);
        let proto_path = source.parent().map(forward_slashes).unwrap_or_default();
        let template = format!(
            "--proto_path={} {} --cpp_out={}",
            proto_path,
            file_name(source),
            forward_slashes(output_folder)
        );
        Self::base(
            StepKind::SchemaCompile,
            target,
            executable,
            source,
            output,
            template,
        )
    }

    /// Whether finalize adds the precompiled header as a forced include
    pub fn accepts_forced_include(&self) -> bool {
        self.kind == StepKind::MetaObjectCompile && !is_cpp_source(&self.source_file)
    }

    /// Attach the resolved argument bundle; later calls are ignored
    pub fn apply_resolved(&mut self, bundle: &ResolvedArguments) {
        if self.resolved.is_some() {
            return;
        }
        if self.accepts_forced_include() {
            if let Some(pch) = &bundle.forced_include {
                if !self.force_includes.contains(pch) {
                    self.force_includes.push(pch.clone());
                }
            }
        }
        self.resolved = Some(bundle.clone());
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// Arguments with placeholders left in place
    ///
    /// Meta-object steps carry the defines, `-I` include paths and `-f`
    /// forced includes in front of the template. Paths are made relative to
    /// `base` when given.
    pub fn arguments(&self, base: Option<&Path>) -> String {
        if self.kind != StepKind::MetaObjectCompile {
            return self.arguments_template.clone();
        }

        let mut parts: Vec<String> = Vec::new();
        if let Some(resolved) = &self.resolved {
            if !resolved.defines.is_empty() {
                parts.push(resolved.defines.clone());
            }
            parts.extend(
                resolved
                    .quoted_include_paths(base)
                    .into_iter()
                    .map(|p| format!("-I{}", p)),
            );
        }
        parts.extend(
            self.force_includes
                .iter()
                .map(|f| format!("-f{}", quote_path(&relative_to(f, base)))),
        );
        parts.push(self.arguments_template.clone());
        parts.join(" ")
    }

    /// Full command line with `[input]` and `[output]` substituted
    pub fn command_line(&self, base: Option<&Path>) -> String {
        let input = quote_path(&relative_to(&self.key_input, base));
        let output = quote_path(&relative_to(&self.output, base));
        let arguments = self
            .arguments(base)
            .replace("[input]", &input)
            .replace("[output]", &output);
        format!("{} {}", quote_path(&self.executable), arguments)
    }
}
