//! Qt code generation steps
//!
//! Headers and sources that mention `Q_OBJECT` or `Q_GADGET` get a moc step,
//! `.qrc` files an rcc step and `.ui` files a uic step. Everything lands in a
//! shared output folder that is added to each configuration's private include
//! paths, so generated files are reachable with a plain `#include`.

use crate::arguments::AdditionalDefinition;
use crate::error::BuildResult;
use crate::filter::{ExclusionFilter, PatternSet};
use crate::pipeline::{finalize_steps, GenerationTool};
use crate::placeholder::ensure_placeholder;
use crate::project::Project;
use crate::scan::MarkerScanner;
use crate::step::CustomBuildStep;
use crate::table::StepTable;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extensions whose content is scanned for markers
pub const DEFAULT_SCAN_EXTENSIONS: [&str; 6] = ["h", "hpp", "hxx", "cpp", "cxx", "cc"];

/// Executable suffix of the Qt tools on the build machine
pub const DEFAULT_EXE_SUFFIX: &str = ".exe";

/// Paths of the Qt code generators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QtExecutables {
    pub moc: PathBuf,
    pub rcc: PathBuf,
    pub uic: PathBuf,
}

impl QtExecutables {
    /// Tools inside a Qt `bin` directory, using the default suffix
    pub fn from_bin_dir(bin_dir: &Path) -> Self {
        Self::with_suffix(bin_dir, DEFAULT_EXE_SUFFIX)
    }

    pub fn with_suffix(bin_dir: &Path, suffix: &str) -> Self {
        Self {
            moc: bin_dir.join(format!("moc{}", suffix)),
            rcc: bin_dir.join(format!("rcc{}", suffix)),
            uic: bin_dir.join(format!("uic{}", suffix)),
        }
    }
}

/// Files selected for each Qt generator, in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QtClassification {
    pub moc: Vec<PathBuf>,
    pub resources: Vec<PathBuf>,
    pub forms: Vec<PathBuf>,
}

impl QtClassification {
    pub fn is_empty(&self) -> bool {
        self.moc.is_empty() && self.resources.is_empty() && self.forms.is_empty()
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_lowercase();
            extensions.iter().any(|x| *x == e)
        })
        .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Qt moc/rcc/uic step generator
#[derive(Debug, Clone)]
pub struct MocTool {
    pub executables: QtExecutables,
    /// Output folder shared by every configuration
    pub shared_folder: PathBuf,
    /// Files never scanned, even if they contain a marker
    pub exclude_regex: Vec<String>,
    /// Files whose generated output is listed but not compiled on its own
    pub exclude_from_compile_regex: Vec<String>,
    pub additional_defines: Vec<AdditionalDefinition>,
    /// Lower-case extensions scanned for markers
    pub scan_extensions: Vec<String>,
    pub create_placeholders: bool,
    scanner: MarkerScanner,
}

impl MocTool {
    pub fn new(qt_bin_dir: impl AsRef<Path>, shared_folder: impl Into<PathBuf>) -> Self {
        Self {
            executables: QtExecutables::from_bin_dir(qt_bin_dir.as_ref()),
            shared_folder: shared_folder.into(),
            exclude_regex: Vec::new(),
            exclude_from_compile_regex: Vec::new(),
            additional_defines: Vec::new(),
            scan_extensions: DEFAULT_SCAN_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            create_placeholders: true,
            scanner: MarkerScanner::qt(),
        }
    }

    pub fn with_executables(mut self, executables: QtExecutables) -> Self {
        self.executables = executables;
        self
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

    pub fn with_scan_extensions<S: AsRef<str>>(mut self, extensions: &[S]) -> Self {
        self.scan_extensions = extensions
            .iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn with_scanner(mut self, scanner: MarkerScanner) -> Self {
        self.scanner = scanner;
        self
    }

    /// Disable writing intermediate placeholder files during collect
    pub fn with_placeholders(mut self, create: bool) -> Self {
        self.create_placeholders = create;
        self
    }

    /// Select the files each Qt generator must process
    pub fn classify(&self, project: &Project) -> BuildResult<QtClassification> {
        let filter = ExclusionFilter::new(project, &self.exclude_regex)?;
        let candidates = filter.apply(&project.resolved_source_files);

        let scanned: Vec<PathBuf> = candidates
            .iter()
            .filter(|f| has_extension(f, &self.scan_extensions))
            .cloned()
            .collect();
        let qrc = vec!["qrc".to_string()];
        let ui = vec!["ui".to_string()];

        Ok(QtClassification {
            moc: self.scanner.filter_files(&scanned),
            resources: candidates
                .iter()
                .filter(|f| has_extension(f, &qrc))
                .cloned()
                .collect(),
            forms: candidates
                .iter()
                .filter(|f| has_extension(f, &ui))
                .cloned()
                .collect(),
        })
    }
}

impl GenerationTool for MocTool {
    fn name(&self) -> &str {
        "moc"
    }

    fn collect(&self, project: &mut Project) -> BuildResult<StepTable> {
        let classified = self.classify(project)?;
        let compile_excludes = PatternSet::compile(&self.exclude_from_compile_regex)?;
        info!(
            project = %project.name,
            moc = classified.moc.len(),
            rcc = classified.resources.len(),
            uic = classified.forms.len(),
            "classified Qt sources"
        );

        let shared = self.shared_folder.as_path();
        let mut table = StepTable::new();
        let mut generated: Vec<PathBuf> = Vec::new();
        let mut placeholders: Vec<(PathBuf, PathBuf)> = Vec::new();

        for conf in &mut project.configurations {
            conf.add_private_include_path(shared);
            let target = conf.target;
            let mut steps = Vec::new();

            for file in &classified.moc {
                let step = CustomBuildStep::moc(&target, &self.executables.moc, shared, shared, file);
                if compile_excludes.is_match(file) {
                    conf.add_build_exclude(regex::escape(&file_name(&step.output)));
                }
                let variant = step.moc_project_variant();
                steps.push(step);
                steps.extend(variant);
            }
            for file in &classified.resources {
                steps.push(CustomBuildStep::rcc(&target, &self.executables.rcc, shared, file));
            }
            for file in &classified.forms {
                steps.push(CustomBuildStep::uic(&target, &self.executables.uic, shared, file));
            }

            for step in steps {
                debug!(target = %target, step = %step.description, "registering step");
                generated.push(step.output.clone());
                if let Some(intermediate) = &step.intermediate_file {
                    generated.push(intermediate.clone());
                    let pair = (step.source_file.clone(), intermediate.clone());
                    if !placeholders.contains(&pair) {
                        placeholders.push(pair);
                    }
                }
                conf.custom_build_steps.push(step);
                table.push(target, conf.custom_build_steps.len() - 1);
            }
        }

        for path in generated {
            project.add_source_file(path);
        }
        if self.create_placeholders {
            for (source, intermediate) in &placeholders {
                ensure_placeholder(source, intermediate);
            }
        }
        Ok(table)
    }

    fn finalize(&self, table: &StepTable, project: &mut Project) -> BuildResult<()> {
        let updated = finalize_steps(project, table, &self.additional_defines)?;
        debug!(project = %project.name, steps = updated, "moc arguments resolved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::resolve_dependencies;
    use crate::project::Configuration;
    use crate::step::StepFilter;
    use crate::target::{DevEnv, Optimization, Platform, Target};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn targets() -> [Target; 2] {
        [
            Target::new(Platform::Win64, DevEnv::Vs2022, Optimization::Debug),
            Target::new(Platform::Win64, DevEnv::Vs2022, Optimization::Release),
        ]
    }

    fn write(root: &Path, name: &str, body: &str) -> PathBuf {
        let path = root.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_executables_from_bin_dir() {
        let exes = QtExecutables::with_suffix(Path::new("/qt/bin"), "");
        assert_eq!(exes.moc, PathBuf::from("/qt/bin/moc"));
        assert_eq!(
            QtExecutables::from_bin_dir(Path::new("/qt/bin")).uic,
            PathBuf::from("/qt/bin/uic.exe")
        );
    }

    #[test]
    fn test_classify_by_content_and_extension() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let widget = write(root, "widget.h", "class W { Q_OBJECT };");
        let plain = write(root, "plain.h", "struct P {};");
        let icons = write(root, "icons.qrc", "<RCC/>");
        let dialog = write(root, "dialog.ui", "<ui/>");
        let notes = write(root, "notes.txt", "Q_OBJECT");

        let project = Project::new("app", root)
            .with_source_files(vec![widget.clone(), plain, icons.clone(), dialog.clone(), notes]);
        let tool = MocTool::new("/qt/bin", root.join("moc"));
        let classified = tool.classify(&project).unwrap();

        assert_eq!(classified.moc, vec![widget]);
        assert_eq!(classified.resources, vec![icons]);
        assert_eq!(classified.forms, vec![dialog]);
    }

    #[test]
    fn test_repeated_source_classified_once() {
        let temp = TempDir::new().unwrap();
        let widget = write(temp.path(), "w.h", "class W { Q_OBJECT };");
        let mut project = Project::new("app", temp.path())
            .with_source_files(vec![widget.clone(), widget.clone()])
            .with_configuration(Configuration::new(targets()[0]));
        project.resolved_source_files.push(widget.clone());

        let tool = MocTool::new("/qt/bin", temp.path().join("moc")).with_placeholders(false);
        assert_eq!(tool.classify(&project).unwrap().moc, vec![widget]);

        tool.collect(&mut project).unwrap();
        let conf = project.configuration(&targets()[0]).unwrap();
        assert_eq!(conf.custom_build_steps.len(), 1);
    }

    #[test]
    fn test_excluded_marker_file_is_never_processed() {
        let temp = TempDir::new().unwrap();
        let fake = write(temp.path(), "fake_qobject.h", "Q_OBJECT");
        let project = Project::new("app", temp.path()).with_source_files(vec![fake]);

        let tool = MocTool::new("/qt/bin", temp.path().join("moc"))
            .with_exclude_regex(vec!["FAKE_".to_string()]);
        assert!(tool.classify(&project).unwrap().is_empty());
    }

    #[test]
    fn test_collect_and_finalize() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let shared = root.join("moc");
        let header = write(root, "widget.h", "Q_OBJECT");
        let source = write(root, "view.cpp", "Q_GADGET");
        let pch = write(root, "pch.h", "Q_OBJECT");

        let [debug, release] = targets();
        let mut project = Project::new("app", root)
            .with_source_files(vec![header.clone(), source.clone(), pch])
            .with_configuration(
                Configuration::new(debug)
                    .with_defines(vec!["QT_CORE LIB".to_string()])
                    .with_precompiled("pch.h", "pch.cpp"),
            )
            .with_configuration(Configuration::new(release).with_precompiled("pch.h", "pch.cpp"));

        let tool = MocTool::new("/qt/bin", &shared)
            .with_exclude_from_compile_regex(vec!["view\\.cpp$".to_string()]);
        let table = tool.collect(&mut project).unwrap();

        // header + bootstrap + project variant, per configuration
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&debug).unwrap().len(), 3);

        let conf = project.configuration(&debug).unwrap();
        assert_eq!(conf.include_private_paths, vec![shared.clone()]);
        assert_eq!(conf.source_files_build_exclude_regex, vec!["view\\.moc".to_string()]);
        let filters: Vec<StepFilter> = conf.custom_build_steps.iter().map(|s| s.filter).collect();
        assert_eq!(
            filters,
            vec![
                StepFilter::All,
                StepFilter::FastBuildOnly,
                StepFilter::ExcludeFastBuild
            ]
        );

        assert!(project.resolved_source_files.contains(&shared.join("moc_widget.cpp")));
        assert!(project.resolved_source_files.contains(&shared.join("view.moc")));
        assert!(project.resolved_source_files.contains(&shared.join("view.inl")));
        assert_eq!(
            fs::read_to_string(shared.join("view.inl")).unwrap().trim_end(),
            source.display().to_string()
        );

        resolve_dependencies(std::slice::from_mut(&mut project)).unwrap();
        tool.finalize(&table, &mut project).unwrap();

        let steps = &project.configuration(&debug).unwrap().custom_build_steps;
        assert_eq!(
            steps[0].force_includes,
            vec![header.clone(), PathBuf::from("pch.h")]
        );
        assert_eq!(steps[1].force_includes, Vec::<PathBuf>::new());
        let args = steps[0].arguments(None);
        assert!(args.starts_with("-DQT_CORELIB -I"));
        assert!(args.ends_with("[input] -o [output]"));
    }

    #[test]
    fn test_collect_without_matches_is_empty() {
        let temp = TempDir::new().unwrap();
        let plain = write(temp.path(), "plain.h", "nothing here");
        let [debug, _] = targets();
        let mut project = Project::new("app", temp.path())
            .with_source_files(vec![plain])
            .with_configuration(Configuration::new(debug));

        let table = MocTool::new("/qt/bin", temp.path().join("moc"))
            .collect(&mut project)
            .unwrap();
        assert!(table.is_empty());
        assert_eq!(project.step_count(), 0);
    }
}
