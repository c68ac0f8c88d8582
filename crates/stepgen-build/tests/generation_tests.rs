//! Step generation integration tests
//!
//! End-to-end tests running discovery, collect, dependency resolution and
//! finalize over projects on disk

use pretty_assertions::assert_eq;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use stepgen_build::{
    AdditionalDefinition, BuildError, Configuration, DevEnv, GenerationTool, MarkerScanner,
    MocTool, Optimization, Platform, Project, ProtoTool, Solution, StepFilter, StepKind, Target,
};
use tempfile::TempDir;

fn debug() -> Target {
    Target::new(Platform::Win64, DevEnv::Vs2022, Optimization::Debug)
}

fn release() -> Target {
    Target::new(Platform::Win64, DevEnv::Vs2022, Optimization::Release)
}

fn write(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

/// Two projects: `shared` owns the schemas, `editor` owns Qt widgets and depends on `shared`
fn create_solution(root: &Path) -> Solution {
    write(&root.join("shared/protocols/net/msg/hello.proto"), "syntax = \"proto3\";");
    write(&root.join("shared/src/log.cpp"), "int log();");
    write(&root.join("editor/src/main_window.h"), "class MainWindow { Q_OBJECT };");
    write(&root.join("editor/src/model.cpp"), "struct M { Q_GADGET };\n#include \"model.moc\"");
    write(&root.join("editor/src/plain.h"), "struct Plain {};");
    write(&root.join("editor/src/pch.h"), "// Q_OBJECT in a comment");
    write(&root.join("editor/src/pch.cpp"), "#include \"pch.h\"");
    write(&root.join("editor/src/mac/cocoa_view.h"), "Q_OBJECT");
    write(&root.join("editor/resources/icons.qrc"), "<RCC/>");
    write(&root.join("editor/forms/settings.ui"), "<ui/>");

    let shared_conf = |target| {
        Configuration::new(target)
            .with_include_paths(vec![root.join("shared/include")])
            .with_export_defines(vec!["SHARED_API".to_string()])
    };
    let shared = Project::new("shared", root.join("shared"))
        .with_source_roots(vec![PathBuf::from("src"), PathBuf::from("protocols")])
        .with_extensions(&["cpp", "h", "proto"])
        .with_configuration(shared_conf(debug()))
        .with_configuration(shared_conf(release()));

    let editor_conf = |target| {
        Configuration::new(target)
            .with_include_paths(vec![root.join("editor/src")])
            .with_defines(vec!["QT_WIDGETS_LIB".to_string(), "WIN32_LEAN AND_MEAN".to_string()])
            .with_dependencies(vec!["shared".to_string()])
            .with_precompiled("pch.h", "pch.cpp")
    };
    let editor = Project::new("editor", root.join("editor"))
        .with_source_roots(vec![
            PathBuf::from("src"),
            PathBuf::from("resources"),
            PathBuf::from("forms"),
        ])
        .with_extensions(&["cpp", "h", "qrc", "ui"])
        .with_exclude_regex(vec![r"[\\/]mac[\\/]".to_string()])
        .with_configuration(editor_conf(debug()))
        .with_configuration(editor_conf(release()));

    let proto: Box<dyn GenerationTool> = Box::new(ProtoTool::new(
        root.join("shared/protocols"),
        root.join("shared/include/protocols"),
        root.join("tools/protoc.exe"),
        root.join("tools/protoc_d.exe"),
    ));
    let moc: Box<dyn GenerationTool> = Box::new(
        MocTool::new(root.join("qt/bin"), root.join("editor/moc")).with_additional_defines(vec![
            AdditionalDefinition::new(
                vec![Platform::Win64],
                vec![DevEnv::Vs2022],
                vec!["_MSC_VER=1930".to_string()],
            ),
        ]),
    );

    let mut solution = Solution::new("darkness");
    solution.add_project(editor, vec![moc]);
    solution.add_project(shared, vec![proto]);
    solution
}

// ============================================================================
// Full generation
// ============================================================================

#[test]
fn test_generate_full_solution() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let mut solution = create_solution(root);

    let stats = solution.generate().unwrap();

    assert_eq!(stats.projects, 2);
    // per configuration: header, .cpp bootstrap + variant
    assert_eq!(stats.steps.get("moc"), Some(&6));
    assert_eq!(stats.steps.get("rcc"), Some(&2));
    assert_eq!(stats.steps.get("uic"), Some(&2));
    assert_eq!(stats.steps.get("protoc"), Some(&2));
    assert_eq!(stats.total_steps(), 12);

    let editor = solution.project("editor").unwrap();
    let conf = editor.configuration(&debug()).unwrap();
    let kinds: Vec<StepKind> = conf.custom_build_steps.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            StepKind::MetaObjectCompile,
            StepKind::MetaObjectCompile,
            StepKind::MetaObjectCompile,
            StepKind::ResourceCompile,
            StepKind::UiCompile,
        ]
    );
    assert!(conf.custom_build_steps.iter().all(|s| s.is_resolved()));
}

#[test]
fn test_dependency_includes_reach_moc_arguments() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let mut solution = create_solution(root);
    solution.generate().unwrap();

    let editor = solution.project("editor").unwrap();
    let step = &editor.configuration(&release()).unwrap().custom_build_steps[0];
    let resolved = step.resolved.as_ref().unwrap();

    assert_eq!(
        resolved.defines,
        "-DQT_WIDGETS_LIB -DWIN32_LEANAND_MEAN -DSHARED_API -D_MSC_VER=1930"
    );
    assert_eq!(
        resolved.include_paths,
        vec![
            root.join("editor/src"),
            root.join("shared/include"),
            root.join("editor/moc"),
        ]
    );
    assert_eq!(
        step.force_includes,
        vec![root.join("editor/src/main_window.h"), PathBuf::from("pch.h")]
    );
}

#[test]
fn test_generated_sources_registered() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let mut solution = create_solution(root);
    solution.generate().unwrap();

    let editor = solution.project("editor").unwrap();
    let moc = root.join("editor/moc");
    for generated in [
        moc.join("moc_main_window.cpp"),
        moc.join("model.moc"),
        moc.join("model.inl"),
        moc.join("icons.rcc"),
        moc.join("ui_settings.h"),
    ] {
        assert!(
            editor.resolved_source_files.contains(&generated),
            "missing {}",
            generated.display()
        );
    }
    assert!(moc.join("model.inl").is_file());
    // excluded and precompiled files never produce steps
    assert!(!editor
        .resolved_source_files
        .contains(&moc.join("moc_cocoa_view.cpp")));
    assert!(!editor.resolved_source_files.contains(&moc.join("moc_pch.cpp")));

    let shared = solution.project("shared").unwrap();
    let header = root.join("shared/include/protocols/net/msg/hello.pb.h");
    assert!(shared.resolved_source_files.contains(&header));
    assert!(header.parent().unwrap().is_dir());
}

#[test]
fn test_cpp_source_produces_two_records_with_one_output() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let mut solution = create_solution(root);
    solution.generate().unwrap();

    let editor = solution.project("editor").unwrap();
    let steps: Vec<_> = editor
        .configuration(&debug())
        .unwrap()
        .custom_build_steps
        .iter()
        .filter(|s| s.source_file.ends_with("model.cpp"))
        .collect();

    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].output, steps[1].output);
    assert_eq!(steps[0].filter, StepFilter::FastBuildOnly);
    assert_eq!(steps[1].filter, StepFilter::ExcludeFastBuild);
    assert_eq!(steps[1].key_input, root.join("editor/moc/model.inl"));
}

#[test]
fn test_generation_is_repeatable() {
    let first = TempDir::new().unwrap();
    let mut a = create_solution(first.path());
    a.generate().unwrap();
    let mut b = create_solution(first.path());
    b.generate().unwrap();

    let lines = |s: &Solution| -> Vec<String> {
        s.projects()
            .iter()
            .flat_map(|p| &p.configurations)
            .flat_map(|c| &c.custom_build_steps)
            .map(|step| step.command_line(None))
            .collect()
    };
    assert_eq!(lines(&a), lines(&b));
}

// ============================================================================
// Failure modes
// ============================================================================

#[test]
fn test_dependency_cycle_stops_generation() {
    let temp = TempDir::new().unwrap();
    let a = Project::new("a", temp.path())
        .with_source_files(vec![])
        .with_configuration(Configuration::new(debug()).with_dependencies(vec!["b".to_string()]));
    let b = Project::new("b", temp.path())
        .with_source_files(vec![])
        .with_configuration(Configuration::new(debug()).with_dependencies(vec!["a".to_string()]));

    let mut solution = Solution::new("cycle");
    solution.add_project(a, vec![]);
    solution.add_project(b, vec![]);

    assert!(matches!(
        solution.generate(),
        Err(BuildError::CircularDependency(_))
    ));
}

#[test]
fn test_finalize_without_resolution_is_rejected() {
    let temp = TempDir::new().unwrap();
    let header = temp.path().join("w.h");
    fs::write(&header, "Q_OBJECT").unwrap();
    let mut project = Project::new("app", temp.path())
        .with_source_files(vec![header])
        .with_configuration(Configuration::new(debug()));

    let tool = MocTool::new("/qt/bin", temp.path().join("moc"));
    let table = tool.collect(&mut project).unwrap();

    assert!(matches!(
        tool.finalize(&table, &mut project),
        Err(BuildError::UnresolvedConfiguration { .. })
    ));
}

// ============================================================================
// Classification
// ============================================================================

#[rstest]
#[case("class A { Q_OBJECT };", 4096, true)]
#[case("struct B { Q_GADGET };", 4096, true)]
#[case("class C { Q_OBJEC };", 4096, false)]
#[case("0123456789Q_OBJECT", 12, true)]
#[case("0123Q_GA|DGET", 7, false)]
fn test_marker_classification(#[case] body: &str, #[case] chunk: usize, #[case] expected: bool) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("file.h");
    fs::write(&path, body).unwrap();

    let scanner = MarkerScanner::qt().with_chunk_size(chunk);
    assert_eq!(scanner.scan_file(&path), expected);
}
