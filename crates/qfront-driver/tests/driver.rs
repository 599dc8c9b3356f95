//! End-to-end driver behaviour on real files.

use std::path::Path;

use pretty_assertions::assert_eq;
use qfront_ast::NodeKind;
use qfront_diag::{ErrorCode, RenderOptions, Severity};
use qfront_driver::{CompilationUnit, FrontendConfig, FrontendError, compile, compile_many};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, text: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, text).unwrap();
}

fn codes(unit: &CompilationUnit) -> Vec<ErrorCode> {
    unit.diagnostics().iter().map(|d| d.code).collect()
}

fn top_level_tags(unit: &CompilationUnit) -> Vec<&'static str> {
    let ast = unit.ast();
    ast.program_items().iter().map(|&id| ast.kind(id).tag()).collect()
}

fn include_items(unit: &CompilationUnit, index: usize) -> Vec<&'static str> {
    let ast = unit.ast();
    let id = ast.program_items()[index];
    match ast.kind(id) {
        NodeKind::Include { items, .. } => items.iter().map(|&i| ast.kind(i).tag()).collect(),
        other => panic!("expected Include, found {}", other.tag()),
    }
}

#[test]
fn test_missing_include_keeps_partial_tree() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "main.qasm",
        "qubit q;\ninclude \"nonexistent.qasm\";\nh q;\n",
    );

    let unit = compile(dir.path().join("main.qasm"), &FrontendConfig::default()).unwrap();

    assert_eq!(
        codes(&unit),
        vec![ErrorCode::MissingVersion, ErrorCode::IncludeNotFound]
    );
    let missing = &unit.diagnostics()[1];
    assert_eq!(missing.severity, Severity::Error);
    assert_eq!(missing.message, "cannot find include file `nonexistent.qasm`");
    assert_eq!(missing.span.range(), 9..36);

    assert_eq!(
        top_level_tags(&unit),
        vec!["QubitDecl", "IncludeError", "GateCall"]
    );
}

#[test]
fn test_include_relative_to_including_file() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "main.qasm",
        "OPENQASM 3.0;\ninclude \"lib/defs.inc\";\nqubit q;\n",
    );
    write(dir.path(), "lib/defs.inc", "include \"more.inc\";\ngate g a { }\n");
    write(dir.path(), "lib/more.inc", "gate k a { }\n");

    let unit = compile(dir.path().join("main.qasm"), &FrontendConfig::default()).unwrap();

    assert!(unit.diagnostics().is_empty(), "{:?}", unit.diagnostics());
    assert_eq!(unit.sources().len(), 3);
    assert_eq!(unit.includes().include_count(), 2);
    assert_eq!(include_items(&unit, 1), vec!["Include", "GateDef"]);

    // Nodes from included files keep pointing at their own source.
    let ast = unit.ast();
    let gate_sources: Vec<_> = ast
        .descendants()
        .filter(|&id| matches!(ast.kind(id), NodeKind::GateDef { .. }))
        .map(|id| ast.span(id).source)
        .collect();
    assert_eq!(gate_sources.len(), 2);
    assert!(gate_sources.iter().all(|&s| s != unit.entry()));
}

#[test]
fn test_include_search_paths() {
    let project = TempDir::new().unwrap();
    let lib = TempDir::new().unwrap();
    write(project.path(), "main.qasm", "OPENQASM 3;\ninclude \"gates.inc\";\n");
    write(lib.path(), "gates.inc", "gate g a { }\n");

    let without = compile(project.path().join("main.qasm"), &FrontendConfig::default()).unwrap();
    assert_eq!(codes(&without), vec![ErrorCode::IncludeNotFound]);

    let config = FrontendConfig {
        include_paths: vec![lib.path().to_path_buf()],
        ..FrontendConfig::default()
    };
    let with = compile(project.path().join("main.qasm"), &config).unwrap();
    assert!(with.diagnostics().is_empty(), "{:?}", with.diagnostics());
    assert_eq!(include_items(&with, 1), vec!["GateDef"]);
}

#[test]
fn test_builtin_standard_library() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "main.qasm",
        "OPENQASM 3.0;\ninclude \"stdgates.inc\";\nqubit[2] q;\nh q[0];\ncx q[0], q[1];\n",
    );

    let unit = compile(dir.path().join("main.qasm"), &FrontendConfig::default()).unwrap();
    assert!(unit.diagnostics().is_empty(), "{:?}", unit.diagnostics());
    let gates = include_items(&unit, 1);
    assert!(gates.len() > 20);
    assert!(gates.iter().all(|&tag| tag == "GateDef"));

    let config = FrontendConfig {
        embedded_includes: false,
        ..FrontendConfig::default()
    };
    let unit = compile(dir.path().join("main.qasm"), &config).unwrap();
    assert_eq!(codes(&unit), vec![ErrorCode::IncludeNotFound]);
}

#[test]
fn test_openqasm2_header() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "main.qasm",
        "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\ncreg c[2];\nh q[0];\ncx q[0],q[1];\nmeasure q -> c;\n",
    );

    let unit = compile(dir.path().join("main.qasm"), &FrontendConfig::default()).unwrap();
    assert!(unit.diagnostics().is_empty(), "{:?}", unit.diagnostics());
}

#[test]
fn test_include_cycle_reported_once() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.qasm", "OPENQASM 3;\ninclude \"a.inc\";\n");
    write(dir.path(), "a.inc", "include \"b.inc\";\ngate ga q { }\n");
    write(dir.path(), "b.inc", "include \"a.inc\";\ngate gb q { }\n");

    let unit = compile(dir.path().join("main.qasm"), &FrontendConfig::default()).unwrap();

    assert_eq!(codes(&unit), vec![ErrorCode::IncludeCycle]);
    let cycle = &unit.diagnostics()[0];
    let b = unit
        .sources()
        .files()
        .find(|f| f.name().ends_with("b.inc"))
        .unwrap();
    assert_eq!(cycle.span.source, b.id());
    assert_eq!(cycle.span.range(), 0..16);

    // main -> a -> b, with b's include of a cut.
    let ast = unit.ast();
    let cut = ast
        .descendants()
        .filter(|&id| matches!(ast.kind(id), NodeKind::IncludeError { .. }))
        .count();
    assert_eq!(cut, 1);
}

#[test]
fn test_self_include() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "main.qasm",
        "OPENQASM 3;\ninclude \"main.qasm\";\nqubit q;\n",
    );

    let unit = compile(dir.path().join("main.qasm"), &FrontendConfig::default()).unwrap();
    assert_eq!(codes(&unit), vec![ErrorCode::IncludeCycle]);
    assert_eq!(unit.sources().len(), 1);
    assert_eq!(top_level_tags(&unit), vec!["VersionPragma", "IncludeError", "QubitDecl"]);
}

#[test]
fn test_diamond_includes_are_not_cycles() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "main.qasm",
        "OPENQASM 3;\ninclude \"a.inc\";\ninclude \"b.inc\";\n",
    );
    write(dir.path(), "a.inc", "include \"common.inc\";\n");
    write(dir.path(), "b.inc", "include \"common.inc\";\n");
    write(dir.path(), "common.inc", "gate c q { }\n");

    let unit = compile(dir.path().join("main.qasm"), &FrontendConfig::default()).unwrap();
    assert!(unit.diagnostics().is_empty(), "{:?}", unit.diagnostics());
    assert_eq!(unit.sources().len(), 4);
    assert_eq!(include_items(&unit, 1), vec!["Include"]);
    assert_eq!(include_items(&unit, 2), vec!["Include"]);
}

#[test]
fn test_errors_in_included_files_are_located_there() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.qasm", "OPENQASM 3;\ninclude \"bad.inc\";\n");
    write(dir.path(), "bad.inc", "gate g q { h q q; }\n");

    let unit = compile(dir.path().join("main.qasm"), &FrontendConfig::default()).unwrap();
    assert_eq!(codes(&unit), vec![ErrorCode::SyntaxError]);
    let diagnostic = &unit.diagnostics()[0];
    let file = unit.sources().get(diagnostic.span.source).unwrap();
    assert!(file.name().ends_with("bad.inc"));

    let rendered = unit.render(RenderOptions { color: false });
    assert!(rendered.contains("bad.inc"), "{rendered}");
}

#[test]
fn test_version_checks() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "v4.qasm", "OPENQASM 4.0;\nqubit q;\n");
    write(dir.path(), "v31.qasm", "OPENQASM 3.1;\nqubit q;\n");
    write(dir.path(), "none.qasm", "qubit q;\n");

    let config = FrontendConfig::default();
    let v4 = compile(dir.path().join("v4.qasm"), &config).unwrap();
    assert_eq!(codes(&v4), vec![ErrorCode::VersionMismatch]);
    assert_eq!(v4.diagnostics()[0].span.range(), 0..13);

    let v31 = compile(dir.path().join("v31.qasm"), &config).unwrap();
    assert!(v31.diagnostics().is_empty());

    let none = compile(dir.path().join("none.qasm"), &config).unwrap();
    assert_eq!(codes(&none), vec![ErrorCode::MissingVersion]);
    assert!(!none.has_errors());
    assert_eq!(none.diagnostics()[0].span.range(), 0..0);
}

#[test]
fn test_late_pragma_does_not_count_as_version() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "late.qasm", "qubit q;\nOPENQASM 3.0;\n");

    let unit = compile(dir.path().join("late.qasm"), &FrontendConfig::default()).unwrap();
    let found = codes(&unit);
    assert_eq!(found.len(), 2, "{:?}", unit.diagnostics());
    assert!(found.contains(&ErrorCode::MissingVersion));
    assert!(found.contains(&ErrorCode::SyntaxError));
}

#[test]
fn test_includes_follow_the_program_version() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.qasm", "OPENQASM 2.0;\ninclude \"regs.inc\";\n");
    write(dir.path(), "regs.inc", "qreg q[2];\ncreg c[2];\ndef f() { }\n");

    let unit = compile(dir.path().join("main.qasm"), &FrontendConfig::default()).unwrap();
    assert_eq!(codes(&unit), vec![ErrorCode::UnsupportedFeature]);
    let diagnostic = &unit.diagnostics()[0];
    assert!(diagnostic.message.contains("OpenQASM 2.0"), "{}", diagnostic.message);
    let file = unit.sources().get(diagnostic.span.source).unwrap();
    assert!(file.name().ends_with("regs.inc"));
}

#[test]
fn test_include_with_own_pragma_keeps_it() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.qasm", "OPENQASM 2.0;\ninclude \"v3.inc\";\n");
    write(dir.path(), "v3.inc", "OPENQASM 3.0;\nqreg q[2];\n");

    let unit = compile(dir.path().join("main.qasm"), &FrontendConfig::default()).unwrap();
    assert_eq!(codes(&unit), vec![ErrorCode::SemanticWarning]);
}

#[test]
fn test_redeclaration_across_files() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "main.qasm",
        "OPENQASM 3;\ninclude \"defs.inc\";\ngate g a { }\nqubit q;\n",
    );
    write(dir.path(), "defs.inc", "gate g a { }\nqubit q;\n");

    let unit = compile(dir.path().join("main.qasm"), &FrontendConfig::default()).unwrap();
    assert_eq!(
        codes(&unit),
        vec![ErrorCode::DuplicateDeclaration, ErrorCode::DuplicateDeclaration]
    );

    let entry = unit.entry();
    let gate = &unit.diagnostics()[0];
    assert_eq!(gate.span.source, entry);
    assert_eq!(gate.span.range(), 37..38);
    assert_eq!(gate.labels.len(), 1);
    assert_ne!(gate.labels[0].span.source, entry);
    assert_eq!(gate.labels[0].span.range(), 5..6);

    let qubit = &unit.diagnostics()[1];
    assert_eq!(qubit.span.range(), 51..52);
    assert_eq!(qubit.labels[0].span.range(), 19..20);
}

#[test]
fn test_redeclaration_between_sibling_includes() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "main.qasm",
        "OPENQASM 3;\ninclude \"a.inc\";\ninclude \"b.inc\";\n",
    );
    write(dir.path(), "a.inc", "qubit q;\n");
    write(dir.path(), "b.inc", "bit c;\nqubit q;\n");

    let unit = compile(dir.path().join("main.qasm"), &FrontendConfig::default()).unwrap();
    assert_eq!(codes(&unit), vec![ErrorCode::DuplicateDeclaration]);
    let diagnostic = &unit.diagnostics()[0];
    let file = unit.sources().get(diagnostic.span.source).unwrap();
    assert!(file.name().ends_with("b.inc"));
    assert_eq!(diagnostic.span.range(), 13..14);
}

#[test]
fn test_error_limit() {
    let dir = TempDir::new().unwrap();
    let body: String = (0..10)
        .map(|i| format!("include \"missing{i}.inc\";\n"))
        .collect();
    write(dir.path(), "main.qasm", &format!("OPENQASM 3;\n{body}"));

    let config = FrontendConfig {
        error_limit: 3,
        ..FrontendConfig::default()
    };
    let unit = compile(dir.path().join("main.qasm"), &config).unwrap();
    assert_eq!(unit.error_count(), 3);
    let last = unit.diagnostics().last().unwrap();
    assert_eq!(last.code, ErrorCode::ErrorLimitReached);
    assert!(last.message.contains("7 more"), "{}", last.message);
}

#[test]
fn test_unreadable_entry_is_fatal() {
    let dir = TempDir::new().unwrap();
    let err = compile(dir.path().join("absent.qasm"), &FrontendConfig::default()).unwrap_err();
    assert!(matches!(err, FrontendError::Io { .. }));

    std::fs::write(dir.path().join("binary.qasm"), b"qubit q;\n\xfe\xff").unwrap();
    let err = compile(dir.path().join("binary.qasm"), &FrontendConfig::default()).unwrap_err();
    assert!(matches!(err, FrontendError::NotUtf8 { offset: 9, .. }));
}

#[test]
fn test_non_utf8_include_is_fatal() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.qasm", "OPENQASM 3;\ninclude \"bin.inc\";\n");
    std::fs::write(dir.path().join("bin.inc"), b"\xc3\x28").unwrap();

    let err = compile(dir.path().join("main.qasm"), &FrontendConfig::default()).unwrap_err();
    match err {
        FrontendError::NotUtf8 { path, offset } => {
            assert!(path.ends_with("bin.inc"));
            assert_eq!(offset, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_compile_many_keeps_order() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "one.qasm", "OPENQASM 3;\nqubit a;\n");
    write(dir.path(), "two.qasm", "OPENQASM 3;\nqubit b;\nqubit c;\n");
    let paths = vec![
        dir.path().join("one.qasm"),
        dir.path().join("missing.qasm"),
        dir.path().join("two.qasm"),
    ];

    let results = compile_many(&paths, &FrontendConfig::default());
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().ast().program_items().len(), 2);
    assert!(results[1].is_err());
    assert_eq!(results[2].as_ref().unwrap().ast().program_items().len(), 3);
}

#[test]
fn test_config_file_round_trip() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "qfront.yaml",
        "include_paths:\n  - vendor\nmax_depth: 32\nerror_limit: 2\n",
    );
    let config = FrontendConfig::from_file(dir.path().join("qfront.yaml")).unwrap();
    assert_eq!(config.max_depth, 32);
    assert_eq!(config.error_limit, 2);
    assert_eq!(config.include_paths, vec![Path::new("vendor").to_path_buf()]);

    assert!(FrontendConfig::from_file(dir.path().join("nope.yaml")).is_err());
}
