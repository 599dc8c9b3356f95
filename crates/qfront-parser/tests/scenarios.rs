//! Whole-program parser behaviour: tree shape, recovery and limits.

use pretty_assertions::assert_eq;
use qfront_ast::NodeKind;
use qfront_diag::{ErrorCode, SourceId};
use qfront_parser::{ParseOptions, ParseOutput, parse};

fn parse_str(source: &str) -> ParseOutput {
    parse(source, SourceId(0), &ParseOptions::default())
}

#[test]
fn test_minimal_program_tree() {
    let out = parse_str("OPENQASM 3.0; qubit[2] q; h q[0];");
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);

    let expected = "\
Program [0..33]
  VersionPragma 3.0 [0..13]
  QubitDecl [14..25]
    Literal 2 (integer) [20..21]
    Identifier q [23..24]
  GateCall [26..33]
    Identifier h [26..27]
    Index [28..32]
      Identifier q [28..29]
      Literal 0 (integer) [30..31]
";
    assert_eq!(out.ast.tree().to_string(), expected);
}

#[test]
fn test_unterminated_string_reports_once() {
    let source = "OPENQASM 3.0;\ninclude \"stdgates.inc;\nqubit q;\nh q;\n";
    let out = parse_str(source);

    assert_eq!(out.diagnostics.len(), 1, "{:#?}", out.diagnostics);
    let diagnostic = &out.diagnostics[0];
    assert_eq!(diagnostic.code, ErrorCode::LexicalError);
    let quote = source.find('"').unwrap();
    assert_eq!(diagnostic.span.start as usize, quote);

    // Lexing resumed on the next line.
    let tags: Vec<_> = out
        .ast
        .program_items()
        .iter()
        .map(|&id| out.ast.kind(id).tag())
        .collect();
    assert_eq!(tags, vec!["VersionPragma", "Error", "QubitDecl", "GateCall"]);
}

#[test]
fn test_duplicate_declaration_points_at_both() {
    let source = "qubit q;\nbit c;\nqubit q;\n";
    let out = parse_str(source);

    assert_eq!(out.diagnostics.len(), 1);
    let diagnostic = &out.diagnostics[0];
    assert_eq!(diagnostic.code, ErrorCode::DuplicateDeclaration);
    assert_eq!(diagnostic.span.range(), 22..23);
    assert_eq!(diagnostic.labels.len(), 1);
    assert_eq!(diagnostic.labels[0].span.range(), 6..7);
}

#[test]
fn test_deep_parentheses_hit_the_depth_limit_once() {
    let depth = 1000;
    let source = format!("x = {}1{};\nqubit q;\n", "(".repeat(depth), ")".repeat(depth));
    let out = parse_str(&source);

    assert_eq!(out.diagnostics.len(), 1, "{:#?}", out.diagnostics);
    assert_eq!(out.diagnostics[0].code, ErrorCode::MaxDepthExceeded);
    let tags: Vec<_> = out
        .ast
        .program_items()
        .iter()
        .map(|&id| out.ast.kind(id).tag())
        .collect();
    assert_eq!(tags, vec!["Error", "QubitDecl"]);
}

#[test]
fn test_deep_complex_components_hit_the_depth_limit_once() {
    let depth = 20_000;
    let source = format!(
        "{}float{} x;\nqubit q;\n",
        "complex[".repeat(depth),
        "]".repeat(depth)
    );
    let out = parse_str(&source);

    assert_eq!(out.diagnostics.len(), 1, "{:#?}", out.diagnostics);
    assert_eq!(out.diagnostics[0].code, ErrorCode::MaxDepthExceeded);
    let tags: Vec<_> = out
        .ast
        .program_items()
        .iter()
        .map(|&id| out.ast.kind(id).tag())
        .collect();
    assert_eq!(tags, vec!["Error", "QubitDecl"]);
}

#[test]
fn test_shallow_complex_component_parses() {
    let out = parse_str("complex[float[64]] z;\narray[complex[float], 2] zs;\n");
    assert!(out.diagnostics.is_empty(), "{:#?}", out.diagnostics);
}

#[test]
fn test_uppercase_octal_prefix() {
    let out = parse_str("int x = 0O17;\n");
    assert!(out.diagnostics.is_empty(), "{:#?}", out.diagnostics);
}

#[test]
fn test_deep_blocks_unwind_to_top_level() {
    let depth = 1000;
    let source = format!("{}h q;{}\nqubit q;\n", "{".repeat(depth), "}".repeat(depth));
    let out = parse_str(&source);

    assert_eq!(out.diagnostics.len(), 1, "{:#?}", out.diagnostics);
    assert_eq!(out.diagnostics[0].code, ErrorCode::MaxDepthExceeded);
    assert_eq!(out.ast.program_items().len(), 2);
}

#[test]
fn test_custom_depth_limit() {
    let options = ParseOptions {
        max_depth: 8,
        ..ParseOptions::default()
    };
    let shallow = parse("x = ((1));", SourceId(0), &options);
    assert!(shallow.diagnostics.is_empty());

    let deep = parse("x = ((((((((((1))))))))));", SourceId(0), &options);
    assert_eq!(deep.diagnostics.len(), 1);
    assert!(deep.diagnostics[0].message.contains("maximum depth of 8"));
}

#[test]
fn test_error_inside_block_keeps_the_block() {
    let source = "gate g a { h a; x a a; y a; }\nqubit q;\n";
    let out = parse_str(source);

    assert_eq!(out.diagnostics.len(), 1);
    let gate = out.ast.program_items()[0];
    let NodeKind::GateDef { body, .. } = out.ast.kind(gate) else {
        panic!("expected gate definition");
    };
    let NodeKind::Scope { items } = out.ast.kind(*body) else {
        panic!("expected scope");
    };
    let tags: Vec<_> = items.iter().map(|&id| out.ast.kind(id).tag()).collect();
    assert_eq!(tags, vec!["GateCall", "Error", "GateCall"]);
}

#[test]
fn test_comments_are_kept_out_of_the_tree() {
    let source = "// header\nqubit q; /* inline */ h q;\n";
    let out = parse_str(source);

    assert!(out.diagnostics.is_empty());
    assert_eq!(out.ast.comments().len(), 2);
    assert_eq!(out.ast.program_items().len(), 2);
}

#[test]
fn test_invalid_characters_are_one_diagnostic() {
    let out = parse_str("qubit q;\nh q ¤¤¤;\n");
    assert_eq!(out.diagnostics.len(), 1, "{:#?}", out.diagnostics);
    assert_eq!(out.diagnostics[0].code, ErrorCode::LexicalError);
}

#[test]
fn test_diagnostics_are_sorted_by_location() {
    let out = parse_str("qubit q;\nqubit q;\nh q q;\nbarrier q;\nx = ;\n");
    let starts: Vec<_> = out.diagnostics.iter().map(|d| d.span.start).collect();
    let mut sorted = starts.clone();
    sorted.sort_unstable();
    assert_eq!(starts, sorted);
    assert_eq!(out.diagnostics.len(), 3);
}
