//! Property-based tests for the parser.
//!
//! Programs are assembled from a pool of valid and broken statements so that
//! recovery paths are exercised as often as the happy path.

use proptest::prelude::*;
use qfront_ast::{Ast, NodeId};
use qfront_diag::SourceId;
use qfront_parser::{ParseOptions, parse};

/// A mix of well-formed statements, broken ones and stray tokens.
fn arb_statement() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "qubit[2] q;",
        "bit[2] c;",
        "h q[0];",
        "cx q[0], q[1];",
        "c = measure q;",
        "measure q[0] -> c[0];",
        "rx(pi / 2) q[1];",
        "ctrl @ x q[0], q[1];",
        "angle[16] a = 0.25;",
        "float x = 1.5e3 * (2 + y);",
        "for int i in [0:3] { h q[i]; }",
        "if (c[0] == 1) { x q[0]; } else y q[0];",
        "while (x > 0) x -= 1;",
        "gate g(t) a, b { rz(t) a; cx a, b; }",
        "def f(qubit r) -> bit { return measure r; }",
        "delay[100ns] q;",
        "box { nop q; }",
        "// comment",
        "/* block */",
        // Broken input.
        "h q q;",
        "qubit;",
        "x = ;",
        ")",
        "}",
        "{",
        "(",
        "gate { }",
        "rx(0.5 q;",
        "\"open",
        "10xs;",
        "¤",
    ])
}

fn arb_program() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_statement(), 0..25).prop_map(|stmts| stmts.join("\n"))
}

/// Check that children sit inside their parent and follow each other in
/// source order.
fn check_spans(ast: &Ast, id: NodeId) -> Result<(), String> {
    let parent = ast.span(id);
    let mut prev_end = parent.start;
    for child in ast.children(id) {
        let span = ast.span(child);
        if span.start < parent.start || span.end > parent.end {
            return Err(format!("{child} {span:?} escapes parent {id} {parent:?}"));
        }
        if span.start < prev_end {
            return Err(format!("{child} {span:?} overlaps its previous sibling"));
        }
        prev_end = span.end;
        check_spans(ast, child)?;
    }
    Ok(())
}

proptest! {
    /// Parsing always terminates with a `Program` covering the whole input.
    #[test]
    fn test_program_covers_input(source in arb_program()) {
        let out = parse(&source, SourceId(0), &ParseOptions::default());
        let root = out.ast.span(out.ast.root());
        prop_assert_eq!(root.range(), 0..source.len());
    }

    /// Child spans nest inside parents and siblings do not overlap.
    #[test]
    fn test_spans_nest(source in arb_program()) {
        let out = parse(&source, SourceId(0), &ParseOptions::default());
        if let Err(message) = check_spans(&out.ast, out.ast.root()) {
            prop_assert!(false, "{}\n{}", message, out.ast.tree());
        }
    }

    /// The same input always yields the same tree and diagnostics.
    #[test]
    fn test_parse_is_deterministic(source in arb_program()) {
        let options = ParseOptions::default();
        let first = parse(&source, SourceId(0), &options);
        let second = parse(&source, SourceId(0), &options);
        prop_assert_eq!(first.ast.tree().to_string(), second.ast.tree().to_string());
        prop_assert_eq!(first.diagnostics, second.diagnostics);
    }

    /// Well-formed programs produce no diagnostics at all.
    #[test]
    fn test_valid_programs_are_clean(count in 1_usize..20) {
        let body = (0..count)
            .map(|i| format!("qubit q{i};\nh q{i};\nbit c{i} = measure q{i};"))
            .collect::<Vec<_>>()
            .join("\n");
        let source = format!("OPENQASM 3.0;\n{body}\n");
        let out = parse(&source, SourceId(0), &ParseOptions::default());
        prop_assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        prop_assert_eq!(out.ast.program_items().len(), 1 + 3 * count);
    }

    /// Arbitrary bytes never make the parser panic.
    #[test]
    fn test_arbitrary_text_does_not_panic(source in "[a-z0-9 ;{}()\\[\\]=+*\"@#$.,:\n-]{0,200}") {
        let out = parse(&source, SourceId(0), &ParseOptions::default());
        prop_assert_eq!(out.ast.span(out.ast.root()).range(), 0..source.len());
    }
}
