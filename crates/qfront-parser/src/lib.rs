//! `OpenQASM` lexer and parser for qfront.
//!
//! Turns one source file into a [`qfront_ast::Ast`] plus every diagnostic
//! found along the way. Parsing never stops at the first error: a broken
//! statement becomes an `Error` node and the parser resumes at the next
//! statement boundary.
//!
//! # Example
//!
//! ```rust
//! use qfront_diag::SourceId;
//! use qfront_parser::{ParseOptions, parse};
//!
//! let source = r#"
//!     OPENQASM 3.0;
//!     qubit[2] q;
//!     h q[0];
//!     cx q[0] q[1];
//!     bit[2] c = measure q;
//! "#;
//!
//! let out = parse(source, SourceId(0), &ParseOptions::default());
//! assert_eq!(out.ast.program_items().len(), 5);
//! assert_eq!(out.diagnostics.len(), 1);
//! assert!(out.diagnostics[0].message.contains("expected `;`"));
//! ```

pub mod lexer;
mod parser;

pub use lexer::{LexErrorKind, Lexer, Token, TokenKind, tokenize};
pub use parser::{DEFAULT_MAX_DEPTH, DEFAULT_SUPPRESSION_WINDOW, ParseOptions, ParseOutput, parse};
