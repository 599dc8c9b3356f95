//! Diagnostics engine for the qfront `OpenQASM` 3 front-end.
//!
//! This crate is a pure data sink: it knows about source files, spans and
//! located diagnostics, and nothing about the grammar. Every phase owns a
//! [`Diagnostics`] buffer and returns it alongside its result.
//!
//! # Example
//!
//! ```rust
//! use qfront_diag::{Diagnostics, ErrorCode, SourceMap, Span, render_short};
//!
//! let mut map = SourceMap::new();
//! let id = map.add("main.qasm", "qubit q\n");
//!
//! let mut diags = Diagnostics::new();
//! diags.report(ErrorCode::SyntaxError, Span::new(id, 7, 8), "expected `;`");
//!
//! let sorted = diags.into_sorted();
//! assert_eq!(render_short(&sorted[0], &map), "main.qasm:1:8: error[Q0101]: expected `;`");
//! ```

mod bag;
mod code;
mod diagnostic;
mod render;
mod source_map;
mod span;

pub use bag::Diagnostics;
pub use code::ErrorCode;
pub use diagnostic::{Diagnostic, Fix, Label, Severity};
pub use render::{RenderOptions, render, render_all, render_short};
pub use source_map::{Location, SourceFile, SourceMap};
pub use span::{SourceId, Span};
