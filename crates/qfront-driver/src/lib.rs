//! Whole-program front-end for `OpenQASM` 2 and 3.
//!
//! The driver reads an entry file, parses it, follows its `include`
//! statements and returns a single [`CompilationUnit`]: the merged syntax
//! tree, every diagnostic from every file, and the source map the spans
//! point into.
//!
//! # Example
//!
//! ```rust
//! use qfront_diag::ErrorCode;
//! use qfront_driver::{FrontendConfig, compile_source};
//!
//! let source = "OPENQASM 3.0;\ninclude \"stdgates.inc\";\nqubit q;\nh q;\n";
//! let unit = compile_source("bell.qasm", source, &FrontendConfig::default()).unwrap();
//! assert!(!unit.has_errors());
//!
//! let missing = compile_source("bad.qasm", "include \"nope.inc\";", &FrontendConfig::default())
//!     .unwrap();
//! let codes: Vec<_> = missing.diagnostics().iter().map(|d| d.code).collect();
//! assert_eq!(codes, vec![ErrorCode::MissingVersion, ErrorCode::IncludeNotFound]);
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod resolve;

mod compile;
mod unit;

pub use compile::{compile, compile_many, compile_source};
pub use config::{ConfigError, FrontendConfig};
pub use error::{FrontendError, FrontendResult};
pub use graph::{IncludeEdge, IncludeGraph};
pub use resolve::{IncludeResolver, Resolved};
pub use unit::CompilationUnit;
