//! Syntax tree and numeric literals for `OpenQASM` 3.
//!
//! The tree is an arena: nodes live in a single `Vec` inside [`Ast`] and
//! refer to their children by [`NodeId`]. Trees are built bottom-up through
//! [`AstBuilder`], which checks the shape of every node in debug builds.
//!
//! Numeric literals keep the exact value written in the source. Nothing in
//! this crate goes through `f64`.
//!
//! ```rust
//! use qfront_ast::{LiteralKind, parse_literal};
//!
//! let lit = parse_literal("1.5e-300", LiteralKind::Float).unwrap();
//! assert_eq!(lit.to_string(), "15e-301");
//!
//! let delay = parse_literal("100ns", LiteralKind::Duration).unwrap();
//! assert_eq!(delay.unit().map(|u| u.as_str()), Some("ns"));
//! ```

pub mod ast;
pub mod literal;
pub mod node;

pub use ast::{Ast, AstBuilder, Tree, Walk};
pub use literal::{
    Decimal, LiteralError, LiteralKind, LiteralValue, NumericLiteral, TimeUnit, parse_literal,
    suffix_kind,
};
pub use node::{
    AssignOp, BinaryOp, Category, Constant, IoDirection, ModifierKind, Node, NodeId, NodeKind,
    RegisterKind, ScalarKind, UnaryOp,
};
