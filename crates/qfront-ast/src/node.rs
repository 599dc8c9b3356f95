//! Node kinds of the `OpenQASM` 3 syntax tree.
//!
//! Nodes refer to their children by [`NodeId`]; the nodes themselves live in
//! the [`Ast`](crate::Ast) arena.

use std::fmt;

use qfront_diag::Span;
use serde::Serialize;

use crate::literal::NumericLiteral;

/// Index of a node in its [`Ast`](crate::Ast).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Saturates at `u32::MAX`.
impl From<usize> for NodeId {
    fn from(id: usize) -> Self {
        NodeId(u32::try_from(id).unwrap_or(u32::MAX))
    }
}

/// A node: its kind and the source it was built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

/// Old-style register keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RegisterKind {
    QReg,
    CReg,
}

/// Direction of an `input`/`output` declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IoDirection {
    Input,
    Output,
}

/// Classical scalar type keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScalarKind {
    Bit,
    Int,
    Uint,
    Float,
    Angle,
    Bool,
    Duration,
    Stretch,
}

impl ScalarKind {
    pub const fn keyword(self) -> &'static str {
        match self {
            ScalarKind::Bit => "bit",
            ScalarKind::Int => "int",
            ScalarKind::Uint => "uint",
            ScalarKind::Float => "float",
            ScalarKind::Angle => "angle",
            ScalarKind::Bool => "bool",
            ScalarKind::Duration => "duration",
            ScalarKind::Stretch => "stretch",
        }
    }
}

/// Gate modifier keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModifierKind {
    Inv,
    Pow,
    Ctrl,
    NegCtrl,
}

/// Built-in mathematical constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Constant {
    Pi,
    Tau,
    Euler,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

impl UnaryOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        }
    }
}

/// Assignment operators, plain and compound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AssignOp {
    Assign,
    /// Compound form `lhs op= rhs`.
    Compound(BinaryOp),
}

/// Every kind of node in the tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeKind {
    // --- Program structure -------------------------------------------------
    Program { items: Vec<NodeId> },
    VersionPragma { major: u32, minor: Option<u32> },
    /// `include "path";`. `items` holds the included file's statements once
    /// the driver has merged it.
    Include { path: String, items: Vec<NodeId> },
    /// Marker left at an include that could not be resolved.
    IncludeError { path: String },
    CalibrationGrammar { name: String },
    Pragma { content: String },
    Annotation { keyword: String, content: Option<String> },
    Scope { items: Vec<NodeId> },

    // --- Declarations ------------------------------------------------------
    QubitDecl { name: NodeId, size: Option<NodeId> },
    RegisterDecl { register: RegisterKind, name: NodeId, size: Option<NodeId> },
    ClassicalDecl { ty: NodeId, name: NodeId, init: Option<NodeId> },
    ConstDecl { ty: NodeId, name: NodeId, init: NodeId },
    IoDecl { direction: IoDirection, ty: NodeId, name: NodeId },
    AliasDecl { name: NodeId, parts: Vec<NodeId> },
    GateDef { name: NodeId, params: Vec<NodeId>, qubits: Vec<NodeId>, body: NodeId },
    SubroutineDef { name: NodeId, params: Vec<NodeId>, return_ty: Option<NodeId>, body: NodeId },
    ExternDecl { name: NodeId, params: Vec<NodeId>, return_ty: Option<NodeId> },
    /// `opaque name(params) qubits;` from `OpenQASM` 2.
    OpaqueDecl { name: NodeId, params: Vec<NodeId>, qubits: Vec<NodeId> },
    /// Typed parameter of a `def`.
    Param { ty: NodeId, name: NodeId },

    // --- Quantum statements ------------------------------------------------
    GateCall {
        modifiers: Vec<NodeId>,
        callee: NodeId,
        args: Vec<NodeId>,
        duration: Option<NodeId>,
        operands: Vec<NodeId>,
    },
    GateModifier { modifier: ModifierKind, arg: Option<NodeId> },
    /// `measure q -> c;` or bare `measure q;`.
    MeasureArrow { measure: NodeId, target: Option<NodeId> },
    Reset { operand: NodeId },
    Barrier { operands: Vec<NodeId> },
    Delay { duration: NodeId, operands: Vec<NodeId> },
    Box { duration: Option<NodeId>, body: NodeId },
    Nop { operands: Vec<NodeId> },

    // --- Classical statements ----------------------------------------------
    Assignment { target: NodeId, op: AssignOp, value: NodeId },
    ExprStmt { expr: NodeId },
    Return { value: Option<NodeId> },
    Break,
    Continue,
    End,

    // --- Control flow ------------------------------------------------------
    If { condition: NodeId, then_branch: NodeId, else_branch: Option<NodeId> },
    /// `for [type] var in iterable body`; 3.0 programs may omit the type.
    For { ty: Option<NodeId>, var: NodeId, iterable: NodeId, body: NodeId },
    While { condition: NodeId, body: NodeId },
    Switch { subject: NodeId, cases: Vec<NodeId> },
    Case { values: Vec<NodeId>, body: NodeId },
    Default { body: NodeId },

    // --- Calibration -------------------------------------------------------
    /// `cal { ... }` with the raw body text.
    Cal { body: String },
    /// `defcal target(...) operands { ... }` with raw signature and body.
    Defcal { target: String, signature: String, body: String },

    // --- Types -------------------------------------------------------------
    ScalarType { scalar: ScalarKind, designator: Option<NodeId> },
    ComplexType { component: Option<NodeId> },
    QubitType { size: Option<NodeId> },
    RegisterType { register: RegisterKind, size: Option<NodeId> },
    ArrayType { element: NodeId, dims: Vec<NodeId> },
    /// `readonly`/`mutable array[T, ...]` or `array[T, #dim = n]`.
    ArrayRefType { mutable: bool, element: NodeId, dims: Vec<NodeId>, rank: Option<NodeId> },

    // --- Expressions -------------------------------------------------------
    Identifier { name: String },
    HardwareQubit { index: u32 },
    Literal(NumericLiteral),
    Bool { value: bool },
    Bitstring { bits: String },
    Constant { constant: Constant },
    Paren { inner: NodeId },
    Unary { op: UnaryOp, operand: NodeId },
    Binary { op: BinaryOp, lhs: NodeId, rhs: NodeId },
    Cast { ty: NodeId, operand: NodeId },
    Call { callee: NodeId, args: Vec<NodeId> },
    Index { base: NodeId, items: Vec<NodeId> },
    Range { start: Option<NodeId>, step: Option<NodeId>, end: Option<NodeId> },
    Set { elements: Vec<NodeId> },
    ArrayLiteral { elements: Vec<NodeId> },
    DurationOf { scope: NodeId },
    Measure { operand: NodeId },

    /// Placeholder for input that could not be parsed.
    Error,
}

/// Visit every child id in source order.
///
/// The same body serves `&NodeKind` and `&mut NodeKind` thanks to default
/// binding modes.
macro_rules! for_each_child {
    ($kind:expr, $visit:expr) => {{
        let mut visit = $visit;
        match $kind {
            NodeKind::Program { items }
            | NodeKind::Include { items, .. }
            | NodeKind::Scope { items } => {
                for c in items {
                    visit(c);
                }
            }
            // `qubit[n] q` puts the size first, `qreg q[n]` puts it last.
            NodeKind::QubitDecl { name, size } => {
                if let Some(c) = size {
                    visit(c);
                }
                visit(name);
            }
            NodeKind::RegisterDecl { name, size, .. } => {
                visit(name);
                if let Some(c) = size {
                    visit(c);
                }
            }
            NodeKind::ClassicalDecl { ty, name, init } => {
                visit(ty);
                visit(name);
                if let Some(c) = init {
                    visit(c);
                }
            }
            NodeKind::ConstDecl { ty, name, init } => {
                visit(ty);
                visit(name);
                visit(init);
            }
            NodeKind::IoDecl { ty, name, .. } | NodeKind::Param { ty, name } => {
                visit(ty);
                visit(name);
            }
            NodeKind::AliasDecl { name, parts } => {
                visit(name);
                for c in parts {
                    visit(c);
                }
            }
            NodeKind::GateDef {
                name,
                params,
                qubits,
                body,
            } => {
                visit(name);
                for c in params {
                    visit(c);
                }
                for c in qubits {
                    visit(c);
                }
                visit(body);
            }
            NodeKind::OpaqueDecl {
                name,
                params,
                qubits,
            } => {
                visit(name);
                for c in params {
                    visit(c);
                }
                for c in qubits {
                    visit(c);
                }
            }
            NodeKind::SubroutineDef {
                name,
                params,
                return_ty,
                body,
            } => {
                visit(name);
                for c in params {
                    visit(c);
                }
                if let Some(c) = return_ty {
                    visit(c);
                }
                visit(body);
            }
            NodeKind::ExternDecl {
                name,
                params,
                return_ty,
            } => {
                visit(name);
                for c in params {
                    visit(c);
                }
                if let Some(c) = return_ty {
                    visit(c);
                }
            }
            NodeKind::GateCall {
                modifiers,
                callee,
                args,
                duration,
                operands,
            } => {
                for c in modifiers {
                    visit(c);
                }
                visit(callee);
                for c in args {
                    visit(c);
                }
                if let Some(c) = duration {
                    visit(c);
                }
                for c in operands {
                    visit(c);
                }
            }
            NodeKind::GateModifier { arg, .. } => {
                if let Some(c) = arg {
                    visit(c);
                }
            }
            NodeKind::MeasureArrow { measure, target } => {
                visit(measure);
                if let Some(c) = target {
                    visit(c);
                }
            }
            NodeKind::Reset { operand } | NodeKind::Measure { operand } => visit(operand),
            NodeKind::Barrier { operands } | NodeKind::Nop { operands } => {
                for c in operands {
                    visit(c);
                }
            }
            NodeKind::Delay { duration, operands } => {
                visit(duration);
                for c in operands {
                    visit(c);
                }
            }
            NodeKind::Box { duration, body } => {
                if let Some(c) = duration {
                    visit(c);
                }
                visit(body);
            }
            NodeKind::Assignment { target, value, .. } => {
                visit(target);
                visit(value);
            }
            NodeKind::ExprStmt { expr } => visit(expr),
            NodeKind::Return { value } => {
                if let Some(c) = value {
                    visit(c);
                }
            }
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                visit(condition);
                visit(then_branch);
                if let Some(c) = else_branch {
                    visit(c);
                }
            }
            NodeKind::For {
                ty,
                var,
                iterable,
                body,
            } => {
                if let Some(c) = ty {
                    visit(c);
                }
                visit(var);
                visit(iterable);
                visit(body);
            }
            NodeKind::While { condition, body } => {
                visit(condition);
                visit(body);
            }
            NodeKind::Switch { subject, cases } => {
                visit(subject);
                for c in cases {
                    visit(c);
                }
            }
            NodeKind::Case { values, body } => {
                for c in values {
                    visit(c);
                }
                visit(body);
            }
            NodeKind::Default { body } => visit(body),
            NodeKind::ScalarType { designator, .. } => {
                if let Some(c) = designator {
                    visit(c);
                }
            }
            NodeKind::ComplexType { component } => {
                if let Some(c) = component {
                    visit(c);
                }
            }
            NodeKind::QubitType { size } | NodeKind::RegisterType { size, .. } => {
                if let Some(c) = size {
                    visit(c);
                }
            }
            NodeKind::ArrayType { element, dims } => {
                visit(element);
                for c in dims {
                    visit(c);
                }
            }
            NodeKind::ArrayRefType {
                element,
                dims,
                rank,
                ..
            } => {
                visit(element);
                for c in dims {
                    visit(c);
                }
                if let Some(c) = rank {
                    visit(c);
                }
            }
            NodeKind::Paren { inner } => visit(inner),
            NodeKind::Unary { operand, .. } => visit(operand),
            NodeKind::Binary { lhs, rhs, .. } => {
                visit(lhs);
                visit(rhs);
            }
            NodeKind::Cast { ty, operand } => {
                visit(ty);
                visit(operand);
            }
            NodeKind::Call { callee, args } => {
                visit(callee);
                for c in args {
                    visit(c);
                }
            }
            NodeKind::Index { base, items } => {
                visit(base);
                for c in items {
                    visit(c);
                }
            }
            NodeKind::Range { start, step, end } => {
                if let Some(c) = start {
                    visit(c);
                }
                if let Some(c) = step {
                    visit(c);
                }
                if let Some(c) = end {
                    visit(c);
                }
            }
            NodeKind::Set { elements } | NodeKind::ArrayLiteral { elements } => {
                for c in elements {
                    visit(c);
                }
            }
            NodeKind::DurationOf { scope } => visit(scope),
            NodeKind::VersionPragma { .. }
            | NodeKind::IncludeError { .. }
            | NodeKind::CalibrationGrammar { .. }
            | NodeKind::Pragma { .. }
            | NodeKind::Annotation { .. }
            | NodeKind::Break
            | NodeKind::Continue
            | NodeKind::End
            | NodeKind::Cal { .. }
            | NodeKind::Defcal { .. }
            | NodeKind::Identifier { .. }
            | NodeKind::HardwareQubit { .. }
            | NodeKind::Literal(_)
            | NodeKind::Bool { .. }
            | NodeKind::Bitstring { .. }
            | NodeKind::Constant { .. }
            | NodeKind::Error => {}
        }
    }};
}

/// Broad syntactic category of a node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Statement,
    Expression,
    Type,
    /// Helper nodes that only appear inside a specific parent
    /// (modifiers, parameters, cases, ranges, sets).
    Part,
    /// The program root.
    Root,
    /// Error placeholders fit anywhere.
    Error,
}

impl NodeKind {
    /// Child ids in source order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for_each_child!(self, |c: &NodeId| out.push(*c));
        out
    }

    /// Apply `f` to every child id in place.
    pub fn map_children(&mut self, mut f: impl FnMut(NodeId) -> NodeId) {
        for_each_child!(self, |c: &mut NodeId| *c = f(*c));
    }

    pub fn category(&self) -> Category {
        match self {
            NodeKind::Program { .. } => Category::Root,
            NodeKind::Error => Category::Error,
            NodeKind::ScalarType { .. }
            | NodeKind::ComplexType { .. }
            | NodeKind::QubitType { .. }
            | NodeKind::RegisterType { .. }
            | NodeKind::ArrayType { .. }
            | NodeKind::ArrayRefType { .. } => Category::Type,
            NodeKind::Identifier { .. }
            | NodeKind::HardwareQubit { .. }
            | NodeKind::Literal(_)
            | NodeKind::Bool { .. }
            | NodeKind::Bitstring { .. }
            | NodeKind::Constant { .. }
            | NodeKind::Paren { .. }
            | NodeKind::Unary { .. }
            | NodeKind::Binary { .. }
            | NodeKind::Cast { .. }
            | NodeKind::Call { .. }
            | NodeKind::Index { .. }
            | NodeKind::ArrayLiteral { .. }
            | NodeKind::DurationOf { .. }
            | NodeKind::Measure { .. } => Category::Expression,
            NodeKind::GateModifier { .. }
            | NodeKind::Param { .. }
            | NodeKind::Case { .. }
            | NodeKind::Default { .. }
            | NodeKind::Range { .. }
            | NodeKind::Set { .. } => Category::Part,
            _ => Category::Statement,
        }
    }

    pub fn is_expression(&self) -> bool {
        matches!(self.category(), Category::Expression | Category::Error)
    }

    pub fn is_statement(&self) -> bool {
        matches!(self.category(), Category::Statement | Category::Error)
    }

    pub fn is_type(&self) -> bool {
        matches!(self.category(), Category::Type | Category::Error)
    }

    /// Short tag used by the tree printer and log output.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Program { .. } => "Program",
            NodeKind::VersionPragma { .. } => "VersionPragma",
            NodeKind::Include { .. } => "Include",
            NodeKind::IncludeError { .. } => "IncludeError",
            NodeKind::CalibrationGrammar { .. } => "CalibrationGrammar",
            NodeKind::Pragma { .. } => "Pragma",
            NodeKind::Annotation { .. } => "Annotation",
            NodeKind::Scope { .. } => "Scope",
            NodeKind::QubitDecl { .. } => "QubitDecl",
            NodeKind::RegisterDecl { .. } => "RegisterDecl",
            NodeKind::ClassicalDecl { .. } => "ClassicalDecl",
            NodeKind::ConstDecl { .. } => "ConstDecl",
            NodeKind::IoDecl { .. } => "IoDecl",
            NodeKind::AliasDecl { .. } => "AliasDecl",
            NodeKind::GateDef { .. } => "GateDef",
            NodeKind::SubroutineDef { .. } => "SubroutineDef",
            NodeKind::ExternDecl { .. } => "ExternDecl",
            NodeKind::OpaqueDecl { .. } => "OpaqueDecl",
            NodeKind::Param { .. } => "Param",
            NodeKind::GateCall { .. } => "GateCall",
            NodeKind::GateModifier { .. } => "GateModifier",
            NodeKind::MeasureArrow { .. } => "MeasureArrow",
            NodeKind::Reset { .. } => "Reset",
            NodeKind::Barrier { .. } => "Barrier",
            NodeKind::Delay { .. } => "Delay",
            NodeKind::Box { .. } => "Box",
            NodeKind::Nop { .. } => "Nop",
            NodeKind::Assignment { .. } => "Assignment",
            NodeKind::ExprStmt { .. } => "ExprStmt",
            NodeKind::Return { .. } => "Return",
            NodeKind::Break => "Break",
            NodeKind::Continue => "Continue",
            NodeKind::End => "End",
            NodeKind::If { .. } => "If",
            NodeKind::For { .. } => "For",
            NodeKind::While { .. } => "While",
            NodeKind::Switch { .. } => "Switch",
            NodeKind::Case { .. } => "Case",
            NodeKind::Default { .. } => "Default",
            NodeKind::Cal { .. } => "Cal",
            NodeKind::Defcal { .. } => "Defcal",
            NodeKind::ScalarType { .. } => "ScalarType",
            NodeKind::ComplexType { .. } => "ComplexType",
            NodeKind::QubitType { .. } => "QubitType",
            NodeKind::RegisterType { .. } => "RegisterType",
            NodeKind::ArrayType { .. } => "ArrayType",
            NodeKind::ArrayRefType { .. } => "ArrayRefType",
            NodeKind::Identifier { .. } => "Identifier",
            NodeKind::HardwareQubit { .. } => "HardwareQubit",
            NodeKind::Literal(_) => "Literal",
            NodeKind::Bool { .. } => "Bool",
            NodeKind::Bitstring { .. } => "Bitstring",
            NodeKind::Constant { .. } => "Constant",
            NodeKind::Paren { .. } => "Paren",
            NodeKind::Unary { .. } => "Unary",
            NodeKind::Binary { .. } => "Binary",
            NodeKind::Cast { .. } => "Cast",
            NodeKind::Call { .. } => "Call",
            NodeKind::Index { .. } => "Index",
            NodeKind::Range { .. } => "Range",
            NodeKind::Set { .. } => "Set",
            NodeKind::ArrayLiteral { .. } => "ArrayLiteral",
            NodeKind::DurationOf { .. } => "DurationOf",
            NodeKind::Measure { .. } => "Measure",
            NodeKind::Error => "Error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_in_source_order() {
        let call = NodeKind::GateCall {
            modifiers: vec![NodeId(0)],
            callee: NodeId(1),
            args: vec![NodeId(2)],
            duration: Some(NodeId(3)),
            operands: vec![NodeId(4), NodeId(5)],
        };
        assert_eq!(
            call.children(),
            (0..6).map(NodeId).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_map_children_rewrites_every_reference() {
        let mut kind = NodeKind::If {
            condition: NodeId(1),
            then_branch: NodeId(2),
            else_branch: Some(NodeId(3)),
        };
        kind.map_children(|id| NodeId(id.0 + 10));
        assert_eq!(kind.children(), vec![NodeId(11), NodeId(12), NodeId(13)]);
    }

    #[test]
    fn test_categories() {
        assert!(NodeKind::Break.is_statement());
        assert!(NodeKind::Bool { value: true }.is_expression());
        assert!(NodeKind::Error.is_expression() && NodeKind::Error.is_statement());
        assert!(!NodeKind::Identifier { name: "q".into() }.is_statement());
        assert!(NodeKind::QubitType { size: None }.is_type());
    }
}
