//! The node arena and its builder.

use std::fmt;

use qfront_diag::Span;
use serde::Serialize;

use crate::node::{AssignOp, Node, NodeId, NodeKind};

/// A parsed program: an arena of nodes rooted at a `Program` node.
///
/// Children are always pushed before their parent, and every node except the
/// root has exactly one parent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
    /// Spans of comments, in source order.
    comments: Vec<Span>,
}

impl Ast {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId::from(i), n))
    }

    pub fn comments(&self) -> &[Span] {
        &self.comments
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id).children()
    }

    /// Top-level statements of the program.
    pub fn program_items(&self) -> &[NodeId] {
        match self.kind(self.root) {
            NodeKind::Program { items } => items,
            _ => &[],
        }
    }

    /// Pre-order walk starting at `id`.
    pub fn walk(&self, id: NodeId) -> Walk<'_> {
        Walk {
            ast: self,
            stack: vec![id],
        }
    }

    /// Every node reachable from the root, in pre-order.
    pub fn descendants(&self) -> Walk<'_> {
        self.walk(self.root)
    }

    /// Parent of every reachable node, indexed by node id.
    pub fn parents(&self) -> Vec<Option<NodeId>> {
        let mut parents = vec![None; self.nodes.len()];
        for id in self.descendants() {
            for child in self.children(id) {
                parents[child.index()] = Some(id);
            }
        }
        parents
    }

    /// Copy `other` into this arena under the `Include` node `at`.
    ///
    /// The top-level statements of `other` become the include's items; its
    /// `Program` root is not copied. Spans are kept as they are, so merged
    /// nodes still point at the file they came from.
    pub fn graft(&mut self, at: NodeId, other: &Ast) {
        let offset = self.nodes.len();
        let skipped = other.root.index();
        let remap = |id: NodeId| {
            let i = id.index();
            debug_assert_ne!(i, skipped, "program root cannot be a child");
            NodeId::from(offset + if i > skipped { i - 1 } else { i })
        };

        self.nodes.reserve(other.nodes.len().saturating_sub(1));
        for (i, node) in other.nodes.iter().enumerate() {
            if i == skipped {
                continue;
            }
            let mut kind = node.kind.clone();
            kind.map_children(remap);
            self.nodes.push(Node {
                kind,
                span: node.span,
            });
        }
        let items: Vec<NodeId> = other.program_items().iter().map(|&id| remap(id)).collect();

        match &mut self.nodes[at.index()].kind {
            NodeKind::Include { items: slot, .. } => {
                debug_assert!(slot.is_empty(), "include grafted twice");
                *slot = items;
            }
            other => debug_assert!(false, "graft target is {}, not Include", other.tag()),
        }
        self.comments.extend_from_slice(&other.comments);
    }

    /// Replace the `Include` node `at` with an `IncludeError` marker for a
    /// file that could not be loaded.
    pub fn mark_include_error(&mut self, at: NodeId) {
        let node = &mut self.nodes[at.index()];
        if let NodeKind::Include { path, items } = &mut node.kind {
            debug_assert!(items.is_empty(), "include already grafted");
            let path = std::mem::take(path);
            node.kind = NodeKind::IncludeError { path };
        }
    }

    /// Indented, one-node-per-line rendering of the tree.
    pub fn tree(&self) -> Tree<'_> {
        Tree(self)
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, id: NodeId, depth: usize) -> fmt::Result {
        let node = self.node(id);
        writeln!(
            f,
            "{:indent$}{} [{}..{}]",
            "",
            NodeLabel(&node.kind),
            node.span.start,
            node.span.end,
            indent = depth * 2
        )?;
        for child in node.kind.children() {
            self.write_tree(f, child, depth + 1)?;
        }
        Ok(())
    }
}

/// Display adapter returned by [`Ast::tree`].
pub struct Tree<'a>(&'a Ast);

impl fmt::Display for Tree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.write_tree(f, self.0.root, 0)
    }
}

/// Pre-order iterator over a subtree.
pub struct Walk<'a> {
    ast: &'a Ast,
    stack: Vec<NodeId>,
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let children = self.ast.children(id);
        self.stack.extend(children.into_iter().rev());
        Some(id)
    }
}

struct NodeLabel<'a>(&'a NodeKind);

impl fmt::Display for NodeLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.0;
        f.write_str(kind.tag())?;
        match kind {
            NodeKind::VersionPragma { major, minor } => match minor {
                Some(minor) => write!(f, " {major}.{minor}"),
                None => write!(f, " {major}"),
            },
            NodeKind::Include { path, .. } | NodeKind::IncludeError { path } => {
                write!(f, " {path:?}")
            }
            NodeKind::CalibrationGrammar { name } => write!(f, " {name:?}"),
            NodeKind::Pragma { content } => write!(f, " {content:?}"),
            NodeKind::Annotation { keyword, .. } => write!(f, " @{keyword}"),
            NodeKind::RegisterDecl { register, .. } | NodeKind::RegisterType { register, .. } => {
                write!(f, " {register:?}")
            }
            NodeKind::IoDecl { direction, .. } => write!(f, " {direction:?}"),
            NodeKind::GateModifier { modifier, .. } => write!(f, " {modifier:?}"),
            NodeKind::Assignment { op, .. } => match op {
                AssignOp::Assign => f.write_str(" ="),
                AssignOp::Compound(op) => write!(f, " {}=", op.symbol()),
            },
            NodeKind::Defcal { target, .. } => write!(f, " {target}"),
            NodeKind::ScalarType { scalar, .. } => write!(f, " {}", scalar.keyword()),
            NodeKind::ArrayRefType { mutable, .. } => {
                f.write_str(if *mutable { " mutable" } else { " readonly" })
            }
            NodeKind::Identifier { name } => write!(f, " {name}"),
            NodeKind::HardwareQubit { index } => write!(f, " ${index}"),
            NodeKind::Literal(lit) => write!(f, " {lit} ({})", lit.kind()),
            NodeKind::Bool { value } => write!(f, " {value}"),
            NodeKind::Bitstring { bits } => write!(f, " \"{bits}\""),
            NodeKind::Constant { constant } => write!(f, " {constant:?}"),
            NodeKind::Unary { op, .. } => write!(f, " {}", op.symbol()),
            NodeKind::Binary { op, .. } => write!(f, " {}", op.symbol()),
            _ => Ok(()),
        }
    }
}

/// Incremental construction of an [`Ast`].
///
/// `push` checks, in debug builds, that every child exists, has no parent
/// yet, and is of a kind its new parent accepts. A failure is a bug in the
/// caller, not a problem with the input program.
#[derive(Debug, Default)]
pub struct AstBuilder {
    nodes: Vec<Node>,
    parents: Vec<Option<NodeId>>,
    comments: Vec<Span>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId::from(self.nodes.len());
        for child in kind.children() {
            debug_assert!(
                child < id,
                "{} references unknown node {child}",
                kind.tag()
            );
            debug_assert!(
                self.parents[child.index()].is_none(),
                "node {child} already has a parent"
            );
            self.parents[child.index()] = Some(id);
        }
        debug_assert!(
            self.children_fit(&kind),
            "{} has a child of the wrong kind",
            kind.tag()
        );
        self.nodes.push(Node { kind, span });
        self.parents.push(None);
        id
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.index()].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current arena size, for a later [`truncate`](Self::truncate).
    pub fn mark(&self) -> usize {
        self.nodes.len()
    }

    /// Drop every node pushed since `mark`.
    pub fn truncate(&mut self, mark: usize) {
        for node in self.nodes.drain(mark..) {
            for child in node.kind.children() {
                if child.index() < mark {
                    self.parents[child.index()] = None;
                }
            }
        }
        self.parents.truncate(mark);
    }

    pub fn add_comment(&mut self, span: Span) {
        self.comments.push(span);
    }

    /// Seal the arena with `root` as its `Program` node.
    pub fn finish(self, root: NodeId) -> Ast {
        debug_assert!(
            matches!(self.nodes[root.index()].kind, NodeKind::Program { .. }),
            "root must be a Program"
        );
        Ast {
            nodes: self.nodes,
            root,
            comments: self.comments,
        }
    }

    fn is(&self, id: NodeId, pred: fn(&NodeKind) -> bool) -> bool {
        pred(self.kind(id))
    }

    fn all(&self, ids: &[NodeId], pred: fn(&NodeKind) -> bool) -> bool {
        ids.iter().all(|&id| self.is(id, pred))
    }

    fn opt(&self, id: Option<NodeId>, pred: fn(&NodeKind) -> bool) -> bool {
        id.is_none_or(|id| self.is(id, pred))
    }

    fn children_fit(&self, kind: &NodeKind) -> bool {
        let stmt = NodeKind::is_statement;
        let expr = NodeKind::is_expression;
        let ty = NodeKind::is_type;
        let ident = |k: &NodeKind| matches!(k, NodeKind::Identifier { .. } | NodeKind::Error);
        let block = |k: &NodeKind| matches!(k, NodeKind::Scope { .. } | NodeKind::Error);
        let index_item = |k: &NodeKind| {
            k.is_expression() || matches!(k, NodeKind::Range { .. } | NodeKind::Set { .. })
        };
        let operand = |k: &NodeKind| {
            matches!(
                k,
                NodeKind::Identifier { .. }
                    | NodeKind::HardwareQubit { .. }
                    | NodeKind::Index { .. }
                    | NodeKind::Error
            )
        };

        match kind {
            NodeKind::Program { items } | NodeKind::Scope { items } | NodeKind::Include { items, .. } => {
                self.all(items, stmt)
            }
            NodeKind::QubitDecl { name, size } | NodeKind::RegisterDecl { name, size, .. } => {
                self.is(*name, ident) && self.opt(*size, expr)
            }
            NodeKind::ClassicalDecl { ty: t, name, init } => {
                self.is(*t, ty) && self.is(*name, ident) && self.opt(*init, expr)
            }
            NodeKind::ConstDecl { ty: t, name, init } => {
                self.is(*t, ty) && self.is(*name, ident) && self.is(*init, expr)
            }
            NodeKind::IoDecl { ty: t, name, .. } | NodeKind::Param { ty: t, name } => {
                self.is(*t, ty) && self.is(*name, ident)
            }
            NodeKind::AliasDecl { name, parts } => self.is(*name, ident) && self.all(parts, expr),
            NodeKind::GateDef {
                name,
                params,
                qubits,
                body,
            } => {
                self.is(*name, ident)
                    && self.all(params, ident)
                    && self.all(qubits, ident)
                    && self.is(*body, block)
            }
            NodeKind::OpaqueDecl {
                name,
                params,
                qubits,
            } => self.is(*name, ident) && self.all(params, ident) && self.all(qubits, ident),
            NodeKind::SubroutineDef {
                name,
                params,
                return_ty,
                body,
            } => {
                self.is(*name, ident)
                    && self.all(params, |k| {
                        matches!(
                            k,
                            NodeKind::Param { .. } | NodeKind::RegisterDecl { .. } | NodeKind::Error
                        )
                    })
                    && self.opt(*return_ty, ty)
                    && self.is(*body, block)
            }
            NodeKind::ExternDecl {
                name,
                params,
                return_ty,
            } => self.is(*name, ident) && self.all(params, ty) && self.opt(*return_ty, ty),
            NodeKind::GateCall {
                modifiers,
                callee,
                args,
                duration,
                operands,
            } => {
                self.all(modifiers, |k| {
                    matches!(k, NodeKind::GateModifier { .. } | NodeKind::Error)
                }) && self.is(*callee, ident)
                    && self.all(args, expr)
                    && self.opt(*duration, expr)
                    && self.all(operands, operand)
            }
            NodeKind::GateModifier { arg, .. } => self.opt(*arg, expr),
            NodeKind::MeasureArrow { measure, target } => {
                self.is(*measure, |k| matches!(k, NodeKind::Measure { .. } | NodeKind::Error))
                    && self.opt(*target, operand)
            }
            NodeKind::Reset { operand: o } | NodeKind::Measure { operand: o } => self.is(*o, operand),
            NodeKind::Barrier { operands } | NodeKind::Nop { operands } => self.all(operands, operand),
            NodeKind::Delay { duration, operands } => {
                self.is(*duration, expr) && self.all(operands, operand)
            }
            NodeKind::Box { duration, body } => self.opt(*duration, expr) && self.is(*body, block),
            NodeKind::Assignment { target, value, .. } => {
                self.is(*target, operand) && self.is(*value, expr)
            }
            NodeKind::ExprStmt { expr: e } => self.is(*e, expr),
            NodeKind::Return { value } => self.opt(*value, |k| k.is_expression()),
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.is(*condition, expr) && self.is(*then_branch, stmt) && self.opt(*else_branch, stmt),
            NodeKind::For {
                ty: t,
                var,
                iterable,
                body,
            } => {
                self.opt(*t, ty)
                    && self.is(*var, ident)
                    && self.is(*iterable, index_item)
                    && self.is(*body, stmt)
            }
            NodeKind::While { condition, body } => self.is(*condition, expr) && self.is(*body, stmt),
            NodeKind::Switch { subject, cases } => {
                self.is(*subject, expr)
                    && self.all(cases, |k| {
                        matches!(k, NodeKind::Case { .. } | NodeKind::Default { .. } | NodeKind::Error)
                    })
            }
            NodeKind::Case { values, body } => self.all(values, expr) && self.is(*body, block),
            NodeKind::Default { body } => self.is(*body, block),
            NodeKind::ScalarType { designator, .. } => self.opt(*designator, expr),
            NodeKind::ComplexType { component } => self.opt(*component, ty),
            NodeKind::QubitType { size } | NodeKind::RegisterType { size, .. } => self.opt(*size, expr),
            NodeKind::ArrayType { element, dims } => self.is(*element, ty) && self.all(dims, expr),
            NodeKind::ArrayRefType {
                element,
                dims,
                rank,
                ..
            } => self.is(*element, ty) && self.all(dims, expr) && self.opt(*rank, expr),
            NodeKind::Paren { inner } => self.is(*inner, expr),
            NodeKind::Unary { operand: o, .. } => self.is(*o, expr),
            NodeKind::Binary { lhs, rhs, .. } => self.is(*lhs, expr) && self.is(*rhs, expr),
            NodeKind::Cast { ty: t, operand: o } => self.is(*t, ty) && self.is(*o, expr),
            NodeKind::Call { callee, args } => self.is(*callee, ident) && self.all(args, expr),
            NodeKind::Index { base, items } => self.is(*base, expr) && self.all(items, index_item),
            NodeKind::Range { start, step, end } => {
                self.opt(*start, expr) && self.opt(*step, expr) && self.opt(*end, expr)
            }
            NodeKind::Set { elements } | NodeKind::ArrayLiteral { elements } => self.all(elements, expr),
            NodeKind::DurationOf { scope } => self.is(*scope, block),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use qfront_diag::SourceId;

    use super::*;
    use crate::literal::{LiteralKind, parse_literal};

    fn sp(start: u32, end: u32) -> Span {
        Span::new(SourceId(0), start, end)
    }

    /// `qubit q; h q;`
    fn small_program() -> Ast {
        let mut b = AstBuilder::new();
        let q = b.push(NodeKind::Identifier { name: "q".into() }, sp(6, 7));
        let decl = b.push(NodeKind::QubitDecl { name: q, size: None }, sp(0, 8));
        let h = b.push(NodeKind::Identifier { name: "h".into() }, sp(9, 10));
        let q2 = b.push(NodeKind::Identifier { name: "q".into() }, sp(11, 12));
        let call = b.push(
            NodeKind::GateCall {
                modifiers: vec![],
                callee: h,
                args: vec![],
                duration: None,
                operands: vec![q2],
            },
            sp(9, 13),
        );
        let root = b.push(
            NodeKind::Program {
                items: vec![decl, call],
            },
            sp(0, 13),
        );
        b.finish(root)
    }

    #[test]
    fn test_walk_is_preorder() {
        let ast = small_program();
        let tags: Vec<_> = ast.descendants().map(|id| ast.kind(id).tag()).collect();
        assert_eq!(
            tags,
            vec!["Program", "QubitDecl", "Identifier", "GateCall", "Identifier", "Identifier"]
        );
    }

    #[test]
    fn test_every_node_has_one_parent() {
        let ast = small_program();
        let parents = ast.parents();
        let orphans: Vec<_> = ast
            .nodes()
            .filter(|(id, _)| *id != ast.root() && parents[id.index()].is_none())
            .collect();
        assert!(orphans.is_empty());
    }

    #[test]
    fn test_truncate_releases_children() {
        let mut b = AstBuilder::new();
        let x = b.push(NodeKind::Identifier { name: "x".into() }, sp(0, 1));
        let mark = b.mark();
        b.push(NodeKind::Paren { inner: x }, sp(0, 3));
        b.truncate(mark);
        assert_eq!(b.len(), 1);
        // `x` is free again.
        let stmt = b.push(NodeKind::ExprStmt { expr: x }, sp(0, 2));
        let root = b.push(NodeKind::Program { items: vec![stmt] }, sp(0, 2));
        assert_eq!(b.finish(root).program_items(), &[stmt]);
    }

    #[test]
    #[should_panic(expected = "already has a parent")]
    #[cfg(debug_assertions)]
    fn test_second_parent_rejected() {
        let mut b = AstBuilder::new();
        let x = b.push(NodeKind::Identifier { name: "x".into() }, sp(0, 1));
        b.push(NodeKind::Paren { inner: x }, sp(0, 3));
        b.push(NodeKind::Paren { inner: x }, sp(0, 3));
    }

    #[test]
    #[should_panic(expected = "wrong kind")]
    #[cfg(debug_assertions)]
    fn test_wrong_child_kind_rejected() {
        let mut b = AstBuilder::new();
        let brk = b.push(NodeKind::Break, sp(0, 6));
        b.push(NodeKind::Paren { inner: brk }, sp(0, 8));
    }

    #[test]
    fn test_graft_remaps_and_keeps_provenance() {
        let included = small_program();

        let mut b = AstBuilder::new();
        let inc = b.push(
            NodeKind::Include {
                path: "lib.inc".into(),
                items: vec![],
            },
            Span::new(SourceId(1), 0, 18),
        );
        let root = b.push(NodeKind::Program { items: vec![inc] }, Span::new(SourceId(1), 0, 18));
        let mut ast = b.finish(root);

        ast.graft(inc, &included);

        assert_eq!(ast.len(), 2 + included.len() - 1);
        let NodeKind::Include { items, .. } = ast.kind(inc) else {
            panic!("expected include");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(ast.kind(items[0]).tag(), "QubitDecl");
        assert_eq!(ast.span(items[1]).source, SourceId(0));
        // Children of grafted nodes point into the grafted region.
        let walked: Vec<_> = ast.descendants().collect();
        assert_eq!(walked.len(), ast.len());
    }

    #[test]
    fn test_mark_include_error() {
        let mut b = AstBuilder::new();
        let inc = b.push(
            NodeKind::Include {
                path: "missing.inc".into(),
                items: vec![],
            },
            sp(0, 22),
        );
        let root = b.push(NodeKind::Program { items: vec![inc] }, sp(0, 22));
        let mut ast = b.finish(root);

        ast.mark_include_error(inc);
        assert!(matches!(ast.kind(inc), NodeKind::IncludeError { path } if path == "missing.inc"));
        assert_eq!(ast.span(inc), sp(0, 22));
    }

    #[test]
    fn test_tree_string() {
        let mut b = AstBuilder::new();
        let lit = parse_literal("1.50", LiteralKind::Float).unwrap();
        let one = b.push(NodeKind::Literal(lit), sp(0, 4));
        let stmt = b.push(NodeKind::ExprStmt { expr: one }, sp(0, 5));
        let root = b.push(NodeKind::Program { items: vec![stmt] }, sp(0, 5));
        let ast = b.finish(root);
        assert_eq!(
            ast.tree().to_string(),
            "Program [0..5]\n  ExprStmt [0..5]\n    Literal 1.5 (float) [0..4]\n"
        );
    }
}
