//! The include graph of a compilation.
//!
//! One node per source file and one edge per `include` statement that
//! resolved to a file. Two statements including the same file give two
//! parallel edges, so every cyclic statement can be reported on its own.

use petgraph::graph::{DiGraph, EdgeIndex, EdgeReference, NodeIndex};
use petgraph::visit::{DfsEvent, DfsPostOrder, EdgeFiltered, EdgeRef, depth_first_search};
use qfront_ast::NodeId;
use qfront_diag::{SourceId, Span};
use rustc_hash::{FxHashMap, FxHashSet};

/// An `include` statement that resolved to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncludeEdge {
    /// Span of the statement in the including file.
    pub span: Span,
    /// The `Include` node in the including file's own tree.
    pub node: NodeId,
}

#[derive(Debug, Clone, Default)]
pub struct IncludeGraph {
    graph: DiGraph<SourceId, IncludeEdge>,
    index: FxHashMap<SourceId, NodeIndex>,
}

impl IncludeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source file. Adding the same file twice is a no-op.
    pub fn add_file(&mut self, source: SourceId) -> NodeIndex {
        *self
            .index
            .entry(source)
            .or_insert_with(|| self.graph.add_node(source))
    }

    /// Record that `from` includes `to` at `edge`.
    pub fn add_include(&mut self, from: SourceId, to: SourceId, edge: IncludeEdge) -> EdgeIndex {
        let a = self.add_file(from);
        let b = self.add_file(to);
        self.graph.add_edge(a, b, edge)
    }

    pub fn file_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn include_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn edge(&self, id: EdgeIndex) -> Option<&IncludeEdge> {
        self.graph.edge_weight(id)
    }

    /// Files `source` includes, with the statement that includes each.
    pub fn includes_of(&self, source: SourceId) -> Vec<(SourceId, IncludeEdge)> {
        let Some(&node) = self.index.get(&source) else {
            return Vec::new();
        };
        let mut out: Vec<_> = self
            .graph
            .edges(node)
            .map(|e| (self.graph[e.target()], *e.weight()))
            .collect();
        // `edges` yields newest first.
        out.sort_by_key(|(_, edge)| edge.span.start);
        out
    }

    /// Include statements that close a cycle, as seen by a depth-first walk
    /// from `root`.
    ///
    /// Each cyclic statement appears once, in source order of discovery.
    /// Removing them leaves the graph reachable from `root` acyclic.
    pub fn back_edges(&self, root: SourceId) -> Vec<EdgeIndex> {
        let Some(&start) = self.index.get(&root) else {
            return Vec::new();
        };
        let mut pairs = Vec::new();
        let mut seen = FxHashSet::default();
        depth_first_search(&self.graph, Some(start), |event| {
            if let DfsEvent::BackEdge(u, v) = event {
                if seen.insert((u, v)) {
                    pairs.push((u, v));
                }
            }
        });

        let mut edges = Vec::new();
        for (u, v) in pairs {
            let mut parallel: Vec<_> = self
                .graph
                .edges_connecting(u, v)
                .map(|e| e.id())
                .collect();
            parallel.sort_by_key(|&id| self.graph[id].span.start);
            edges.extend(parallel);
        }
        edges
    }

    /// Files reachable from `root` with every file listed after all the
    /// files it includes, ignoring the `cut` edges.
    pub fn merge_order(&self, root: SourceId, cut: &FxHashSet<EdgeIndex>) -> Vec<SourceId> {
        let Some(&start) = self.index.get(&root) else {
            return Vec::new();
        };
        let filtered = EdgeFiltered::from_fn(&self.graph, |e: EdgeReference<'_, IncludeEdge>| {
            !cut.contains(&e.id())
        });
        let mut dfs = DfsPostOrder::new(&filtered, start);
        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(node) = dfs.next(&filtered) {
            order.push(self.graph[node]);
        }
        order
    }
}
