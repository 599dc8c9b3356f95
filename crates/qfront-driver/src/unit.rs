//! The result of compiling one entry file.

use qfront_ast::Ast;
use qfront_diag::{Diagnostic, RenderOptions, SourceId, SourceMap, render_all};

use crate::graph::IncludeGraph;

/// A whole program: the merged tree, everything reported while building it
/// and the sources the spans point into.
///
/// Included files appear in the tree under their `Include` node. Spans keep
/// the id of the file they came from, so diagnostics and nodes can always be
/// traced back through [`sources`](Self::sources).
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub(crate) ast: Ast,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) sources: SourceMap,
    pub(crate) includes: IncludeGraph,
    pub(crate) entry: SourceId,
}

impl CompilationUnit {
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Diagnostics from every file, sorted by location.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn sources(&self) -> &SourceMap {
        &self.sources
    }

    pub fn includes(&self) -> &IncludeGraph {
        &self.includes
    }

    /// The file compilation started from.
    pub fn entry(&self) -> SourceId {
        self.entry
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// Render all diagnostics as source-annotated reports.
    pub fn render(&self, options: RenderOptions) -> String {
        render_all(&self.diagnostics, &self.sources, options)
    }

    pub fn into_parts(self) -> (Ast, Vec<Diagnostic>, SourceMap) {
        (self.ast, self.diagnostics, self.sources)
    }
}
