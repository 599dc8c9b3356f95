//! Whole-program compilation: load, parse, resolve includes, merge.
//!
//! Files are discovered breadth-first. All files found at the same include
//! depth are parsed in parallel, each into its own tree and diagnostic
//! buffer; the results are folded into the session afterwards, in discovery
//! order, so the outcome does not depend on scheduling.

use std::path::{Path, PathBuf};

use qfront_ast::{Ast, NodeId, NodeKind};
use qfront_diag::{Diagnostic, Diagnostics, ErrorCode, SourceId, SourceMap, Span};
use qfront_parser::{ParseOptions, ParseOutput, parse};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, instrument, warn};

use crate::config::FrontendConfig;
use crate::error::{FrontendResult, check_size, read_source};
use crate::graph::{IncludeEdge, IncludeGraph};
use crate::resolve::{IncludeResolver, Resolved, canonical};
use crate::unit::CompilationUnit;

/// Compile the program whose entry file is `path`.
///
/// Problems in the program text become diagnostics on the returned unit.
/// `Err` is reserved for files that cannot be read at all.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn compile(path: impl AsRef<Path>, config: &FrontendConfig) -> FrontendResult<CompilationUnit> {
    let path = path.as_ref();
    config.validate()?;
    let text = read_source(path)?;
    check_size(&path.display().to_string(), &text)?;

    let mut session = Session::new(config);
    let entry = session.sources.add_file(path, text);
    session.by_path.insert(canonical(path), entry);
    session.run(entry)
}

/// Compile in-memory source text.
///
/// `name` only labels diagnostics. Relative includes are looked up in the
/// configured include paths, since the text has no directory of its own.
#[instrument(skip(text, config))]
pub fn compile_source(
    name: &str,
    text: &str,
    config: &FrontendConfig,
) -> FrontendResult<CompilationUnit> {
    config.validate()?;
    check_size(name, text)?;

    let mut session = Session::new(config);
    let entry = session.sources.add(name, text);
    session.run(entry)
}

/// Compile independent entry files in parallel.
///
/// Results come back in the order of `paths`.
pub fn compile_many<P>(paths: &[P], config: &FrontendConfig) -> Vec<FrontendResult<CompilationUnit>>
where
    P: AsRef<Path> + Sync,
{
    info!(files = paths.len(), "compiling entry files");
    paths.par_iter().map(|path| compile(path, config)).collect()
}

/// State of one compilation.
struct Session<'a> {
    config: &'a FrontendConfig,
    options: ParseOptions,
    resolver: IncludeResolver,
    sources: SourceMap,
    by_path: FxHashMap<PathBuf, SourceId>,
    by_builtin: FxHashMap<&'static str, SourceId>,
    parsed: FxHashMap<SourceId, Ast>,
    graph: IncludeGraph,
    diagnostics: Diagnostics,
}

impl<'a> Session<'a> {
    fn new(config: &'a FrontendConfig) -> Self {
        Self {
            config,
            options: config.parse_options(),
            resolver: IncludeResolver::new(config.include_paths.clone(), config.embedded_includes),
            sources: SourceMap::new(),
            by_path: FxHashMap::default(),
            by_builtin: FxHashMap::default(),
            parsed: FxHashMap::default(),
            graph: IncludeGraph::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    fn run(mut self, entry: SourceId) -> FrontendResult<CompilationUnit> {
        self.graph.add_file(entry);

        let mut wave = vec![entry];
        let mut depth = 0usize;
        while !wave.is_empty() {
            debug!(depth, files = wave.len(), "parsing include wave");
            let sources = &self.sources;
            let options = self.options;
            let outputs: Vec<(SourceId, ParseOutput)> = wave
                .par_iter()
                .map(|&id| (id, parse(sources.text(id), id, &options)))
                .collect();

            let mut next = Vec::new();
            for (id, output) in outputs {
                self.diagnostics.extend(output.diagnostics);
                let mut ast = output.ast;
                self.resolve_includes(id, &mut ast, &mut next)?;
                self.parsed.insert(id, ast);
            }
            if depth == 0 {
                // Includes without a pragma of their own follow the program.
                self.options.default_version = self
                    .version_pragma(entry)
                    .map(|(major, minor, _)| (major, minor));
            }
            wave = next;
            depth += 1;
        }

        self.break_cycles(entry);
        self.check_version(entry);
        self.check_redeclarations(entry);
        let ast = self.merge(entry);

        let diagnostics = self.diagnostics.finish(self.config.error_limit);
        let errors = diagnostics.iter().filter(|d| d.is_error()).count();
        info!(
            files = self.sources.len(),
            nodes = ast.len(),
            errors,
            "compilation finished"
        );

        Ok(CompilationUnit {
            ast,
            diagnostics,
            sources: self.sources,
            includes: self.graph,
            entry,
        })
    }

    /// Resolve every top-level `include` of `id`, registering files not seen
    /// before into `discovered`.
    fn resolve_includes(
        &mut self,
        id: SourceId,
        ast: &mut Ast,
        discovered: &mut Vec<SourceId>,
    ) -> FrontendResult<()> {
        let from_dir = self
            .sources
            .get(id)
            .and_then(|file| file.path())
            .and_then(Path::parent)
            .map(Path::to_path_buf);

        for item in ast.program_items().to_vec() {
            let NodeKind::Include { path: name, .. } = ast.kind(item) else {
                continue;
            };
            let name = name.clone();
            let span = ast.span(item);

            let target = match self.resolver.resolve(&name, from_dir.as_deref()) {
                Resolved::File(path) => match self.by_path.get(&path) {
                    Some(&known) => known,
                    None => {
                        debug!(include = %name, path = %path.display(), "loading include");
                        let text = read_source(&path)?;
                        check_size(&path.display().to_string(), &text)?;
                        let new = self.sources.add_file(path.clone(), text);
                        self.by_path.insert(path, new);
                        discovered.push(new);
                        new
                    }
                },
                Resolved::Embedded { name: lib, text } => match self.by_builtin.get(lib) {
                    Some(&known) => known,
                    None => {
                        debug!(include = %lib, "using built-in include");
                        let new = self.sources.add(format!("<builtin>/{lib}"), text);
                        self.by_builtin.insert(lib, new);
                        discovered.push(new);
                        new
                    }
                },
                Resolved::NotFound => {
                    warn!(include = %name, "include not found");
                    let note = self.search_note();
                    self.diagnostics.push(
                        Diagnostic::new(
                            ErrorCode::IncludeNotFound,
                            span,
                            format!("cannot find include file `{name}`"),
                        )
                        .with_note(note),
                    );
                    ast.mark_include_error(item);
                    continue;
                }
            };
            self.graph.add_include(id, target, IncludeEdge { span, node: item });
        }
        Ok(())
    }

    fn search_note(&self) -> String {
        if self.config.include_paths.is_empty() {
            "searched the including file's directory; add directories with `-I`".to_string()
        } else {
            let dirs: Vec<_> = self
                .config
                .include_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            format!(
                "searched the including file's directory and {}",
                dirs.join(", ")
            )
        }
    }

    /// Report every include statement that closes a cycle and turn it into
    /// an error marker, leaving an acyclic graph to merge.
    fn break_cycles(&mut self, entry: SourceId) {
        for edge_id in self.graph.back_edges(entry) {
            let Some(edge) = self.graph.edge(edge_id).copied() else {
                continue;
            };
            let Some(ast) = self.parsed.get_mut(&edge.span.source) else {
                continue;
            };
            let name = match ast.kind(edge.node) {
                NodeKind::Include { path, .. } => path.clone(),
                _ => continue,
            };
            debug!(include = %name, "include cycle");
            self.diagnostics.push(
                Diagnostic::new(
                    ErrorCode::IncludeCycle,
                    edge.span,
                    format!("`{name}` is already being included; this include forms a cycle"),
                )
                .with_note("the cyclic include is skipped"),
            );
            ast.mark_include_error(edge.node);
        }
    }

    /// The version pragma opening `id`, if it is the file's first statement.
    fn version_pragma(&self, id: SourceId) -> Option<(u32, Option<u32>, Span)> {
        let ast = self.parsed.get(&id)?;
        let &first = ast.program_items().first()?;
        match ast.kind(first) {
            NodeKind::VersionPragma { major, minor } => Some((*major, *minor, ast.span(first))),
            _ => None,
        }
    }

    /// Check the entry file's version declaration.
    fn check_version(&mut self, entry: SourceId) {
        if !self.parsed.contains_key(&entry) {
            return;
        }
        match self.version_pragma(entry) {
            None => self.diagnostics.push(
                Diagnostic::new(
                    ErrorCode::MissingVersion,
                    Span::point(entry, 0),
                    "missing `OPENQASM` version declaration",
                )
                .with_note("assuming OpenQASM 3.1"),
            ),
            Some((major, minor, span)) if !is_supported_version(major, minor) => {
                let version = match minor {
                    Some(minor) => format!("{major}.{minor}"),
                    None => major.to_string(),
                };
                self.diagnostics.push(
                    Diagnostic::new(
                        ErrorCode::VersionMismatch,
                        span,
                        format!("unsupported OpenQASM version {version}"),
                    )
                    .with_note("supported versions are 2.x, 3, 3.0 and 3.1"),
                );
            }
            Some(_) => {}
        }
    }

    /// Report global names declared again in another file of the program.
    ///
    /// Each file's own scope is checked by the parser; this walks the
    /// top-level statements of the whole program in merged order, visiting
    /// every included file once, and reports a later declaration whose
    /// first one lives in a different file.
    fn check_redeclarations(&mut self, entry: SourceId) {
        let mut declared: FxHashMap<String, Span> = FxHashMap::default();
        let mut visited = FxHashSet::default();
        visited.insert(entry);
        let mut found = Vec::new();

        let mut stack = vec![(entry, 0usize)];
        while let Some((id, next)) = stack.pop() {
            let Some(ast) = self.parsed.get(&id) else {
                continue;
            };
            let Some(&item) = ast.program_items().get(next) else {
                continue;
            };
            stack.push((id, next + 1));

            if let NodeKind::Include { .. } = ast.kind(item) {
                let target = self
                    .graph
                    .includes_of(id)
                    .into_iter()
                    .find_map(|(target, edge)| (edge.node == item).then_some(target));
                if let Some(target) = target.filter(|&t| visited.insert(t)) {
                    stack.push((target, 0));
                }
                continue;
            }

            let Some(name) = declared_name(ast, item) else {
                continue;
            };
            let NodeKind::Identifier { name: text } = ast.kind(name) else {
                continue;
            };
            let span = ast.span(name);
            match declared.get(text) {
                Some(&first) if first.source != span.source => {
                    found.push(
                        Diagnostic::new(
                            ErrorCode::DuplicateDeclaration,
                            span,
                            format!("`{text}` is already declared in this scope"),
                        )
                        .with_label(first, "first declared here"),
                    );
                }
                Some(_) => {}
                None => {
                    declared.insert(text.clone(), span);
                }
            }
        }

        for diagnostic in found {
            self.diagnostics.push(diagnostic);
        }
    }

    /// Build the entry file's tree with every include grafted in.
    fn merge(&mut self, entry: SourceId) -> Ast {
        // Cycles are already cut, so no edge is filtered here.
        let order = self.graph.merge_order(entry, &FxHashSet::default());
        let mut merged: FxHashMap<SourceId, Ast> = FxHashMap::default();
        for id in order {
            let Some(mut ast) = self.parsed.remove(&id) else {
                continue;
            };
            for (target, edge) in self.graph.includes_of(id) {
                if !matches!(ast.kind(edge.node), NodeKind::Include { .. }) {
                    continue;
                }
                match merged.get(&target) {
                    Some(child) => ast.graft(edge.node, child),
                    None => ast.mark_include_error(edge.node),
                }
            }
            merged.insert(id, ast);
        }
        // The entry is parsed before merging, so this only falls back for
        // an empty session.
        merged
            .remove(&entry)
            .unwrap_or_else(|| parse("", entry, &self.options).ast)
    }
}

/// Identifier introduced into the global scope by a top-level statement.
fn declared_name(ast: &Ast, item: NodeId) -> Option<NodeId> {
    match ast.kind(item) {
        NodeKind::QubitDecl { name, .. }
        | NodeKind::RegisterDecl { name, .. }
        | NodeKind::ClassicalDecl { name, .. }
        | NodeKind::ConstDecl { name, .. }
        | NodeKind::IoDecl { name, .. }
        | NodeKind::AliasDecl { name, .. }
        | NodeKind::GateDef { name, .. }
        | NodeKind::OpaqueDecl { name, .. }
        | NodeKind::SubroutineDef { name, .. }
        | NodeKind::ExternDecl { name, .. } => Some(*name),
        _ => None,
    }
}

fn is_supported_version(major: u32, minor: Option<u32>) -> bool {
    match major {
        2 => true,
        3 => matches!(minor, None | Some(0) | Some(1)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_versions() {
        assert!(is_supported_version(2, Some(0)));
        assert!(is_supported_version(2, None));
        assert!(is_supported_version(3, None));
        assert!(is_supported_version(3, Some(0)));
        assert!(is_supported_version(3, Some(1)));
        assert!(!is_supported_version(3, Some(2)));
        assert!(!is_supported_version(4, None));
        assert!(!is_supported_version(1, Some(0)));
    }

    #[test]
    fn test_source_without_includes() {
        let unit =
            compile_source("main.qasm", "OPENQASM 3.0;\nqubit q;\n", &FrontendConfig::default())
                .unwrap();
        assert!(unit.diagnostics().is_empty());
        assert_eq!(unit.sources().len(), 1);
        assert_eq!(unit.includes().file_count(), 1);
        assert_eq!(unit.ast().program_items().len(), 2);
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let config = FrontendConfig {
            max_depth: 0,
            ..FrontendConfig::default()
        };
        assert!(compile_source("main.qasm", "", &config).is_err());
    }
}
