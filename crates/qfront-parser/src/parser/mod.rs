//! Parser for `OpenQASM` 3.
//!
//! Hand-written recursive descent with precedence climbing for expressions.
//! Every method returns [`PResult`]; by the time an `Err(Recovered)` is
//! returned the problem has already been reported, and the statement loop
//! skips ahead to a synchronising token and carries on.

mod expression;
mod statement;
mod types;

use std::collections::hash_map::Entry;

use qfront_ast::{Ast, AstBuilder, NodeId, NodeKind};
use qfront_diag::{Diagnostic, Diagnostics, ErrorCode, SourceId, Span};
use rustc_hash::FxHashMap;

use crate::lexer::{Token, TokenKind, tokenize};

/// Default bound on expression and block nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Default number of tokens after a resynchronisation point in which
/// further syntax errors are dropped.
pub const DEFAULT_SUPPRESSION_WINDOW: usize = 4;

/// Grow the stack when less than this is left.
const RED_ZONE: usize = 100 * 1024;

/// Size of each stack extension.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Knobs for a single parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum nesting of expressions and blocks.
    pub max_depth: usize,
    /// Syntax errors this many tokens after a recovery point are treated as
    /// cascades of the first one and not reported. 0 reports everything.
    pub suppression_window: usize,
    /// Version `(major, minor)` assumed when the source has no leading
    /// pragma, e.g. the including program's version for an include file.
    /// `None` parses such sources as `OpenQASM` 3.
    pub default_version: Option<(u32, Option<u32>)>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            suppression_window: DEFAULT_SUPPRESSION_WINDOW,
            default_version: None,
        }
    }
}

/// The tree and everything reported while building it.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub ast: Ast,
    /// Lexer and parser diagnostics, sorted by location.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Parse one source file.
///
/// Always returns a `Program`; statements that could not be parsed are
/// replaced by `Error` nodes.
pub fn parse(source: &str, source_id: SourceId, options: &ParseOptions) -> ParseOutput {
    let mut lexer = tokenize(source, source_id);
    let mut builder = AstBuilder::new();
    let mut tokens = Vec::new();
    for token in lexer.by_ref() {
        if token.kind.is_trivia() {
            builder.add_comment(token.span);
        } else {
            tokens.push(token);
        }
    }
    let mut diagnostics = lexer.take_diagnostics();

    let mut parser = Parser::new(source, source_id, tokens, builder, *options);
    let root = parser.parse_program();
    diagnostics.extend(parser.diagnostics);

    ParseOutput {
        ast: parser.builder.finish(root),
        diagnostics: diagnostics.into_sorted(),
    }
}

/// Marker for "already reported, unwind to a recovery point".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Recovered;

pub(super) type PResult<T> = Result<T, Recovered>;

/// Parser state.
pub(super) struct Parser<'src> {
    pub(super) source: &'src str,
    pub(super) source_id: SourceId,
    pub(super) tokens: Vec<Token<'src>>,
    pub(super) pos: usize,
    /// End offset of the last consumed token.
    pub(super) prev_end: u32,
    pub(super) builder: AstBuilder,
    pub(super) diagnostics: Diagnostics,
    options: ParseOptions,
    depth: usize,
    pub(super) open_blocks: usize,
    /// Braces still open when a depth overflow started unwinding.
    unwinding: Option<usize>,
    /// Token index of the last recovery point.
    resync: Option<usize>,
    scopes: Vec<FxHashMap<String, Span>>,
    /// Version from the leading pragma, or the inherited default, as
    /// `(major, minor)`.
    pub(super) version: Option<(u32, Option<u32>)>,
}

impl<'src> Parser<'src> {
    fn new(
        source: &'src str,
        source_id: SourceId,
        tokens: Vec<Token<'src>>,
        builder: AstBuilder,
        options: ParseOptions,
    ) -> Self {
        Self {
            source,
            source_id,
            tokens,
            pos: 0,
            prev_end: 0,
            builder,
            diagnostics: Diagnostics::new(),
            options,
            depth: 0,
            open_blocks: 0,
            unwinding: None,
            resync: None,
            scopes: vec![FxHashMap::default()],
            version: options.default_version,
        }
    }

    /// Check if we've reached the end.
    pub(super) fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Peek at the current token kind.
    pub(super) fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    pub(super) fn peek_at(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| t.kind)
    }

    pub(super) fn current(&self) -> Option<Token<'src>> {
        self.tokens.get(self.pos).copied()
    }

    /// Span of the current token, or an empty span at the end of input.
    pub(super) fn current_span(&self) -> Span {
        match self.current() {
            Some(token) => token.span,
            None => Span::point(self.source_id, self.source_len()),
        }
    }

    pub(super) fn source_len(&self) -> u32 {
        u32::try_from(self.source.len()).unwrap_or(u32::MAX)
    }

    /// Advance and return the current token.
    pub(super) fn advance(&mut self) -> Option<Token<'src>> {
        let token = self.current()?;
        self.pos += 1;
        self.prev_end = token.span.end;
        Some(token)
    }

    /// Check if current token matches.
    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.peek() == Some(kind)
    }

    /// Consume token if it matches.
    pub(super) fn consume(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect a specific token.
    pub(super) fn expect(&mut self, kind: TokenKind) -> PResult<Token<'src>> {
        match self.current() {
            Some(token) if token.kind == kind => {
                self.advance();
                Ok(token)
            }
            _ => Err(self.unexpected(kind.describe())),
        }
    }

    /// Report "expected X, found Y" at the current token.
    pub(super) fn unexpected(&mut self, expected: &str) -> Recovered {
        let found = match self.current() {
            Some(token) => describe_found(token),
            None => "end of input".to_string(),
        };
        self.syntax_error(format!("expected {expected}, found {found}"))
    }

    /// Report a syntax error at the current token unless it is a cascade.
    ///
    /// Errors on lexer error tokens were already reported by the lexer, and
    /// errors inside the suppression window after a recovery point are
    /// assumed to stem from the same root cause.
    pub(super) fn syntax_error(&mut self, message: String) -> Recovered {
        let on_lex_error = self.check(TokenKind::Error);
        let window = self.options.suppression_window;
        let suppressed = self
            .resync
            .is_some_and(|r| self.pos >= r && self.pos < r + window);
        if !on_lex_error && !suppressed {
            self.diagnostics
                .report(ErrorCode::SyntaxError, self.current_span(), message);
        }
        Recovered
    }

    /// Span from the start of `start` to the end of the last consumed token.
    pub(super) fn span_from(&self, start: Span) -> Span {
        Span::new(self.source_id, start.start, self.prev_end.max(start.start))
    }

    pub(super) fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.builder.push(kind, span)
    }

    /// Run `f` one nesting level deeper.
    pub(super) fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= self.options.max_depth {
            if self.unwinding.is_none() {
                self.diagnostics.report(
                    ErrorCode::MaxDepthExceeded,
                    self.current_span(),
                    format!(
                        "nesting exceeds the maximum depth of {}",
                        self.options.max_depth
                    ),
                );
                self.unwinding = Some(self.open_blocks);
            }
            return Err(Recovered);
        }
        self.depth += 1;
        let result = stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || f(self));
        self.depth -= 1;
        result
    }

    /// Run `f` inside a fresh declaration scope.
    pub(super) fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        self.scopes.push(FxHashMap::default());
        let result = f(self);
        self.scopes.pop();
        result
    }

    /// Record a declaration of the identifier node `name` in the innermost
    /// scope, reporting a duplicate if it is already there.
    pub(super) fn declare(&mut self, name: NodeId) {
        let NodeKind::Identifier { name: text } = self.builder.kind(name) else {
            return;
        };
        let text = text.clone();
        let span = self.builder.span(name);
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        match scope.entry(text) {
            Entry::Occupied(first) => {
                let diagnostic = Diagnostic::new(
                    ErrorCode::DuplicateDeclaration,
                    span,
                    format!("`{}` is already declared in this scope", first.key()),
                )
                .with_label(*first.get(), "first declared here");
                self.diagnostics.push(diagnostic);
            }
            Entry::Vacant(slot) => {
                slot.insert(span);
            }
        }
    }

    fn version_text(&self) -> String {
        match self.version {
            Some((major, Some(minor))) => format!("{major}.{minor}"),
            Some((major, None)) => major.to_string(),
            None => "3".to_string(),
        }
    }

    fn is_v2(&self) -> bool {
        self.version.is_some_and(|(major, _)| major == 2)
    }

    /// Report `feature` as unavailable when parsing an `OpenQASM` 2 program.
    pub(super) fn require_v3(&mut self, span: Span, feature: &str) {
        if self.is_v2() {
            let message = format!(
                "{feature} is not available in OpenQASM {}",
                self.version_text()
            );
            self.diagnostics
                .report(ErrorCode::UnsupportedFeature, span, message);
        }
    }

    /// Warn about `OpenQASM` 2 syntax used in a version 3 program.
    pub(super) fn deprecated(&mut self, span: Span, feature: &str, fix: Option<(Span, String)>) {
        if self.is_v2() {
            return;
        }
        let mut diagnostic = Diagnostic::new(
            ErrorCode::SemanticWarning,
            span,
            format!(
                "{feature} is deprecated in OpenQASM {}",
                self.version_text()
            ),
        );
        if let Some((fix_span, replacement)) = fix {
            diagnostic = diagnostic.with_fix(fix_span, replacement, "use the OpenQASM 3 form");
        }
        self.diagnostics.push(diagnostic);
    }

    /// Parse the entire program.
    fn parse_program(&mut self) -> NodeId {
        let mut items = Vec::new();
        while let Some(kind) = self.peek() {
            if kind == TokenKind::RBrace {
                self.syntax_error("unexpected `}`".to_string());
                self.advance();
                continue;
            }
            if let Ok(item) = self.statement_or_recover() {
                items.push(item);
            }
        }
        let span = Span::new(self.source_id, 0, self.source_len());
        self.push(NodeKind::Program { items }, span)
    }

    /// Parse a statement, replacing it with an `Error` node on failure.
    ///
    /// Inside a block this only fails while a depth overflow unwinds.
    pub(super) fn statement_or_recover(&mut self) -> PResult<NodeId> {
        let mark = self.builder.mark();
        let start_pos = self.pos;
        let start = self.current_span();
        match self.parse_statement() {
            Ok(id) => Ok(id),
            Err(Recovered) => {
                self.builder.truncate(mark);
                if self.unwinding.is_some() && self.open_blocks > 0 {
                    return Err(Recovered);
                }
                let open = self.unwinding.take().unwrap_or(0);
                self.synchronize(start_pos, open);
                Ok(self.push(NodeKind::Error, self.span_from(start)))
            }
        }
    }

    /// Skip to a synchronising token: past a `;` or a block's closing `}`,
    /// before an unmatched `}` or before a statement keyword, all at the
    /// nesting level the statement began at.
    /// `open` counts braces that were entered but not left before unwinding.
    fn synchronize(&mut self, start_pos: usize, mut open: usize) {
        if self.pos == start_pos {
            match self.advance().map(|t| t.kind) {
                Some(TokenKind::Semicolon) if open == 0 => {
                    self.resync = Some(self.pos);
                    return;
                }
                Some(TokenKind::LBrace) => open += 1,
                _ => {}
            }
        }
        while let Some(kind) = self.peek() {
            match kind {
                TokenKind::LBrace => open += 1,
                TokenKind::RBrace if open == 0 => break,
                TokenKind::RBrace => {
                    open -= 1;
                    self.advance();
                    if open == 0 {
                        break;
                    }
                    continue;
                }
                TokenKind::Semicolon if open == 0 => {
                    self.advance();
                    break;
                }
                kind if open == 0 && kind.starts_statement() => break,
                _ => {}
            }
            self.advance();
        }
        self.resync = Some(self.pos);
    }

    /// Index of the token after the group opened at `index`, or the end of
    /// input if it is never closed.
    pub(super) fn skip_group(&self, index: usize) -> usize {
        let mut depth = 0usize;
        let mut i = index;
        while let Some(token) = self.tokens.get(i) {
            match token.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return i + 1;
                    }
                }
                TokenKind::Semicolon => return i,
                _ => {}
            }
            i += 1;
        }
        i
    }

    pub(super) fn kind_at(&self, index: usize) -> Option<TokenKind> {
        self.tokens.get(index).map(|t| t.kind)
    }
}

fn describe_found(token: Token<'_>) -> String {
    match token.kind {
        TokenKind::Identifier
        | TokenKind::IntegerLiteral
        | TokenKind::FloatLiteral
        | TokenKind::NumberWithSuffix
        | TokenKind::HardwareQubit => format!("{} `{}`", token.kind, token.text),
        kind => kind.to_string(),
    }
}
