//! Diagnostic buffer for collecting, deduplicating, and sorting diagnostics.
//!
//! A [`Diagnostics`] value is owned by whoever runs a phase (lexer, parser,
//! driver) and handed back with the phase's result. There is no global sink.

use rustc_hash::FxHashSet;

use crate::code::ErrorCode;
use crate::diagnostic::{Diagnostic, Severity};
use crate::span::Span;

/// Buffer of diagnostics produced by one phase or one compilation.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Shorthand for `push(Diagnostic::new(..))`.
    pub fn report(&mut self, code: ErrorCode, span: Span, message: impl Into<String>) {
        self.push(Diagnostic::new(code, span, message));
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        self.items.extend(other);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_error()).count()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Sort by location and drop exact duplicates.
    ///
    /// The sort is stable, so diagnostics at the same position keep their
    /// emission order.
    pub fn into_sorted(self) -> Vec<Diagnostic> {
        let mut items = self.items;
        items.sort_by_key(Diagnostic::sort_key);
        let mut seen = FxHashSet::default();
        items.retain(|d| seen.insert((d.code, d.span, d.message.clone())));
        items
    }

    /// Sort, deduplicate and cap the number of errors at `error_limit`
    /// (0 = unlimited). Warnings and notes are never dropped.
    ///
    /// When errors are dropped a trailing [`ErrorCode::ErrorLimitReached`]
    /// note is attached at the last kept error.
    pub fn finish(self, error_limit: usize) -> Vec<Diagnostic> {
        let items = self.into_sorted();
        if error_limit == 0 {
            return items;
        }

        let mut kept = Vec::with_capacity(items.len());
        let mut errors = 0usize;
        let mut dropped = 0usize;
        let mut last_error_span = None;
        for diagnostic in items {
            if diagnostic.severity == Severity::Error {
                if errors == error_limit {
                    dropped += 1;
                    continue;
                }
                errors += 1;
                last_error_span = Some(diagnostic.span);
            }
            kept.push(diagnostic);
        }

        if let (true, Some(span)) = (dropped > 0, last_error_span) {
            kept.push(Diagnostic::new(
                ErrorCode::ErrorLimitReached,
                span,
                format!("error limit of {error_limit} reached; {dropped} more error(s) not shown"),
            ));
        }
        kept
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<T: IntoIterator<Item = Diagnostic>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
