//! Human-readable rendering of diagnostics through `ariadne`.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind};

use crate::diagnostic::{Diagnostic, Severity};
use crate::source_map::SourceMap;
use crate::span::Span;

/// Options for [`render`].
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Emit ANSI colours.
    pub color: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { color: true }
    }
}

/// Render one diagnostic with source context.
pub fn render(diagnostic: &Diagnostic, map: &SourceMap, options: RenderOptions) -> String {
    let Some(primary) = ariadne_span(map, diagnostic.span) else {
        return render_plain(diagnostic);
    };

    let kind = match diagnostic.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
        Severity::Note => ReportKind::Advice,
    };
    let color = match diagnostic.severity {
        Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Note => Color::Cyan,
    };

    let mut builder = Report::build(kind, primary.0.clone(), primary.1.start)
        .with_code(diagnostic.code.as_str())
        .with_message(&diagnostic.message)
        .with_config(Config::default().with_color(options.color))
        .with_label(
            Label::new(primary)
                .with_message(&diagnostic.message)
                .with_color(color),
        );

    for label in &diagnostic.labels {
        if let Some(span) = ariadne_span(map, label.span) {
            builder = builder.with_label(
                Label::new(span)
                    .with_message(&label.message)
                    .with_color(Color::Blue),
            );
        }
    }
    if let Some(fix) = &diagnostic.fix {
        builder = builder.with_help(format!("{}: `{}`", fix.message, fix.replacement));
    }
    for note in &diagnostic.notes {
        builder = builder.with_note(note);
    }

    let cache = ariadne::sources(
        map.files()
            .map(|f| (f.name().to_string(), f.text().to_string())),
    );
    let mut out = Vec::new();
    if builder.finish().write(cache, &mut out).is_err() {
        return render_plain(diagnostic);
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Render every diagnostic, in order, separated by blank lines.
pub fn render_all(diagnostics: &[Diagnostic], map: &SourceMap, options: RenderOptions) -> String {
    diagnostics
        .iter()
        .map(|d| render(d, map, options))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line form: `file:line:col: error[Q0101]: message`.
pub fn render_short(diagnostic: &Diagnostic, map: &SourceMap) -> String {
    match map.location(diagnostic.span) {
        Some(loc) => format!("{}:{}:{}: {}", loc.file, loc.line, loc.column, diagnostic),
        None => diagnostic.to_string(),
    }
}

fn render_plain(diagnostic: &Diagnostic) -> String {
    format!("{diagnostic} at {}\n", diagnostic.span)
}

// ariadne indexes sources by character, spans are bytes.
fn ariadne_span(map: &SourceMap, span: Span) -> Option<(String, Range<usize>)> {
    let file = map.get(span.source)?;
    let start = file.char_offset(span.start);
    let end = file.char_offset(span.end).max(start);
    Some((file.name().to_string(), start..end))
}
