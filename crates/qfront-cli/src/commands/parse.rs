//! Parse command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use qfront_ast::Ast;
use qfront_diag::{Diagnostic, Location, render_short};
use qfront_driver::{CompilationUnit, compile};
use serde::Serialize;

use super::FrontendArgs;
use crate::OutputFormat;

/// JSON form of a diagnostic with its resolved location.
#[derive(Serialize)]
struct LocatedDiagnostic<'a> {
    #[serde(flatten)]
    diagnostic: &'a Diagnostic,
    location: Option<Location>,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    file: String,
    files: Vec<&'a str>,
    ast: &'a Ast,
    diagnostics: Vec<LocatedDiagnostic<'a>>,
}

/// Execute the parse command.
pub fn execute(input: &Path, format: OutputFormat, args: &FrontendArgs) -> Result<()> {
    let config = args.config()?;
    let unit = compile(input, &config)
        .with_context(|| format!("Failed to compile {}", input.display()))?;

    match format {
        OutputFormat::Tree => {
            print!("{}", unit.ast().tree());
            print_diagnostics(&unit, args);
        }
        OutputFormat::Diagnostics => print_diagnostics(&unit, args),
        OutputFormat::Short => {
            for diagnostic in unit.diagnostics() {
                println!("{}", render_short(diagnostic, unit.sources()));
            }
        }
        OutputFormat::Json => println!("{}", to_json(&unit)?),
    }

    let errors = unit.error_count();
    if errors > 0 {
        anyhow::bail!(
            "{} produced {errors} error{}",
            input.display(),
            if errors == 1 { "" } else { "s" }
        );
    }
    Ok(())
}

fn print_diagnostics(unit: &CompilationUnit, args: &FrontendArgs) {
    if unit.diagnostics().is_empty() {
        return;
    }
    eprintln!("{}", unit.render(args.render_options()));
    let warnings = unit.diagnostics().len() - unit.error_count();
    eprintln!(
        "{} {} error(s), {} other diagnostic(s)",
        style("→").cyan().bold(),
        unit.error_count(),
        warnings
    );
}

fn to_json(unit: &CompilationUnit) -> Result<String> {
    let sources = unit.sources();
    let output = JsonOutput {
        file: sources
            .get(unit.entry())
            .map(|f| f.name().to_string())
            .unwrap_or_default(),
        files: sources.files().map(|f| f.name()).collect(),
        ast: unit.ast(),
        diagnostics: unit
            .diagnostics()
            .iter()
            .map(|diagnostic| LocatedDiagnostic {
                diagnostic,
                location: sources.location(diagnostic.span),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}
