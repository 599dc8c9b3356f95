//! Check command implementation.

use std::path::PathBuf;

use anyhow::Result;
use console::style;
use qfront_driver::compile_many;

use super::FrontendArgs;

/// Execute the check command.
pub fn execute(inputs: &[PathBuf], args: &FrontendArgs) -> Result<()> {
    let config = args.config()?;
    let render = args.render_options();

    println!(
        "{} Checking {} file(s)",
        style("→").cyan().bold(),
        inputs.len()
    );

    let mut failed = 0usize;
    for (input, result) in inputs.iter().zip(compile_many(inputs, &config)) {
        match result {
            Ok(unit) if !unit.has_errors() => {
                let warnings = unit.diagnostics().len();
                println!(
                    "  {} {} ({} file(s), {} warning(s))",
                    style("✓").green().bold(),
                    input.display(),
                    unit.sources().len(),
                    warnings
                );
                if warnings > 0 {
                    eprintln!("{}", unit.render(render));
                }
            }
            Ok(unit) => {
                failed += 1;
                println!(
                    "  {} {} ({} error(s))",
                    style("✗").red().bold(),
                    input.display(),
                    unit.error_count()
                );
                eprintln!("{}", unit.render(render));
            }
            Err(e) => {
                failed += 1;
                println!("  {} {}: {e}", style("✗").red().bold(), input.display());
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} file(s) failed", inputs.len());
    }
    println!("{} All files passed", style("✓").green().bold());
    Ok(())
}
