//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - error-recovering OpenQASM 2/3 front-end",
        style("qfront").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qfront-diag    Spans, source maps and diagnostics");
    println!("  qfront-ast     Arena syntax tree and exact literals");
    println!("  qfront-parser  Lexer and recovering parser");
    println!("  qfront-driver  Includes, version checks, merging");
    println!("  qfront-cli     Command-line interface");
    println!();
    println!("Supported:  OpenQASM 2.x, 3.0, 3.1");
    println!("License:    {}", style("Apache-2.0").dim());
}
