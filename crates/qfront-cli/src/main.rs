//! qfront command-line interface.
//!
//! ```text
//! qfront parse main.qasm -I lib --format tree
//! qfront check a.qasm b.qasm c.qasm
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{FrontendArgs, check, parse, version};

/// qfront - error-recovering OpenQASM 2/3 front-end
#[derive(Parser)]
#[command(name = "qfront")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// What `parse` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented syntax tree followed by rendered diagnostics
    Tree,
    /// Tree and diagnostics as JSON
    Json,
    /// Rendered diagnostics only
    Diagnostics,
    /// One line per diagnostic
    Short,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a program and print its syntax tree and diagnostics
    Parse {
        /// Entry file
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "tree")]
        format: OutputFormat,

        #[command(flatten)]
        frontend: FrontendArgs,
    },

    /// Check several programs in parallel and summarize the results
    Check {
        /// Entry files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        frontend: FrontendArgs,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Parse {
            input,
            format,
            frontend,
        } => parse::execute(&input, format, &frontend),

        Commands::Check { inputs, frontend } => check::execute(&inputs, &frontend),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
