//! CLI command implementations.

pub mod check;
pub mod parse;
pub mod version;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use qfront_diag::RenderOptions;
use qfront_driver::FrontendConfig;

/// Options shared by every command that runs the front-end.
#[derive(Debug, Args)]
pub struct FrontendArgs {
    /// Add a directory to the include search path
    #[arg(short = 'I', long = "include-path", value_name = "DIR")]
    pub include_paths: Vec<PathBuf>,

    /// YAML configuration file
    #[arg(short, long, env = "QFRONT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Stop reporting after this many errors (0 = unlimited)
    #[arg(long)]
    pub max_errors: Option<usize>,

    /// Maximum nesting depth of expressions and blocks
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Do not fall back to the built-in stdgates.inc and qelib1.inc
    #[arg(long)]
    pub no_builtin_includes: bool,

    /// Disable colored diagnostics
    #[arg(long)]
    pub no_color: bool,
}

impl FrontendArgs {
    /// Build the configuration: file, then environment, then flags.
    pub fn config(&self) -> Result<FrontendConfig> {
        let base = match &self.config {
            Some(path) => FrontendConfig::from_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => FrontendConfig::default(),
        };
        let mut config = base.with_env()?;

        // `-I` directories are searched before configured ones.
        let mut include_paths = self.include_paths.clone();
        include_paths.append(&mut config.include_paths);
        config.include_paths = include_paths;
        if let Some(limit) = self.max_errors {
            config.error_limit = limit;
        }
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if self.no_builtin_includes {
            config.embedded_includes = false;
        }
        config.validate()?;

        tracing::debug!(%config, "front-end configuration");
        Ok(config)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            color: !self.no_color && console::colors_enabled_stderr(),
        }
    }
}
