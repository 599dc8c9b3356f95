//! Front-end configuration.
//!
//! Values come from, highest precedence first:
//! 1. Command-line flags (applied by the caller)
//! 2. Environment variables (`QFRONT_` prefix)
//! 3. A YAML configuration file
//! 4. Default values

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use qfront_parser::{DEFAULT_MAX_DEPTH, DEFAULT_SUPPRESSION_WINDOW, ParseOptions};
use serde::{Deserialize, Serialize};

/// Environment variable holding extra include directories, separated like `PATH`.
pub const ENV_INCLUDE_PATH: &str = "QFRONT_INCLUDE_PATH";
/// Environment variable overriding [`FrontendConfig::max_depth`].
pub const ENV_MAX_DEPTH: &str = "QFRONT_MAX_DEPTH";
/// Environment variable overriding [`FrontendConfig::error_limit`].
pub const ENV_ERROR_LIMIT: &str = "QFRONT_ERROR_LIMIT";

/// Settings for one front-end run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrontendConfig {
    /// Directories searched for `include` files after the including file's
    /// own directory, in order.
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,

    /// Maximum nesting of expressions and blocks.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Tokens after a recovery point during which further syntax errors
    /// are dropped as cascades.
    #[serde(default = "default_suppression_window")]
    pub suppression_window: usize,

    /// Maximum number of errors reported (0 = unlimited)
    #[serde(default)]
    pub error_limit: usize,

    /// Serve `stdgates.inc` and `qelib1.inc` from the built-in copies when
    /// they are not found on disk.
    #[serde(default = "default_true")]
    pub embedded_includes: bool,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_suppression_window() -> usize {
    DEFAULT_SUPPRESSION_WINDOW
}

fn default_true() -> bool {
    true
}

impl Default for FrontendConfig {
    fn default() -> Self {
        FrontendConfig {
            include_paths: Vec::new(),
            max_depth: default_max_depth(),
            suppression_window: default_suppression_window(),
            error_limit: 0,
            embedded_includes: default_true(),
        }
    }
}

impl FrontendConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: FrontendConfig = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.apply_env(|key| std::env::var_os(key))
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    ///
    /// Include directories from the environment are appended after the ones
    /// already configured. Unparsable numbers are rejected rather than
    /// silently ignored.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        if let Some(paths) = lookup(ENV_INCLUDE_PATH) {
            self.include_paths
                .extend(std::env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()));
        }
        if let Some(value) = lookup(ENV_MAX_DEPTH) {
            self.max_depth = parse_number(ENV_MAX_DEPTH, &value)?;
        }
        if let Some(value) = lookup(ENV_ERROR_LIMIT) {
            self.error_limit = parse_number(ENV_ERROR_LIMIT, &value)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_depth must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// The subset of the configuration the parser needs.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            max_depth: self.max_depth,
            suppression_window: self.suppression_window,
            default_version: None,
        }
    }
}

fn parse_number(key: &str, value: &OsString) -> Result<usize, ConfigError> {
    value
        .to_str()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| {
            ConfigError::Invalid(format!(
                "{key} must be a non-negative integer, got `{}`",
                value.to_string_lossy()
            ))
        })
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl fmt::Display for FrontendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "max_depth={} suppression_window={} error_limit={} include_paths={} embedded_includes={}",
            self.max_depth,
            self.suppression_window,
            self.error_limit,
            self.include_paths.len(),
            self.embedded_includes
        )
    }
}
