//! Errors that stop a front-end run.
//!
//! Everything wrong with the program text is a diagnostic. These are the
//! failures that leave nothing to parse.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ConfigError;

/// Fatal front-end errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FrontendError {
    /// A source file exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source file is not valid UTF-8.
    #[error("{} is not valid UTF-8 (invalid byte at offset {offset})", path.display())]
    NotUtf8 { path: PathBuf, offset: usize },

    /// A source file is too large for 32-bit span offsets.
    #[error("{name} is too large ({size} bytes, limit is {} bytes)", u32::MAX)]
    TooLarge { name: String, size: usize },

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for front-end operations.
pub type FrontendResult<T> = Result<T, FrontendError>;

/// Read a source file as UTF-8 text.
pub(crate) fn read_source(path: &Path) -> FrontendResult<String> {
    let bytes = std::fs::read(path).map_err(|source| FrontendError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|e| FrontendError::NotUtf8 {
        path: path.to_path_buf(),
        offset: e.utf8_error().valid_up_to(),
    })
}

/// Reject texts whose offsets do not fit in a [`Span`](qfront_diag::Span).
pub(crate) fn check_size(name: &str, text: &str) -> FrontendResult<()> {
    if u32::try_from(text.len()).is_err() {
        return Err(FrontendError::TooLarge {
            name: name.to_string(),
            size: text.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_source(Path::new("/definitely/not/here.qasm")).unwrap_err();
        assert!(matches!(err, FrontendError::Io { .. }));
        assert!(err.to_string().contains("here.qasm"));
    }

    #[test]
    fn test_invalid_utf8_reports_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.qasm");
        std::fs::write(&path, b"qubit q;\xff\n").unwrap();

        let err = read_source(&path).unwrap_err();
        match err {
            FrontendError::NotUtf8 { offset, .. } => assert_eq!(offset, 8),
            other => panic!("unexpected error: {other}"),
        }
    }
}
