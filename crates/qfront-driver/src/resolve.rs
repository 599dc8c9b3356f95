//! Include path resolution.

use std::path::{Path, PathBuf};

use tracing::trace;

/// The built-in include libraries.
const EMBEDDED: &[(&str, &str)] = &[
    ("stdgates.inc", include_str!("../include/stdgates.inc")),
    ("qelib1.inc", include_str!("../include/qelib1.inc")),
];

/// Where an include name led.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A file on disk, canonicalized where possible.
    File(PathBuf),
    /// One of the built-in libraries.
    Embedded {
        name: &'static str,
        text: &'static str,
    },
    NotFound,
}

/// Finds the file an `include` statement names.
///
/// Relative names are tried against the including file's directory first,
/// then against each search path in order. Absolute names are used as they
/// are. The built-in `stdgates.inc` and `qelib1.inc` are the last resort.
#[derive(Debug, Clone)]
pub struct IncludeResolver {
    search_paths: Vec<PathBuf>,
    embedded: bool,
}

impl IncludeResolver {
    pub fn new(search_paths: Vec<PathBuf>, embedded: bool) -> Self {
        Self {
            search_paths,
            embedded,
        }
    }

    /// Resolve `name` as included from a file in `from_dir`.
    ///
    /// `from_dir` is `None` for sources that do not live on disk.
    pub fn resolve(&self, name: &str, from_dir: Option<&Path>) -> Resolved {
        if name.is_empty() {
            return Resolved::NotFound;
        }
        let requested = Path::new(name);
        if requested.is_absolute() {
            if requested.is_file() {
                return Resolved::File(canonical(requested));
            }
        } else {
            let candidates = from_dir
                .into_iter()
                .chain(self.search_paths.iter().map(PathBuf::as_path));
            for dir in candidates {
                let path = dir.join(requested);
                trace!(candidate = %path.display(), "trying include");
                if path.is_file() {
                    return Resolved::File(canonical(&path));
                }
            }
        }
        if self.embedded {
            if let Some(&(lib, text)) = EMBEDDED.iter().find(|(lib, _)| *lib == name) {
                return Resolved::Embedded { name: lib, text };
            }
        }
        Resolved::NotFound
    }
}

/// Canonical form of `path`, or the path itself when that fails.
pub(crate) fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
