//! Stable diagnostic codes.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::diagnostic::Severity;

/// Error codes for every diagnostic the front-end emits.
///
/// Format: `Q####` where the first two digits group the phase:
/// - Q00xx: lexer
/// - Q01xx: parser
/// - Q02xx: literals
/// - Q03xx: declarations
/// - Q04xx: language features
/// - Q05xx: includes
/// - Q06xx: version pragma
/// - Q09xx: driver bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum ErrorCode {
    /// Unscannable input: invalid character, unterminated string or comment.
    LexicalError,
    /// Grammar violation.
    SyntaxError,
    /// Nesting deeper than the configured limit.
    MaxDepthExceeded,
    /// Malformed or out-of-range numeric literal, or unknown unit.
    LiteralError,
    /// Same name declared twice in one scope.
    DuplicateDeclaration,
    /// Deprecated syntax accepted for compatibility.
    SemanticWarning,
    /// Construct not available in the declared language version.
    UnsupportedFeature,
    /// An `include` target could not be found.
    IncludeNotFound,
    /// A file transitively includes itself.
    IncludeCycle,
    /// No `OPENQASM` version pragma.
    MissingVersion,
    /// Unsupported `OPENQASM` version.
    VersionMismatch,
    /// Further errors were dropped because the error limit was hit.
    ErrorLimitReached,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 12] = [
        ErrorCode::LexicalError,
        ErrorCode::SyntaxError,
        ErrorCode::MaxDepthExceeded,
        ErrorCode::LiteralError,
        ErrorCode::DuplicateDeclaration,
        ErrorCode::SemanticWarning,
        ErrorCode::UnsupportedFeature,
        ErrorCode::IncludeNotFound,
        ErrorCode::IncludeCycle,
        ErrorCode::MissingVersion,
        ErrorCode::VersionMismatch,
        ErrorCode::ErrorLimitReached,
    ];

    /// The stable textual code.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::LexicalError => "Q0001",
            ErrorCode::SyntaxError => "Q0101",
            ErrorCode::MaxDepthExceeded => "Q0102",
            ErrorCode::LiteralError => "Q0201",
            ErrorCode::DuplicateDeclaration => "Q0301",
            ErrorCode::SemanticWarning => "Q0401",
            ErrorCode::UnsupportedFeature => "Q0402",
            ErrorCode::IncludeNotFound => "Q0501",
            ErrorCode::IncludeCycle => "Q0502",
            ErrorCode::MissingVersion => "Q0601",
            ErrorCode::VersionMismatch => "Q0602",
            ErrorCode::ErrorLimitReached => "Q0901",
        }
    }

    /// Human-readable kind name.
    pub const fn name(self) -> &'static str {
        match self {
            ErrorCode::LexicalError => "LexicalError",
            ErrorCode::SyntaxError => "SyntaxError",
            ErrorCode::MaxDepthExceeded => "MaxDepthExceeded",
            ErrorCode::LiteralError => "LiteralError",
            ErrorCode::DuplicateDeclaration => "DuplicateDeclaration",
            ErrorCode::SemanticWarning => "SemanticWarning",
            ErrorCode::UnsupportedFeature => "UnsupportedFeature",
            ErrorCode::IncludeNotFound => "IncludeNotFound",
            ErrorCode::IncludeCycle => "IncludeCycle",
            ErrorCode::MissingVersion => "MissingVersion",
            ErrorCode::VersionMismatch => "VersionMismatch",
            ErrorCode::ErrorLimitReached => "ErrorLimitReached",
        }
    }

    /// Severity used when a diagnostic is created from this code.
    pub const fn default_severity(self) -> Severity {
        match self {
            ErrorCode::SemanticWarning | ErrorCode::MissingVersion => Severity::Warning,
            ErrorCode::ErrorLimitReached => Severity::Note,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
