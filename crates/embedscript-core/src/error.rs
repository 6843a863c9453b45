//! Error types.
//!
//! None of these escape the public query functions: the session manager and
//! the formatter log them and fall back to defaults or empty results.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to read a project configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid pattern '{pattern}' in {path}: {source}")]
    Pattern {
        path: PathBuf,
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("configuration chain starting at {path} extends more than {limit} files")]
    ExtendsTooDeep { path: PathBuf, limit: usize },
}

/// Failure of the bundled formatter. The document is left untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("unexpected '{found}' on line {line}")]
    Unbalanced { line: usize, found: char },

    #[error("'{open}' is never closed")]
    Unclosed { open: char },

    #[error("unterminated comment or template literal")]
    Unterminated,
}
