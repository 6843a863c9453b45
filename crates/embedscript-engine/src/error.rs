//! Error types for engine queries.

use std::path::PathBuf;
use thiserror::Error;

/// Errors an engine query can fail with.
///
/// None of these are fatal; embedders are expected to degrade to "no
/// results" for the query that failed.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The queried file is not part of the program.
    #[error("File is not part of the program: {}", .0.display())]
    UnknownFile(PathBuf),

    /// The host listed the file but could not provide its contents.
    #[error("No source text available for {}", .0.display())]
    MissingSource(PathBuf),

    /// The grammar could not be loaded into the parser.
    #[error("Failed to load grammar: {0}")]
    Grammar(String),

    /// The parser gave up on the input.
    #[error("Parsing {} did not produce a syntax tree", .0.display())]
    ParseFailed(PathBuf),

    /// The engine was disposed and must be replaced.
    #[error("Engine has been disposed")]
    Disposed,
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
