//! Engine-native result types.
//!
//! All locations are byte offsets into the analyzed file's text. Callers are
//! expected to translate them into whatever coordinate system they use.

use serde::{Deserialize, Serialize};

/// A span of text, as a start offset and a length in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub length: usize,
}

impl TextSpan {
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Span covering `start..end`. An inverted range yields an empty span.
    pub fn from_bounds(start: usize, end: usize) -> Self {
        Self {
            start,
            length: end.saturating_sub(start),
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategory {
    Error,
    Warning,
    Suggestion,
    Message,
}

/// A problem found in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineDiagnostic {
    pub span: TextSpan,
    pub category: DiagnosticCategory,
    pub code: u32,
    pub message: String,
}

impl EngineDiagnostic {
    pub fn error(span: TextSpan, code: u32, message: impl Into<String>) -> Self {
        Self {
            span,
            category: DiagnosticCategory::Error,
            code,
            message: message.into(),
        }
    }
}

/// Diagnostic codes produced by the engine.
pub mod codes {
    /// `'{0}' expected.`
    pub const TOKEN_EXPECTED: u32 = 1005;
    /// `Unexpected token.`
    pub const UNEXPECTED_TOKEN: u32 = 1012;
    /// `Type '{0}' is not assignable to type '{1}'.`
    pub const NOT_ASSIGNABLE: u32 = 2322;
    /// `Cannot find module '{0}' or its corresponding type declarations.`
    pub const MODULE_NOT_FOUND: u32 = 2307;
    /// `Cannot redeclare block-scoped variable '{0}'.`
    pub const REDECLARED_BLOCK_SCOPED: u32 = 2451;
}

/// What the engine knows about the symbol at a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickInfo {
    /// The identifier the information is about.
    pub span: TextSpan,
    /// Declaration-like rendering, e.g. `let count: number`.
    pub display: String,
    /// Documentation taken from a leading doc comment, if any.
    pub documentation: Option<String>,
}
