//! Output types shared by every front end.
//!
//! These types are designed to be:
//! - Transport-agnostic (no LSP protocol dependencies)
//! - Easily serializable to JSON (for `check --json`)
//! - Easily convertible to `lsp-types` (for the language server)
//!
//! All positions use 0-based line and character indices, matching the LSP specification.

use serde::{Deserialize, Serialize};

/// A position in a text document, expressed as zero-based line and character offset.
///
/// Character offsets are measured in UTF-16 code units to match the LSP specification.
/// For ASCII text, this is equivalent to the character index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Position {
    /// Zero-based line number.
    pub line: u32,
    /// Zero-based character offset (UTF-16 code units).
    pub character: u32,
}

impl Position {
    /// Create a new position.
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match self.line.cmp(&other.line) {
            std::cmp::Ordering::Equal => self.character.cmp(&other.character),
            ord => ord,
        }
    }
}

/// A range in a text document, expressed as start and end positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Range {
    /// The range's start position (inclusive).
    pub start: Position,
    /// The range's end position (exclusive).
    pub end: Position,
}

impl Range {
    /// Create a new range.
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Check if this range contains a position.
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Check if this range is empty (zero-width).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Diagnostic severity levels, matching LSP DiagnosticSeverity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// Reports an error.
    Error = 1,
    /// Reports a warning.
    Warning = 2,
    /// Reports an information.
    Information = 3,
    /// Reports a hint.
    Hint = 4,
}

/// A diagnostic message, such as a compiler error or warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The range at which the diagnostic applies.
    pub range: Range,
    /// The diagnostic's severity.
    pub severity: DiagnosticSeverity,
    /// The engine's numeric code, rendered as a string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Dialect label of the fragment: `"ts"` or `"js"`.
    pub source: String,
    /// The diagnostic's message.
    pub message: String,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(
        range: Range,
        severity: DiagnosticSeverity,
        source: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            range,
            severity,
            code: None,
            source: source.into(),
            message: message.into(),
        }
    }

    /// Set the diagnostic code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// The language-tagged body of a hover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoverContents {
    /// Code fence language, `"ts"` or `"js"`.
    pub language: String,
    pub value: String,
}

/// Hover information for a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hover {
    /// The symbol the hover describes, in host document coordinates.
    pub range: Range,
    pub contents: HoverContents,
    /// Doc comment attached to the declaration, as plain text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

/// A replacement of `range` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_ordering() {
        let p1 = Position::new(0, 5);
        let p2 = Position::new(1, 0);
        let p3 = Position::new(1, 5);

        assert!(p1 < p2);
        assert!(p2 < p3);
        assert!(p1 < p3);
    }

    #[test]
    fn range_contains() {
        let range = Range::new(Position::new(1, 0), Position::new(3, 10));

        assert!(!range.contains(Position::new(0, 5)));
        assert!(range.contains(Position::new(1, 0)));
        assert!(range.contains(Position::new(2, 50)));
        assert!(!range.contains(Position::new(3, 10)));
    }

    #[test]
    fn diagnostic_serialization() {
        let diag = Diagnostic::new(
            Range::new(Position::new(0, 4), Position::new(0, 5)),
            DiagnosticSeverity::Error,
            "ts",
            "Type 'string' is not assignable to type 'number'.",
        )
        .with_code("2322");

        let json = serde_json::to_string(&diag).unwrap();
        insta::assert_snapshot!(json, @r#"{"range":{"start":{"line":0,"character":4},"end":{"line":0,"character":5}},"severity":"error","code":"2322","source":"ts","message":"Type 'string' is not assignable to type 'number'."}"#);
    }

    #[test]
    fn hover_without_documentation_omits_field() {
        let hover = Hover {
            range: Range::default(),
            contents: HoverContents {
                language: "js".to_string(),
                value: "let x: number".to_string(),
            },
            documentation: None,
        };
        let json = serde_json::to_value(&hover).unwrap();
        assert!(json.get("documentation").is_none());
        assert_eq!(json["contents"]["language"], "js");
    }
}
