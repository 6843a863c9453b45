//! Conversion of engine results into host document terms.

use embedscript_engine::{DiagnosticCategory, EngineDiagnostic, QuickInfo};

use crate::dialect::Dialect;
use crate::document::HostDocument;
use crate::types::{Diagnostic, DiagnosticSeverity, Hover, HoverContents, Range};

/// Host range covering `length` bytes of the fragment from `start`.
pub fn to_host_range<D: HostDocument + ?Sized>(doc: &D, start: usize, length: usize) -> Range {
    Range::new(
        doc.position_at(start),
        doc.position_at(start.saturating_add(length)),
    )
}

pub fn diagnostic_severity_of(category: DiagnosticCategory) -> DiagnosticSeverity {
    match category {
        DiagnosticCategory::Error => DiagnosticSeverity::Error,
        DiagnosticCategory::Warning => DiagnosticSeverity::Warning,
        DiagnosticCategory::Suggestion => DiagnosticSeverity::Hint,
        DiagnosticCategory::Message => DiagnosticSeverity::Information,
    }
}

/// The label diagnostics and hovers are tagged with.
pub fn dialect_label_of(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::TypedScript => "ts",
        Dialect::Script | Dialect::Markup | Dialect::Unknown => "js",
    }
}

pub fn to_host_diagnostic<D: HostDocument + ?Sized>(
    doc: &D,
    diagnostic: &EngineDiagnostic,
    dialect: Dialect,
) -> Diagnostic {
    Diagnostic::new(
        to_host_range(doc, diagnostic.span.start, diagnostic.span.length),
        diagnostic_severity_of(diagnostic.category),
        dialect_label_of(dialect),
        diagnostic.message.clone(),
    )
    .with_code(diagnostic.code.to_string())
}

pub fn to_host_hover<D: HostDocument + ?Sized>(
    doc: &D,
    info: &QuickInfo,
    dialect: Dialect,
) -> Hover {
    Hover {
        range: to_host_range(doc, info.span.start, info.span.length),
        contents: HoverContents {
            language: dialect_label_of(dialect).to_string(),
            value: info.display.clone(),
        },
        documentation: info.documentation.clone(),
    }
}

#[cfg(test)]
mod tests {
    use embedscript_engine::{TextSpan, codes};

    use super::*;
    use crate::document::ScriptDocument;
    use crate::types::Position;

    #[test]
    fn full_range_round_trips() {
        for text in ["", "let x = 1", "a\nb\n", "const s = 'é😀';\nlet t;"] {
            let doc = ScriptDocument::from_host("/w/a.ts", text, 1);
            let range = to_host_range(&doc, 0, doc.text_length());
            assert_eq!(doc.offset_at(range.start), 0, "{text:?}");
            assert_eq!(doc.offset_at(range.end), text.len(), "{text:?}");
        }
    }

    #[test]
    fn markup_fragment_round_trips() {
        let doc = ScriptDocument::from_host(
            "/w/App.svelte",
            "<main/>\n<script>\n  let x;\n</script>",
            1,
        );
        let range = to_host_range(&doc, 0, doc.text_length());
        assert_eq!(range.start, Position::new(1, 8));
        assert_eq!(range.end, Position::new(3, 0));
        assert_eq!(doc.offset_at(range.start), 0);
        assert_eq!(doc.offset_at(range.end), doc.text_length());
    }

    #[test]
    fn severity_mapping() {
        assert_eq!(
            diagnostic_severity_of(DiagnosticCategory::Error),
            DiagnosticSeverity::Error
        );
        assert_eq!(
            diagnostic_severity_of(DiagnosticCategory::Warning),
            DiagnosticSeverity::Warning
        );
        assert_eq!(
            diagnostic_severity_of(DiagnosticCategory::Suggestion),
            DiagnosticSeverity::Hint
        );
        assert_eq!(
            diagnostic_severity_of(DiagnosticCategory::Message),
            DiagnosticSeverity::Information
        );
    }

    #[test]
    fn only_typed_script_is_labelled_ts() {
        assert_eq!(dialect_label_of(Dialect::TypedScript), "ts");
        assert_eq!(dialect_label_of(Dialect::Script), "js");
        assert_eq!(dialect_label_of(Dialect::Markup), "js");
        assert_eq!(dialect_label_of(Dialect::Unknown), "js");
    }

    #[test]
    fn diagnostic_conversion() {
        let doc = ScriptDocument::from_host("/w/a.ts", "let x: number = 'a'", 1);
        let engine = EngineDiagnostic::error(
            TextSpan::new(4, 1),
            codes::NOT_ASSIGNABLE,
            "Type 'string' is not assignable to type 'number'.",
        );
        let diagnostic = to_host_diagnostic(&doc, &engine, Dialect::TypedScript);
        insta::assert_json_snapshot!(diagnostic, @r#"
        {
          "range": {
            "start": {
              "line": 0,
              "character": 4
            },
            "end": {
              "line": 0,
              "character": 5
            }
          },
          "severity": "error",
          "code": "2322",
          "source": "ts",
          "message": "Type 'string' is not assignable to type 'number'."
        }
        "#);
    }

    #[test]
    fn hover_conversion() {
        let doc = ScriptDocument::from_host("/w/a.js", "let count = 1;", 1);
        let info = QuickInfo {
            span: TextSpan::new(4, 5),
            display: "let count: number".to_string(),
            documentation: Some("How many.".to_string()),
        };
        let hover = to_host_hover(&doc, &info, Dialect::Script);
        assert_eq!(hover.contents.language, "js");
        assert_eq!(hover.contents.value, "let count: number");
        assert_eq!(hover.documentation.as_deref(), Some("How many."));
        assert_eq!(hover.range.start, Position::new(0, 4));
        assert_eq!(hover.range.end, Position::new(0, 9));
    }
}
