//! Conversion between embedscript-core types and tower_lsp::lsp_types.

use std::path::PathBuf;

use tower_lsp::lsp_types::{
    Diagnostic as LspDiagnostic, DiagnosticSeverity as LspSeverity, Hover as LspHover,
    HoverContents as LspHoverContents, LanguageString, MarkedString, NumberOrString,
    Position as LspPosition, Range as LspRange, TextEdit as LspTextEdit, Url,
};

use embedscript_core::types::{Diagnostic, DiagnosticSeverity, Hover, Position, Range, TextEdit};

/// Convert an embedscript-core Position to an lsp-types Position.
pub fn position_to_lsp(pos: &Position) -> LspPosition {
    LspPosition {
        line: pos.line,
        character: pos.character,
    }
}

pub fn position_from_lsp(pos: &LspPosition) -> Position {
    Position::new(pos.line, pos.character)
}

/// Convert an embedscript-core Range to an lsp-types Range.
pub fn range_to_lsp(range: &Range) -> LspRange {
    LspRange {
        start: position_to_lsp(&range.start),
        end: position_to_lsp(&range.end),
    }
}

pub fn severity_to_lsp(severity: &DiagnosticSeverity) -> LspSeverity {
    match severity {
        DiagnosticSeverity::Error => LspSeverity::ERROR,
        DiagnosticSeverity::Warning => LspSeverity::WARNING,
        DiagnosticSeverity::Information => LspSeverity::INFORMATION,
        DiagnosticSeverity::Hint => LspSeverity::HINT,
    }
}

/// Convert an embedscript-core Diagnostic to an lsp-types Diagnostic.
pub fn diagnostic_to_lsp(diag: &Diagnostic) -> LspDiagnostic {
    LspDiagnostic {
        range: range_to_lsp(&diag.range),
        severity: Some(severity_to_lsp(&diag.severity)),
        code: diag.code.clone().map(NumberOrString::String),
        code_description: None,
        source: Some(diag.source.clone()),
        message: diag.message.clone(),
        related_information: None,
        tags: None,
        data: None,
    }
}

/// A language-tagged code block, followed by the doc comment when there is one.
pub fn hover_to_lsp(hover: &Hover) -> LspHover {
    let code = MarkedString::LanguageString(LanguageString {
        language: hover.contents.language.clone(),
        value: hover.contents.value.clone(),
    });
    let contents = match &hover.documentation {
        Some(doc) => LspHoverContents::Array(vec![code, MarkedString::String(doc.clone())]),
        None => LspHoverContents::Scalar(code),
    };
    LspHover {
        contents,
        range: Some(range_to_lsp(&hover.range)),
    }
}

pub fn text_edit_to_lsp(edit: &TextEdit) -> LspTextEdit {
    LspTextEdit {
        range: range_to_lsp(&edit.range),
        new_text: edit.new_text.clone(),
    }
}

/// File system path for a document URI. Non-file URIs keep their path
/// component so they still get a stable identity.
pub fn path_from_uri(uri: &Url) -> PathBuf {
    uri.to_file_path()
        .unwrap_or_else(|()| PathBuf::from(uri.path()))
}

/// LSP versions are signed; negative ones are treated as unversioned.
pub fn version_from_lsp(version: i32) -> u64 {
    u64::try_from(version).unwrap_or(0)
}
