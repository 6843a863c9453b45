//! Batch diagnostics for files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use embedscript_core::{Diagnostic, DiagnosticSeverity, ScriptDocument, SessionManager};

#[derive(Debug, Serialize)]
struct FileReport {
    file: PathBuf,
    diagnostics: Vec<Diagnostic>,
}

/// Check every file through one session, the way an editor would see them
/// when opened one after another.
pub fn execute(workspace: &Path, files: &[PathBuf], json: bool) -> Result<()> {
    let mut manager: SessionManager = SessionManager::new(std::path::absolute(workspace)?);
    let mut reports = Vec::with_capacity(files.len());

    for file in files {
        let path = std::path::absolute(file)?;
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let doc = ScriptDocument::from_host(&path, text, 1);
        let diagnostics = manager.diagnostics(&doc);
        tracing::debug!(file = %path.display(), count = diagnostics.len(), "Checked");
        reports.push(FileReport {
            file: path,
            diagnostics,
        });
    }

    let errors = reports
        .iter()
        .flat_map(|report| &report.diagnostics)
        .filter(|diagnostic| diagnostic.severity == DiagnosticSeverity::Error)
        .count();

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            for diagnostic in &report.diagnostics {
                println!("{}", render(&report.file, diagnostic));
            }
        }
    }

    if errors > 0 {
        anyhow::bail!("{errors} error(s) found");
    }
    Ok(())
}

/// `file:line:col: severity source(code): message`, one-based like compilers print.
fn render(file: &Path, diagnostic: &Diagnostic) -> String {
    let severity = match diagnostic.severity {
        DiagnosticSeverity::Error => "error",
        DiagnosticSeverity::Warning => "warning",
        DiagnosticSeverity::Information => "info",
        DiagnosticSeverity::Hint => "hint",
    };
    let code = diagnostic
        .code
        .as_deref()
        .map(|code| format!("({code})"))
        .unwrap_or_default();
    format!(
        "{}:{}:{}: {severity} {}{code}: {}",
        file.display(),
        diagnostic.range.start.line + 1,
        diagnostic.range.start.character + 1,
        diagnostic.source,
        diagnostic.message
    )
}
