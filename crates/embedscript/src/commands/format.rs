//! Formatting of files on disk.

use std::path::PathBuf;

use anyhow::{Context, Result};

use embedscript_core::{BraceFormatter, LineIndex, ScriptDocument, TextEdit, format_document};

pub fn execute(files: &[PathBuf], write: bool) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async {
        for file in files {
            let path = std::path::absolute(file)?;
            let text = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let doc = ScriptDocument::from_host(&path, text.as_str(), 1);
            let edits = format_document(&doc, &BraceFormatter).await;
            let formatted = apply_edits(&text, &edits);

            if !write {
                print!("{formatted}");
            } else if formatted != text {
                tokio::fs::write(&path, formatted)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                tracing::info!(file = %path.display(), "Formatted");
            }
        }
        Ok::<_, anyhow::Error>(())
    })
}

/// Apply non-overlapping edits to `text`.
fn apply_edits(text: &str, edits: &[TextEdit]) -> String {
    let index = LineIndex::new(text);
    let mut spans: Vec<(usize, usize, &str)> = edits
        .iter()
        .map(|edit| {
            (
                index.offset_at(text, edit.range.start),
                index.offset_at(text, edit.range.end),
                edit.new_text.as_str(),
            )
        })
        .collect();
    // Back to front, so earlier offsets stay valid
    spans.sort_by_key(|&(start, _, _)| std::cmp::Reverse(start));

    let mut result = text.to_string();
    for (start, end, new_text) in spans {
        result.replace_range(start..end, new_text);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedscript_core::{Position, Range};

    #[test]
    fn edits_apply_back_to_front() {
        let text = "one\ntwo\nthree";
        let edits = vec![
            TextEdit {
                range: Range::new(Position::new(0, 0), Position::new(0, 3)),
                new_text: "1".to_string(),
            },
            TextEdit {
                range: Range::new(Position::new(2, 0), Position::new(2, 5)),
                new_text: "3".to_string(),
            },
        ];
        assert_eq!(apply_edits(text, &edits), "1\ntwo\n3");
        assert_eq!(apply_edits(text, &[]), text);
    }
}
