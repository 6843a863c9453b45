//! Whole-fragment formatting.
//!
//! Formatting is the only asynchronous operation in the crate: reading the
//! formatter configuration is file I/O and is awaited before the
//! synchronous formatter runs.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::adapters::to_host_range;
use crate::dialect::Dialect;
use crate::document::HostDocument;
use crate::error::FormatError;
use crate::types::TextEdit;

/// Formatter configuration file names, in lookup order.
pub const FORMAT_CONFIG_FILE_NAMES: &[&str] = &[".prettierrc", ".prettierrc.json"];

/// Layout settings, read from the nearest prettier configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormatConfig {
    pub tab_width: usize,
    pub use_tabs: bool,
    pub print_width: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            tab_width: 2,
            use_tabs: false,
            print_width: 80,
        }
    }
}

impl FormatConfig {
    /// Walk up from the directory of `path` to the nearest configuration
    /// file. Missing or unreadable configuration gives the defaults.
    pub async fn discover(path: &Path) -> Self {
        for dir in path.parent().into_iter().flat_map(Path::ancestors) {
            for name in FORMAT_CONFIG_FILE_NAMES {
                let candidate = dir.join(name);
                let text = match tokio::fs::read_to_string(&candidate).await {
                    Ok(text) => text,
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(err) => {
                        tracing::debug!(config = %candidate.display(), error = %err, "Unreadable formatter config");
                        return Self::default();
                    }
                };
                return match serde_json::from_str(&text) {
                    Ok(config) => {
                        tracing::debug!(config = %candidate.display(), "Using formatter config");
                        config
                    }
                    Err(err) => {
                        tracing::debug!(config = %candidate.display(), error = %err, "Malformed formatter config");
                        Self::default()
                    }
                };
            }
        }
        Self::default()
    }

    /// One level of indentation.
    pub fn indent_unit(&self) -> String {
        if self.use_tabs {
            "\t".to_string()
        } else {
            " ".repeat(self.tab_width)
        }
    }
}

/// A formatter for script text.
pub trait ScriptFormatter: Send + Sync {
    /// Format the whole of `text`. The result carries no base indentation.
    fn format(&self, text: &str, dialect: Dialect, config: &FormatConfig) -> Result<String, FormatError>;
}

/// Re-indents by bracket depth.
///
/// Trailing whitespace is trimmed, runs of blank lines collapse to one and
/// the output ends with exactly one newline. Brackets inside strings,
/// template literals and comments do not count. Template literal lines are
/// kept verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct BraceFormatter;

impl ScriptFormatter for BraceFormatter {
    fn format(&self, text: &str, _dialect: Dialect, config: &FormatConfig) -> Result<String, FormatError> {
        let unit = config.indent_unit();
        let mut scanner = Scanner::default();
        let mut lines: Vec<String> = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line_number = index + 1;
            match scanner.mode {
                Mode::Template => {
                    lines.push(raw.to_string());
                    scanner.scan(raw, line_number)?;
                    continue;
                }
                Mode::BlockComment => {
                    let trimmed = raw.trim();
                    let line = match trimmed {
                        "" => String::new(),
                        star if star.starts_with('*') => {
                            format!("{} {star}", unit.repeat(scanner.depth()))
                        }
                        other => format!("{}{other}", unit.repeat(scanner.depth())),
                    };
                    lines.push(line);
                    scanner.scan(trimmed, line_number)?;
                    continue;
                }
                Mode::Code => {}
            }

            let trimmed = raw.trim();
            if trimmed.is_empty() {
                if lines.last().is_some_and(|last| !last.is_empty()) {
                    lines.push(String::new());
                }
                continue;
            }
            let closers = trimmed
                .chars()
                .take_while(|ch| matches!(ch, '}' | ')' | ']'))
                .count();
            let level = scanner.depth().saturating_sub(closers);
            lines.push(format!("{}{trimmed}", unit.repeat(level)));
            scanner.scan(trimmed, line_number)?;
        }
        scanner.finish()?;

        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        if lines.is_empty() {
            return Ok(String::new());
        }
        let mut formatted = lines.join("\n");
        formatted.push('\n');
        Ok(formatted)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Mode {
    #[default]
    Code,
    BlockComment,
    Template,
}

/// Bracket and literal state carried from line to line.
#[derive(Debug, Default)]
struct Scanner {
    mode: Mode,
    /// Open brackets; `$` marks a `${` inside a template literal.
    stack: Vec<char>,
}

impl Scanner {
    fn depth(&self) -> usize {
        self.stack.iter().filter(|open| **open != '$').count()
    }

    fn scan(&mut self, line: &str, line_number: usize) -> Result<(), FormatError> {
        let mut chars = line.chars().peekable();
        while let Some(ch) = chars.next() {
            match self.mode {
                Mode::BlockComment => {
                    if ch == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        self.mode = Mode::Code;
                    }
                }
                Mode::Template => match ch {
                    '\\' => {
                        chars.next();
                    }
                    '`' => self.mode = Mode::Code,
                    '$' if chars.peek() == Some(&'{') => {
                        chars.next();
                        self.stack.push('$');
                        self.mode = Mode::Code;
                    }
                    _ => {}
                },
                Mode::Code => match ch {
                    '/' if chars.peek() == Some(&'/') => return Ok(()),
                    '/' if chars.peek() == Some(&'*') => {
                        chars.next();
                        self.mode = Mode::BlockComment;
                    }
                    '"' | '\'' => {
                        while let Some(inner) = chars.next() {
                            if inner == '\\' {
                                chars.next();
                            } else if inner == ch {
                                break;
                            }
                        }
                    }
                    '`' => self.mode = Mode::Template,
                    '(' | '[' | '{' => self.stack.push(ch),
                    ')' | ']' | '}' => self.close(ch, line_number)?,
                    _ => {}
                },
            }
        }
        Ok(())
    }

    fn close(&mut self, found: char, line: usize) -> Result<(), FormatError> {
        let expected = match found {
            ')' => '(',
            ']' => '[',
            _ => '{',
        };
        match self.stack.pop() {
            Some(open) if open == expected => Ok(()),
            Some('$') if found == '}' => {
                self.mode = Mode::Template;
                Ok(())
            }
            _ => Err(FormatError::Unbalanced { line, found }),
        }
    }

    fn finish(&self) -> Result<(), FormatError> {
        match (self.mode, self.stack.last()) {
            (Mode::Code, None) => Ok(()),
            (Mode::Code, Some(&open)) => Err(FormatError::Unclosed { open }),
            (Mode::BlockComment | Mode::Template, _) => Err(FormatError::Unterminated),
        }
    }
}

/// Indentation style of a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indent {
    /// Number of indent characters per level; 0 when nothing is indented.
    pub amount: usize,
    pub kind: IndentKind,
    /// The indentation string for one level.
    pub indent: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndentKind {
    Space,
    Tab,
    None,
}

/// Detect the indentation used by `text`.
///
/// Every indented line contributes the difference from the previous
/// line's indentation; the most frequent difference wins, ties going to the
/// one that repeated the same indentation most often. Single-space indents
/// are ignored unless nothing else is found.
pub fn detect_indent(text: &str) -> Indent {
    let counts = indent_counts(text, true);
    let counts = if counts.is_empty() {
        indent_counts(text, false)
    } else {
        counts
    };

    let best = counts
        .into_iter()
        .max_by(|(a_key, (a_uses, a_weight)), (b_key, (b_uses, b_weight))| {
            a_uses
                .cmp(b_uses)
                .then(a_weight.cmp(b_weight))
                // Deterministic choice between equal candidates.
                .then(b_key.1.cmp(&a_key.1))
                .then(b_key.0.cmp(&a_key.0))
        });

    match best {
        Some(((kind, amount), _)) => {
            let unit = if kind == IndentKind::Tab { "\t" } else { " " };
            Indent {
                amount,
                kind,
                indent: unit.repeat(amount),
            }
        }
        None => Indent {
            amount: 0,
            kind: IndentKind::None,
            indent: String::new(),
        },
    }
}

/// `(kind, size difference) -> (uses, weight)`.
fn indent_counts(text: &str, ignore_single_spaces: bool) -> HashMap<(IndentKind, usize), (usize, usize)> {
    let mut counts: HashMap<(IndentKind, usize), (usize, usize)> = HashMap::new();
    let mut previous_size = 0;
    let mut previous_kind = IndentKind::None;
    let mut key: Option<(IndentKind, usize)> = None;

    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        let spaces = line.len() - line.trim_start_matches(' ').len();
        let tabs = line.len() - line.trim_start_matches('\t').len();
        let (kind, size) = match (spaces, tabs) {
            (0, 0) => {
                previous_size = 0;
                previous_kind = IndentKind::None;
                continue;
            }
            (0, tabs) => (IndentKind::Tab, tabs),
            (spaces, _) => (IndentKind::Space, spaces),
        };
        if ignore_single_spaces && kind == IndentKind::Space && size == 1 {
            continue;
        }
        if kind != previous_kind {
            previous_size = 0;
        }
        previous_kind = kind;

        let difference = size.abs_diff(previous_size);
        previous_size = size;
        let (uses, weight) = if difference == 0 {
            (0, 1)
        } else {
            key = Some((kind, difference));
            (1, 0)
        };
        if let Some(current) = key {
            let entry = counts.entry(current).or_insert((0, 0));
            entry.0 += uses;
            entry.1 += weight;
        }
    }
    counts
}

/// Format the fragment of `doc` as one edit.
///
/// The edit replaces the whole fragment with a leading newline and the
/// formatted text, every non-blank line indented the way the original
/// fragment was. Empty fragments, non-script dialects and formatter
/// failures produce no edits.
pub async fn format_document<D, F>(doc: &D, formatter: &F) -> Vec<TextEdit>
where
    D: HostDocument + ?Sized,
    F: ScriptFormatter + ?Sized,
{
    let dialect = Dialect::from_attributes(doc.attributes());
    match dialect {
        Dialect::Script | Dialect::TypedScript => {}
        Dialect::Markup | Dialect::Unknown => return Vec::new(),
    }
    if doc.text().is_empty() {
        return Vec::new();
    }

    let config = FormatConfig::discover(doc.file_path()).await;
    let text = doc.text();
    let formatted = match formatter.format(text, dialect, &config) {
        Ok(formatted) => formatted,
        Err(err) => {
            tracing::warn!(file = %doc.file_path().display(), error = %err, "Formatting failed");
            return Vec::new();
        }
    };

    let indent = detect_indent(text).indent;
    let indented = formatted
        .split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    vec![TextEdit {
        range: to_host_range(doc, 0, doc.text_length()),
        new_text: format!("\n{indented}"),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ScriptDocument;
    use crate::types::Position;

    fn format(text: &str) -> String {
        BraceFormatter
            .format(text, Dialect::Script, &FormatConfig::default())
            .unwrap()
    }

    #[test]
    fn reindents_by_bracket_depth() {
        let text = "function f(a) {\nif (a) {\n      return [\n1,\n2,\n];   \n}\n\n\n\nreturn 0;\n}";
        insta::assert_snapshot!(format(text), @r"
        function f(a) {
          if (a) {
            return [
              1,
              2,
            ];
          }

          return 0;
        }
        ");
    }

    #[test]
    fn brackets_in_strings_and_comments_are_ignored() {
        let text = "const s = '{';\n// }\n/* { */\nconst t = \"(\";\nlet u = 1;";
        insta::assert_snapshot!(format(text), @r#"
        const s = '{';
        // }
        /* { */
        const t = "(";
        let u = 1;
        "#);
    }

    #[test]
    fn template_literals_are_verbatim() {
        let text = "const t = `\n   keep ${ {a: 1}.a }\n  me`;\nif (x) {\ny();\n}";
        let formatted = format(text);
        assert_eq!(
            formatted,
            "const t = `\n   keep ${ {a: 1}.a }\n  me`;\nif (x) {\n  y();\n}\n"
        );
    }

    #[test]
    fn tabs_from_config() {
        let config = FormatConfig {
            use_tabs: true,
            ..FormatConfig::default()
        };
        let formatted = BraceFormatter
            .format("{\nx;\n}", Dialect::TypedScript, &config)
            .unwrap();
        assert_eq!(formatted, "{\n\tx;\n}\n");
    }

    #[test]
    fn unbalanced_input_is_an_error() {
        let err = BraceFormatter
            .format("let a = 1;\n}", Dialect::Script, &FormatConfig::default())
            .unwrap_err();
        assert_eq!(err, FormatError::Unbalanced { line: 2, found: '}' });

        let err = BraceFormatter
            .format("if (a) {", Dialect::Script, &FormatConfig::default())
            .unwrap_err();
        assert_eq!(err, FormatError::Unclosed { open: '{' });

        let err = BraceFormatter
            .format("/* open", Dialect::Script, &FormatConfig::default())
            .unwrap_err();
        assert_eq!(err, FormatError::Unterminated);
    }

    #[test]
    fn detects_spaces_and_tabs() {
        let spaces = detect_indent("a\n    b\n        c\n    d\n");
        assert_eq!(spaces.kind, IndentKind::Space);
        assert_eq!(spaces.amount, 4);
        assert_eq!(spaces.indent, "    ");

        let tabs = detect_indent("a\n\tb\n\t\tc\n");
        assert_eq!(tabs.kind, IndentKind::Tab);
        assert_eq!(tabs.indent, "\t");

        let fragment = detect_indent("\n  let x = 1;\n  let y = 2;\n");
        assert_eq!(fragment.indent, "  ");

        let none = detect_indent("a\nb\n");
        assert_eq!(none.kind, IndentKind::None);
        assert_eq!(none.indent, "");
    }

    #[test]
    fn single_spaces_only_count_as_last_resort() {
        assert_eq!(detect_indent("a\n b\n   c\n   d\n").amount, 3);
        assert_eq!(detect_indent("a\n b\n").amount, 1);
    }

    #[tokio::test]
    async fn empty_document_has_no_edits() {
        let doc = ScriptDocument::from_host("/nonexistent/empty.ts", "", 1);
        assert!(format_document(&doc, &BraceFormatter).await.is_empty());

        let markup = ScriptDocument::from_host("/nonexistent/App.svelte", "<p>no script</p>", 1);
        assert!(format_document(&markup, &BraceFormatter).await.is_empty());
    }

    #[tokio::test]
    async fn fragment_is_replaced_and_reindented() {
        let text = "<div/>\n<script>\n  if (a) {\n  b();\n  }\n</script>\n";
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("App.svelte");
        let doc = ScriptDocument::from_host(&path, text, 1);

        let edits = format_document(&doc, &BraceFormatter).await;
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].range.start, Position::new(1, 8));
        assert_eq!(edits[0].range.end, Position::new(5, 0));
        assert_eq!(edits[0].new_text, "\n  if (a) {\n    b();\n  }\n");
    }

    #[tokio::test]
    async fn prettier_config_is_discovered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".prettierrc"), r#"{ "tabWidth": 4 }"#).unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();

        let config = FormatConfig::discover(&dir.path().join("src/a.ts")).await;
        assert_eq!(config.tab_width, 4);
        assert!(!config.use_tabs);
        assert_eq!(config.print_width, 80);

        let doc = ScriptDocument::from_host(dir.path().join("src/a.ts"), "if (a) {\nb();\n}", 1);
        let edits = format_document(&doc, &BraceFormatter).await;
        assert_eq!(edits[0].new_text, "\nif (a) {\n    b();\n}\n");
    }

    #[tokio::test]
    async fn malformed_prettier_config_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".prettierrc"), "semi: false").unwrap();
        let config = FormatConfig::discover(&dir.path().join("a.ts")).await;
        assert_eq!(config, FormatConfig::default());
    }
}
