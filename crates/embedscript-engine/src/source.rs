//! Parsed source files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tree_sitter::{Language, Node, Parser, Tree};

use crate::error::{EngineError, EngineResult};
use crate::host::ScriptKind;

/// One file as seen by an engine instance: its text at a given version and
/// the syntax tree for that text.
#[derive(Debug)]
pub struct SourceFile {
    path: PathBuf,
    version: String,
    kind: ScriptKind,
    text: Arc<str>,
    /// `None` for [`ScriptKind::External`] files, which are never parsed.
    tree: Option<Tree>,
}

impl SourceFile {
    /// Parse `text` with the grammar matching `kind`.
    ///
    /// `kind` must already be concrete; [`ScriptKind::Unknown`] is parsed
    /// as untyped script.
    pub fn parse(
        path: &Path,
        version: String,
        kind: ScriptKind,
        text: Arc<str>,
    ) -> EngineResult<Self> {
        let tree = match grammar_for(kind) {
            Some(language) => {
                let mut parser = Parser::new();
                parser
                    .set_language(&language)
                    .map_err(|e| EngineError::Grammar(e.to_string()))?;
                let tree = parser
                    .parse(text.as_bytes(), None)
                    .ok_or_else(|| EngineError::ParseFailed(path.to_path_buf()))?;
                Some(tree)
            }
            None => None,
        };

        Ok(Self {
            path: path.to_path_buf(),
            version,
            kind,
            text,
            tree,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn kind(&self) -> ScriptKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_typed(&self) -> bool {
        self.kind == ScriptKind::Ts
    }

    /// Root of the syntax tree, if the file was parsed.
    pub fn root(&self) -> Option<Node<'_>> {
        self.tree.as_ref().map(Tree::root_node)
    }

    /// Source text covered by a node.
    pub fn node_text(&self, node: Node<'_>) -> &str {
        self.text.get(node.start_byte()..node.end_byte()).unwrap_or("")
    }
}

fn grammar_for(kind: ScriptKind) -> Option<Language> {
    match kind {
        ScriptKind::Ts => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        ScriptKind::Js | ScriptKind::Unknown => Some(tree_sitter_javascript::LANGUAGE.into()),
        ScriptKind::External => None,
    }
}

/// Named children of `node`, collected so callers can recurse freely.
pub(crate) fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Every child of `node`, named or not.
pub(crate) fn children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Depth-first pre-order visit of every named node under `node`.
pub(crate) fn visit_named<'t>(node: Node<'t>, visit: &mut impl FnMut(Node<'t>)) {
    visit(node);
    for child in named_children(node) {
        visit_named(child, visit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_source_parses_annotations() {
        let file = SourceFile::parse(
            Path::new("/a.ts"),
            "1".into(),
            ScriptKind::Ts,
            Arc::from("let x: number = 1;"),
        )
        .unwrap();
        let root = file.root().unwrap();
        assert!(!root.has_error());
        assert!(file.is_typed());
    }

    #[test]
    fn annotations_are_errors_in_untyped_source() {
        let file = SourceFile::parse(
            Path::new("/a.js"),
            "1".into(),
            ScriptKind::Js,
            Arc::from("let x: number = 1;"),
        )
        .unwrap();
        assert!(file.root().unwrap().has_error());
    }

    #[test]
    fn external_files_have_no_tree() {
        let file = SourceFile::parse(
            Path::new("/a.svelte"),
            "0".into(),
            ScriptKind::External,
            Arc::from("<div></div>"),
        )
        .unwrap();
        assert!(file.root().is_none());
        assert_eq!(file.text(), "<div></div>");
    }
}
