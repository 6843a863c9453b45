//! Documents as the session manager sees them.
//!
//! A [`HostDocument`] is whatever the editor integration hands over: the
//! text of one script fragment, its attributes and a way to map between
//! offsets in that text and positions in the enclosing file. The bundled
//! [`ScriptDocument`] covers both markup files (a `<script>` block inside a
//! larger file) and standalone script files.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::dialect::Dialect;
use crate::fragment::extract_script_fragment;
use crate::snapshot::floor_char_boundary;
use crate::types::Position;

/// A script fragment together with its host document coordinates.
///
/// Offsets are byte offsets into [`HostDocument::text`]; positions are in
/// the host document, so results can be shown without further mapping.
pub trait HostDocument: Send + Sync {
    /// Path of the enclosing file. Stable for the life of the fragment.
    fn file_path(&self) -> &Path;

    /// The fragment text.
    fn text(&self) -> &str;

    fn text_length(&self) -> usize {
        self.text().len()
    }

    /// Fragment offset of a host position, clamped to the fragment.
    fn offset_at(&self, position: Position) -> usize;

    /// Whether a host position falls inside the fragment, either edge
    /// included.
    fn contains(&self, position: Position) -> bool;

    /// Host position of a fragment offset, clamped to the fragment.
    fn position_at(&self, offset: usize) -> Position;

    fn version(&self) -> u64;

    /// Attributes of the fragment's opening tag, the dialect hint.
    fn attributes(&self) -> &BTreeMap<String, String>;
}

/// Line start offsets of a text, for offset/position conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(index, _)| index + 1))
            .collect();
        Self { line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Position of byte `offset` in `text`, which must be the text this
    /// index was built from.
    pub fn position_at(&self, text: &str, offset: usize) -> Position {
        let offset = floor_char_boundary(text, offset);
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        let character: usize = text[line_start..offset].chars().map(char::len_utf16).sum();
        Position::new(line as u32, character as u32)
    }

    /// Byte offset of `position` in `text`. Lines past the end map to the
    /// end of the text; characters past the end of a line map to the end of
    /// that line.
    pub fn offset_at(&self, text: &str, position: Position) -> usize {
        let Some(&line_start) = self.line_starts.get(position.line as usize) else {
            return text.len();
        };
        let line_end = self
            .line_starts
            .get(position.line as usize + 1)
            .copied()
            .unwrap_or(text.len());

        let mut remaining = position.character as usize;
        for (index, ch) in text[line_start..line_end].char_indices() {
            if remaining == 0 || ch == '\n' || ch == '\r' {
                return line_start + index;
            }
            remaining = remaining.saturating_sub(ch.len_utf16());
        }
        line_end
    }
}

/// A script fragment view over a host file.
#[derive(Debug, Clone)]
pub struct ScriptDocument {
    path: PathBuf,
    host_text: Arc<str>,
    index: LineIndex,
    start: usize,
    end: usize,
    version: u64,
    attributes: BTreeMap<String, String>,
}

impl ScriptDocument {
    /// A fragment covering `text[start..end]` of the host file.
    pub fn new(
        path: impl Into<PathBuf>,
        host_text: impl Into<Arc<str>>,
        start: usize,
        end: usize,
        version: u64,
        attributes: BTreeMap<String, String>,
    ) -> Self {
        let host_text = host_text.into();
        let end = floor_char_boundary(&host_text, end);
        let start = floor_char_boundary(&host_text, start).min(end);
        Self {
            path: path.into(),
            index: LineIndex::new(&host_text),
            host_text,
            start,
            end,
            version,
            attributes,
        }
    }

    /// Build the fragment view for a file as the editor sees it.
    ///
    /// Markup files expose their instance `<script>` block (or an empty
    /// fragment when there is none). Every other file is a fragment of
    /// itself, with the `type` attribute implied by its extension.
    pub fn from_host(path: impl Into<PathBuf>, text: impl Into<Arc<str>>, version: u64) -> Self {
        let path = path.into();
        let text = text.into();
        match Dialect::from_path(&path) {
            Dialect::Markup => match extract_script_fragment(&text) {
                Some(fragment) => {
                    let (start, end) = (fragment.start, fragment.end());
                    Self::new(path, text, start, end, version, fragment.attributes)
                }
                None => Self::new(path, text, 0, 0, version, BTreeMap::new()),
            },
            dialect @ (Dialect::Script | Dialect::TypedScript | Dialect::Unknown) => {
                let attributes = dialect
                    .implied_type_attribute()
                    .map(|mime| ("type".to_string(), mime.to_string()))
                    .into_iter()
                    .collect();
                let len = text.len();
                Self::new(path, text, 0, len, version, attributes)
            }
        }
    }

    /// The whole host file.
    pub fn host_text(&self) -> &str {
        &self.host_text
    }

    /// Byte offset of the fragment in the host file.
    pub fn fragment_start(&self) -> usize {
        self.start
    }

    pub fn dialect(&self) -> Dialect {
        Dialect::from_attributes(&self.attributes)
    }

    /// Replace the host text, re-extracting the fragment.
    pub fn set_text(&mut self, text: impl Into<Arc<str>>, version: u64) {
        *self = Self::from_host(std::mem::take(&mut self.path), text, version);
    }
}

impl HostDocument for ScriptDocument {
    fn file_path(&self) -> &Path {
        &self.path
    }

    fn text(&self) -> &str {
        &self.host_text[self.start..self.end]
    }

    fn offset_at(&self, position: Position) -> usize {
        let host_offset = self.index.offset_at(&self.host_text, position);
        host_offset.clamp(self.start, self.end) - self.start
    }

    fn contains(&self, position: Position) -> bool {
        let host_offset = self.index.offset_at(&self.host_text, position);
        (self.start..=self.end).contains(&host_offset)
    }

    fn position_at(&self, offset: usize) -> Position {
        let host_offset = self.start + offset.min(self.end - self.start);
        self.index.position_at(&self.host_text, host_offset)
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

/// Open documents, keyed by URI.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: HashMap<String, ScriptDocument>,
}

impl DocumentStore {
    /// Create a new empty document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open or replace a document.
    pub fn open(
        &mut self,
        uri: impl Into<String>,
        path: impl Into<PathBuf>,
        text: impl Into<Arc<str>>,
        version: u64,
    ) {
        self.documents
            .insert(uri.into(), ScriptDocument::from_host(path, text, version));
    }

    /// Update a document's content. Unknown URIs are ignored.
    pub fn change(&mut self, uri: &str, text: impl Into<Arc<str>>, version: u64) {
        if let Some(doc) = self.documents.get_mut(uri) {
            doc.set_text(text, version);
        }
    }

    /// Close a document (remove from store).
    pub fn close(&mut self, uri: &str) -> Option<ScriptDocument> {
        self.documents.remove(uri)
    }

    /// Get a document by URI.
    pub fn get(&self, uri: &str) -> Option<&ScriptDocument> {
        self.documents.get(uri)
    }
}
