//! Immutable, versioned fragment text.

use std::sync::Arc;

use crate::dialect::Dialect;

/// One captured state of a fragment.
///
/// A snapshot never changes after capture. An edit produces a new snapshot
/// and the table replaces the old one; in-flight readers keep theirs alive
/// through the shared text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    version: u64,
    dialect: Dialect,
    text: Arc<str>,
}

impl Snapshot {
    pub fn capture(text: impl Into<Arc<str>>, dialect: Dialect, version: u64) -> Self {
        Self {
            version,
            dialect,
            text: text.into(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The text as a shared buffer, for handing to the engine.
    pub fn shared_text(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Text between byte offsets `start` and `end`.
    ///
    /// Both ends are clamped to the text length and moved back to the
    /// nearest character boundary. A reversed range is empty.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let end = floor_char_boundary(&self.text, end);
        let start = floor_char_boundary(&self.text, start).min(end);
        &self.text[start..end]
    }
}

/// The largest character boundary not after `offset`, clamped to `text`.
pub(crate) fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_keeps_metadata() {
        let snapshot = Snapshot::capture("let x = 1", Dialect::Script, 3);
        assert_eq!(snapshot.version(), 3);
        assert_eq!(snapshot.dialect(), Dialect::Script);
        assert_eq!(snapshot.len(), 9);
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn slice_in_range() {
        let snapshot = Snapshot::capture("let x = 1", Dialect::Script, 1);
        assert_eq!(snapshot.slice(4, 5), "x");
        assert_eq!(snapshot.slice(0, snapshot.len()), "let x = 1");
    }

    #[test]
    fn slice_clamps_out_of_range() {
        let snapshot = Snapshot::capture("abc", Dialect::Script, 1);
        assert_eq!(snapshot.slice(1, 100), "bc");
        assert_eq!(snapshot.slice(50, 100), "");
        assert_eq!(snapshot.slice(2, 1), "");
    }

    #[test]
    fn slice_never_splits_characters() {
        // 'é' is two bytes.
        let snapshot = Snapshot::capture("aéb", Dialect::Script, 1);
        assert_eq!(snapshot.slice(0, 2), "a");
        assert_eq!(snapshot.slice(2, 4), "éb");
    }

    #[test]
    fn clones_share_text() {
        let snapshot = Snapshot::capture("shared", Dialect::TypedScript, 1);
        let copy = snapshot.clone();
        assert!(Arc::ptr_eq(&snapshot.shared_text(), &copy.shared_text()));
    }
}
