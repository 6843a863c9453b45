//! The virtual file table: what the engine believes is on disk.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use embedscript_engine::normalize_path;

use crate::dialect::Dialect;
use crate::snapshot::Snapshot;

/// Stable identity of a fragment or project file.
///
/// Built from the enclosing document's path, lexically normalized so that
/// `a/./b.svelte` and `a/b.svelte` are the same key. Whether an id is an
/// in-memory fragment is decided by the table, never by the path itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FragmentId(PathBuf);

impl FragmentId {
    pub fn from_path(path: &Path) -> Self {
        Self(normalize_path(path))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path(self) -> PathBuf {
        self.0
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Fragment snapshots plus the statically discovered project files.
#[derive(Debug, Default)]
pub struct VirtualFileTable {
    project_files: BTreeSet<FragmentId>,
    snapshots: HashMap<FragmentId, Snapshot>,
    dialects: HashMap<FragmentId, Dialect>,
}

impl VirtualFileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table seeded with the project's files. Those are read from disk
    /// until a fragment with the same id is upserted.
    pub fn with_project_files<I>(files: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        Self {
            project_files: files
                .into_iter()
                .map(|path| FragmentId::from_path(&path))
                .collect(),
            ..Self::default()
        }
    }

    /// Every file the engine should consider part of the program.
    pub fn list_known_files(&self) -> BTreeSet<FragmentId> {
        self.project_files
            .iter()
            .chain(self.snapshots.keys())
            .cloned()
            .collect()
    }

    /// The version string the engine sees. `"0"` for ids never upserted.
    pub fn version_of(&self, id: &FragmentId) -> String {
        self.snapshots
            .get(id)
            .map_or_else(|| "0".to_string(), |snapshot| snapshot.version().to_string())
    }

    /// In-memory content. `None` means "read the real file".
    pub fn content_of(&self, id: &FragmentId) -> Option<Snapshot> {
        self.snapshots.get(id).cloned()
    }

    /// Borrowing form of [`Self::content_of`].
    pub fn snapshot(&self, id: &FragmentId) -> Option<&Snapshot> {
        self.snapshots.get(id)
    }

    /// Store `snapshot` and return the dialect recorded before this call.
    pub fn upsert(&mut self, id: FragmentId, snapshot: Snapshot) -> Option<Dialect> {
        let previous = self.dialects.insert(id.clone(), snapshot.dialect());
        self.snapshots.insert(id, snapshot);
        previous
    }

    /// The version to capture the next snapshot of `id` at.
    ///
    /// Editors restart their own counters when a document is reopened, so
    /// the requested version is only a lower bound.
    pub fn next_version(&self, id: &FragmentId, requested: u64) -> u64 {
        match self.snapshots.get(id) {
            Some(previous) => requested.max(previous.version().saturating_add(1)),
            None => requested.max(1),
        }
    }

    pub fn is_tracked(&self, id: &FragmentId) -> bool {
        self.snapshots.contains_key(id)
    }

    pub fn is_project_file(&self, id: &FragmentId) -> bool {
        self.project_files.contains(id)
    }

    pub fn dialect_of(&self, id: &FragmentId) -> Option<Dialect> {
        self.dialects.get(id).copied()
    }

    /// Number of tracked in-memory fragments.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Forget every fragment, keeping the project file list.
    pub fn clear_fragments(&mut self) {
        self.snapshots.clear();
        self.dialects.clear();
    }
}
