//! The engine trait and the bundled tree-sitter implementation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::checker;
use crate::diagnostic::{EngineDiagnostic, QuickInfo};
use crate::error::{EngineError, EngineResult};
use crate::host::{CompilerOptions, EngineHost, Extension, ScriptKind};
use crate::quick_info::quick_info_at;
use crate::source::SourceFile;

/// A stateful analysis engine.
///
/// An engine is created with a fixed set of options and caches whatever it
/// learns about the program between queries. It reads files only through
/// the [`EngineHost`] passed to each query, so the same host can be reused
/// when an engine is replaced.
pub trait LanguageEngine: Send {
    /// Create a fresh engine instance.
    fn create(options: CompilerOptions) -> Self
    where
        Self: Sized;

    /// Options the engine was created with.
    fn options(&self) -> &CompilerOptions;

    /// Parse errors in `file`, ordered by position.
    fn syntactic_diagnostics(
        &mut self,
        host: &dyn EngineHost,
        file: &Path,
    ) -> EngineResult<Vec<EngineDiagnostic>>;

    /// Semantic errors in `file`, ordered by position.
    fn semantic_diagnostics(
        &mut self,
        host: &dyn EngineHost,
        file: &Path,
    ) -> EngineResult<Vec<EngineDiagnostic>>;

    /// Information about the symbol at byte `offset` of `file`.
    fn quick_info_at_position(
        &mut self,
        host: &dyn EngineHost,
        file: &Path,
        offset: usize,
    ) -> EngineResult<Option<QuickInfo>>;

    /// Release everything the engine holds. Every later query fails with
    /// [`EngineError::Disposed`].
    fn dispose(&mut self);
}

/// Tree-sitter backed engine.
///
/// Each file is parsed once per version. The [`ScriptKind`] of a file is
/// taken from the host the first time the file is seen and is kept for the
/// life of the engine, even if the host later reports a different kind.
/// Changing how a file is classified therefore requires a new engine.
#[derive(Debug)]
pub struct ScriptEngine {
    options: CompilerOptions,
    files: HashMap<PathBuf, SourceFile>,
    disposed: bool,
}

impl ScriptEngine {
    /// Number of files currently parsed and cached.
    pub fn cached_file_count(&self) -> usize {
        self.files.len()
    }

    /// The cached version of `path`, if any.
    pub fn cached_version(&self, path: &Path) -> Option<&str> {
        self.files.get(path).map(SourceFile::version)
    }

    /// The kind `path` is being analyzed as.
    pub fn cached_kind(&self, path: &Path) -> Option<ScriptKind> {
        self.files.get(path).map(SourceFile::kind)
    }

    fn concrete_kind(&self, reported: ScriptKind, path: &Path) -> ScriptKind {
        match reported {
            ScriptKind::Unknown
                if Extension::from_path(path).is_none() && !self.options.allow_non_ts_extensions =>
            {
                ScriptKind::External
            }
            ScriptKind::Unknown => ScriptKind::from_path(path),
            known => known,
        }
    }

    /// Bring the cached copy of `path` up to the host's current version.
    fn sync_file(&mut self, host: &dyn EngineHost, path: &Path) -> EngineResult<&SourceFile> {
        if self.disposed {
            return Err(EngineError::Disposed);
        }
        if !host.script_file_names().iter().any(|known| known == path) {
            return Err(EngineError::UnknownFile(path.to_path_buf()));
        }

        let version = host.script_version(path);
        let kind = match self.files.get(path) {
            Some(file) if file.version() == version => None,
            Some(file) => {
                let reported = host.script_kind(path);
                if reported != ScriptKind::Unknown && reported != file.kind() {
                    tracing::debug!(
                        file = %path.display(),
                        cached = ?file.kind(),
                        reported = ?reported,
                        "Script kind change ignored by running engine"
                    );
                }
                Some(file.kind())
            }
            None => Some(self.concrete_kind(host.script_kind(path), path)),
        };

        if let Some(kind) = kind {
            let text = host
                .script_snapshot(path)
                .or_else(|| host.read_file(path).map(Arc::from))
                .ok_or_else(|| EngineError::MissingSource(path.to_path_buf()))?;
            tracing::trace!(file = %path.display(), version = %version, ?kind, "Parsing");
            let file = SourceFile::parse(path, version, kind, text)?;
            self.files.insert(path.to_path_buf(), file);
        }

        self.files
            .get(path)
            .ok_or_else(|| EngineError::UnknownFile(path.to_path_buf()))
    }
}

impl LanguageEngine for ScriptEngine {
    fn create(options: CompilerOptions) -> Self {
        Self {
            options,
            files: HashMap::new(),
            disposed: false,
        }
    }

    fn options(&self) -> &CompilerOptions {
        &self.options
    }

    fn syntactic_diagnostics(
        &mut self,
        host: &dyn EngineHost,
        file: &Path,
    ) -> EngineResult<Vec<EngineDiagnostic>> {
        let source = self.sync_file(host, file)?;
        Ok(checker::syntactic_diagnostics(source))
    }

    fn semantic_diagnostics(
        &mut self,
        host: &dyn EngineHost,
        file: &Path,
    ) -> EngineResult<Vec<EngineDiagnostic>> {
        let source = self.sync_file(host, file)?;
        Ok(checker::semantic_diagnostics(host, source))
    }

    fn quick_info_at_position(
        &mut self,
        host: &dyn EngineHost,
        file: &Path,
        offset: usize,
    ) -> EngineResult<Option<QuickInfo>> {
        let source = self.sync_file(host, file)?;
        Ok(quick_info_at(source, offset))
    }

    fn dispose(&mut self) {
        tracing::debug!(files = self.files.len(), "Disposing script engine");
        self.files.clear();
        self.disposed = true;
    }
}
