//! The engine host backed by the virtual file table.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use embedscript_engine::{
    CompilerOptions, EngineHost, ModuleResolutionHost, ResolvedModule, ScriptKind,
};

use crate::config::ProjectConfig;
use crate::resolution::ResolutionBridge;
use crate::vfs::{FragmentId, VirtualFileTable};

/// Answers the engine's questions from the table first and the real
/// filesystem second.
///
/// The host outlives engine instances: a restart replaces the engine but
/// keeps the host, so the project file list and every tracked fragment
/// carry over.
#[derive(Debug)]
pub struct BridgeHost {
    config: Arc<ProjectConfig>,
    table: VirtualFileTable,
    bridge: ResolutionBridge,
}

impl BridgeHost {
    pub fn new(config: Arc<ProjectConfig>) -> Self {
        let table = VirtualFileTable::with_project_files(config.file_names.iter().cloned());
        Self {
            config,
            table,
            bridge: ResolutionBridge::new(),
        }
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn table(&self) -> &VirtualFileTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut VirtualFileTable {
        &mut self.table
    }
}

impl ModuleResolutionHost for BridgeHost {
    fn file_exists(&self, path: &Path) -> bool {
        self.table.is_tracked(&FragmentId::from_path(path)) || path.is_file()
    }

    fn read_file(&self, path: &Path) -> Option<String> {
        if let Some(snapshot) = self.table.snapshot(&FragmentId::from_path(path)) {
            return Some(snapshot.text().to_string());
        }
        std::fs::read_to_string(path).ok()
    }
}

impl EngineHost for BridgeHost {
    fn compilation_settings(&self) -> &CompilerOptions {
        &self.config.options
    }

    fn script_file_names(&self) -> Vec<PathBuf> {
        self.table
            .list_known_files()
            .into_iter()
            .map(FragmentId::into_path)
            .collect()
    }

    fn script_version(&self, path: &Path) -> String {
        self.table.version_of(&FragmentId::from_path(path))
    }

    fn script_snapshot(&self, path: &Path) -> Option<Arc<str>> {
        self.table
            .snapshot(&FragmentId::from_path(path))
            .map(|snapshot| snapshot.shared_text())
    }

    fn script_kind(&self, path: &Path) -> ScriptKind {
        self.table
            .dialect_of(&FragmentId::from_path(path))
            .map_or(ScriptKind::Unknown, |dialect| dialect.script_kind())
    }

    fn current_directory(&self) -> &Path {
        &self.config.root
    }

    fn resolve_module_names(
        &self,
        names: &[String],
        containing_file: &Path,
    ) -> Vec<Option<ResolvedModule>> {
        self.bridge
            .resolve_module_names(names, containing_file, self.compilation_settings(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::snapshot::Snapshot;

    fn host() -> BridgeHost {
        let config = ProjectConfig::new(
            "/w",
            CompilerOptions::default(),
            vec![PathBuf::from("/w/lib.ts")],
        );
        BridgeHost::new(Arc::new(config))
    }

    #[test]
    fn fragments_shadow_the_filesystem() {
        let mut host = host();
        let id = FragmentId::from_path(Path::new("/w/App.svelte"));
        host.table_mut()
            .upsert(id, Snapshot::capture("let a = 1", Dialect::TypedScript, 3));

        let path = Path::new("/w/App.svelte");
        assert!(host.file_exists(path));
        assert_eq!(host.read_file(path).as_deref(), Some("let a = 1"));
        assert_eq!(host.script_version(path), "3");
        assert_eq!(host.script_kind(path), ScriptKind::Ts);
        assert_eq!(host.script_snapshot(path).as_deref(), Some("let a = 1"));
        assert_eq!(
            host.script_file_names(),
            vec![PathBuf::from("/w/App.svelte"), PathBuf::from("/w/lib.ts")]
        );
    }

    #[test]
    fn project_files_fall_through() {
        let host = host();
        let path = Path::new("/w/lib.ts");
        assert_eq!(host.script_version(path), "0");
        assert!(host.script_snapshot(path).is_none());
        assert_eq!(host.script_kind(path), ScriptKind::Unknown);
        assert_eq!(host.current_directory(), Path::new("/w"));
    }

    #[test]
    fn markup_imports_resolve_through_the_bridge() {
        let host = host();
        let resolved = host.resolve_module_names(
            &["./Card.svelte".to_string(), "./nowhere".to_string()],
            Path::new("/w/src/App.svelte"),
        );
        assert_eq!(
            resolved[0].as_ref().map(|r| r.resolved_file_name.clone()),
            Some(PathBuf::from("/w/src/Card.svelte"))
        );
        assert!(resolved[1].is_none());
    }
}
