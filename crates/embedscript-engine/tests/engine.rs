//! Engine behaviour against an in-memory host.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use embedscript_engine::{
    CompilerOptions, EngineError, EngineHost, LanguageEngine, ModuleResolutionHost,
    ResolvedModule, ScriptEngine, ScriptKind, codes,
};

struct Entry {
    version: u64,
    kind: ScriptKind,
    text: Arc<str>,
}

/// A host whose whole world is a map of in-memory files.
struct MemoryHost {
    options: CompilerOptions,
    root: PathBuf,
    files: HashMap<PathBuf, Entry>,
}

impl MemoryHost {
    fn new() -> Self {
        Self {
            options: CompilerOptions::default(),
            root: PathBuf::from("/project"),
            files: HashMap::new(),
        }
    }

    fn set(&mut self, path: &str, kind: ScriptKind, text: &str) {
        let version = self.files.get(Path::new(path)).map_or(1, |e| e.version + 1);
        self.files.insert(
            PathBuf::from(path),
            Entry {
                version,
                kind,
                text: Arc::from(text),
            },
        );
    }
}

impl ModuleResolutionHost for MemoryHost {
    fn file_exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read_file(&self, path: &Path) -> Option<String> {
        self.files.get(path).map(|e| e.text.to_string())
    }
}

impl EngineHost for MemoryHost {
    fn compilation_settings(&self) -> &CompilerOptions {
        &self.options
    }

    fn script_file_names(&self) -> Vec<PathBuf> {
        self.files.keys().cloned().collect()
    }

    fn script_version(&self, path: &Path) -> String {
        self.files
            .get(path)
            .map_or_else(|| "0".to_string(), |e| e.version.to_string())
    }

    fn script_snapshot(&self, path: &Path) -> Option<Arc<str>> {
        self.files.get(path).map(|e| e.text.clone())
    }

    fn script_kind(&self, path: &Path) -> ScriptKind {
        self.files.get(path).map_or(ScriptKind::Unknown, |e| e.kind)
    }

    fn current_directory(&self) -> &Path {
        &self.root
    }
}

/// Host that resolves every import, to isolate resolution from checking.
struct ResolveEverything(MemoryHost);

impl ModuleResolutionHost for ResolveEverything {
    fn file_exists(&self, path: &Path) -> bool {
        self.0.file_exists(path)
    }

    fn read_file(&self, path: &Path) -> Option<String> {
        self.0.read_file(path)
    }
}

impl EngineHost for ResolveEverything {
    fn compilation_settings(&self) -> &CompilerOptions {
        self.0.compilation_settings()
    }

    fn script_file_names(&self) -> Vec<PathBuf> {
        self.0.script_file_names()
    }

    fn script_version(&self, path: &Path) -> String {
        self.0.script_version(path)
    }

    fn script_snapshot(&self, path: &Path) -> Option<Arc<str>> {
        self.0.script_snapshot(path)
    }

    fn script_kind(&self, path: &Path) -> ScriptKind {
        self.0.script_kind(path)
    }

    fn current_directory(&self) -> &Path {
        self.0.current_directory()
    }

    fn resolve_module_names(
        &self,
        names: &[String],
        containing_file: &Path,
    ) -> Vec<Option<ResolvedModule>> {
        let dir = containing_file.parent().unwrap();
        names
            .iter()
            .map(|name| {
                Some(ResolvedModule {
                    resolved_file_name: dir.join(name),
                    extension: embedscript_engine::Extension::Markup,
                    is_external_library_import: false,
                })
            })
            .collect()
    }
}

fn engine() -> ScriptEngine {
    ScriptEngine::create(CompilerOptions::default())
}

#[test]
fn clean_untyped_script_has_no_diagnostics() {
    let mut host = MemoryHost::new();
    host.set("/project/a.js", ScriptKind::Js, "let x = 1");
    let mut engine = engine();
    let path = Path::new("/project/a.js");

    assert!(engine.syntactic_diagnostics(&host, path).unwrap().is_empty());
    assert!(engine.semantic_diagnostics(&host, path).unwrap().is_empty());
}

#[test]
fn typed_mismatch_is_reported_once() {
    let mut host = MemoryHost::new();
    host.set("/project/a.ts", ScriptKind::Ts, "let x: number = 'a'");
    let mut engine = engine();
    let path = Path::new("/project/a.ts");

    assert!(engine.syntactic_diagnostics(&host, path).unwrap().is_empty());
    let semantic = engine.semantic_diagnostics(&host, path).unwrap();
    assert_eq!(semantic.len(), 1);
    assert_eq!(semantic[0].code, codes::NOT_ASSIGNABLE);
    insta::assert_snapshot!(semantic[0].message, @"Type 'string' is not assignable to type 'number'.");
    assert_eq!(semantic[0].span.start, 4);
    assert_eq!(semantic[0].span.length, 1);
}

#[test]
fn matching_annotation_is_accepted() {
    let mut host = MemoryHost::new();
    host.set(
        "/project/a.ts",
        ScriptKind::Ts,
        "let n: number = 1;\nconst s: string = `t`;\nlet b: boolean = (true);",
    );
    let mut engine = engine();
    let diagnostics = engine
        .semantic_diagnostics(&host, Path::new("/project/a.ts"))
        .unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn broken_syntax_is_reported() {
    let mut host = MemoryHost::new();
    host.set("/project/a.js", ScriptKind::Js, "let x = (1;");
    let mut engine = engine();
    let diagnostics = engine
        .syntactic_diagnostics(&host, Path::new("/project/a.js"))
        .unwrap();
    assert!(!diagnostics.is_empty());
    assert!(diagnostics.iter().all(|d| {
        d.code == codes::TOKEN_EXPECTED || d.code == codes::UNEXPECTED_TOKEN
    }));
}

#[test]
fn unresolved_import_is_semantic_error() {
    let mut host = MemoryHost::new();
    host.set("/project/util.ts", ScriptKind::Ts, "export const u = 1;");
    host.set(
        "/project/main.ts",
        ScriptKind::Ts,
        "import { u } from './util';\nimport missing from './missing';\n",
    );
    let mut engine = engine();
    let diagnostics = engine
        .semantic_diagnostics(&host, Path::new("/project/main.ts"))
        .unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, codes::MODULE_NOT_FOUND);
    insta::assert_snapshot!(
        diagnostics[0].message,
        @"Cannot find module './missing' or its corresponding type declarations."
    );
}

#[test]
fn host_resolution_overrides_native_algorithm() {
    let mut inner = MemoryHost::new();
    inner.set(
        "/project/App.js",
        ScriptKind::Js,
        "import Button from './Button.svelte';\nconst fs = require('fs');",
    );
    let host = ResolveEverything(inner);
    let mut engine = engine();
    let diagnostics = engine
        .semantic_diagnostics(&host, Path::new("/project/App.js"))
        .unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn redeclared_let_reports_both_sites() {
    let mut host = MemoryHost::new();
    host.set("/project/a.js", ScriptKind::Js, "let a = 1;\nlet a = 2;\n{ let a = 3; }");
    let mut engine = engine();
    let diagnostics = engine
        .semantic_diagnostics(&host, Path::new("/project/a.js"))
        .unwrap();
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics.iter().all(|d| d.code == codes::REDECLARED_BLOCK_SCOPED));
    assert!(diagnostics[0].span.start < diagnostics[1].span.start);
}

#[test]
fn unchanged_version_is_not_reparsed() {
    let mut host = MemoryHost::new();
    host.set("/project/a.ts", ScriptKind::Ts, "let a = 1;");
    let mut engine = engine();
    let path = Path::new("/project/a.ts");

    engine.syntactic_diagnostics(&host, path).unwrap();
    assert_eq!(engine.cached_version(path), Some("1"));
    engine.semantic_diagnostics(&host, path).unwrap();
    assert_eq!(engine.cached_version(path), Some("1"));

    host.set("/project/a.ts", ScriptKind::Ts, "let a = 2;");
    engine.syntactic_diagnostics(&host, path).unwrap();
    assert_eq!(engine.cached_version(path), Some("2"));
}

#[test]
fn script_kind_is_fixed_at_first_sight() {
    let mut host = MemoryHost::new();
    host.set("/project/frag.svelte", ScriptKind::Js, "let x = 1");
    let mut engine = engine();
    let path = Path::new("/project/frag.svelte");
    engine.semantic_diagnostics(&host, path).unwrap();

    host.set("/project/frag.svelte", ScriptKind::Ts, "let x: number = 'a'");
    // Still parsed as untyped script: the annotation is a syntax error and
    // no type check runs.
    assert!(!engine.syntactic_diagnostics(&host, path).unwrap().is_empty());
    assert_eq!(engine.cached_kind(path), Some(ScriptKind::Js));

    let mut fresh = ScriptEngine::create(CompilerOptions::default());
    let semantic = fresh.semantic_diagnostics(&host, path).unwrap();
    assert_eq!(semantic.len(), 1);
    assert_eq!(fresh.cached_kind(path), Some(ScriptKind::Ts));
}

#[test]
fn unknown_file_and_disposed_engine_are_errors() {
    let mut host = MemoryHost::new();
    host.set("/project/a.js", ScriptKind::Js, "let a;");
    let mut engine = engine();

    let err = engine
        .syntactic_diagnostics(&host, Path::new("/project/nope.js"))
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownFile(_)));

    engine.dispose();
    assert_eq!(engine.cached_file_count(), 0);
    let err = engine
        .syntactic_diagnostics(&host, Path::new("/project/a.js"))
        .unwrap_err();
    assert!(matches!(err, EngineError::Disposed));
}

#[test]
fn quick_info_through_engine() {
    let mut host = MemoryHost::new();
    host.set("/project/a.ts", ScriptKind::Ts, "const limit: number = 10;\nlimit;");
    let mut engine = engine();
    let path = Path::new("/project/a.ts");

    let info = engine
        .quick_info_at_position(&host, path, 26)
        .unwrap()
        .unwrap();
    insta::assert_snapshot!(info.display, @"const limit: number");
    assert!(engine.quick_info_at_position(&host, path, 13).unwrap().is_none());
}

#[test]
fn external_files_are_never_analyzed() {
    let mut host = MemoryHost::new();
    host.set("/project/page.html", ScriptKind::External, "<p>let x: = </p>");
    let mut engine = engine();
    let path = Path::new("/project/page.html");
    assert!(engine.syntactic_diagnostics(&host, path).unwrap().is_empty());
    assert!(engine.semantic_diagnostics(&host, path).unwrap().is_empty());
    assert!(engine.quick_info_at_position(&host, path, 3).unwrap().is_none());
}
