//! The interface an engine uses to see the outside world.
//!
//! The engine never touches the filesystem or editor state directly. Every
//! question about which files exist, what they contain and which version
//! they are at goes through an [`EngineHost`]. This lets a caller present
//! in-memory text as if it were a file on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::resolve::resolve_module_name;

/// How the engine should treat a file's contents.
///
/// The kind of a file is decided the first time an engine instance sees the
/// file and stays fixed for the life of that instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptKind {
    /// Let the engine decide from the file extension.
    Unknown,
    /// Untyped script.
    Js,
    /// Typed script.
    Ts,
    /// Not script at all (markup). Present in the program but never parsed.
    External,
}

impl ScriptKind {
    /// Pick a kind from a file extension, used when the host answers
    /// [`ScriptKind::Unknown`].
    pub fn from_path(path: &Path) -> Self {
        match Extension::from_path(path) {
            Some(Extension::Ts | Extension::Tsx | Extension::Dts) => ScriptKind::Ts,
            Some(Extension::Js | Extension::Jsx | Extension::Json) => ScriptKind::Js,
            Some(Extension::Markup) => ScriptKind::External,
            None => ScriptKind::Js,
        }
    }
}

/// File extensions the engine knows how to deal with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extension {
    Ts,
    Tsx,
    Dts,
    Js,
    Jsx,
    Json,
    /// `.svelte` / `.html` components.
    Markup,
}

impl Extension {
    /// Classify a path by its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.ends_with(".d.ts") || name.ends_with(".d.mts") || name.ends_with(".d.cts") {
            return Some(Extension::Dts);
        }
        match path.extension()?.to_str()? {
            "ts" | "mts" | "cts" => Some(Extension::Ts),
            "tsx" => Some(Extension::Tsx),
            "js" | "mjs" | "cjs" => Some(Extension::Js),
            "jsx" => Some(Extension::Jsx),
            "json" => Some(Extension::Json),
            "svelte" | "html" => Some(Extension::Markup),
            _ => None,
        }
    }
}

/// The language level the program is written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScriptTarget {
    Es5,
    Es2015,
    Es2016,
    Es2017,
    Es2018,
    Es2019,
    Es2020,
    Es2021,
    Es2022,
    EsNext,
}

impl ScriptTarget {
    /// Parse a `target` compiler option value, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let target = match name.to_ascii_lowercase().as_str() {
            "es5" => ScriptTarget::Es5,
            "es6" | "es2015" => ScriptTarget::Es2015,
            "es2016" => ScriptTarget::Es2016,
            "es2017" => ScriptTarget::Es2017,
            "es2018" => ScriptTarget::Es2018,
            "es2019" => ScriptTarget::Es2019,
            "es2020" => ScriptTarget::Es2020,
            "es2021" => ScriptTarget::Es2021,
            "es2022" => ScriptTarget::Es2022,
            "esnext" | "latest" => ScriptTarget::EsNext,
            _ => return None,
        };
        Some(target)
    }
}

/// Which module resolution algorithm to run for bare specifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleResolutionKind {
    /// Walk up the directory tree looking for the module, no `node_modules`.
    Classic,
    /// Node-style `node_modules` lookup.
    Node,
    /// Node-style lookup as done by bundlers. Treated like [`Self::Node`].
    Bundler,
}

impl ModuleResolutionKind {
    /// Parse a `moduleResolution` compiler option value, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "classic" => ModuleResolutionKind::Classic,
            "node" | "node10" | "node16" | "nodenext" => ModuleResolutionKind::Node,
            "bundler" => ModuleResolutionKind::Bundler,
            _ => return None,
        };
        Some(kind)
    }
}

/// Options an engine instance is created with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerOptions {
    pub target: ScriptTarget,
    pub module_resolution: ModuleResolutionKind,
    /// Whether `.js`/`.jsx` files take part in resolution.
    pub allow_js: bool,
    /// Whether files with unrecognized extensions may be part of the program.
    pub allow_non_ts_extensions: bool,
    /// Base directory for non-relative specifiers.
    pub base_url: Option<PathBuf>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            target: ScriptTarget::EsNext,
            module_resolution: ModuleResolutionKind::Node,
            allow_js: true,
            allow_non_ts_extensions: true,
            base_url: None,
        }
    }
}

/// A successfully resolved import.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedModule {
    /// The file the import points at.
    pub resolved_file_name: PathBuf,
    pub extension: Extension,
    /// True when the module came from a `node_modules` directory.
    pub is_external_library_import: bool,
}

/// Filesystem questions needed by module resolution.
pub trait ModuleResolutionHost {
    fn file_exists(&self, path: &Path) -> bool;

    fn read_file(&self, path: &Path) -> Option<String>;
}

/// Everything an engine needs from its embedder.
///
/// Implementations answer from their own state (in-memory documents,
/// discovered project files) and fall back to the real filesystem where
/// that makes sense.
pub trait EngineHost: ModuleResolutionHost {
    /// Options the program is compiled with.
    fn compilation_settings(&self) -> &CompilerOptions;

    /// Every file that is part of the program.
    fn script_file_names(&self) -> Vec<PathBuf>;

    /// An opaque version string. The engine re-reads a file only when this
    /// changes.
    fn script_version(&self, path: &Path) -> String;

    /// In-memory contents of a file. `None` means "read it from disk".
    fn script_snapshot(&self, path: &Path) -> Option<Arc<str>>;

    fn script_kind(&self, path: &Path) -> ScriptKind;

    fn current_directory(&self) -> &Path;

    /// Resolve every name imported by `containing_file`. The result has one
    /// slot per requested name; `None` marks an unresolved import.
    fn resolve_module_names(
        &self,
        names: &[String],
        containing_file: &Path,
    ) -> Vec<Option<ResolvedModule>> {
        names
            .iter()
            .map(|name| {
                resolve_module_name(name, containing_file, self.compilation_settings(), self)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_classification() {
        assert_eq!(Extension::from_path(Path::new("a/b.ts")), Some(Extension::Ts));
        assert_eq!(Extension::from_path(Path::new("b.d.ts")), Some(Extension::Dts));
        assert_eq!(Extension::from_path(Path::new("App.svelte")), Some(Extension::Markup));
        assert_eq!(Extension::from_path(Path::new("x.mjs")), Some(Extension::Js));
        assert_eq!(Extension::from_path(Path::new("README")), None);
    }

    #[test]
    fn script_kind_falls_back_to_untyped() {
        assert_eq!(ScriptKind::from_path(Path::new("a.tsx")), ScriptKind::Ts);
        assert_eq!(ScriptKind::from_path(Path::new("index.html")), ScriptKind::External);
        assert_eq!(ScriptKind::from_path(Path::new("noext")), ScriptKind::Js);
    }

    #[test]
    fn option_names_are_case_insensitive() {
        assert_eq!(ScriptTarget::from_name("ESNext"), Some(ScriptTarget::EsNext));
        assert_eq!(ScriptTarget::from_name("es6"), Some(ScriptTarget::Es2015));
        assert_eq!(ScriptTarget::from_name("es1"), None);
        assert_eq!(
            ModuleResolutionKind::from_name("NodeNext"),
            Some(ModuleResolutionKind::Node)
        );
    }

    #[test]
    fn default_options_target_latest_with_node_resolution() {
        let options = CompilerOptions::default();
        assert_eq!(options.target, ScriptTarget::EsNext);
        assert_eq!(options.module_resolution, ModuleResolutionKind::Node);
        assert!(options.allow_js);
    }
}
