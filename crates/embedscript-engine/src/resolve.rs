//! Native module resolution.
//!
//! Given an import specifier and the file it appears in, find the file the
//! import refers to. Relative specifiers are looked up next to the importing
//! file; bare specifiers go through `baseUrl` and then `node_modules` (or an
//! upward directory walk under classic resolution).

use std::path::{Component, Path, PathBuf};

use crate::host::{
    CompilerOptions, Extension, ModuleResolutionHost, ModuleResolutionKind, ResolvedModule,
};

const TS_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".d.ts"];
const JS_EXTENSIONS: &[&str] = &[".js", ".jsx"];

/// Resolve a single import specifier.
///
/// Returns `None` when no candidate file exists.
pub fn resolve_module_name<H: ModuleResolutionHost + ?Sized>(
    name: &str,
    containing_file: &Path,
    options: &CompilerOptions,
    host: &H,
) -> Option<ResolvedModule> {
    let containing_dir = containing_file.parent().unwrap_or(Path::new(""));
    let resolver = Resolver { options, host };

    if is_relative(name) {
        let candidate = normalize_path(&containing_dir.join(name));
        return resolver.load_as_file_or_directory(&candidate, false);
    }

    if let Some(base_url) = &options.base_url {
        let candidate = normalize_path(&base_url.join(name));
        if let Some(resolved) = resolver.load_as_file_or_directory(&candidate, false) {
            return Some(resolved);
        }
    }

    match options.module_resolution {
        ModuleResolutionKind::Classic => resolver.classic_lookup(name, containing_dir),
        ModuleResolutionKind::Node | ModuleResolutionKind::Bundler => {
            resolver.node_modules_lookup(name, containing_dir)
        }
    }
}

/// Whether a specifier is resolved relative to the importing file.
pub fn is_relative(name: &str) -> bool {
    name == "."
        || name == ".."
        || name.starts_with("./")
        || name.starts_with("../")
        || Path::new(name).is_absolute()
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. Does not touch the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) && normalized.pop();
                if !popped && !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

struct Resolver<'a, H: ModuleResolutionHost + ?Sized> {
    options: &'a CompilerOptions,
    host: &'a H,
}

impl<H: ModuleResolutionHost + ?Sized> Resolver<'_, H> {
    fn extensions(&self) -> impl Iterator<Item = &'static str> + '_ {
        TS_EXTENSIONS
            .iter()
            .chain(JS_EXTENSIONS.iter().filter(|_| self.options.allow_js))
            .copied()
    }

    fn resolved(&self, path: PathBuf, external: bool) -> Option<ResolvedModule> {
        let extension = Extension::from_path(&path)?;
        Some(ResolvedModule {
            resolved_file_name: path,
            extension,
            is_external_library_import: external,
        })
    }

    fn load_as_file_or_directory(&self, candidate: &Path, external: bool) -> Option<ResolvedModule> {
        self.load_as_file(candidate, external)
            .or_else(|| self.load_as_directory(candidate, external))
    }

    fn load_as_file(&self, candidate: &Path, external: bool) -> Option<ResolvedModule> {
        // Markup components are not modules to the native algorithm.
        let scriptlike = matches!(Extension::from_path(candidate), Some(ext) if ext != Extension::Markup);
        if scriptlike && self.host.file_exists(candidate) {
            return self.resolved(candidate.to_path_buf(), external);
        }

        // `./util.js` written against a `util.ts` source.
        let ext = candidate.extension().and_then(|e| e.to_str());
        if matches!(ext, Some("js" | "jsx" | "mjs" | "cjs")) {
            let stem = candidate.with_extension("");
            for replacement in TS_EXTENSIONS {
                let path = with_appended_extension(&stem, replacement);
                if self.host.file_exists(&path) {
                    return self.resolved(path, external);
                }
            }
        }

        self.extensions().find_map(|ext| {
            let path = with_appended_extension(candidate, ext);
            if self.host.file_exists(&path) {
                self.resolved(path, external)
            } else {
                None
            }
        })
    }

    fn load_as_directory(&self, dir: &Path, external: bool) -> Option<ResolvedModule> {
        self.package_entry(dir)
            .and_then(|entry| self.load_as_file(&entry, external))
            .or_else(|| self.load_as_file(&dir.join("index"), external))
    }

    /// The entry point named by `dir/package.json`, if any.
    fn package_entry(&self, dir: &Path) -> Option<PathBuf> {
        let manifest = self.host.read_file(&dir.join("package.json"))?;
        let manifest: serde_json::Value = match serde_json::from_str(&manifest) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(dir = %dir.display(), error = %err, "Ignoring unreadable package.json");
                return None;
            }
        };
        ["types", "typings", "main"]
            .iter()
            .find_map(|field| manifest.get(*field).and_then(|v| v.as_str()))
            .map(|entry| normalize_path(&dir.join(entry)))
    }

    fn node_modules_lookup(&self, name: &str, start: &Path) -> Option<ResolvedModule> {
        for dir in start.ancestors() {
            let node_modules = dir.join("node_modules");
            let candidate = node_modules.join(name);
            if let Some(resolved) = self.load_as_file_or_directory(&candidate, true) {
                return Some(resolved);
            }
            let typings = node_modules.join("@types").join(types_package_name(name));
            if let Some(resolved) = self.load_as_file_or_directory(&typings, true) {
                return Some(resolved);
            }
        }
        None
    }

    fn classic_lookup(&self, name: &str, start: &Path) -> Option<ResolvedModule> {
        start
            .ancestors()
            .find_map(|dir| self.load_as_file(&dir.join(name), false))
    }
}

/// `@scope/pkg` lives under `@types/scope__pkg`.
fn types_package_name(name: &str) -> String {
    match name.strip_prefix('@') {
        Some(scoped) => scoped.replacen('/', "__", 1),
        None => name.to_string(),
    }
}

fn with_appended_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(ext);
    PathBuf::from(name)
}
