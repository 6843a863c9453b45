//! Project configuration discovery.
//!
//! The project is described by the nearest `tsconfig.json` (or, failing
//! that, `jsconfig.json`) above the workspace root. Both are JSON with
//! comments and trailing commas. When neither exists, or the one found
//! cannot be read, the workspace is analyzed with default options and every
//! script file under it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use embedscript_engine::{CompilerOptions, ModuleResolutionKind, ScriptTarget, normalize_path};
use glob::{MatchOptions, Pattern};
use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::ConfigError;

/// Configuration file names, in lookup order.
pub const CONFIG_FILE_NAMES: &[&str] = &["tsconfig.json", "jsconfig.json"];

const MAX_EXTENDS_DEPTH: usize = 8;

const TS_FILE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts"];
const JS_FILE_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs"];

/// Options and root files of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// The configuration file this came from, `None` for defaults.
    pub config_path: Option<PathBuf>,
    /// Directory relative paths are resolved against.
    pub root: PathBuf,
    pub options: CompilerOptions,
    /// Files on disk that are part of the program, sorted.
    pub file_names: Vec<PathBuf>,
}

impl ProjectConfig {
    /// A configuration assembled by the caller rather than discovered.
    pub fn new(root: impl Into<PathBuf>, options: CompilerOptions, file_names: Vec<PathBuf>) -> Self {
        Self {
            config_path: None,
            root: root.into(),
            options,
            file_names,
        }
    }

    /// Find and load the configuration for `workspace_root`. Never fails.
    pub fn discover(workspace_root: &Path) -> Self {
        let Some(config_path) = find_config_file(workspace_root) else {
            tracing::debug!(
                root = %workspace_root.display(),
                "No project configuration found, using defaults"
            );
            return Self::defaults(workspace_root);
        };

        match Self::load(&config_path) {
            Ok(config) => {
                tracing::info!(
                    config = %config_path.display(),
                    files = config.file_names.len(),
                    "Loaded project configuration"
                );
                config
            }
            Err(err) => {
                tracing::warn!(error = %err, "Ignoring project configuration");
                Self::defaults(workspace_root)
            }
        }
    }

    /// Default options, with every script file under `root`.
    pub fn defaults(root: &Path) -> Self {
        let options = CompilerOptions::default();
        let include: Vec<Pattern> = Pattern::new("**/*").into_iter().collect();
        let file_names = collect_files(root, &include, &[], options.allow_js);
        Self {
            config_path: None,
            root: root.to_path_buf(),
            options,
            file_names,
        }
    }

    /// Load a specific configuration file, following `extends`.
    pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
        let chain = load_chain(config_path)?;
        let root = config_dir(config_path);

        let mut raw_options = RawCompilerOptions::default();
        let mut files: Option<(PathBuf, Vec<String>)> = None;
        let mut include: Option<(PathBuf, Vec<String>)> = None;
        let mut exclude: Option<(PathBuf, Vec<String>)> = None;

        // Base configurations first, so that extending files win.
        for layer in &chain {
            if let Some(options) = &layer.raw.compiler_options {
                raw_options.merge(options, &layer.dir);
            }
            if let Some(list) = &layer.raw.files {
                files = Some((layer.dir.clone(), list.clone()));
            }
            if let Some(list) = &layer.raw.include {
                include = Some((layer.dir.clone(), list.clone()));
            }
            if let Some(list) = &layer.raw.exclude {
                exclude = Some((layer.dir.clone(), list.clone()));
            }
        }

        let options = raw_options.into_options();

        // Without `files` or `include`, everything under the root is included.
        let include = match (&files, include) {
            (None, None) => Some((root.clone(), vec!["**/*".to_string()])),
            (_, include) => include,
        };

        let mut file_names = BTreeSet::new();
        if let Some((dir, list)) = &files {
            file_names.extend(list.iter().map(|file| normalize_path(&dir.join(file))));
        }
        if let Some((dir, patterns)) = &include {
            let include = compile_patterns(config_path, dir, patterns)?;
            let exclude = match &exclude {
                Some((exclude_dir, patterns)) => {
                    compile_patterns(config_path, exclude_dir, patterns)?
                }
                None => Vec::new(),
            };
            file_names.extend(collect_files(dir, &include, &exclude, options.allow_js));
        }

        Ok(Self {
            config_path: Some(config_path.to_path_buf()),
            root,
            options,
            file_names: file_names.into_iter().collect(),
        })
    }
}

/// Search `start` and its ancestors for `tsconfig.json`, then for
/// `jsconfig.json`.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES.iter().find_map(|name| {
        start
            .ancestors()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    extends: Option<String>,
    compiler_options: Option<RawCompilerOptions>,
    files: Option<Vec<String>>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
    target: Option<String>,
    module: Option<String>,
    module_resolution: Option<String>,
    allow_js: Option<bool>,
    base_url: Option<String>,
    /// `base_url` made absolute against the file that declared it.
    #[serde(skip)]
    resolved_base_url: Option<PathBuf>,
}

impl RawCompilerOptions {
    /// Overlay `other`, declared in a file living in `dir`.
    fn merge(&mut self, other: &RawCompilerOptions, dir: &Path) {
        if other.target.is_some() {
            self.target.clone_from(&other.target);
        }
        if other.module.is_some() {
            self.module.clone_from(&other.module);
        }
        if other.module_resolution.is_some() {
            self.module_resolution.clone_from(&other.module_resolution);
        }
        if other.allow_js.is_some() {
            self.allow_js = other.allow_js;
        }
        if let Some(base_url) = &other.base_url {
            self.resolved_base_url = Some(normalize_path(&dir.join(base_url)));
        }
    }

    fn into_options(self) -> CompilerOptions {
        let defaults = CompilerOptions::default();
        let target = self
            .target
            .as_deref()
            .and_then(ScriptTarget::from_name)
            .unwrap_or(defaults.target);
        let module_resolution = self
            .module_resolution
            .as_deref()
            .and_then(ModuleResolutionKind::from_name)
            .or_else(|| self.module.as_deref().map(resolution_for_module))
            .unwrap_or(defaults.module_resolution);
        CompilerOptions {
            target,
            module_resolution,
            allow_js: self.allow_js.unwrap_or(defaults.allow_js),
            allow_non_ts_extensions: defaults.allow_non_ts_extensions,
            base_url: self.resolved_base_url,
        }
    }
}

/// The resolution mode implied by a `module` setting when
/// `moduleResolution` is absent.
fn resolution_for_module(module: &str) -> ModuleResolutionKind {
    match module.to_ascii_lowercase().as_str() {
        "commonjs" | "node16" | "nodenext" => ModuleResolutionKind::Node,
        "preserve" => ModuleResolutionKind::Bundler,
        _ => ModuleResolutionKind::Classic,
    }
}

struct Layer {
    dir: PathBuf,
    raw: RawConfig,
}

/// Read `path` and everything it extends, base configuration first.
fn load_chain(path: &Path) -> Result<Vec<Layer>, ConfigError> {
    let mut chain = Vec::new();
    let mut next = Some(path.to_path_buf());
    while let Some(current) = next.take() {
        if chain.len() >= MAX_EXTENDS_DEPTH {
            return Err(ConfigError::ExtendsTooDeep {
                path: path.to_path_buf(),
                limit: MAX_EXTENDS_DEPTH,
            });
        }
        let raw = read_raw_config(&current)?;
        let dir = config_dir(&current);
        next = match raw.extends.as_deref() {
            Some(extends) => {
                let resolved = resolve_extends(&dir, extends);
                if resolved.is_none() {
                    tracing::warn!(
                        config = %current.display(),
                        extends = %extends,
                        "Extended configuration not found"
                    );
                }
                resolved
            }
            None => None,
        };
        chain.push(Layer { dir, raw });
    }
    chain.reverse();
    Ok(chain)
}

fn read_raw_config(path: &Path) -> Result<RawConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&strip_jsonc(&text)).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn config_dir(config_path: &Path) -> PathBuf {
    normalize_path(config_path.parent().unwrap_or(Path::new("")))
}

/// Locate the file named by an `extends` entry.
fn resolve_extends(dir: &Path, extends: &str) -> Option<PathBuf> {
    let candidates = |base: PathBuf| {
        let mut with_json = base.clone().into_os_string();
        with_json.push(".json");
        [base.clone(), PathBuf::from(with_json), base.join("tsconfig.json")]
    };

    if extends.starts_with('.') || Path::new(extends).is_absolute() {
        return candidates(normalize_path(&dir.join(extends)))
            .into_iter()
            .find(|candidate| candidate.is_file());
    }

    dir.ancestors().find_map(|ancestor| {
        candidates(ancestor.join("node_modules").join(extends))
            .into_iter()
            .find(|candidate| candidate.is_file())
    })
}

/// Compile `include`/`exclude` entries, relative to `dir`.
///
/// An entry whose last segment has neither a wildcard nor an extension
/// names a directory and matches everything below it.
fn compile_patterns(
    config_path: &Path,
    dir: &Path,
    patterns: &[String],
) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|raw| {
            let relative = raw.trim_start_matches("./").trim_end_matches('/');
            let relative = if Path::new(relative).is_absolute() {
                Path::new(relative)
                    .strip_prefix(dir)
                    .map_or_else(|_| relative.to_string(), |p| p.display().to_string())
            } else {
                relative.to_string()
            };
            let last = relative.rsplit('/').next().unwrap_or("");
            let expanded = if !last.contains('*') && !last.contains('.') {
                format!("{relative}/**/*")
            } else {
                relative
            };
            Pattern::new(&expanded).map_err(|source| ConfigError::Pattern {
                path: config_path.to_path_buf(),
                pattern: raw.clone(),
                source,
            })
        })
        .collect()
}

fn is_hidden_or_vendored(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.') || name == "node_modules")
}

/// Script files under `root` matching `include` and not `exclude`.
fn collect_files(root: &Path, include: &[Pattern], exclude: &[Pattern], allow_js: bool) -> Vec<PathBuf> {
    let match_options = MatchOptions {
        require_literal_separator: true,
        ..MatchOptions::default()
    };
    let is_script = |path: &Path| {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                TS_FILE_EXTENSIONS.contains(&ext) || (allow_js && JS_FILE_EXTENSIONS.contains(&ext))
            })
    };

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_hidden_or_vendored(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::debug!(error = %err, "Skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_script(entry.path()))
        .filter(|entry| {
            let Ok(relative) = entry.path().strip_prefix(root) else {
                return false;
            };
            include
                .iter()
                .any(|pattern| pattern.matches_path_with(relative, match_options))
                && !exclude
                    .iter()
                    .any(|pattern| pattern.matches_path_with(relative, match_options))
        })
        .map(|entry| normalize_path(entry.path()))
        .collect();
    files.sort();
    files
}

/// Turn JSON-with-comments into plain JSON: drop `//` and `/* */` comments
/// and commas directly before a closing bracket.
pub fn strip_jsonc(text: &str) -> String {
    strip_trailing_commas(&strip_comments(text))
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            match ch {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        let next = chars.peek().copied();
        match (ch, next) {
            ('"', _) => {
                in_string = true;
                out.push(ch);
            }
            ('/', Some('/')) => {
                while chars.peek().is_some_and(|&c| c != '\n') {
                    chars.next();
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut previous = '\0';
                for c in chars.by_ref() {
                    if previous == '*' && c == '/' {
                        break;
                    }
                    previous = c;
                }
                out.push(' ');
            }
            _ => out.push(ch),
        }
    }
    out
}

fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    for (index, &ch) in chars.iter().enumerate() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        if ch == '"' {
            in_string = true;
        }
        if ch == ',' {
            let next = chars[index + 1..]
                .iter()
                .copied()
                .find(|c| !c.is_whitespace());
            if matches!(next, Some('}' | ']')) {
                continue;
            }
        }
        out.push(ch);
    }
    out
}
