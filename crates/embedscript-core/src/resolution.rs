//! Module resolution with a fallback for imports of markup components.

use std::path::Path;

use embedscript_engine::{
    CompilerOptions, Extension, ModuleResolutionHost, ResolvedModule, normalize_path,
    resolve_module_name,
};

/// Extensions whose imports are assumed to name a sibling component.
pub const MARKUP_EXTENSIONS: &[&str] = &["svelte", "html"];

/// Sits between the engine and native resolution.
///
/// Markup components only exist for the engine as in-memory fragments (or
/// not at all), so the native algorithm never resolves `./Button.svelte`.
/// The bridge treats such a name as the sibling file it spells out. The
/// check is purely on the extension: an import of a component that does
/// not exist is also reported as resolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolutionBridge;

impl ResolutionBridge {
    pub fn new() -> Self {
        Self
    }

    /// Resolve every name imported by `containing_file`, one slot per name.
    pub fn resolve_module_names<H: ModuleResolutionHost + ?Sized>(
        &self,
        names: &[String],
        containing_file: &Path,
        options: &CompilerOptions,
        host: &H,
    ) -> Vec<Option<ResolvedModule>> {
        names
            .iter()
            .map(|name| self.resolve(name, containing_file, options, host))
            .collect()
    }

    /// Native resolution, then the markup fallback.
    pub fn resolve<H: ModuleResolutionHost + ?Sized>(
        &self,
        name: &str,
        containing_file: &Path,
        options: &CompilerOptions,
        host: &H,
    ) -> Option<ResolvedModule> {
        resolve_module_name(name, containing_file, options, host)
            .or_else(|| markup_fallback(name, containing_file))
    }
}

fn markup_fallback(name: &str, containing_file: &Path) -> Option<ResolvedModule> {
    if !is_markup_reference(name) {
        return None;
    }
    let directory = containing_file.parent().unwrap_or(Path::new(""));
    let resolved_file_name = normalize_path(&directory.join(name));
    tracing::trace!(
        module = %name,
        resolved = %resolved_file_name.display(),
        "Resolved markup import by name"
    );
    Some(ResolvedModule {
        resolved_file_name,
        extension: Extension::Markup,
        is_external_library_import: false,
    })
}

/// Whether `name` ends in one of [`MARKUP_EXTENSIONS`].
pub fn is_markup_reference(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MARKUP_EXTENSIONS
                .iter()
                .any(|markup| ext.eq_ignore_ascii_case(markup))
        })
}
