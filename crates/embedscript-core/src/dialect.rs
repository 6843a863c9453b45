//! Script dialect classification.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use embedscript_engine::ScriptKind;
use serde::{Deserialize, Serialize};

/// The language variant a fragment is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Untyped script.
    Script,
    /// Typed script.
    TypedScript,
    /// A markup component (`.svelte`, `.html`).
    Markup,
    Unknown,
}

impl Dialect {
    /// Classify a fragment from its `<script>` attributes.
    ///
    /// `type="text/typescript"`, `lang="ts"` and `lang="typescript"` give
    /// [`Dialect::TypedScript`]. Anything else, including no attributes at
    /// all, is untyped.
    pub fn from_attributes(attributes: &BTreeMap<String, String>) -> Self {
        let typed_type = attributes
            .get("type")
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("text/typescript"));
        let typed_lang = attributes.get("lang").is_some_and(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "ts" | "typescript"
            )
        });
        if typed_type || typed_lang {
            Dialect::TypedScript
        } else {
            Dialect::Script
        }
    }

    /// Classify a file on disk by extension.
    pub fn from_path(path: &Path) -> Self {
        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            return Dialect::Unknown;
        };
        match extension.to_ascii_lowercase().as_str() {
            "ts" | "tsx" | "mts" | "cts" => Dialect::TypedScript,
            "js" | "jsx" | "mjs" | "cjs" => Dialect::Script,
            "svelte" | "html" => Dialect::Markup,
            _ => Dialect::Unknown,
        }
    }

    /// How the engine should parse a file of this dialect.
    pub fn script_kind(self) -> ScriptKind {
        match self {
            Dialect::Script => ScriptKind::Js,
            Dialect::TypedScript => ScriptKind::Ts,
            Dialect::Markup => ScriptKind::External,
            Dialect::Unknown => ScriptKind::Unknown,
        }
    }

    /// The `type` attribute a standalone file of this dialect implies.
    pub fn implied_type_attribute(self) -> Option<&'static str> {
        match self {
            Dialect::Script => Some("text/javascript"),
            Dialect::TypedScript => Some("text/typescript"),
            Dialect::Markup | Dialect::Unknown => None,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::Script => "script",
            Dialect::TypedScript => "typed-script",
            Dialect::Markup => "markup",
            Dialect::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn typed_from_type_or_lang() {
        assert_eq!(
            Dialect::from_attributes(&attrs(&[("type", "text/typescript")])),
            Dialect::TypedScript
        );
        assert_eq!(
            Dialect::from_attributes(&attrs(&[("lang", "ts")])),
            Dialect::TypedScript
        );
        assert_eq!(
            Dialect::from_attributes(&attrs(&[("lang", "TypeScript")])),
            Dialect::TypedScript
        );
    }

    #[test]
    fn everything_else_is_untyped() {
        assert_eq!(Dialect::from_attributes(&attrs(&[])), Dialect::Script);
        assert_eq!(
            Dialect::from_attributes(&attrs(&[("type", "module")])),
            Dialect::Script
        );
        assert_eq!(
            Dialect::from_attributes(&attrs(&[("type", "text/javascript")])),
            Dialect::Script
        );
    }

    #[test]
    fn extension_classification() {
        assert_eq!(Dialect::from_path(Path::new("a.ts")), Dialect::TypedScript);
        assert_eq!(Dialect::from_path(Path::new("a.mjs")), Dialect::Script);
        assert_eq!(Dialect::from_path(Path::new("App.svelte")), Dialect::Markup);
        assert_eq!(Dialect::from_path(Path::new("notes.md")), Dialect::Unknown);
        assert_eq!(Dialect::from_path(Path::new("Makefile")), Dialect::Unknown);
    }

    #[test]
    fn engine_kind_mapping() {
        assert_eq!(Dialect::Script.script_kind(), ScriptKind::Js);
        assert_eq!(Dialect::TypedScript.script_kind(), ScriptKind::Ts);
        assert_eq!(Dialect::Markup.script_kind(), ScriptKind::External);
        assert_eq!(Dialect::Unknown.script_kind(), ScriptKind::Unknown);
    }
}
