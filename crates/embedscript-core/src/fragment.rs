//! Locating the `<script>` block of a markup document.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").unwrap());

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .unwrap()
});

/// A script block found inside markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFragment {
    /// Byte offset of the first content byte in the host document.
    pub start: usize,
    /// The text between the opening and closing tags.
    pub content: String,
    pub attributes: BTreeMap<String, String>,
}

impl ScriptFragment {
    /// Byte offset just past the content in the host document.
    pub fn end(&self) -> usize {
        self.start + self.content.len()
    }
}

/// Find the instance `<script>` block of `markup`.
///
/// A `context="module"` block is only returned when it is the sole script.
/// Blocks inside HTML comments are not recognized as such and may be picked
/// up.
pub fn extract_script_fragment(markup: &str) -> Option<ScriptFragment> {
    let mut module_block = None;
    for captures in SCRIPT_BLOCK.captures_iter(markup) {
        let (Some(attrs), Some(content)) = (captures.get(1), captures.get(2)) else {
            continue;
        };
        let fragment = ScriptFragment {
            start: content.start(),
            content: content.as_str().to_string(),
            attributes: parse_attributes(attrs.as_str()),
        };
        let is_module = fragment
            .attributes
            .get("context")
            .is_some_and(|context| context == "module");
        if !is_module {
            return Some(fragment);
        }
        module_block.get_or_insert(fragment);
    }
    module_block
}

/// Parse the attribute list of an opening tag. Valueless attributes map to
/// an empty string; names are lowercased.
pub fn parse_attributes(source: &str) -> BTreeMap<String, String> {
    ATTRIBUTE
        .captures_iter(source)
        .filter_map(|captures| {
            let name = captures.get(1)?.as_str().to_ascii_lowercase();
            let value = captures
                .get(2)
                .or_else(|| captures.get(3))
                .or_else(|| captures.get(4))
                .map_or("", |m| m.as_str());
            Some((name, value.to_string()))
        })
        .collect()
}
