//! Syntactic and semantic checks over a parsed source file.

use std::collections::HashMap;

use tree_sitter::Node;

use crate::diagnostic::{EngineDiagnostic, TextSpan, codes};
use crate::host::EngineHost;
use crate::source::{SourceFile, children, named_children, visit_named};

/// Parse errors, ordered by position.
pub fn syntactic_diagnostics(file: &SourceFile) -> Vec<EngineDiagnostic> {
    let mut diagnostics = Vec::new();
    if let Some(root) = file.root().filter(|root| root.has_error()) {
        collect_syntax_errors(file, root, &mut diagnostics);
    }
    diagnostics.sort_by_key(|d| d.span.start);
    diagnostics
}

fn collect_syntax_errors(file: &SourceFile, node: Node<'_>, out: &mut Vec<EngineDiagnostic>) {
    if node.is_missing() {
        out.push(EngineDiagnostic::error(
            TextSpan::new(node.start_byte(), 0),
            codes::TOKEN_EXPECTED,
            format!("'{}' expected.", node.kind()),
        ));
        return;
    }
    if node.is_error() {
        let token = file.node_text(node).trim();
        let message = if !token.is_empty() && token.len() <= 20 && !token.contains('\n') {
            format!("Unexpected token '{token}'.")
        } else {
            "Unexpected token.".to_string()
        };
        out.push(EngineDiagnostic::error(
            TextSpan::from_bounds(node.start_byte(), node.end_byte()),
            codes::UNEXPECTED_TOKEN,
            message,
        ));
        return;
    }
    for child in children(node) {
        if child.has_error() || child.is_missing() {
            collect_syntax_errors(file, child, out);
        }
    }
}

/// Semantic problems, ordered by position.
///
/// Unresolved imports and block-scoped redeclarations are reported for every
/// script kind; annotation mismatches only for typed files.
pub fn semantic_diagnostics(host: &dyn EngineHost, file: &SourceFile) -> Vec<EngineDiagnostic> {
    let Some(root) = file.root() else {
        return Vec::new();
    };

    let mut diagnostics = unresolved_imports(host, file, root);
    check_redeclarations(file, root, &mut diagnostics);
    if file.is_typed() {
        check_annotated_initializers(file, root, &mut diagnostics);
    }
    diagnostics.sort_by_key(|d| d.span.start);
    diagnostics
}

/// An import specifier and the string node it came from.
struct ImportSite<'t> {
    name: String,
    node: Node<'t>,
}

/// Module specifiers in `import ... from`, `export ... from` and
/// `require(...)` forms.
fn import_sites<'t>(file: &SourceFile, root: Node<'t>) -> Vec<ImportSite<'t>> {
    let mut sites = Vec::new();
    visit_named(root, &mut |node| {
        let source = match node.kind() {
            "import_statement" | "export_statement" => node.child_by_field_name("source"),
            "call_expression" => require_argument(file, node),
            _ => None,
        };
        if let Some((source, name)) =
            source.and_then(|source| string_value(file, source).map(|name| (source, name)))
        {
            sites.push(ImportSite { name, node: source });
        }
    });
    sites
}

fn require_argument<'t>(file: &SourceFile, call: Node<'t>) -> Option<Node<'t>> {
    let function = call.child_by_field_name("function")?;
    if function.kind() != "identifier" || file.node_text(function) != "require" {
        return None;
    }
    let arguments = call.child_by_field_name("arguments")?;
    match named_children(arguments).as_slice() {
        [only] if only.kind() == "string" => Some(*only),
        _ => None,
    }
}

/// Contents of a string literal without its quotes.
fn string_value(file: &SourceFile, node: Node<'_>) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let text = file.node_text(node);
    let inner = text.get(1..text.len().checked_sub(1)?)?;
    Some(inner.to_string())
}

fn unresolved_imports(
    host: &dyn EngineHost,
    file: &SourceFile,
    root: Node<'_>,
) -> Vec<EngineDiagnostic> {
    let sites = import_sites(file, root);
    if sites.is_empty() {
        return Vec::new();
    }
    let names: Vec<String> = sites.iter().map(|site| site.name.clone()).collect();
    let resolutions = host.resolve_module_names(&names, file.path());

    sites
        .iter()
        .enumerate()
        .filter(|(index, _)| !matches!(resolutions.get(*index), Some(Some(_))))
        .map(|(_, site)| {
            tracing::debug!(module = %site.name, file = %file.path().display(), "Unresolved import");
            EngineDiagnostic::error(
                TextSpan::from_bounds(site.node.start_byte(), site.node.end_byte()),
                codes::MODULE_NOT_FOUND,
                format!(
                    "Cannot find module '{}' or its corresponding type declarations.",
                    site.name
                ),
            )
        })
        .collect()
}

/// `let`/`const` names declared twice in the same block.
fn check_redeclarations(file: &SourceFile, root: Node<'_>, out: &mut Vec<EngineDiagnostic>) {
    visit_named(root, &mut |node| {
        if !matches!(node.kind(), "program" | "statement_block" | "switch_body") {
            return;
        }
        let mut declared: HashMap<&str, Vec<Node<'_>>> = HashMap::new();
        for statement in named_children(node) {
            let declaration = match statement.kind() {
                "lexical_declaration" => statement,
                "export_statement" => match statement.child_by_field_name("declaration") {
                    Some(inner) if inner.kind() == "lexical_declaration" => inner,
                    _ => continue,
                },
                _ => continue,
            };
            for declarator in named_children(declaration) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                let name = declarator.child_by_field_name("name");
                if let Some(name) = name.filter(|name| name.kind() == "identifier") {
                    declared.entry(file.node_text(name)).or_default().push(name);
                }
            }
        }
        for (name, sites) in declared {
            if sites.len() < 2 {
                continue;
            }
            for site in sites {
                out.push(EngineDiagnostic::error(
                    TextSpan::from_bounds(site.start_byte(), site.end_byte()),
                    codes::REDECLARED_BLOCK_SCOPED,
                    format!("Cannot redeclare block-scoped variable '{name}'."),
                ));
            }
        }
    });
}

/// `let x: number = 'a'` and friends.
fn check_annotated_initializers(
    file: &SourceFile,
    root: Node<'_>,
    out: &mut Vec<EngineDiagnostic>,
) {
    visit_named(root, &mut |node| {
        if node.kind() != "variable_declarator" {
            return;
        }
        let (Some(name), Some(annotation), Some(value)) = (
            node.child_by_field_name("name"),
            node.child_by_field_name("type"),
            node.child_by_field_name("value"),
        ) else {
            return;
        };
        let Some(expected) = annotated_primitive(file, annotation) else {
            return;
        };
        let Some(actual) = literal_type(value) else {
            return;
        };
        if actual != expected {
            out.push(EngineDiagnostic::error(
                TextSpan::from_bounds(name.start_byte(), name.end_byte()),
                codes::NOT_ASSIGNABLE,
                format!("Type '{actual}' is not assignable to type '{expected}'."),
            ));
        }
    });
}

/// The primitive named by a `: T` annotation, for the primitives we check.
fn annotated_primitive<'f>(file: &'f SourceFile, annotation: Node<'_>) -> Option<&'f str> {
    let ty = named_children(annotation).into_iter().next()?;
    if ty.kind() != "predefined_type" {
        return None;
    }
    match file.node_text(ty) {
        primitive @ ("number" | "string" | "boolean") => Some(primitive),
        _ => None,
    }
}

/// The widened type of a literal expression.
pub(crate) fn literal_type(value: Node<'_>) -> Option<&'static str> {
    match value.kind() {
        "number" => Some("number"),
        "string" | "template_string" => Some("string"),
        "true" | "false" => Some("boolean"),
        "parenthesized_expression" => named_children(value)
            .into_iter()
            .next()
            .and_then(literal_type),
        _ => None,
    }
}
