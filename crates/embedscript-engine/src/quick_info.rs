//! Quick info (hover) for identifiers.
//!
//! The engine has no type checker, so the rendering comes from the
//! declaration's own syntax: annotations where present, literal types for
//! simple initializers, `any` otherwise.

use tree_sitter::Node;

use crate::checker::literal_type;
use crate::diagnostic::{QuickInfo, TextSpan};
use crate::source::{SourceFile, named_children, visit_named};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclarationKind {
    Variable,
    Function,
    Class,
    Interface,
    TypeAlias,
    Enum,
    Parameter,
    Import,
}

#[derive(Debug, Clone, Copy)]
struct Declaration<'t> {
    kind: DeclarationKind,
    /// The identifier being declared.
    name: Node<'t>,
    /// The declaring node (declarator, function, parameter, ...).
    node: Node<'t>,
    /// Region in which the name is visible.
    scope: Node<'t>,
}

/// Describe the identifier at `offset`, or `None` when there is nothing to
/// say (whitespace, keywords, undeclared globals, unparsed files).
pub fn quick_info_at(file: &SourceFile, offset: usize) -> Option<QuickInfo> {
    let root = file.root()?;
    let identifier = identifier_at(root, offset)?;
    let name = file.node_text(identifier);

    let declarations = collect_declarations(file, root);
    let declaration = declarations
        .iter()
        .find(|decl| decl.name.id() == identifier.id())
        .or_else(|| {
            declarations
                .iter()
                .filter(|decl| file.node_text(decl.name) == name)
                .filter(|decl| encloses(decl.scope, identifier))
                .max_by_key(|decl| decl.scope.start_byte())
        })?;

    Some(QuickInfo {
        span: TextSpan::from_bounds(identifier.start_byte(), identifier.end_byte()),
        display: display(file, declaration),
        documentation: documentation(file, declaration),
    })
}

const IDENTIFIER_KINDS: &[&str] = &[
    "identifier",
    "type_identifier",
    "shorthand_property_identifier",
    "shorthand_property_identifier_pattern",
];

fn identifier_at(root: Node<'_>, offset: usize) -> Option<Node<'_>> {
    let at = |offset: usize| {
        root.descendant_for_byte_range(offset, offset)
            .filter(|node| IDENTIFIER_KINDS.contains(&node.kind()))
    };
    // A cursor just past the last character still refers to the identifier.
    at(offset).or_else(|| offset.checked_sub(1).and_then(at))
}

fn encloses(scope: Node<'_>, node: Node<'_>) -> bool {
    scope.start_byte() <= node.start_byte() && node.end_byte() <= scope.end_byte()
}

/// Nearest ancestor that opens a block scope.
fn block_scope(node: Node<'_>) -> Node<'_> {
    let mut current = node;
    while let Some(parent) = current.parent() {
        if matches!(
            parent.kind(),
            "statement_block" | "program" | "class_body" | "switch_body"
        ) {
            return parent;
        }
        current = parent;
    }
    current
}

/// The function a parameter list belongs to.
fn function_scope(parameters: Node<'_>) -> Node<'_> {
    parameters.parent().unwrap_or(parameters)
}

fn collect_declarations<'t>(file: &SourceFile, root: Node<'t>) -> Vec<Declaration<'t>> {
    let mut declarations = Vec::new();
    let mut push = |kind, name: Node<'t>, node: Node<'t>, scope: Node<'t>| {
        declarations.push(Declaration {
            kind,
            name,
            node,
            scope,
        });
    };

    visit_named(root, &mut |node| match node.kind() {
        "variable_declarator" => {
            if let Some(name) = node.child_by_field_name("name") {
                push(DeclarationKind::Variable, name, node, block_scope(node));
            }
        }
        "function_declaration" | "generator_function_declaration" => {
            if let Some(name) = node.child_by_field_name("name") {
                push(DeclarationKind::Function, name, node, block_scope(node));
            }
        }
        "class_declaration" => {
            if let Some(name) = node.child_by_field_name("name") {
                push(DeclarationKind::Class, name, node, block_scope(node));
            }
        }
        "interface_declaration" => {
            if let Some(name) = node.child_by_field_name("name") {
                push(DeclarationKind::Interface, name, node, block_scope(node));
            }
        }
        "type_alias_declaration" => {
            if let Some(name) = node.child_by_field_name("name") {
                push(DeclarationKind::TypeAlias, name, node, block_scope(node));
            }
        }
        "enum_declaration" => {
            if let Some(name) = node.child_by_field_name("name") {
                push(DeclarationKind::Enum, name, node, block_scope(node));
            }
        }
        "required_parameter" | "optional_parameter" => {
            let pattern = node.child_by_field_name("pattern");
            if let Some(name) = pattern.filter(|p| p.kind() == "identifier") {
                let scope = node.parent().map(function_scope).unwrap_or(node);
                push(DeclarationKind::Parameter, name, node, scope);
            }
        }
        "formal_parameters" => {
            // Untyped parameters are bare identifiers or `x = default`.
            for child in named_children(node) {
                let name = match child.kind() {
                    "identifier" => Some(child),
                    "assignment_pattern" => child
                        .child_by_field_name("left")
                        .filter(|left| left.kind() == "identifier"),
                    _ => None,
                };
                if let Some(name) = name {
                    push(DeclarationKind::Parameter, name, child, function_scope(node));
                }
            }
        }
        "arrow_function" => {
            // `x => ...` has a single bare parameter.
            let parameter = node.child_by_field_name("parameter");
            if let Some(name) = parameter.filter(|p| p.kind() == "identifier") {
                push(DeclarationKind::Parameter, name, name, node);
            }
        }
        "import_specifier" => {
            let local = node
                .child_by_field_name("alias")
                .or_else(|| node.child_by_field_name("name"));
            if let Some(name) = local {
                push(DeclarationKind::Import, name, node, root);
            }
        }
        "import_clause" | "namespace_import" => {
            for child in named_children(node) {
                if child.kind() == "identifier" {
                    push(DeclarationKind::Import, child, node, root);
                }
            }
        }
        _ => {}
    });

    tracing::trace!(count = declarations.len(), file = %file.path().display(), "Collected declarations");
    declarations
}

/// Text of a `: T` annotation without the colon.
fn annotation_text<'f>(file: &'f SourceFile, node: Node<'_>, field: &str) -> Option<&'f str> {
    let annotation = node.child_by_field_name(field)?;
    let text = file.node_text(annotation).trim_start();
    Some(text.strip_prefix(':').unwrap_or(text).trim())
}

fn display(file: &SourceFile, decl: &Declaration<'_>) -> String {
    let name = file.node_text(decl.name);
    match decl.kind {
        DeclarationKind::Variable => {
            let keyword = decl
                .node
                .parent()
                .and_then(|parent| parent.child(0))
                .map(|keyword| keyword.kind())
                .filter(|kind| matches!(*kind, "let" | "const" | "var"))
                .unwrap_or("let");
            let ty = annotation_text(file, decl.node, "type")
                .map(str::to_string)
                .or_else(|| {
                    let value = decl.node.child_by_field_name("value")?;
                    initializer_type(file, value, keyword == "const")
                })
                .unwrap_or_else(|| "any".to_string());
            format!("{keyword} {name}: {ty}")
        }
        DeclarationKind::Function => {
            let parameters = decl
                .node
                .child_by_field_name("parameters")
                .map(|p| file.node_text(p))
                .unwrap_or("()");
            match annotation_text(file, decl.node, "return_type") {
                Some(ret) => format!("function {name}{parameters}: {ret}"),
                None => format!("function {name}{parameters}"),
            }
        }
        DeclarationKind::Class => format!("class {name}"),
        DeclarationKind::Interface => format!("interface {name}"),
        DeclarationKind::Enum => format!("enum {name}"),
        DeclarationKind::TypeAlias => {
            let value = decl
                .node
                .child_by_field_name("value")
                .map(|v| file.node_text(v))
                .unwrap_or("unknown");
            format!("type {name} = {value}")
        }
        DeclarationKind::Parameter => {
            let ty = annotation_text(file, decl.node, "type").unwrap_or("any");
            format!("(parameter) {name}: {ty}")
        }
        DeclarationKind::Import => format!("import {name}"),
    }
}

/// Type rendering for an initializer: literal types for `const`, widened
/// primitives for `let`/`var`, and a signature for function values.
fn initializer_type(file: &SourceFile, value: Node<'_>, is_const: bool) -> Option<String> {
    match value.kind() {
        "number" | "string" | "true" | "false" if is_const => {
            Some(file.node_text(value).to_string())
        }
        "arrow_function" | "function_expression" | "function" => {
            let parameters = value
                .child_by_field_name("parameters")
                .map(|p| file.node_text(p).to_string())
                .or_else(|| {
                    value
                        .child_by_field_name("parameter")
                        .map(|p| format!("({})", file.node_text(p)))
                })
                .unwrap_or_else(|| "()".to_string());
            let ret = annotation_text(file, value, "return_type").unwrap_or("any");
            Some(format!("{parameters} => {ret}"))
        }
        _ => literal_type(value).map(str::to_string),
    }
}

/// Body of a `/** ... */` comment directly preceding the declaration.
fn documentation(file: &SourceFile, decl: &Declaration<'_>) -> Option<String> {
    let mut statement = match decl.kind {
        DeclarationKind::Variable => decl.node.parent()?,
        DeclarationKind::Parameter | DeclarationKind::Import => return None,
        _ => decl.node,
    };
    if let Some(parent) = statement.parent().filter(|p| p.kind() == "export_statement") {
        statement = parent;
    }

    let comment = statement.prev_named_sibling()?;
    if comment.kind() != "comment" {
        return None;
    }
    let text = file.node_text(comment);
    let body = text.strip_prefix("/**")?.strip_suffix("*/")?;
    let lines: Vec<&str> = body
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('*').unwrap_or(line).trim()
        })
        .collect();
    let joined = lines.join("\n").trim().to_string();
    (!joined.is_empty()).then_some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ScriptKind;
    use std::path::Path;
    use std::sync::Arc;

    fn parse(kind: ScriptKind, text: &str) -> SourceFile {
        SourceFile::parse(Path::new("/t.ts"), "1".into(), kind, Arc::from(text)).unwrap()
    }

    fn hover(kind: ScriptKind, text: &str, needle: &str) -> Option<QuickInfo> {
        let offset = text.rfind(needle).unwrap();
        quick_info_at(&parse(kind, text), offset)
    }

    #[test]
    fn annotated_variable() {
        let info = hover(ScriptKind::Ts, "let count: number = 1;\ncount;", "count").unwrap();
        assert_eq!(info.display, "let count: number");
        assert_eq!(info.span, TextSpan::new(23, 5));
    }

    #[test]
    fn untyped_let_widens_literal() {
        let info = hover(ScriptKind::Js, "let x = 'a';\nx;", "x;").unwrap();
        assert_eq!(info.display, "let x: string");
    }

    #[test]
    fn const_keeps_literal_type() {
        let info = hover(ScriptKind::Js, "const answer = 42;", "answer").unwrap();
        assert_eq!(info.display, "const answer: 42");
    }

    #[test]
    fn function_signature_and_doc_comment() {
        let text = "/**\n * Adds two numbers.\n */\nfunction add(a: number, b: number): number {\n  return a + b;\n}\nadd(1, 2);";
        let info = hover(ScriptKind::Ts, text, "add(1").unwrap();
        assert_eq!(info.display, "function add(a: number, b: number): number");
        assert_eq!(info.documentation.as_deref(), Some("Adds two numbers."));
    }

    #[test]
    fn typed_parameter() {
        let text = "function f(limit: number) {\n  return limit;\n}";
        let info = hover(ScriptKind::Ts, text, "limit;").unwrap();
        assert_eq!(info.display, "(parameter) limit: number");
    }

    #[test]
    fn inner_scope_shadows_outer() {
        let text = "let v = 1;\n{\n  let v = 'inner';\n  v;\n}";
        let info = hover(ScriptKind::Js, text, "v;").unwrap();
        assert_eq!(info.display, "let v: string");
    }

    #[test]
    fn nothing_at_whitespace_or_unknown_global() {
        let text = "let a = 1;\n\n\nconsole.log(a);";
        let file = parse(ScriptKind::Js, text);
        assert!(quick_info_at(&file, 11).is_none());
        assert!(quick_info_at(&file, text.find("console").unwrap()).is_none());
    }
}
