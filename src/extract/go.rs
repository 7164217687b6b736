//! Go symbol extraction using tree-sitter.
//!
//! Extracts top-level:
//! - Function declarations
//! - Method declarations (parent = receiver type)
//! - Type specs and aliases (struct, interface, other)
//! - Const and var specs (one symbol per declared name)

use std::collections::HashSet;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use super::{collapse_whitespace, Symbol, SymbolKind};

/// Tree-sitter query for Go declarations.
///
/// Specs are captured whole; names are read from their `name` fields so
/// `const a, b = 1, 2` yields two symbols.
const DECLARATION_QUERY: &str = r#"
(function_declaration name: (identifier) @name) @func
(method_declaration name: (field_identifier) @name) @method
(type_spec name: (type_identifier) @name) @type
(type_alias name: (type_identifier) @name) @alias
(const_spec) @const
(var_spec) @var
"#;

fn language() -> Language {
    tree_sitter_go::LANGUAGE.into()
}

/// Extract symbols from Go source.
pub fn extract(source: &str) -> anyhow::Result<Vec<Symbol>> {
    let language = language();
    let mut parser = Parser::new();
    parser.set_language(&language)?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| anyhow::anyhow!("failed to parse source"))?;

    let query = Query::new(&language, DECLARATION_QUERY)?;
    let mut cursor = QueryCursor::new();
    let bytes = source.as_bytes();
    let mut matches = cursor.matches(&query, tree.root_node(), bytes);

    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    while let Some(m) = matches.next() {
        let mut decl = None;
        let mut name = None;
        for capture in m.captures {
            let capture_name = query.capture_names()[capture.index as usize];
            if capture_name == "name" {
                name = Some(capture.node);
            } else {
                decl = Some((capture_name, capture.node));
            }
        }
        let Some((capture_name, node)) = decl else {
            continue;
        };
        if !is_top_level(node) || !seen.insert(node.id()) {
            continue;
        }

        match capture_name {
            "func" | "method" | "type" | "alias" => {
                let Some(name_node) = name else { continue };
                let name = text(name_node, bytes);
                if name.is_empty() || name == "_" {
                    continue;
                }
                let (kind, parent) = match capture_name {
                    "func" => (SymbolKind::Func, None),
                    "method" => (SymbolKind::Method, receiver_type(node, bytes)),
                    "type" => (type_kind(node), None),
                    _ => (SymbolKind::Type, None),
                };
                symbols.push(symbol(name, kind, node, signature(node, capture_name, bytes), parent));
            }
            "const" | "var" => {
                let kind = if capture_name == "const" {
                    SymbolKind::Const
                } else {
                    SymbolKind::Var
                };
                let sig = format!("{} {}", capture_name, collapse_whitespace(text(node, bytes)));
                let mut walker = node.walk();
                for name_node in node.children_by_field_name("name", &mut walker) {
                    let name = text(name_node, bytes);
                    if name.is_empty() || name == "_" {
                        continue;
                    }
                    symbols.push(symbol(name, kind, node, sig.clone(), None));
                }
            }
            _ => {}
        }
    }

    Ok(symbols)
}

fn symbol(name: &str, kind: SymbolKind, node: Node, signature: String, parent: Option<String>) -> Symbol {
    Symbol {
        name: name.to_string(),
        kind,
        line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
        exported: name.chars().next().is_some_and(|c| c.is_uppercase()),
        signature,
        parent,
    }
}

fn text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Whether a declaration sits at file scope rather than inside a function.
fn is_top_level(node: Node) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        match parent.kind() {
            "source_file" => return true,
            "block" | "func_literal" | "function_declaration" | "method_declaration" => {
                return false
            }
            _ => current = parent.parent(),
        }
    }
    false
}

fn type_kind(spec: Node) -> SymbolKind {
    match spec.child_by_field_name("type").map(|t| t.kind()) {
        Some("interface_type") => SymbolKind::Interface,
        _ => SymbolKind::Type,
    }
}

/// Receiver type name with pointer and type arguments stripped.
fn receiver_type(method: Node, source: &[u8]) -> Option<String> {
    let receiver = method.child_by_field_name("receiver")?;
    let mut walker = receiver.walk();
    let param = receiver
        .named_children(&mut walker)
        .find(|n| n.kind() == "parameter_declaration")?;

    let mut ty = param.child_by_field_name("type")?;
    loop {
        match ty.kind() {
            "pointer_type" | "parenthesized_type" => ty = ty.named_child(0)?,
            "generic_type" => ty = ty.child_by_field_name("type")?,
            _ => break,
        }
    }

    let name = text(ty, source)
        .trim_start_matches('*')
        .split('[')
        .next()
        .unwrap_or("")
        .trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Declaration text up to the body, on one line.
fn signature(node: Node, capture_name: &str, source: &[u8]) -> String {
    let full = text(node, source);
    let head = match capture_name {
        "func" | "method" => match node.child_by_field_name("body") {
            Some(body) => &full[..body.start_byte() - node.start_byte()],
            None => full,
        },
        "type" => match node.child_by_field_name("type") {
            Some(ty) if matches!(ty.kind(), "struct_type" | "interface_type") => {
                let keyword = if ty.kind() == "struct_type" {
                    "struct"
                } else {
                    "interface"
                };
                let end = ty.start_byte() - node.start_byte();
                return format!("type {} {}", collapse_whitespace(&full[..end]), keyword);
            }
            _ => full,
        },
        _ => full,
    };
    let prefix = if matches!(capture_name, "type" | "alias") {
        "type "
    } else {
        ""
    };
    format!("{}{}", prefix, collapse_whitespace(head))
}
