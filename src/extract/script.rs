//! TypeScript/JavaScript symbol extraction by line scanning.
//!
//! Extracts:
//! - Top-level functions, classes, interfaces, type aliases, enums
//! - Top-level `const`/`let`/`var` bindings (arrow functions count as functions)
//! - Methods and arrow-function fields one level inside a top-level class
//!
//! Visibility comes from the `export` keyword, either on the declaration or
//! in a local `export { a, b as c }` list.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

use super::lexer::{BraceScanner, LineScan};
use super::{collapse_whitespace, Symbol, SymbolKind};

lazy_static! {
    static ref FUNC_RE: Regex = Regex::new(
        r"^(export\s+)?(?:default\s+)?(?:declare\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)"
    ).unwrap();
    static ref CLASS_RE: Regex = Regex::new(
        r"^(export\s+)?(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?class\s+([A-Za-z_$][\w$]*)"
    ).unwrap();
    static ref INTERFACE_RE: Regex = Regex::new(
        r"^(export\s+)?(?:declare\s+)?interface\s+([A-Za-z_$][\w$]*)"
    ).unwrap();
    static ref TYPE_RE: Regex = Regex::new(
        r"^(export\s+)?(?:declare\s+)?type\s+([A-Za-z_$][\w$]*)\s*(?:<.*>)?\s*="
    ).unwrap();
    static ref ENUM_RE: Regex = Regex::new(
        r"^(export\s+)?(?:declare\s+)?(?:const\s+)?enum\s+([A-Za-z_$][\w$]*)"
    ).unwrap();
    static ref BINDING_RE: Regex = Regex::new(
        r"^(export\s+)?(?:declare\s+)?(const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?::[^=]*)?(?:=\s*(.*))?$"
    ).unwrap();
    /// Initializers that make a binding a function.
    static ref FUNC_VALUE_RE: Regex = Regex::new(
        r"^(?:async\s+)?(?:function\b|\([^)]*\)\s*(?::[^=]*)?=>|[A-Za-z_$][\w$]*\s*=>)"
    ).unwrap();
    static ref METHOD_RE: Regex = Regex::new(
        r"^((?:(?:public|private|protected|static|async|readonly|abstract|override|declare|get|set)\s+)*)\*?\s*(#?[A-Za-z_$][\w$]*)\s*(?:<[^>]*>)?\s*\("
    ).unwrap();
    static ref ARROW_FIELD_RE: Regex = Regex::new(
        r"^((?:(?:public|private|protected|static|readonly)\s+)*)(#?[A-Za-z_$][\w$]*)\s*(?::[^=]*)?=\s*(?:async\s+)?(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*(?::[^=]*)?=>"
    ).unwrap();
    static ref EXPORT_LIST_RE: Regex = Regex::new(r"^export\s*\{([^}]*)\}\s*;?\s*$").unwrap();
}

/// Words that look like a method head but are statements.
const NOT_METHODS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "function", "do", "else", "try", "with",
    "typeof", "await", "yield", "new", "delete", "super", "this",
];

/// Characters that leave a declaration line unfinished.
const CONTINUATION_ENDINGS: &[char] = &['=', '(', ',', '<', ':', '|', '&', '+', '-', '?', '[', '.'];

/// A declaration whose closing line is not known yet.
struct Pending {
    index: usize,
    depth: usize,
    line: usize,
    opened: bool,
}

/// The top-level class whose body is currently open.
struct OpenClass {
    name: String,
    exported: bool,
    body_open: bool,
}

/// Extract symbols from TypeScript or JavaScript source.
pub fn extract(source: &str) -> Vec<Symbol> {
    let mut scanner = BraceScanner::new();
    let mut symbols: Vec<Symbol> = Vec::new();
    let mut pending: Vec<Pending> = Vec::new();
    let mut class: Option<OpenClass> = None;
    let mut export_list: HashSet<String> = HashSet::new();
    let mut last_nonblank = 0;

    for (idx, line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let scan = scanner.scan_line(line);
        let code = scan.code.trim();

        if scan.starts_in_code && !code.is_empty() {
            let found = if scan.depth_before == 0 {
                if let Some(caps) = EXPORT_LIST_RE.captures(code) {
                    export_list.extend(parse_export_list(&caps[1]));
                }
                top_level_declaration(code, line)
            } else if scan.depth_before == 1 {
                class
                    .as_ref()
                    .and_then(|c| class_member(code, line, c))
            } else {
                None
            };

            if let Some(mut symbol) = found {
                // A new declaration at the same depth closes any unfinished one.
                let depth = scan.depth_before;
                close_pending(&mut pending, &mut symbols, |p| p.depth >= depth, last_nonblank);

                symbol.line = line_no;
                symbol.end_line = line_no;
                if scan.depth_before == 0 {
                    class = if symbol.kind == SymbolKind::Class {
                        Some(OpenClass {
                            name: symbol.name.clone(),
                            exported: symbol.exported,
                            body_open: false,
                        })
                    } else {
                        None
                    };
                }
                pending.push(Pending {
                    index: symbols.len(),
                    depth,
                    line: line_no,
                    opened: false,
                });
                symbols.push(symbol);
            }
        }

        update_pending(&mut pending, &mut symbols, &scan, line_no);

        let class_closed = match class.as_mut() {
            Some(open) => {
                if scan.max_depth > 0 {
                    open.body_open = true;
                }
                open.body_open && scan.depth_after == 0
            }
            None => false,
        };
        if class_closed {
            class = None;
        }
        if !line.trim().is_empty() {
            last_nonblank = line_no;
        }
    }

    close_pending(&mut pending, &mut symbols, |_| true, last_nonblank);

    if !export_list.is_empty() {
        for symbol in symbols.iter_mut().filter(|s| s.parent.is_none()) {
            if export_list.contains(&symbol.name) {
                symbol.exported = true;
            }
        }
    }

    symbols
}

/// Match a declaration at depth 0.
fn top_level_declaration(code: &str, line: &str) -> Option<Symbol> {
    let make = |caps: &regex::Captures, name_group: usize, kind: SymbolKind| Symbol {
        name: caps[name_group].to_string(),
        kind,
        line: 0,
        end_line: 0,
        exported: caps.get(1).is_some(),
        signature: signature(line),
        parent: None,
    };

    if let Some(caps) = FUNC_RE.captures(code) {
        return Some(make(&caps, 2, SymbolKind::Func));
    }
    if let Some(caps) = CLASS_RE.captures(code) {
        return Some(make(&caps, 2, SymbolKind::Class));
    }
    if let Some(caps) = INTERFACE_RE.captures(code) {
        return Some(make(&caps, 2, SymbolKind::Interface));
    }
    if let Some(caps) = ENUM_RE.captures(code) {
        return Some(make(&caps, 2, SymbolKind::Enum));
    }
    if let Some(caps) = TYPE_RE.captures(code) {
        return Some(make(&caps, 2, SymbolKind::Type));
    }
    if let Some(caps) = BINDING_RE.captures(code) {
        let value = caps.get(4).map(|m| m.as_str().trim()).unwrap_or("");
        let kind = if FUNC_VALUE_RE.is_match(value) {
            SymbolKind::Func
        } else if &caps[2] == "const" {
            SymbolKind::Const
        } else {
            SymbolKind::Var
        };
        return Some(make(&caps, 3, kind));
    }
    None
}

/// Match a method or arrow-function field directly inside a class body.
fn class_member(code: &str, line: &str, class: &OpenClass) -> Option<Symbol> {
    let caps = METHOD_RE
        .captures(code)
        .or_else(|| ARROW_FIELD_RE.captures(code))?;
    let name = caps[2].to_string();
    if NOT_METHODS.contains(&name.as_str()) {
        return None;
    }

    let modifiers = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let private = name.starts_with('#')
        || modifiers
            .split_whitespace()
            .any(|m| m == "private" || m == "protected");

    Some(Symbol {
        name,
        kind: SymbolKind::Method,
        line: 0,
        end_line: 0,
        exported: class.exported && !private,
        signature: signature(line),
        parent: Some(class.name.clone()),
    })
}

/// Advance open/close state of unfinished declarations after a line.
fn update_pending(pending: &mut Vec<Pending>, symbols: &mut [Symbol], scan: &LineScan, line_no: usize) {
    let code = scan.code.trim();
    pending.retain_mut(|p| {
        if scan.max_depth > p.depth {
            p.opened = true;
        }
        let done = if p.opened {
            scan.depth_after <= p.depth
        } else if code.ends_with(';') {
            true
        } else {
            // An unbraced declaration that reads as a complete statement ends here.
            p.line == line_no
                && scan.depth_after == p.depth
                && !code.is_empty()
                && !code.ends_with("=>")
                && !code.ends_with(CONTINUATION_ENDINGS)
        };
        if done {
            symbols[p.index].end_line = line_no;
        }
        !done
    });
}

/// Close unfinished declarations matching `filter` at `end_line`.
fn close_pending<F>(pending: &mut Vec<Pending>, symbols: &mut [Symbol], filter: F, end_line: usize)
where
    F: Fn(&Pending) -> bool,
{
    pending.retain(|p| {
        if filter(p) {
            symbols[p.index].end_line = end_line.max(p.line);
            false
        } else {
            true
        }
    });
}

/// Names from `export { a, b as c }`; the local name is what was declared.
fn parse_export_list(list: &str) -> Vec<String> {
    list.split(',')
        .filter_map(|item| item.split_whitespace().next())
        .filter(|name| !name.is_empty() && *name != "type")
        .map(|name| name.to_string())
        .collect()
}

/// The declaration head without its opening brace.
fn signature(line: &str) -> String {
    let trimmed = line.trim();
    let trimmed = trimmed.strip_suffix('{').unwrap_or(trimmed);
    collapse_whitespace(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(symbols: &'a [Symbol], name: &str) -> &'a Symbol {
        symbols
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("expected symbol {}, got {:?}", name, symbols))
    }

    #[test]
    fn test_top_level_declarations() {
        let source = r#"
import { readFile } from "fs";

export function loadConfig(path: string): Config {
    return parse(readFile(path));
}

function helper() {
    return 1;
}

export interface Config {
    name: string;
}

export type Mode = "fast" | "slow";

export enum Color {
    Red,
    Green,
}

export const DEFAULT_NAME = "app";
let counter = 0;
export const handler = async (req: Request) => {
    return respond(req);
};
"#;
        let symbols = extract(source);

        let load = find(&symbols, "loadConfig");
        assert_eq!(load.kind, SymbolKind::Func);
        assert!(load.exported);
        assert_eq!(load.line, 4);
        assert_eq!(load.end_line, 6);
        assert_eq!(load.signature, "export function loadConfig(path: string): Config");

        let helper = find(&symbols, "helper");
        assert!(!helper.exported);
        assert_eq!((helper.line, helper.end_line), (8, 10));

        assert_eq!(find(&symbols, "Config").kind, SymbolKind::Interface);
        let mode = find(&symbols, "Mode");
        assert_eq!(mode.kind, SymbolKind::Type);
        assert_eq!(mode.end_line, mode.line);
        assert_eq!(find(&symbols, "Color").kind, SymbolKind::Enum);
        assert_eq!(find(&symbols, "DEFAULT_NAME").kind, SymbolKind::Const);
        assert_eq!(find(&symbols, "counter").kind, SymbolKind::Var);

        let handler = find(&symbols, "handler");
        assert_eq!(handler.kind, SymbolKind::Func);
        assert!(handler.exported);
        assert_eq!(handler.end_line, handler.line + 2);
    }

    #[test]
    fn test_class_methods() {
        let source = r#"export class Server {
    private port: number;

    constructor(port: number) {
        this.port = port;
    }

    async start(): Promise<void> {
        if (this.port) {
            listen(this.port);
        }
    }

    private stop() {
    }

    onRequest = (req) => {
        return req;
    };
}

class Internal {
    run() {}
}
"#;
        let symbols = extract(source);

        let server = find(&symbols, "Server");
        assert_eq!(server.kind, SymbolKind::Class);
        assert_eq!((server.line, server.end_line), (1, 20));

        let start = find(&symbols, "start");
        assert_eq!(start.kind, SymbolKind::Method);
        assert_eq!(start.parent.as_deref(), Some("Server"));
        assert!(start.exported);
        assert_eq!((start.line, start.end_line), (8, 12));

        assert!(!find(&symbols, "stop").exported);
        assert_eq!(find(&symbols, "constructor").kind, SymbolKind::Method);
        assert_eq!(find(&symbols, "onRequest").kind, SymbolKind::Method);

        // `if` inside a method body is not a member.
        assert!(!symbols.iter().any(|s| s.name == "if"));

        let run = find(&symbols, "run");
        assert_eq!(run.parent.as_deref(), Some("Internal"));
        assert!(!run.exported);
    }

    #[test]
    fn test_nested_declarations_ignored() {
        let source = r#"function outer() {
    function inner() {}
    const local = 1;
}
"#;
        let symbols = extract(source);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "outer");
    }

    #[test]
    fn test_strings_and_comments_do_not_shift_depth() {
        let source = r#"const open = "{";
/* function ghost() { */
const tpl = `${"{"} and {`;
export function real() {
    return "}";
}
"#;
        let symbols = extract(source);
        let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["open", "tpl", "real"]);
        let real = find(&symbols, "real");
        assert_eq!((real.line, real.end_line), (4, 6));
    }

    #[test]
    fn test_regex_literal_braces_do_not_shift_depth() {
        let source = r#"const OPEN = /\{/g;
export function later() {
    return OPEN.test("x") ? half / 2 : /[}]/;
}
"#;
        let symbols = extract(source);
        let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["OPEN", "later"]);
        let later = find(&symbols, "later");
        assert_eq!((later.line, later.end_line), (2, 4));
    }

    #[test]
    fn test_export_list_marks_exported() {
        let source = r#"function a() {}
function b() {}
function c() {}
export { a, b as bee };
"#;
        let symbols = extract(source);
        assert!(find(&symbols, "a").exported);
        assert!(find(&symbols, "b").exported);
        assert!(!find(&symbols, "c").exported);
    }

    #[test]
    fn test_multiline_signature() {
        let source = r#"export function build(
    a: number,
    b: number,
) {
    return a + b;
}
"#;
        let symbols = extract(source);
        let build = find(&symbols, "build");
        assert_eq!((build.line, build.end_line), (1, 6));
    }

    #[test]
    fn test_malformed_input_is_partial() {
        let source = "export function broken() {\n    if (x) {\n";
        let symbols = extract(source);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].end_line, 2);
    }
}
