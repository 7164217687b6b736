//! Python symbol extraction by indentation scanning.
//!
//! Extracts:
//! - Top-level `def`/`async def` (functions) and `class` declarations
//! - `def` in the direct body of a top-level class (methods)
//! - Module-level assignments (UPPER_CASE names are constants)
//!
//! Names starting with `_` are private.

use lazy_static::lazy_static;
use regex::Regex;

use super::{collapse_whitespace, Symbol, SymbolKind};

lazy_static! {
    static ref DEF_RE: Regex = Regex::new(r"^(\s*)(?:async\s+)?def\s+([A-Za-z_]\w*)").unwrap();
    static ref CLASS_RE: Regex = Regex::new(r"^(\s*)class\s+([A-Za-z_]\w*)").unwrap();
    static ref ASSIGN_RE: Regex = Regex::new(r"^([A-Za-z_]\w*)\s*(?::[^=]+)?=(?:[^=]|$)").unwrap();
    static ref CONST_NAME_RE: Regex = Regex::new(r"^_*[A-Z][A-Z0-9_]*$").unwrap();
}

/// Per-line facts gathered in the first pass.
#[derive(Debug, Clone, Copy)]
struct LineInfo {
    indent: usize,
    /// Starts a logical line outside strings and bracket continuations.
    significant: bool,
    blank: bool,
}

/// The top-level class whose body is being read.
struct OpenClass {
    name: String,
    indent: usize,
    body_indent: Option<usize>,
}

/// Extract symbols from Python source.
pub fn extract(source: &str) -> Vec<Symbol> {
    let lines: Vec<&str> = source.lines().collect();
    let infos = classify_lines(&lines);

    let mut symbols = Vec::new();
    let mut class: Option<OpenClass> = None;

    for (idx, line) in lines.iter().enumerate() {
        let info = infos[idx];
        if !info.significant {
            continue;
        }
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            continue;
        }

        let class_closed = match class.as_mut() {
            Some(open) if info.indent <= open.indent => true,
            Some(open) => {
                open.body_indent.get_or_insert(info.indent);
                false
            }
            None => false,
        };
        if class_closed {
            class = None;
        }

        let found = if info.indent == 0 {
            top_level_declaration(line)
        } else {
            class.as_ref().and_then(|open| {
                if open.body_indent != Some(info.indent) {
                    return None;
                }
                let caps = DEF_RE.captures(line)?;
                Some(make_symbol(&caps[2], SymbolKind::Method, line, Some(open.name.clone())))
            })
        };

        if let Some(mut symbol) = found {
            symbol.line = idx + 1;
            symbol.end_line = block_end(&infos, idx);
            if symbol.kind == SymbolKind::Class {
                class = Some(OpenClass {
                    name: symbol.name.clone(),
                    indent: info.indent,
                    body_indent: None,
                });
            }
            symbols.push(symbol);
        }
    }

    symbols
}

fn top_level_declaration(line: &str) -> Option<Symbol> {
    if let Some(caps) = DEF_RE.captures(line) {
        return Some(make_symbol(&caps[2], SymbolKind::Func, line, None));
    }
    if let Some(caps) = CLASS_RE.captures(line) {
        return Some(make_symbol(&caps[2], SymbolKind::Class, line, None));
    }
    if let Some(caps) = ASSIGN_RE.captures(line) {
        let name = &caps[1];
        let kind = if CONST_NAME_RE.is_match(name) {
            SymbolKind::Const
        } else {
            SymbolKind::Var
        };
        return Some(make_symbol(name, kind, line, None));
    }
    None
}

fn make_symbol(name: &str, kind: SymbolKind, line: &str, parent: Option<String>) -> Symbol {
    let trimmed = line.trim();
    let head = if kind.is_callable() || kind == SymbolKind::Class {
        trimmed.strip_suffix(':').unwrap_or(trimmed)
    } else {
        trimmed
    };
    Symbol {
        name: name.to_string(),
        kind,
        line: 0,
        end_line: 0,
        exported: !name.starts_with('_'),
        signature: collapse_whitespace(head),
        parent,
    }
}

/// Last non-blank line (1-indexed) of the block opened at `start`.
/// Comment-only lines never close a block, whatever their indentation.
fn block_end(infos: &[LineInfo], start: usize) -> usize {
    let indent = infos[start].indent;
    let mut end = start;
    for (idx, info) in infos.iter().enumerate().skip(start + 1) {
        if info.significant && !info.blank && info.indent <= indent {
            break;
        }
        if !info.blank {
            end = idx;
        }
    }
    end + 1
}

/// First pass: indentation, blankness and whether each line starts a
/// logical line (not inside a triple-quoted string or open brackets).
fn classify_lines(lines: &[&str]) -> Vec<LineInfo> {
    let mut infos = Vec::with_capacity(lines.len());
    let mut in_triple: Option<&'static str> = None;
    let mut bracket_depth: usize = 0;

    for line in lines {
        let trimmed = line.trim();
        let starts_clean = in_triple.is_none() && bracket_depth == 0;
        let blank = trimmed.is_empty() || (starts_clean && trimmed.starts_with('#'));

        infos.push(LineInfo {
            indent: indentation(line),
            significant: starts_clean && !trimmed.is_empty(),
            blank,
        });

        scan_line(line, &mut in_triple, &mut bracket_depth);
    }

    infos
}

/// Update string and bracket state across one line.
fn scan_line(line: &str, in_triple: &mut Option<&'static str>, bracket_depth: &mut usize) {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if let Some(delim) = *in_triple {
            if bytes[i..].starts_with(delim.as_bytes()) {
                *in_triple = None;
                i += 3;
            } else {
                i += if bytes[i] == b'\\' { 2 } else { 1 };
            }
            continue;
        }

        match bytes[i] {
            b'#' => break,
            b'"' | b'\'' => {
                let quote = bytes[i];
                let triple = if quote == b'"' { "\"\"\"" } else { "'''" };
                if bytes[i..].starts_with(triple.as_bytes()) {
                    *in_triple = Some(triple);
                    i += 3;
                    continue;
                }
                // Single-line string: skip to the closing quote.
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    i += if bytes[i] == b'\\' { 2 } else { 1 };
                }
            }
            b'(' | b'[' | b'{' => *bracket_depth += 1,
            b')' | b']' | b'}' => *bracket_depth = bracket_depth.saturating_sub(1),
            _ => {}
        }
        i += 1;
    }
}

/// Leading whitespace width (tabs count as four columns).
fn indentation(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}
