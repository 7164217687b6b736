//! Per-language symbol extraction.
//!
//! Three variants share one contract: take a file's text, return the named
//! declarations in it.
//!
//! - [`Extractor::Go`]: tree-sitter syntax tree walk (structured)
//! - [`Extractor::Script`]: TypeScript/JavaScript brace-depth line scanner
//! - [`Extractor::Python`]: indentation line scanner
//!
//! A [`Registry`] maps file extensions to variants. It is built once and
//! passed by reference to everything that needs extraction.
//!
//! # Adding a New Language
//!
//! Add a variant to [`Extractor`], list its extensions in
//! [`Extractor::extensions`] and route [`Extractor::extract`] to the new
//! module. Nothing else dispatches on language.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

#[cfg(feature = "tree-sitter")]
mod go;
mod lexer;
mod python;
mod script;

/// Kind of declaration found by an extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Func,
    Method,
    Type,
    Class,
    Interface,
    Const,
    Var,
    Enum,
}

impl SymbolKind {
    pub const ALL: [SymbolKind; 8] = [
        SymbolKind::Func,
        SymbolKind::Method,
        SymbolKind::Type,
        SymbolKind::Class,
        SymbolKind::Interface,
        SymbolKind::Const,
        SymbolKind::Var,
        SymbolKind::Enum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Func => "func",
            SymbolKind::Method => "method",
            SymbolKind::Type => "type",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Const => "const",
            SymbolKind::Var => "var",
            SymbolKind::Enum => "enum",
        }
    }

    /// Check if this is a callable (function or method).
    pub fn is_callable(&self) -> bool {
        matches!(self, SymbolKind::Func | SymbolKind::Method)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SymbolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "func" | "function" | "fn" => Ok(SymbolKind::Func),
            "method" => Ok(SymbolKind::Method),
            "type" | "struct" => Ok(SymbolKind::Type),
            "class" => Ok(SymbolKind::Class),
            "interface" => Ok(SymbolKind::Interface),
            "const" | "constant" => Ok(SymbolKind::Const),
            "var" | "variable" => Ok(SymbolKind::Var),
            "enum" => Ok(SymbolKind::Enum),
            _ => Err(format!("unknown symbol kind: {}", s)),
        }
    }
}

/// A named declaration found in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Declaration line (1-indexed).
    pub line: usize,
    /// Closing line of the declaration's body (1-indexed, >= `line`).
    pub end_line: usize,
    pub exported: bool,
    /// Declaration text up to the body, on one line.
    pub signature: String,
    /// Enclosing type for methods (receiver type, class name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Symbol {
    /// Whether `line` falls inside this declaration.
    pub fn contains_line(&self, line: usize) -> bool {
        self.line <= line && line <= self.end_line
    }

    /// `Parent.name` for methods, `name` otherwise.
    pub fn qualified_name(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}.{}", parent, self.name),
            None => self.name.clone(),
        }
    }
}

/// The closed set of extractor variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Extractor {
    /// Go, via tree-sitter.
    Go,
    /// TypeScript and JavaScript, via brace-depth scanning.
    Script,
    /// Python, via indentation scanning.
    Python,
}

impl Extractor {
    /// Every variant compiled into this build.
    pub fn available() -> &'static [Extractor] {
        #[cfg(feature = "tree-sitter")]
        {
            &[Extractor::Go, Extractor::Script, Extractor::Python]
        }
        #[cfg(not(feature = "tree-sitter"))]
        {
            &[Extractor::Script, Extractor::Python]
        }
    }

    /// Language identifier used in output.
    pub fn language_id(&self) -> &'static str {
        match self {
            Extractor::Go => "go",
            Extractor::Script => "typescript",
            Extractor::Python => "python",
        }
    }

    /// File extensions this variant claims (lowercase, without dot).
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Extractor::Go => &["go"],
            Extractor::Script => &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"],
            Extractor::Python => &["py", "pyi"],
        }
    }

    /// Extract symbols from one file's text, ordered by line.
    ///
    /// Malformed input yields whatever could be recovered; an error means the
    /// file could not be processed at all.
    pub fn extract(&self, path: &str, source: &str) -> anyhow::Result<Vec<Symbol>> {
        let mut symbols = match self {
            #[cfg(feature = "tree-sitter")]
            Extractor::Go => go::extract(source)?,
            #[cfg(not(feature = "tree-sitter"))]
            Extractor::Go => anyhow::bail!("{}: built without tree-sitter support", path),
            Extractor::Script => script::extract(source),
            Extractor::Python => python::extract(source),
        };
        symbols.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.name.cmp(&b.name)));
        tracing::debug!(path, count = symbols.len(), "extracted symbols");
        Ok(symbols)
    }
}

impl fmt::Display for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.language_id())
    }
}

/// Immutable extension → extractor mapping.
#[derive(Debug, Clone)]
pub struct Registry {
    by_extension: HashMap<&'static str, Extractor>,
}

impl Registry {
    /// Build the mapping for every available variant.
    pub fn new() -> Self {
        Self::with_extractors(Extractor::available())
    }

    /// Build the mapping for a chosen set of variants.
    pub fn with_extractors(extractors: &[Extractor]) -> Self {
        let mut by_extension = HashMap::new();
        for extractor in extractors {
            for ext in extractor.extensions() {
                let previous = by_extension.insert(*ext, *extractor);
                debug_assert!(
                    previous.is_none() || previous == Some(*extractor),
                    "extension {} claimed twice",
                    ext
                );
            }
        }
        Self { by_extension }
    }

    /// Get the extractor for an extension (with or without leading dot).
    pub fn for_extension(&self, ext: &str) -> Option<Extractor> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        self.by_extension.get(ext.as_str()).copied()
    }

    /// Get the extractor for a path, by its extension.
    pub fn for_path(&self, path: impl AsRef<Path>) -> Option<Extractor> {
        let ext = path.as_ref().extension().and_then(|e| e.to_str())?;
        self.for_extension(ext)
    }

    /// Return all registered file extensions, sorted.
    pub fn extensions(&self) -> Vec<&'static str> {
        let mut exts: Vec<_> = self.by_extension.keys().copied().collect();
        exts.sort_unstable();
        exts
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse runs of whitespace into single spaces.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
