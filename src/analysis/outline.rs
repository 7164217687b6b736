//! Per-file symbol outline.

use serde::Serialize;
use std::fs;

use crate::error::Result;
use crate::extract::{Registry, Symbol};
use crate::index::Index;

/// Full symbol records for one file.
#[derive(Debug, Clone, Serialize)]
pub struct Outline {
    pub path: String,
    /// Language of the extractor used, if any.
    pub language: Option<&'static str>,
    pub symbols: Vec<Symbol>,
}

/// Re-extract one indexed file.
pub fn outline(index: &Index, registry: &Registry, file: &str) -> Result<Outline> {
    let path = index.resolve_file(file)?.to_string();
    let Some(extractor) = registry.for_path(&path) else {
        return Ok(Outline {
            path,
            language: None,
            symbols: Vec::new(),
        });
    };

    let bytes = fs::read(index.abs_path(&path))?;
    let source = String::from_utf8_lossy(&bytes);
    let symbols = match extractor.extract(&path, &source) {
        Ok(symbols) => symbols,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "extraction failed");
            Vec::new()
        }
    };

    Ok(Outline {
        path,
        language: Some(extractor.language_id()),
        symbols,
    })
}

/// Symbols of an indexed file, or nothing if it cannot be read or parsed.
pub(crate) fn file_symbols(index: &Index, registry: &Registry, path: &str) -> Vec<Symbol> {
    let Some(extractor) = registry.for_path(path) else {
        return Vec::new();
    };
    let Some(source) = index.read_text(path) else {
        return Vec::new();
    };
    extractor.extract(path, &source).unwrap_or_else(|e| {
        tracing::warn!(path, error = %e, "extraction failed");
        Vec::new()
    })
}

/// Innermost symbol whose span contains `line`.
pub(crate) fn enclosing_symbol(symbols: &[Symbol], line: usize) -> Option<&Symbol> {
    symbols
        .iter()
        .filter(|s| s.contains_line(line))
        .max_by_key(|s| (s.line, std::cmp::Reverse(s.end_line)))
}
