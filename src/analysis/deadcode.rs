//! Unused-export detection.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::extract::{Registry, SymbolKind};
use crate::index::{Entry, Index};
use crate::refs::{occurrences, word_regex, DefinitionPatterns};

/// Names invoked by a runtime rather than by code in the project.
pub const ENTRY_POINTS: &[&str] = &["main", "init", "__init__", "__main__", "constructor"];

/// Name prefixes test runners pick up.
const TEST_PREFIXES: &[&str] = &["Test", "Benchmark", "Example", "Fuzz", "test_"];

#[derive(Debug, Clone)]
pub struct DeadCodeOptions {
    pub kind: Option<SymbolKind>,
    /// Only report symbols whose path starts with this prefix.
    pub path_prefix: Option<String>,
    /// 0 means no cap.
    pub max_results: usize,
    /// Extra entry-point names on top of [`ENTRY_POINTS`].
    pub entry_points: Vec<String>,
}

impl Default for DeadCodeOptions {
    fn default() -> Self {
        Self {
            kind: None,
            path_prefix: None,
            max_results: 100,
            entry_points: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub name: String,
    pub kind: SymbolKind,
    pub path: String,
    pub line: usize,
    pub package: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeadCodeReport {
    pub candidates: Vec<Candidate>,
    /// Candidates found before truncation.
    pub total: usize,
    pub truncated: bool,
    /// Exported symbols examined after filtering.
    pub checked: usize,
}

/// Exported symbols with no reference outside their own definition line.
pub fn find_dead_code(index: &Index, registry: &Registry, options: &DeadCodeOptions) -> Result<DeadCodeReport> {
    let prefix = options
        .path_prefix
        .as_deref()
        .map(|p| p.trim_start_matches("./"))
        .filter(|p| !p.is_empty());

    let checked: Vec<(&Entry, SymbolKind)> = index
        .symbols()
        .filter(|e| e.exported)
        .filter_map(|e| e.kind.symbol_kind().map(|k| (e, k)))
        .filter(|(e, _)| registry.for_path(&e.path).is_some())
        .filter(|(_, k)| options.kind.map_or(true, |want| want == *k))
        .filter(|(e, _)| prefix.map_or(true, |p| e.path.starts_with(p)))
        .filter(|(e, _)| !is_test_file(&e.path))
        .filter(|(e, _)| !is_entry_point(&e.name, &options.entry_points))
        .filter(|(e, _)| !is_test_entry(&e.name))
        .collect();

    let texts: Vec<(&str, String)> = index
        .files()
        .map(|e| e.path.as_str())
        .collect::<Vec<_>>()
        .into_par_iter()
        .filter_map(|path| index.read_text(path).map(|text| (path, text)))
        .collect();
    let by_path: HashMap<&str, usize> = texts.iter().enumerate().map(|(i, (p, _))| (*p, i)).collect();

    let results: Vec<Result<Option<Candidate>>> = checked
        .par_iter()
        .map(|(entry, kind)| {
            if is_referenced(entry, registry, &texts, &by_path)? {
                return Ok(None);
            }
            Ok(Some(Candidate {
                name: entry.name.clone(),
                kind: *kind,
                path: entry.path.clone(),
                line: entry.line,
                package: entry.package.clone(),
            }))
        })
        .collect();

    let mut candidates = Vec::new();
    for result in results {
        if let Some(candidate) = result? {
            candidates.push(candidate);
        }
    }
    candidates.sort_by(|a, b| a.path.cmp(&b.path).then(a.line.cmp(&b.line)));

    let total = candidates.len();
    let truncated = options.max_results > 0 && total > options.max_results;
    if truncated {
        candidates.truncate(options.max_results);
    }

    tracing::info!(checked = checked.len(), candidates = total, "dead code analysis complete");
    Ok(DeadCodeReport {
        candidates,
        total,
        truncated,
        checked: checked.len(),
    })
}

/// Any non-declaration occurrence besides the definition line, defining
/// file first. Declaration-shaped lines of same-named symbols elsewhere do
/// not keep a symbol alive.
fn is_referenced(
    entry: &Entry,
    registry: &Registry,
    texts: &[(&str, String)],
    by_path: &HashMap<&str, usize>,
) -> Result<bool> {
    let word = word_regex(&entry.name)?;
    let patterns = DefinitionPatterns::new(&entry.name)?;
    let used = |path: &str, text: &str, skip: Option<usize>| {
        let extractor = registry.for_path(path);
        occurrences(text, &entry.name, &word)
            .any(|(line, content)| Some(line) != skip && !patterns.matches(extractor, content))
    };

    if let Some(&own) = by_path.get(entry.path.as_str()) {
        let (path, text) = &texts[own];
        if used(*path, text.as_str(), Some(entry.line)) {
            return Ok(true);
        }
    }

    Ok(texts
        .iter()
        .filter(|(path, _)| *path != entry.path)
        .any(|(path, text)| used(*path, text.as_str(), None)))
}

fn is_entry_point(name: &str, extra: &[String]) -> bool {
    ENTRY_POINTS.contains(&name) || extra.iter().any(|e| e == name)
}

/// `TestParse` and `test_parse` are test entries; `Testify` is not.
pub fn is_test_entry(name: &str) -> bool {
    TEST_PREFIXES.iter().any(|prefix| match name.strip_prefix(prefix) {
        Some(rest) => prefix.ends_with('_') || rest.chars().next().map_or(true, |c| !c.is_lowercase()),
        None => false,
    })
}

/// Test files by naming convention.
pub fn is_test_file(path: &str) -> bool {
    if path.split('/').any(|segment| segment == "__tests__") {
        return true;
    }
    let base = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path);

    if base.ends_with("_test.go") || base == "conftest.py" {
        return true;
    }
    if base.ends_with(".py") && (base.starts_with("test_") || base.ends_with("_test.py")) {
        return true;
    }
    // foo.test.ts, foo.spec.js
    let parts: Vec<&str> = base.split('.').collect();
    parts.len() >= 3 && parts[1..parts.len() - 1].iter().any(|p| *p == "test" || *p == "spec")
}
