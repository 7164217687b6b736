//! Blast-radius estimation.
//!
//! Symbol mode walks "who references the referrers": layer 1 holds the
//! symbols enclosing each reference to the target, layer 2 the symbols
//! enclosing references to those, and so on. File mode walks importers of
//! importers through the dependency graph. Both keep a visited set, so each
//! dependent is reported once and cycles terminate.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::outline::{enclosing_symbol, file_symbols};
use crate::error::{Error, Result};
use crate::extract::{Registry, Symbol, SymbolKind};
use crate::graph::DependencyGraph;
use crate::index::Index;
use crate::refs::{find_refs, RefsResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactMode {
    Symbol,
    File,
}

#[derive(Debug, Clone)]
pub struct ImpactOptions {
    /// Layers to expand beyond the target.
    pub max_depth: usize,
    /// Items reported per layer; 0 means no cap.
    pub max_results: usize,
}

impl Default for ImpactOptions {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_results: 50,
        }
    }
}

/// One dependent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactItem {
    /// Enclosing symbol (symbol mode); `None` for top-level code and files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<SymbolKind>,
    pub path: String,
    /// Reference line; 0 in file mode.
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// The symbol or file this item depends on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImpactLayer {
    pub depth: usize,
    pub items: Vec<ImpactItem>,
    /// Items in this layer before truncation.
    pub total: usize,
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImpactReport {
    pub target: String,
    pub mode: ImpactMode,
    pub max_depth: usize,
    /// Layer 0 is the target itself.
    pub layers: Vec<ImpactLayer>,
    /// Distinct files among all dependents.
    pub affected_files: usize,
}

/// Impact of changing `target`: a file if it resolves to an indexed file,
/// otherwise a symbol name.
pub fn impact(index: &Index, registry: &Registry, target: &str, options: &ImpactOptions) -> Result<ImpactReport> {
    let target = target.trim();
    if target.is_empty() {
        return Err(Error::EmptyQuery);
    }
    match index.resolve_file(target) {
        Ok(path) => {
            let graph = DependencyGraph::build(index, registry);
            Ok(file_impact(&graph, path, options))
        }
        Err(Error::FileNotIndexed(_)) => symbol_impact(index, registry, target, options),
        Err(e @ Error::AmbiguousFile { .. }) if looks_like_path(target) => Err(e),
        Err(Error::AmbiguousFile { .. }) => symbol_impact(index, registry, target, options),
        Err(e) => Err(e),
    }
}

fn looks_like_path(target: &str) -> bool {
    target.contains('/') || target.contains('\\') || target.contains('.')
}

/// Transitive referrers of a symbol.
pub fn symbol_impact(
    index: &Index,
    registry: &Registry,
    symbol: &str,
    options: &ImpactOptions,
) -> Result<ImpactReport> {
    let first = find_refs(index, registry, symbol, 0)?;

    let kind = index
        .symbols()
        .find(|e| e.name == symbol)
        .and_then(|e| e.kind.symbol_kind());
    let root_items: Vec<ImpactItem> = first
        .definition
        .iter()
        .map(|d| ImpactItem {
            name: Some(symbol.to_string()),
            kind,
            path: d.path.clone(),
            line: d.line,
            content: (!d.content.is_empty()).then(|| d.content.clone()),
            via: None,
        })
        .collect();

    let mut layers = vec![layer(0, root_items, 0)];
    let mut visited: HashSet<String> = HashSet::from([symbol.to_string()]);
    let mut top_level_sites: HashSet<(String, usize)> = HashSet::new();
    let mut symbols_by_file: HashMap<String, Vec<Symbol>> = HashMap::new();
    let mut frontier: Vec<(String, Option<RefsResult>)> = vec![(symbol.to_string(), Some(first))];

    for depth in 1..=options.max_depth {
        if frontier.is_empty() {
            break;
        }
        let mut items = Vec::new();
        let mut next = Vec::new();

        for (name, refs) in frontier {
            let refs = match refs {
                Some(r) => r,
                None => find_refs(index, registry, &name, 0)?,
            };
            for reference in refs.references.into_iter().filter(|r| !r.is_definition) {
                let symbols = symbols_by_file
                    .entry(reference.path.clone())
                    .or_insert_with(|| file_symbols(index, registry, &reference.path));

                match enclosing_symbol(symbols, reference.line) {
                    Some(enclosing) => {
                        if enclosing.name == name || !visited.insert(enclosing.name.clone()) {
                            continue;
                        }
                        items.push(ImpactItem {
                            name: Some(enclosing.qualified_name()),
                            kind: Some(enclosing.kind),
                            path: reference.path,
                            line: reference.line,
                            content: Some(reference.content),
                            via: Some(name.clone()),
                        });
                        next.push((enclosing.name.clone(), None));
                    }
                    None => {
                        if !top_level_sites.insert((reference.path.clone(), reference.line)) {
                            continue;
                        }
                        items.push(ImpactItem {
                            name: None,
                            kind: None,
                            path: reference.path,
                            line: reference.line,
                            content: Some(reference.content),
                            via: Some(name.clone()),
                        });
                    }
                }
            }
        }

        tracing::debug!(depth, dependents = items.len(), "expanded impact layer");
        if items.is_empty() {
            break;
        }
        layers.push(layer(depth, items, options.max_results));
        frontier = next;
    }

    Ok(report(symbol, ImpactMode::Symbol, options, layers))
}

/// Transitive importers of a file.
pub fn file_impact(graph: &DependencyGraph, file: &str, options: &ImpactOptions) -> ImpactReport {
    let root = ImpactItem {
        name: None,
        kind: None,
        path: file.to_string(),
        line: 0,
        content: None,
        via: None,
    };
    let mut layers = vec![layer(0, vec![root], 0)];
    let mut visited: HashSet<&str> = HashSet::from([file]);
    let mut frontier: Vec<&str> = vec![file];

    for depth in 1..=options.max_depth {
        let mut items = Vec::new();
        let mut next = Vec::new();
        for current in &frontier {
            for importer in graph.importers(current) {
                if visited.insert(importer) {
                    items.push(ImpactItem {
                        name: None,
                        kind: None,
                        path: importer.to_string(),
                        line: 0,
                        content: None,
                        via: Some(current.to_string()),
                    });
                    next.push(importer);
                }
            }
        }
        if items.is_empty() {
            break;
        }
        layers.push(layer(depth, items, options.max_results));
        frontier = next;
    }

    report(file, ImpactMode::File, options, layers)
}

fn layer(depth: usize, mut items: Vec<ImpactItem>, max: usize) -> ImpactLayer {
    let total = items.len();
    let truncated = max > 0 && total > max;
    if truncated {
        items.truncate(max);
    }
    ImpactLayer {
        depth,
        items,
        total,
        truncated,
    }
}

fn report(target: &str, mode: ImpactMode, options: &ImpactOptions, layers: Vec<ImpactLayer>) -> ImpactReport {
    let affected_files = layers
        .iter()
        .skip(1)
        .flat_map(|l| l.items.iter().map(|i| i.path.as_str()))
        .collect::<HashSet<_>>()
        .len();
    ImpactReport {
        target: target.to_string(),
        mode,
        max_depth: options.max_depth,
        layers,
        affected_files,
    }
}
