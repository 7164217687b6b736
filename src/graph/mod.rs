//! File-level import graph.
//!
//! Built fresh for each query from the index plus the current file
//! contents. Only forward edges are computed from imports; the importer
//! relation is derived from them, so `a → b` is an edge exactly when `a` is
//! listed among `b`'s importers.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::extract::Registry;
use crate::index::Index;

mod imports;

pub use imports::extract_imports;

/// Directed import graph over importable files.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    files: BTreeSet<String>,
    forward: BTreeMap<String, BTreeSet<String>>,
    reverse: BTreeMap<String, BTreeSet<String>>,
}

/// How a node relates to the focus of a focused graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Focus,
    /// Reached by following imports from the focus.
    Dependency,
    /// Reached by following importers of the focus.
    Dependent,
}

/// A file with its fan-in and fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub path: String,
    pub fan_in: usize,
    pub fan_out: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<Relation>,
}

/// `from` imports `to`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub files: usize,
    pub edges: usize,
    /// Nodes with neither importers nor imports.
    pub isolated: usize,
}

/// Nodes and edges of a whole or focused graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub stats: GraphStats,
}

impl DependencyGraph {
    /// Build the graph from every importable indexed file.
    pub fn build(index: &Index, registry: &Registry) -> Self {
        let resolver = imports::Resolver::new(index, registry);

        let sources: Vec<(&str, crate::extract::Extractor)> = index
            .files()
            .filter_map(|e| registry.for_path(&e.path).map(|x| (e.path.as_str(), x)))
            .collect();

        let edges: Vec<(String, BTreeSet<String>)> = sources
            .par_iter()
            .map(|(path, extractor)| {
                let targets = match index.read_text(path) {
                    Some(content) => extract_imports(*extractor, &content)
                        .iter()
                        .flat_map(|spec| resolver.resolve(path, *extractor, spec))
                        .collect(),
                    None => BTreeSet::new(),
                };
                (path.to_string(), targets)
            })
            .collect();

        let mut graph = Self::default();
        for (path, targets) in edges {
            graph.files.insert(path.clone());
            for target in targets {
                graph.add_edge(&path, &target);
            }
        }

        tracing::debug!(
            files = graph.files.len(),
            edges = graph.edge_count(),
            "built dependency graph"
        );
        graph
    }

    /// Build a graph from explicit edges.
    pub fn from_edges<'e>(edges: impl IntoIterator<Item = (&'e str, &'e str)>) -> Self {
        let mut graph = Self::default();
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        self.files.insert(from.to_string());
        self.files.insert(to.to_string());
        self.forward.entry(from.to_string()).or_default().insert(to.to_string());
        self.reverse.entry(to.to_string()).or_default().insert(from.to_string());
    }

    pub fn contains(&self, file: &str) -> bool {
        self.files.contains(file)
    }

    /// Files `file` imports.
    pub fn imports(&self, file: &str) -> impl Iterator<Item = &str> {
        self.forward.get(file).into_iter().flatten().map(String::as_str)
    }

    /// Files importing `file`.
    pub fn importers(&self, file: &str) -> impl Iterator<Item = &str> {
        self.reverse.get(file).into_iter().flatten().map(String::as_str)
    }

    pub fn fan_in(&self, file: &str) -> usize {
        self.reverse.get(file).map_or(0, BTreeSet::len)
    }

    pub fn fan_out(&self, file: &str) -> usize {
        self.forward.get(file).map_or(0, BTreeSet::len)
    }

    pub fn edge_count(&self) -> usize {
        self.forward.values().map(BTreeSet::len).sum()
    }

    /// The whole graph: nodes by fan-in (descending) then path, edges sorted.
    pub fn view(&self) -> GraphView {
        let mut nodes: Vec<Node> = self.files.iter().map(|f| self.node(f, None, None)).collect();
        nodes.sort_by(|a, b| b.fan_in.cmp(&a.fan_in).then_with(|| a.path.cmp(&b.path)));

        let edges: Vec<Edge> = self
            .forward
            .iter()
            .flat_map(|(from, tos)| {
                tos.iter().map(move |to| Edge {
                    from: from.clone(),
                    to: to.clone(),
                })
            })
            .collect();

        let stats = stats(&nodes, &edges);
        GraphView {
            focus: None,
            max_depth: None,
            nodes,
            edges,
            stats,
        }
    }

    /// Neighborhood of `file`: dependencies followed forward and dependents
    /// followed backward, each up to `max_depth` hops (unbounded if `None`).
    pub fn focused(&self, file: &str, max_depth: Option<usize>) -> GraphView {
        let mut reached: BTreeMap<&str, (usize, Relation)> = BTreeMap::new();
        let mut queue: VecDeque<(&str, usize, Relation)> = VecDeque::new();
        reached.insert(file, (0, Relation::Focus));
        queue.push_back((file, 0, Relation::Focus));

        while let Some((current, depth, relation)) = queue.pop_front() {
            if max_depth.is_some_and(|max| depth >= max) {
                continue;
            }
            if relation != Relation::Dependent {
                for next in self.imports(current) {
                    if !reached.contains_key(next) {
                        reached.insert(next, (depth + 1, Relation::Dependency));
                        queue.push_back((next, depth + 1, Relation::Dependency));
                    }
                }
            }
            if relation != Relation::Dependency {
                for next in self.importers(current) {
                    if !reached.contains_key(next) {
                        reached.insert(next, (depth + 1, Relation::Dependent));
                        queue.push_back((next, depth + 1, Relation::Dependent));
                    }
                }
            }
        }

        let mut nodes: Vec<Node> = reached
            .iter()
            .map(|(path, (depth, relation))| self.node(path, Some(*depth), Some(*relation)))
            .collect();
        nodes.sort_by(|a, b| {
            a.depth
                .cmp(&b.depth)
                .then_with(|| b.fan_in.cmp(&a.fan_in))
                .then_with(|| a.path.cmp(&b.path))
        });

        let mut edges = Vec::new();
        for from in reached.keys() {
            for to in self.imports(from) {
                if reached.contains_key(to) {
                    edges.push(Edge {
                        from: from.to_string(),
                        to: to.to_string(),
                    });
                }
            }
        }
        edges.sort();

        let stats = stats(&nodes, &edges);
        GraphView {
            focus: Some(file.to_string()),
            max_depth,
            nodes,
            edges,
            stats,
        }
    }

    fn node(&self, path: &str, depth: Option<usize>, relation: Option<Relation>) -> Node {
        Node {
            path: path.to_string(),
            fan_in: self.fan_in(path),
            fan_out: self.fan_out(path),
            depth,
            relation,
        }
    }
}

fn stats(nodes: &[Node], edges: &[Edge]) -> GraphStats {
    GraphStats {
        files: nodes.len(),
        edges: edges.len(),
        isolated: nodes.iter().filter(|n| n.fan_in == 0 && n.fan_out == 0).count(),
    }
}
