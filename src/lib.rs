//! codenav - a project-local code index.
//!
//! A scan walks the project, extracts symbols from each supported file and
//! persists a flat list of file and symbol entries. Every other operation is
//! a read-only query over that list, re-reading file contents on demand.
//!
//! # Architecture
//!
//! - `extract`: per-language symbol extractors (Go via tree-sitter, line
//!   scanners for TypeScript/JavaScript and Python)
//! - `index`: scan, persist, load and staleness of the entry store
//! - `search`: ranked and fuzzy lookup over entries
//! - `refs`: definition and reference finding
//! - `graph`: file-level import graph
//! - `analysis`: outline, impact and dead-code analysis
//! - `config`, `report`, `cli`: the command-line tool
//!
//! # Adding a New Language
//!
//! Add a variant to [`extract::Extractor`] with its extensions and an
//! `extract` arm, then teach `graph::imports` its import syntax.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod graph;
pub mod index;
pub mod refs;
pub mod report;
pub mod search;

pub use analysis::{find_dead_code, impact, outline, DeadCodeOptions, ImpactOptions};
pub use config::Config;
pub use error::{Error, Result};
pub use extract::{Extractor, Registry, Symbol, SymbolKind};
pub use graph::DependencyGraph;
pub use index::{Entry, EntryKind, Index};
pub use refs::{find_refs, Reference, RefsResult};
pub use search::{rank, MatchOptions};
