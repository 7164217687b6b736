//! The entry store: scan a tree, persist it, load it back.
//!
//! An [`Index`] owns the flat entry list for one project root. Every query
//! module borrows from it; nothing else keeps a copy. A scan always rebuilds
//! the whole list.

use chrono::Utc;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::extract::{Registry, Symbol};

mod entry;
mod ignore;
mod stale;
mod store;

pub use entry::{Entry, EntryKind};
pub use ignore::{IgnoreRules, DEFAULT_SKIP_DIRS, IGNORE_FILE};
pub use stale::Staleness;
pub use store::{Meta, STORE_DIR};

/// Bytes inspected when deciding whether a file is binary.
const BINARY_PROBE_LEN: usize = 8000;

/// A loaded or freshly scanned index.
#[derive(Debug, Clone)]
pub struct Index {
    root: PathBuf,
    entries: Vec<Entry>,
    meta: Meta,
}

impl Index {
    /// Walk `root`, extract symbols from every supported file and build a
    /// new index. Nothing is written to disk.
    pub fn scan<S: AsRef<str>>(root: impl AsRef<Path>, registry: &Registry, ignore: &[S]) -> Result<Self> {
        let root = validate_root(root.as_ref())?;
        let rules = IgnoreRules::load(&root, ignore)?;
        let scanned_at = Utc::now();

        let files = walk_files(&root, &rules)?;
        tracing::debug!(files = files.len(), "walked tree");

        let per_file: Vec<(Entry, Extraction)> = files
            .par_iter()
            .map(|rel| {
                let file = Entry::file(rel);
                let outcome = extract_file(&root, rel, registry);
                (file, outcome)
            })
            .collect();

        if let Some(failed) = all_extractions_failed(per_file.iter().map(|(_, outcome)| outcome)) {
            tracing::warn!(
                failed,
                "symbol extraction failed for every supported file; the index has file entries only"
            );
        }

        let mut entries = Vec::with_capacity(per_file.len());
        let mut packages = BTreeSet::new();
        let mut extensions = BTreeMap::new();
        let mut symbol_count = 0;
        for (file, outcome) in per_file {
            let symbols = match outcome {
                Extraction::Symbols(symbols) => symbols,
                Extraction::Unsupported | Extraction::Failed => Vec::new(),
            };
            packages.insert(file.package.clone());
            if let Some(ext) = extension_of(&file.path) {
                *extensions.entry(ext).or_insert(0) += 1;
            }
            let symbol_entries: Vec<Entry> = symbols.iter().map(|s| Entry::symbol(&file, s)).collect();
            symbol_count += symbol_entries.len();
            entries.push(file);
            entries.extend(symbol_entries);
        }

        let meta = Meta {
            root: root.clone(),
            scanned_at,
            version: env!("CARGO_PKG_VERSION").to_string(),
            file_count: files.len(),
            package_count: packages.len(),
            extensions,
        };

        tracing::info!(
            root = %root.display(),
            files = files.len(),
            symbols = symbol_count,
            "scan complete"
        );
        Ok(Self { root, entries, meta })
    }

    /// Write the index to `<root>/.codenav/`, replacing any previous store.
    pub fn persist(&self) -> Result<()> {
        store::save(&self.root, &self.entries, &self.meta)
    }

    /// Load a previously persisted index for `root`.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = validate_root(root.as_ref())?;
        let (entries, mut meta) = store::load(&root)?;

        let files: BTreeSet<&str> = entries.iter().filter(|e| e.is_file()).map(|e| e.path.as_str()).collect();
        if let Some(orphan) = entries.iter().find(|e| !e.is_file() && !files.contains(e.path.as_str())) {
            return Err(Error::CorruptIndex {
                path: store::store_dir(&root),
                reason: format!("symbol {} refers to unindexed file {}", orphan.name, orphan.path),
            });
        }

        // A moved project keeps working: queries use the directory it was loaded from.
        if meta.root != root {
            tracing::debug!(stored = %meta.root.display(), "index root moved");
            meta.root = root.clone();
        }

        tracing::debug!(entries = entries.len(), "loaded index");
        Ok(Self { root, entries, meta })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// File entries in path order.
    pub fn files(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.is_file())
    }

    /// Symbol entries in index order.
    pub fn symbols(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| !e.is_file())
    }

    /// Whether a root-relative path is an indexed file.
    pub fn contains_file(&self, path: &str) -> bool {
        self.files().any(|e| e.path == path)
    }

    /// Resolve a user-supplied file argument to an indexed path.
    ///
    /// Accepts a root-relative path (optionally `./`-prefixed), an absolute
    /// path inside the root, or a unique path suffix.
    pub fn resolve_file(&self, query: &str) -> Result<&str> {
        let normalized = self.normalize_query(query);
        if normalized.is_empty() {
            return Err(Error::EmptyQuery);
        }

        if let Some(e) = self.files().find(|e| e.path == normalized) {
            return Ok(&e.path);
        }

        let suffix = format!("/{}", normalized);
        let matches: Vec<&str> = self
            .files()
            .filter(|e| e.path.ends_with(&suffix))
            .map(|e| e.path.as_str())
            .collect();

        match matches.len() {
            0 => Err(Error::FileNotIndexed(query.to_string())),
            1 => Ok(matches[0]),
            _ => Err(Error::AmbiguousFile {
                query: query.to_string(),
                candidates: matches.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }

    fn normalize_query(&self, query: &str) -> String {
        let query = query.trim();
        let path = Path::new(query);
        if path.is_absolute() {
            let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
            for candidate in [path, canonical.as_path()] {
                if let Ok(rel) = candidate.strip_prefix(&self.root) {
                    return to_slash(rel);
                }
            }
        }
        let mut s = query.replace('\\', "/");
        while let Some(rest) = s.strip_prefix("./") {
            s = rest.to_string();
        }
        s.trim_end_matches('/').to_string()
    }

    /// Absolute path of an indexed file.
    pub fn abs_path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Read an indexed file as text. Binary or unreadable files yield `None`.
    pub fn read_text(&self, rel: &str) -> Option<String> {
        match fs::read(self.abs_path(rel)) {
            Ok(bytes) => {
                let probe = &bytes[..bytes.len().min(BINARY_PROBE_LEN)];
                if probe.contains(&0) {
                    tracing::debug!(path = rel, "skipping binary file");
                    return None;
                }
                Some(String::from_utf8_lossy(&bytes).into_owned())
            }
            Err(e) => {
                tracing::warn!(path = rel, error = %e, "cannot read file");
                None
            }
        }
    }

    /// Compare the index against the live tree.
    pub fn status<S: AsRef<str>>(&self, ignore: &[S]) -> Result<Staleness> {
        let rules = IgnoreRules::load(&self.root, ignore)?;
        stale::check(self, &rules)
    }
}

/// Canonical scan root, or an input error.
fn validate_root(root: &Path) -> Result<PathBuf> {
    let metadata = match fs::metadata(root) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::RootNotFound(root.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    if !metadata.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }
    Ok(root.canonicalize()?)
}

/// Root-relative paths of every non-ignored file, sorted.
pub(crate) fn walk_files(root: &Path, rules: &IgnoreRules) -> Result<Vec<String>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            match e.path().strip_prefix(root) {
                Ok(rel) => !rules.is_ignored(&to_slash(rel), e.file_type().is_dir()),
                Err(_) => true,
            }
        });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable path");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(root) {
            files.push(to_slash(rel));
        }
    }

    files.sort();
    Ok(files)
}

/// What symbol extraction made of one file.
#[derive(Debug)]
enum Extraction {
    /// No extractor for the extension.
    Unsupported,
    Symbols(Vec<Symbol>),
    /// Unreadable, or rejected by its extractor.
    Failed,
}

fn extract_file(root: &Path, rel: &str, registry: &Registry) -> Extraction {
    let Some(extractor) = registry.for_path(rel) else {
        return Extraction::Unsupported;
    };
    let source = match fs::read(root.join(rel)) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::warn!(path = rel, error = %e, "cannot read file, skipping symbols");
            return Extraction::Failed;
        }
    };
    match extractor.extract(rel, &source) {
        Ok(symbols) => Extraction::Symbols(symbols),
        Err(e) => {
            tracing::warn!(path = rel, error = %e, "extraction failed, skipping symbols");
            Extraction::Failed
        }
    }
}

/// Number of failures when at least one supported file was attempted and
/// none succeeded.
fn all_extractions_failed<'a>(outcomes: impl Iterator<Item = &'a Extraction>) -> Option<usize> {
    let mut failed = 0;
    for outcome in outcomes {
        match outcome {
            Extraction::Symbols(_) => return None,
            Extraction::Failed => failed += 1,
            Extraction::Unsupported => {}
        }
    }
    (failed > 0).then_some(failed)
}

fn extension_of(path: &str) -> Option<String> {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_lowercase()),
        _ => None,
    }
}

/// Path with `/` separators.
pub(crate) fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
