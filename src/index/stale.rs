//! Staleness check: compare a stored index with the live tree.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;

use super::{walk_files, IgnoreRules, Index};
use crate::error::Result;

/// Differences between the index and the filesystem.
#[derive(Debug, Clone, Serialize)]
pub struct Staleness {
    pub scanned_at: DateTime<Utc>,
    /// Files on disk that the index does not know about.
    pub new: Vec<String>,
    /// Indexed files that no longer exist.
    pub deleted: Vec<String>,
    /// Indexed files modified after the scan.
    pub modified: Vec<String>,
}

impl Staleness {
    pub fn is_stale(&self) -> bool {
        !(self.new.is_empty() && self.deleted.is_empty() && self.modified.is_empty())
    }
}

pub(super) fn check(index: &Index, rules: &IgnoreRules) -> Result<Staleness> {
    let scanned_at = index.meta().scanned_at;
    let live: BTreeSet<String> = walk_files(index.root(), rules)?.into_iter().collect();
    let indexed: BTreeSet<&str> = index.files().map(|e| e.path.as_str()).collect();

    let new = live
        .iter()
        .filter(|p| !indexed.contains(p.as_str()))
        .cloned()
        .collect();
    let deleted = indexed
        .iter()
        .filter(|p| !live.contains(**p))
        .map(|p| p.to_string())
        .collect();

    let mut modified = Vec::new();
    for path in indexed.iter().filter(|p| live.contains(**p)) {
        let mtime = match fs::metadata(index.abs_path(path)).and_then(|m| m.modified()) {
            Ok(t) => DateTime::<Utc>::from(t),
            Err(e) => {
                tracing::debug!(path = *path, error = %e, "no modification time");
                continue;
            }
        };
        if mtime > scanned_at {
            modified.push(path.to_string());
        }
    }

    Ok(Staleness {
        scanned_at,
        new,
        deleted,
        modified,
    })
}
