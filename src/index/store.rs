//! On-disk layout of a persisted index.
//!
//! ```text
//! <root>/.codenav/entries.json   array of Entry
//! <root>/.codenav/meta.json      scan metadata
//! ```
//!
//! Each file is written to a temporary sibling and renamed into place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::Entry;
use crate::error::{Error, Result};

/// Store directory, relative to the scanned root.
pub const STORE_DIR: &str = ".codenav";

const ENTRIES_FILE: &str = "entries.json";
const META_FILE: &str = "meta.json";

/// Scan metadata stored next to the entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Absolute scan root.
    pub root: PathBuf,
    pub scanned_at: DateTime<Utc>,
    /// Version of the tool that wrote the store.
    pub version: String,
    pub file_count: usize,
    pub package_count: usize,
    /// File counts per lowercase extension.
    pub extensions: BTreeMap<String, usize>,
}

pub fn store_dir(root: &Path) -> PathBuf {
    root.join(STORE_DIR)
}

/// Write entries and metadata under `root`.
pub fn save(root: &Path, entries: &[Entry], meta: &Meta) -> Result<()> {
    let dir = store_dir(root);
    fs::create_dir_all(&dir)?;

    write_atomic(&dir.join(ENTRIES_FILE), &serde_json::to_vec(entries).map_err(io::Error::from)?)?;
    write_atomic(
        &dir.join(META_FILE),
        &serde_json::to_vec_pretty(meta).map_err(io::Error::from)?,
    )?;

    tracing::debug!(dir = %dir.display(), entries = entries.len(), "persisted index");
    Ok(())
}

/// Read entries and metadata from under `root`.
pub fn load(root: &Path) -> Result<(Vec<Entry>, Meta)> {
    let dir = store_dir(root);
    let meta: Meta = read_json(root, &dir.join(META_FILE))?;
    let entries: Vec<Entry> = read_json(root, &dir.join(ENTRIES_FILE))?;
    Ok((entries, meta))
}

fn read_json<T: serde::de::DeserializeOwned>(root: &Path, path: &Path) -> Result<T> {
    let content = match fs::read(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::NoIndex(root.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&content).map_err(|e| Error::CorruptIndex {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)
}
