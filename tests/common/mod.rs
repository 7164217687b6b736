//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use codenav::{Index, Registry};
use tempfile::TempDir;
use walkdir::WalkDir;

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata").join("project")
}

/// Copy the fixture project into a fresh temp dir, so scans can persist.
pub fn copy_fixture() -> TempDir {
    let temp = TempDir::new().expect("should create temp dir");
    let src = fixture_path();
    for entry in WalkDir::new(&src) {
        let entry = entry.expect("should walk fixture");
        let rel = entry.path().strip_prefix(&src).expect("should be under fixture");
        let dest = temp.path().join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).expect("should create dir");
        } else {
            fs::copy(entry.path(), &dest).expect("should copy file");
        }
    }
    temp
}

/// A temp project made of `(path, content)` pairs.
pub fn project(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().expect("should create temp dir");
    for (path, content) in files {
        write(temp.path(), path, content);
    }
    temp
}

pub fn write(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    fs::create_dir_all(full.parent().expect("file has a parent")).expect("should create dirs");
    fs::write(full, content).expect("should write file");
}

pub fn scan(root: &Path) -> Index {
    Index::scan::<&str>(root, &Registry::new(), &[]).expect("scan should succeed")
}
