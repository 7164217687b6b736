//! Error types surfaced by the index and its queries.
//!
//! Per-file problems (unreadable files, syntax errors) never reach this type:
//! they are logged and skipped where they happen. What remains are input
//! errors, store errors and plain I/O failures.

use std::path::PathBuf;

/// Errors returned by index operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("path not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("query must not be empty")]
    EmptyQuery,

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid ignore pattern {pattern:?}: {source}")]
    InvalidIgnorePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("no index found in {}; run `codenav scan` first", .0.display())]
    NoIndex(PathBuf),

    #[error("index in {} is unreadable ({reason}); run `codenav scan` to rebuild it", .path.display())]
    CorruptIndex { path: PathBuf, reason: String },

    #[error("file not in index: {0}")]
    FileNotIndexed(String),

    #[error("{query:?} matches several indexed files: {}", .candidates.join(", "))]
    AmbiguousFile {
        query: String,
        candidates: Vec<String>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the caller should rebuild the store before retrying.
    pub fn is_rescan_required(&self) -> bool {
        matches!(self, Error::NoIndex(_) | Error::CorruptIndex { .. })
    }
}

/// Result alias for index operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rescan_required() {
        assert!(Error::NoIndex(PathBuf::from("/tmp/x")).is_rescan_required());
        assert!(Error::CorruptIndex {
            path: PathBuf::from("/tmp/x"),
            reason: "bad json".to_string(),
        }
        .is_rescan_required());
        assert!(!Error::EmptyQuery.is_rescan_required());
        assert!(!Error::Io(std::io::Error::other("boom")).is_rescan_required());
    }

    #[test]
    fn test_messages_are_actionable() {
        let msg = Error::NoIndex(PathBuf::from("/proj")).to_string();
        assert!(msg.contains("codenav scan"), "got: {}", msg);

        let msg = Error::AmbiguousFile {
            query: "lib.ts".to_string(),
            candidates: vec!["a/lib.ts".to_string(), "b/lib.ts".to_string()],
        }
        .to_string();
        assert!(msg.contains("a/lib.ts, b/lib.ts"), "got: {}", msg);
    }
}
