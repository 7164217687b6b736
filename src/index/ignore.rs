//! Scan exclusion rules.
//!
//! Fixed noise directories are always skipped. Extra patterns come from the
//! project's `.codenavignore` and from configuration, in gitignore-style
//! syntax:
//!
//! - `name/` matches directories with that basename anywhere
//! - `/path` is anchored to the root
//! - a pattern containing `/` is anchored to the root
//! - anything else (including globs) matches basenames anywhere

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::fs;
use std::io;
use std::path::Path;

use super::store::STORE_DIR;
use crate::error::{Error, Result};

/// Project-local ignore file name.
pub const IGNORE_FILE: &str = ".codenavignore";

/// Directories never scanned.
pub const DEFAULT_SKIP_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "vendor",
    "target",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    ".idea",
    ".vscode",
    STORE_DIR,
];

/// Compiled exclusion rules.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    /// Basename patterns applied to files and directories.
    basename: GlobSet,
    /// Basename patterns applied to directories only.
    dir_basename: GlobSet,
    /// Root-relative patterns applied to files and directories.
    rooted: GlobSet,
    /// Root-relative patterns applied to directories only.
    rooted_dir: GlobSet,
    patterns: usize,
}

impl IgnoreRules {
    /// Compile rules from pattern lines.
    pub fn new<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        let mut basename = GlobSetBuilder::new();
        let mut dir_basename = GlobSetBuilder::new();
        let mut rooted = GlobSetBuilder::new();
        let mut rooted_dir = GlobSetBuilder::new();
        let mut patterns = 0;

        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with('!') {
                tracing::debug!(pattern = line, "negated ignore patterns are not supported");
                continue;
            }

            let (pattern, dir_only) = match line.strip_suffix('/') {
                Some(p) => (p, true),
                None => (line, false),
            };
            let (pattern, anchored) = match pattern.strip_prefix('/') {
                Some(p) => (p, true),
                None => (pattern, pattern.contains('/')),
            };
            if pattern.is_empty() {
                continue;
            }

            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|source| Error::InvalidIgnorePattern {
                    pattern: line.to_string(),
                    source,
                })?;

            match (anchored, dir_only) {
                (false, false) => basename.add(glob),
                (false, true) => dir_basename.add(glob),
                (true, false) => rooted.add(glob),
                (true, true) => rooted_dir.add(glob),
            };
            patterns += 1;
        }

        let build = |builder: GlobSetBuilder| {
            builder.build().map_err(|source| Error::InvalidIgnorePattern {
                pattern: String::new(),
                source,
            })
        };

        Ok(Self {
            basename: build(basename)?,
            dir_basename: build(dir_basename)?,
            rooted: build(rooted)?,
            rooted_dir: build(rooted_dir)?,
            patterns,
        })
    }

    /// Rules from `<root>/.codenavignore` plus extra configured patterns.
    pub fn load<S: AsRef<str>>(root: &Path, extra: &[S]) -> Result<Self> {
        let mut lines: Vec<String> = match fs::read_to_string(root.join(IGNORE_FILE)) {
            Ok(content) => content.lines().map(str::to_string).collect(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        lines.extend(extra.iter().map(|s| s.as_ref().to_string()));

        let rules = Self::new(&lines)?;
        tracing::debug!(patterns = rules.patterns, "loaded ignore rules");
        Ok(rules)
    }

    /// Whether a root-relative path (with `/` separators) is excluded.
    pub fn is_ignored(&self, rel_path: &str, is_dir: bool) -> bool {
        let name = rel_path.rsplit('/').next().unwrap_or(rel_path);

        if is_dir && DEFAULT_SKIP_DIRS.contains(&name) {
            return true;
        }
        if self.basename.is_match(name) || self.rooted.is_match(rel_path) {
            return true;
        }
        is_dir && (self.dir_basename.is_match(name) || self.rooted_dir.is_match(rel_path))
    }

    /// Number of custom patterns compiled.
    pub fn len(&self) -> usize {
        self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns == 0
    }
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self {
            basename: GlobSet::empty(),
            dir_basename: GlobSet::empty(),
            rooted: GlobSet::empty(),
            rooted_dir: GlobSet::empty(),
            patterns: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_dirs() {
        let rules = IgnoreRules::default();
        assert!(rules.is_ignored("node_modules", true));
        assert!(rules.is_ignored("web/node_modules", true));
        assert!(rules.is_ignored(".codenav", true));
        // Only directories are skipped by default.
        assert!(!rules.is_ignored("build", false));
        assert!(!rules.is_ignored("src/main.go", false));
    }

    #[test]
    fn test_pattern_forms() {
        let rules = IgnoreRules::new(&[
            "# generated code",
            "",
            "generated/",
            "*.pb.go",
            "/docs",
            "web/legacy/*.js",
            "!keep.pb.go",
        ])
        .unwrap();
        assert_eq!(rules.len(), 4);

        assert!(rules.is_ignored("generated", true));
        assert!(rules.is_ignored("api/generated", true));
        assert!(!rules.is_ignored("generated", false));

        assert!(rules.is_ignored("api/v1/user.pb.go", false));
        assert!(!rules.is_ignored("api/v1/user.go", false));

        assert!(rules.is_ignored("docs", true));
        assert!(!rules.is_ignored("pkg/docs", true));

        assert!(rules.is_ignored("web/legacy/old.js", false));
        assert!(!rules.is_ignored("web/legacy/nested/old.js", false));
        assert!(!rules.is_ignored("other/web/legacy/old.js", false));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = IgnoreRules::new(&["src/[bad"]).unwrap_err();
        assert!(matches!(err, Error::InvalidIgnorePattern { .. }), "got {:?}", err);
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(IGNORE_FILE), "fixtures/\n*.min.js\n").unwrap();

        let rules = IgnoreRules::load(temp.path(), &["tmp/"]).unwrap();
        assert_eq!(rules.len(), 3);
        assert!(rules.is_ignored("fixtures", true));
        assert!(rules.is_ignored("app.min.js", false));
        assert!(rules.is_ignored("tmp", true));
    }

    #[test]
    fn test_load_without_file() {
        let temp = TempDir::new().unwrap();
        let rules = IgnoreRules::load::<&str>(temp.path(), &[]).unwrap();
        assert!(rules.is_empty());
    }
}
