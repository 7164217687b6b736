//! Reference resolution: where a name is defined and where it is used.
//!
//! Matching is textual. Every indexed text file is searched for the name
//! bounded by non-identifier characters, so occurrences inside strings and
//! comments count, and same-named symbols in unrelated scopes are merged.
//! Lines that look like declarations (per-language keyword patterns) are
//! flagged as definitions; a declaration-shaped line inside a string
//! literal is misclassified the same way.

use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::extract::{Extractor, Registry};
use crate::index::Index;

/// One line mentioning the symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub path: String,
    pub line: usize,
    /// The line's text, trimmed.
    pub content: String,
    pub is_definition: bool,
}

/// Result of a reference lookup.
#[derive(Debug, Clone, Serialize)]
pub struct RefsResult {
    pub symbol: String,
    pub definition: Option<Reference>,
    pub references: Vec<Reference>,
    /// Reference count before truncation.
    pub total: usize,
    pub truncated: bool,
}

/// Find the definition of `symbol` and every line referencing it.
///
/// `max` caps the reference list; 0 means no cap.
pub fn find_refs(index: &Index, registry: &Registry, symbol: &str, max: usize) -> Result<RefsResult> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(Error::EmptyQuery);
    }

    let word = word_regex(symbol)?;
    let patterns = DefinitionPatterns::new(symbol)?;

    let authoritative = index
        .symbols()
        .find(|e| e.name == symbol)
        .map(|e| (e.path.clone(), e.line));

    let files: Vec<&str> = index.files().map(|e| e.path.as_str()).collect();
    let per_file: Vec<Vec<Reference>> = files
        .par_iter()
        .map(|path| {
            let Some(content) = index.read_text(path) else {
                return Vec::new();
            };
            let extractor = registry.for_path(path);
            occurrences(&content, symbol, &word)
                .map(|(line, text)| Reference {
                    path: path.to_string(),
                    line,
                    content: text.trim().to_string(),
                    is_definition: patterns.matches(extractor, text),
                })
                .collect()
        })
        .collect();

    let mut definition = None;
    let mut references = Vec::new();
    for mut reference in per_file.into_iter().flatten() {
        match &authoritative {
            Some((path, line)) if reference.path == *path && reference.line == *line => {
                reference.is_definition = true;
                definition = Some(reference);
            }
            None if reference.is_definition && definition.is_none() => {
                definition = Some(reference);
            }
            _ => references.push(reference),
        }
    }

    // The indexed line may have drifted from the file; keep the location anyway.
    if definition.is_none() {
        if let Some((path, line)) = authoritative {
            definition = Some(Reference {
                path,
                line,
                content: String::new(),
                is_definition: true,
            });
        }
    }

    let total = references.len();
    let truncated = max > 0 && total > max;
    if truncated {
        references.truncate(max);
    }

    tracing::debug!(symbol, total, "resolved references");
    Ok(RefsResult {
        symbol: symbol.to_string(),
        definition,
        references,
        total,
        truncated,
    })
}

/// Regex matching `name` bounded by non-identifier characters.
pub(crate) fn word_regex(name: &str) -> Result<Regex> {
    let pattern = format!(
        r"(?:^|[^A-Za-z0-9_$]){}(?:[^A-Za-z0-9_$]|$)",
        regex::escape(name)
    );
    Regex::new(&pattern).map_err(|source| Error::InvalidPattern {
        pattern: name.to_string(),
        source,
    })
}

/// Lines (1-indexed) of `content` containing `name` as a whole word.
pub(crate) fn occurrences<'c>(
    content: &'c str,
    name: &'c str,
    word: &'c Regex,
) -> impl Iterator<Item = (usize, &'c str)> + 'c {
    let candidate = content.contains(name);
    content
        .lines()
        .enumerate()
        .filter(move |(_, line)| candidate && line.contains(name) && word.is_match(line))
        .map(|(i, line)| (i + 1, line))
}

/// Declaration-shaped line patterns for one name.
pub(crate) struct DefinitionPatterns {
    go: Regex,
    script: Regex,
    python: Regex,
}

impl DefinitionPatterns {
    pub fn new(name: &str) -> Result<Self> {
        let n = regex::escape(name);
        let build = |pattern: String| {
            Regex::new(&pattern).map_err(|source| Error::InvalidPattern {
                pattern: name.to_string(),
                source,
            })
        };
        Ok(Self {
            go: build(format!(
                r"^\s*(?:func\s+(?:\([^)]*\)\s*)?{n}\s*[\[(]|type\s+{n}\b|(?:const|var)\s+{n}\b)"
            ))?,
            script: build(format!(
                r"^\s*(?:export\s+)?(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?(?:async\s+)?(?:function\s*\*?\s*{n}\b|class\s+{n}\b|interface\s+{n}\b|type\s+{n}\b|(?:const\s+)?enum\s+{n}\b|(?:const|let|var)\s+{n}\s*[=:;])"
            ))?,
            python: build(format!(
                r"^\s*(?:(?:async\s+)?def\s+{n}\s*\(|class\s+{n}\b|{n}\s*(?::[^=]+)?=[^=])"
            ))?,
        })
    }

    /// Whether `line` declares the name, for the given file's language.
    pub fn matches(&self, extractor: Option<Extractor>, line: &str) -> bool {
        match extractor {
            Some(Extractor::Go) => self.go.is_match(line),
            Some(Extractor::Script) => self.script.is_match(line),
            Some(Extractor::Python) => self.python.is_match(line),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn index_of(files: &[(&str, &str)]) -> (TempDir, Index) {
        let temp = TempDir::new().unwrap();
        for (path, content) in files {
            let full = temp.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        let index = Index::scan::<&str>(temp.path(), &Registry::new(), &[]).unwrap();
        (temp, index)
    }

    #[test]
    fn test_definition_and_references() {
        let (_temp, index) = index_of(&[
            ("lib.py", "def helper(x):\n    return x\n\n\nHELPER_NAME = 'helper'\n"),
            ("app.py", "from lib import helper\n\nprint(helper(1))\nhelpers = []\n"),
        ]);

        let result = find_refs(&index, &Registry::new(), "helper", 0).unwrap();
        let def = result.definition.unwrap();
        assert_eq!((def.path.as_str(), def.line), ("lib.py", 1));
        assert!(def.is_definition);

        let locations: Vec<(&str, usize)> = result.references.iter().map(|r| (r.path.as_str(), r.line)).collect();
        // String contents count; `helpers` and `HELPER_NAME` do not.
        assert_eq!(locations, vec![("app.py", 1), ("app.py", 3), ("lib.py", 5)]);
        assert_eq!(result.total, 3);
        assert!(!result.truncated);
    }

    #[test]
    fn test_definition_line_never_in_references() {
        let (_temp, index) = index_of(&[
            ("a.ts", "export function run() { return run; }\nrun();\n"),
        ]);
        let result = find_refs(&index, &Registry::new(), "run", 0).unwrap();
        let def = result.definition.unwrap();
        assert!(!result
            .references
            .iter()
            .any(|r| r.path == def.path && r.line == def.line));
        assert_eq!(result.references.len(), 1);
    }

    #[test]
    fn test_truncation() {
        let body: String = (0..10).map(|i| format!("total = count + {}\n", i)).collect();
        let content = format!("count = 0\n{}", body);
        let (_temp, index) = index_of(&[("calc.py", content.as_str())]);

        let result = find_refs(&index, &Registry::new(), "count", 3).unwrap();
        assert_eq!(result.references.len(), 3);
        assert_eq!(result.total, 10);
        assert!(result.truncated);
    }

    #[test]
    fn test_unknown_symbol_is_empty() {
        let (_temp, index) = index_of(&[("a.py", "x = 1\n")]);
        let result = find_refs(&index, &Registry::new(), "Nowhere", 0).unwrap();
        assert!(result.definition.is_none());
        assert!(result.references.is_empty());
    }

    #[test]
    fn test_heuristic_definition_without_index_entry() {
        // Nested functions are not indexed, but the declaration line is recognized.
        let (_temp, index) = index_of(&[(
            "a.py",
            "def outer():\n    def inner():\n        pass\n    return inner()\n",
        )]);
        let result = find_refs(&index, &Registry::new(), "inner", 0).unwrap();
        let def = result.definition.unwrap();
        assert_eq!(def.line, 2);
        assert_eq!(result.references.len(), 1);
        assert_eq!(result.references[0].line, 4);
    }

    #[test]
    fn test_empty_symbol() {
        let (_temp, index) = index_of(&[("a.py", "x = 1\n")]);
        assert!(matches!(
            find_refs(&index, &Registry::new(), " ", 0),
            Err(Error::EmptyQuery)
        ));
    }

    #[test]
    fn test_word_boundaries() {
        let re = word_regex("Run").unwrap();
        assert!(re.is_match("Run()"));
        assert!(re.is_match("s.Run(ctx)"));
        assert!(!re.is_match("RunAll()"));
        assert!(!re.is_match("doRun()"));
        assert!(!re.is_match("$Run"));
    }

    #[test]
    fn test_definition_patterns() {
        let p = DefinitionPatterns::new("Serve").unwrap();
        assert!(p.matches(Some(Extractor::Go), "func (s *Server) Serve() error {"));
        assert!(p.matches(Some(Extractor::Go), "func Serve(addr string) {"));
        assert!(!p.matches(Some(Extractor::Go), "\treturn Serve(addr)"));
        assert!(p.matches(Some(Extractor::Script), "export async function Serve() {"));
        assert!(p.matches(Some(Extractor::Script), "export const Serve = () => {"));
        assert!(!p.matches(Some(Extractor::Script), "Serve();"));
        assert!(p.matches(Some(Extractor::Python), "    def Serve(self):"));
        assert!(!p.matches(Some(Extractor::Python), "if Serve == 1:"));
        assert!(!p.matches(None, "func Serve() {"));
    }
}
