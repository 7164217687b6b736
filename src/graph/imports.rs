//! Import extraction and resolution to indexed files.
//!
//! Extraction is regex based and returns raw specifiers. Resolution maps a
//! specifier to the indexed files it names; anything that does not resolve
//! (standard library, third-party packages) is dropped.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::extract::{Extractor, Registry};
use crate::index::Index;

lazy_static! {
    static ref GO_SINGLE_RE: Regex = Regex::new(r#"(?m)^import\s+(?:[\w.]+\s+)?"([^"]+)""#).unwrap();
    static ref GO_BLOCK_RE: Regex = Regex::new(r#"(?ms)^import\s*\((.*?)\)"#).unwrap();
    static ref GO_BLOCK_ITEM_RE: Regex = Regex::new(r#"(?m)^\s*(?:[\w.]+\s+)?"([^"]+)""#).unwrap();
    static ref GO_MODULE_RE: Regex = Regex::new(r"(?m)^module\s+(\S+)").unwrap();

    static ref JS_FROM_RE: Regex = Regex::new(r#"^\s*(?:import|export|\}).*?\bfrom\s*['"]([^'"]+)['"]"#).unwrap();
    static ref JS_SIDE_EFFECT_RE: Regex = Regex::new(r#"^\s*import\s*['"]([^'"]+)['"]"#).unwrap();
    static ref JS_CALL_RE: Regex = Regex::new(r#"\b(?:require|import)\s*\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap();

    static ref PY_IMPORT_RE: Regex = Regex::new(r"^\s*import\s+(.+)$").unwrap();
    static ref PY_FROM_RE: Regex = Regex::new(r"^\s*from\s+(\.*[\w.]*)\s+import\s+(.+)$").unwrap();
}

const SCRIPT_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Raw import specifiers in one file, in order of first appearance.
pub fn extract_imports(extractor: Extractor, content: &str) -> Vec<String> {
    let specs = match extractor {
        Extractor::Go => extract_go_imports(content),
        Extractor::Script => extract_script_imports(content),
        Extractor::Python => extract_python_imports(content),
    };
    let mut seen = HashSet::new();
    specs.into_iter().filter(|s| seen.insert(s.clone())).collect()
}

fn extract_go_imports(content: &str) -> Vec<String> {
    let mut specs = Vec::new();
    for caps in GO_SINGLE_RE.captures_iter(content) {
        specs.push(caps[1].to_string());
    }
    for block in GO_BLOCK_RE.captures_iter(content) {
        for caps in GO_BLOCK_ITEM_RE.captures_iter(&block[1]) {
            specs.push(caps[1].to_string());
        }
    }
    specs
}

fn extract_script_imports(content: &str) -> Vec<String> {
    let mut specs = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*') {
            continue;
        }
        if let Some(caps) = JS_FROM_RE.captures(line) {
            specs.push(caps[1].to_string());
        } else if let Some(caps) = JS_SIDE_EFFECT_RE.captures(line) {
            specs.push(caps[1].to_string());
        }
        for caps in JS_CALL_RE.captures_iter(line) {
            specs.push(caps[1].to_string());
        }
    }
    specs
}

/// Python specifiers are dotted module paths. `from m import a` yields both
/// `m` and `m.a`, since `a` may be a submodule.
fn extract_python_imports(content: &str) -> Vec<String> {
    let mut specs = Vec::new();
    for statement in python_statements(content) {
        let line = statement.as_str();
        if let Some(caps) = PY_FROM_RE.captures(line) {
            let module = &caps[1];
            specs.push(module.to_string());
            for name in import_names(&caps[2]) {
                if name == "*" {
                    continue;
                }
                if module.ends_with('.') {
                    specs.push(format!("{}{}", module, name));
                } else {
                    specs.push(format!("{}.{}", module, name));
                }
            }
        } else if let Some(caps) = PY_IMPORT_RE.captures(line) {
            specs.extend(import_names(&caps[1]));
        }
    }
    specs
}

/// Logical lines without comments: backslash continuations are joined, and
/// an import whose name list opens `(` runs until the matching `)`.
fn python_statements(content: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    for raw in content.lines() {
        let line = raw.split('#').next().unwrap_or("").trim_end();
        if current.is_empty() {
            current.push_str(line);
        } else {
            current.push(' ');
            current.push_str(line.trim_start());
        }

        if current.ends_with('\\') {
            current.pop();
            continue;
        }
        let head = current.trim_start();
        let is_import = head.starts_with("from ") || head.starts_with("import ");
        if is_import && current.matches('(').count() > current.matches(')').count() {
            continue;
        }
        statements.push(std::mem::take(&mut current));
    }
    if !current.is_empty() {
        statements.push(current);
    }
    statements
}

/// `a as b, (c, d)` → `[a, c, d]`.
fn import_names(list: &str) -> Vec<String> {
    list.split(',')
        .filter_map(|item| {
            let item = item.trim().trim_matches(|c| c == '(' || c == ')' || c == '\\').trim();
            let name = item.split_whitespace().next()?;
            Some(name.to_string())
        })
        .collect()
}

/// Maps specifiers to indexed files.
pub(crate) struct Resolver<'a> {
    files: BTreeSet<&'a str>,
    /// `(module path, directory)` from each `go.mod`, longest module first.
    go_modules: Vec<(String, String)>,
    /// Non-test Go files per package directory.
    go_packages: BTreeMap<&'a str, Vec<&'a str>>,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a Index, registry: &Registry) -> Self {
        let files: BTreeSet<&str> = index.files().map(|e| e.path.as_str()).collect();

        let mut go_modules = Vec::new();
        for path in files.iter().filter(|p| p.rsplit('/').next() == Some("go.mod")) {
            let Some(content) = index.read_text(path) else { continue };
            if let Some(caps) = GO_MODULE_RE.captures(&content) {
                let dir = parent_dir(path).to_string();
                tracing::debug!(module = &caps[1], dir = %dir, "found go module");
                go_modules.push((caps[1].to_string(), dir));
            }
        }
        go_modules.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        let mut go_packages: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for entry in index.files() {
            if registry.for_path(&entry.path) == Some(Extractor::Go) && !entry.path.ends_with("_test.go") {
                go_packages.entry(entry.package.as_str()).or_default().push(entry.path.as_str());
            }
        }

        Self {
            files,
            go_modules,
            go_packages,
        }
    }

    /// Indexed files named by `spec`, imported from `from`.
    pub fn resolve(&self, from: &str, extractor: Extractor, spec: &str) -> Vec<String> {
        let targets = match extractor {
            Extractor::Go => self.resolve_go(spec),
            Extractor::Script => self.resolve_script(from, spec).into_iter().collect(),
            Extractor::Python => self.resolve_python(from, spec).into_iter().collect(),
        };
        targets.into_iter().filter(|t| *t != from).map(str::to_string).collect()
    }

    fn resolve_go(&self, spec: &str) -> Vec<&'a str> {
        for (module, dir) in &self.go_modules {
            let rest = if spec == module.as_str() {
                ""
            } else if let Some(rest) = spec.strip_prefix(module.as_str()).and_then(|r| r.strip_prefix('/')) {
                rest
            } else {
                continue;
            };
            return self.go_package(&join(dir, rest));
        }

        // Without a matching go.mod, accept a local directory that ends the
        // import path, for module-style paths only.
        let first = spec.split('/').next().unwrap_or("");
        if !first.contains('.') {
            return Vec::new();
        }
        self.go_packages
            .keys()
            .filter(|dir| **dir != "." && spec.ends_with(&format!("/{}", dir)))
            .max_by_key(|dir| dir.len())
            .map(|dir| self.go_package(dir))
            .unwrap_or_default()
    }

    fn go_package(&self, dir: &str) -> Vec<&'a str> {
        self.go_packages.get(dir).cloned().unwrap_or_default()
    }

    fn resolve_script(&self, from: &str, spec: &str) -> Option<&'a str> {
        if !spec.starts_with('.') {
            return None;
        }
        let joined = normalize(&join(parent_dir(from), spec))?;

        let mut candidates = vec![joined.clone()];
        if let Some((stem, ext)) = joined.rsplit_once('.') {
            let swapped: &[&str] = match ext {
                "js" => &["ts", "tsx"],
                "jsx" => &["tsx"],
                "mjs" => &["mts"],
                "cjs" => &["cts"],
                _ => &[],
            };
            candidates.extend(swapped.iter().map(|e| format!("{}.{}", stem, e)));
        }
        candidates.extend(SCRIPT_EXTENSIONS.iter().map(|e| format!("{}.{}", joined, e)));
        candidates.extend(SCRIPT_EXTENSIONS.iter().map(|e| format!("{}/index.{}", joined, e)));

        candidates.iter().find_map(|c| self.files.get(c.as_str()).copied())
    }

    fn resolve_python(&self, from: &str, spec: &str) -> Option<&'a str> {
        let level = spec.chars().take_while(|c| *c == '.').count();
        let module = &spec[level..];
        let module_path = module.replace('.', "/");

        let bases: Vec<String> = if level > 0 {
            let mut base = parent_dir(from).to_string();
            for _ in 1..level {
                base = normalize(&join(&base, ".."))?;
            }
            vec![base]
        } else {
            vec![".".to_string(), "src".to_string()]
        };

        for base in bases {
            let stem = join(&base, &module_path);
            let mut candidates = vec![join(&stem, "__init__.py"), join(&stem, "__init__.pyi")];
            if !module_path.is_empty() {
                candidates.insert(0, format!("{}.pyi", stem));
                candidates.insert(0, format!("{}.py", stem));
            }
            if let Some(found) = candidates.iter().find_map(|c| self.files.get(c.as_str()).copied()) {
                return Some(found);
            }
        }
        None
    }
}

/// Directory part of a root-relative path, `.` at the root.
fn parent_dir(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => ".",
    }
}

/// Join two relative paths, treating `.` and empty as the root.
fn join(dir: &str, rest: &str) -> String {
    let dir = if dir == "." { "" } else { dir };
    match (dir.is_empty(), rest.is_empty()) {
        (true, true) => ".".to_string(),
        (true, false) => rest.to_string(),
        (false, true) => dir.to_string(),
        (false, false) => format!("{}/{}", dir, rest),
    }
}

/// Collapse `.` and `..` segments; `None` if the path escapes the root.
fn normalize(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            _ => parts.push(part),
        }
    }
    Some(if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_imports() {
        let content = r#"package main

import "fmt"
import log "github.com/acme/app/internal/log"

import (
	"os"
	_ "github.com/lib/pq"
	// "commented/out"
	db "github.com/acme/app/internal/db"
)
"#;
        let specs = extract_imports(Extractor::Go, content);
        assert_eq!(
            specs,
            vec![
                "fmt",
                "github.com/acme/app/internal/log",
                "os",
                "github.com/lib/pq",
                "github.com/acme/app/internal/db",
            ]
        );
    }

    #[test]
    fn test_script_imports() {
        let content = r#"import express from 'express';
import { a, b } from "./util";
import './styles.css';
export * from '../shared/types';
// import { nope } from './commented';
import {
  c,
} from './multi';
const lazy = import('./lazy');
const fs = require('fs');
const message = "data from './not-an-import'";
"#;
        let specs = extract_imports(Extractor::Script, content);
        assert_eq!(
            specs,
            vec!["express", "./util", "./styles.css", "../shared/types", "./multi", "./lazy", "fs"]
        );
    }

    #[test]
    fn test_python_imports() {
        let content = r#"import os, sys
import app.models as models
from . import views
from ..core import config, helpers as h
from app.services import (
    billing,
)
from typing import *  # noqa
"#;
        let specs = extract_imports(Extractor::Python, content);
        assert_eq!(
            specs,
            vec![
                "os",
                "sys",
                "app.models",
                ".",
                ".views",
                "..core",
                "..core.config",
                "..core.helpers",
                "app.services",
                "app.services.billing",
                "typing",
            ]
        );
    }

    #[test]
    fn test_python_multiline_imports() {
        let content = "from app.services import (\n    billing,  # invoices\n    shipping as ship,\n)\nimport app.jobs, \\\n    app.tasks\nx = (1,\n     2)\nfrom app import util\n";
        let specs = extract_imports(Extractor::Python, content);
        assert_eq!(
            specs,
            vec![
                "app.services",
                "app.services.billing",
                "app.services.shipping",
                "app.jobs",
                "app.tasks",
                "app",
                "app.util",
            ]
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("web/./lib/../util").as_deref(), Some("web/util"));
        assert_eq!(normalize("a/..").as_deref(), Some("."));
        assert_eq!(normalize("../outside"), None);
        assert_eq!(join(".", "x.ts"), "x.ts");
        assert_eq!(parent_dir("main.go"), ".");
    }
}
