//! The persisted entry record.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::extract::{Symbol, SymbolKind};

/// Kind of an indexed entry: a file, or one of the symbol kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Func,
    Method,
    Type,
    Class,
    Interface,
    Const,
    Var,
    Enum,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Func => "func",
            EntryKind::Method => "method",
            EntryKind::Type => "type",
            EntryKind::Class => "class",
            EntryKind::Interface => "interface",
            EntryKind::Const => "const",
            EntryKind::Var => "var",
            EntryKind::Enum => "enum",
        }
    }

    /// The symbol kind, or `None` for files.
    pub fn symbol_kind(&self) -> Option<SymbolKind> {
        match self {
            EntryKind::File => None,
            EntryKind::Func => Some(SymbolKind::Func),
            EntryKind::Method => Some(SymbolKind::Method),
            EntryKind::Type => Some(SymbolKind::Type),
            EntryKind::Class => Some(SymbolKind::Class),
            EntryKind::Interface => Some(SymbolKind::Interface),
            EntryKind::Const => Some(SymbolKind::Const),
            EntryKind::Var => Some(SymbolKind::Var),
            EntryKind::Enum => Some(SymbolKind::Enum),
        }
    }
}

impl From<SymbolKind> for EntryKind {
    fn from(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Func => EntryKind::Func,
            SymbolKind::Method => EntryKind::Method,
            SymbolKind::Type => EntryKind::Type,
            SymbolKind::Class => EntryKind::Class,
            SymbolKind::Interface => EntryKind::Interface,
            SymbolKind::Const => EntryKind::Const,
            SymbolKind::Var => EntryKind::Var,
            SymbolKind::Enum => EntryKind::Enum,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("file") {
            return Ok(EntryKind::File);
        }
        s.parse::<SymbolKind>().map(EntryKind::from)
    }
}

/// One indexed file or symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
    /// Root-relative path with `/` separators.
    pub path: String,
    /// 1-indexed declaration line; 0 for files.
    pub line: usize,
    /// Containing directory, `.` at the root.
    pub package: String,
    pub exported: bool,
}

impl Entry {
    /// File entry for a root-relative path.
    pub fn file(path: &str) -> Self {
        let (package, name) = match path.rsplit_once('/') {
            Some((dir, base)) => (dir.to_string(), base.to_string()),
            None => (".".to_string(), path.to_string()),
        };
        Self {
            name,
            kind: EntryKind::File,
            path: path.to_string(),
            line: 0,
            package,
            exported: true,
        }
    }

    /// Symbol entry inheriting path and package from its file entry.
    pub fn symbol(file: &Entry, symbol: &Symbol) -> Self {
        Self {
            name: symbol.name.clone(),
            kind: symbol.kind.into(),
            path: file.path.clone(),
            line: symbol.line.max(1),
            package: file.package.clone(),
            exported: symbol.exported,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Name with any file extension removed.
    pub fn stem(&self) -> &str {
        if self.is_file() {
            match self.name.rsplit_once('.') {
                Some((stem, _)) if !stem.is_empty() => stem,
                _ => &self.name,
            }
        } else {
            &self.name
        }
    }

    /// `path:line` for symbols, `path` for files.
    pub fn location(&self) -> String {
        if self.is_file() {
            self.path.clone()
        } else {
            format!("{}:{}", self.path, self.line)
        }
    }
}
