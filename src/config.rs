//! Project configuration for codenav.
//!
//! An optional YAML file at the project root tunes ignore patterns and the
//! default limits of each query. Command-line flags take precedence.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::index::IgnoreRules;

/// Config file names looked up at the project root, in order.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &[".codenav.yaml", "codenav.yaml"];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct Config {
    /// Extra ignore patterns, same syntax as `.codenavignore`.
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub refs: RefsConfig,
    #[serde(default)]
    pub impact: ImpactConfig,
    #[serde(default)]
    pub dead_code: DeadCodeConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SearchConfig {
    /// Maximum matches returned by `find` (default: 20)
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RefsConfig {
    /// Maximum references listed (default: 100)
    #[serde(default = "default_refs_max")]
    pub max_results: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ImpactConfig {
    /// Layers expanded beyond the target (default: 3)
    #[serde(default = "default_impact_depth")]
    pub max_depth: usize,
    /// Items listed per layer (default: 50)
    #[serde(default = "default_impact_max")]
    pub max_results: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DeadCodeConfig {
    /// Maximum candidates listed (default: 100)
    #[serde(default = "default_dead_max")]
    pub max_results: usize,
    /// Names never reported, in addition to the built-in entry points.
    #[serde(default)]
    pub entry_points: Vec<String>,
}

fn default_search_limit() -> usize {
    20
}

fn default_refs_max() -> usize {
    100
}

fn default_impact_depth() -> usize {
    3
}

fn default_impact_max() -> usize {
    50
}

fn default_dead_max() -> usize {
    100
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: default_search_limit(),
        }
    }
}

impl Default for RefsConfig {
    fn default() -> Self {
        Self {
            max_results: default_refs_max(),
        }
    }
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            max_depth: default_impact_depth(),
            max_results: default_impact_max(),
        }
    }
}

impl Default for DeadCodeConfig {
    fn default() -> Self {
        Self {
            max_results: default_dead_max(),
            entry_points: Vec::new(),
        }
    }
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::parse_str(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parse a config from YAML text. An empty document yields the defaults.
    pub fn parse_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config found at `root`, or the defaults if there is none.
    pub fn load(root: &Path) -> Result<Self> {
        match discover(root) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::parse_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Check limits and ignore patterns.
    pub fn validate(&self) -> Result<()> {
        let limits = [
            ("search.limit", self.search.limit),
            ("refs.max_results", self.refs.max_results),
            ("impact.max_depth", self.impact.max_depth),
            ("impact.max_results", self.impact.max_results),
            ("dead_code.max_results", self.dead_code.max_results),
        ];
        for (key, value) in limits {
            if value == 0 {
                return Err(Error::Config(format!("{} must be greater than 0", key)));
            }
        }

        IgnoreRules::new(&self.ignore).map_err(|e| Error::Config(e.to_string()))?;

        if let Some(bad) = self.dead_code.entry_points.iter().find(|n| n.trim().is_empty()) {
            return Err(Error::Config(format!("invalid entry point name {:?}", bad)));
        }
        Ok(())
    }
}

/// Find a config file at the project root.
pub fn discover(root: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
ignore: ["generated/", "*.pb.go"]
search:
  limit: 5
impact:
  max_depth: 4
dead_code:
  entry_points: ["Handler"]
"#;
        let config = Config::parse_str(yaml).unwrap();
        assert_eq!(config.ignore, vec!["generated/", "*.pb.go"]);
        assert_eq!(config.search.limit, 5);
        assert_eq!(config.impact.max_depth, 4);
        // Unset fields keep their defaults.
        assert_eq!(config.impact.max_results, 50);
        assert_eq!(config.refs.max_results, 100);
        assert_eq!(config.dead_code.entry_points, vec!["Handler"]);
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::parse_str("\n").unwrap(), Config::default());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let err = Config::parse_str("refs:\n  max_results: 0\n").unwrap_err();
        assert!(
            err.to_string().contains("refs.max_results"),
            "Expected refs.max_results in error, got {:?}",
            err
        );
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        let err = Config::parse_str("search: [unclosed").unwrap_err();
        assert!(matches!(err, Error::Config(_)), "Expected Config error, got {:?}", err);
    }

    #[test]
    fn test_invalid_ignore_pattern_rejected() {
        let err = Config::parse_str("ignore: [\"src/[\"]\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)), "Expected Config error, got {:?}", err);
    }

    #[test]
    fn test_discover() {
        let temp = TempDir::new().unwrap();
        assert!(discover(temp.path()).is_none());
        assert_eq!(Config::load(temp.path()).unwrap(), Config::default());

        fs::write(temp.path().join("codenav.yaml"), "search:\n  limit: 3\n").unwrap();
        assert_eq!(discover(temp.path()), Some(temp.path().join("codenav.yaml")));

        fs::write(temp.path().join(".codenav.yaml"), "search:\n  limit: 7\n").unwrap();
        assert_eq!(Config::load(temp.path()).unwrap().search.limit, 7);
    }
}
