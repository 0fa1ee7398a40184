//! Generation settings.
//!
//! Settings live in `.entigraph/config.json` next to the entity repository:
//!
//! ```json
//! {
//!   "root": "memory",
//!   "output": "data/entities.json",
//!   "summary_overrides": {
//!     "people/izzy": { "core_idea": "..." }
//!   }
//! }
//! ```
//!
//! Relative paths are resolved against the project directory that contains
//! `.entigraph/`. Every field is optional.

use crate::summary::SummaryOverrides;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory holding the config file, relative to the project.
pub const CONFIG_DIR: &str = ".entigraph";

/// Name of the config file inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.json";

/// Default entity root, relative to the project.
pub const DEFAULT_ROOT: &str = "memory";

/// Default snapshot location, relative to the project.
pub const DEFAULT_OUTPUT: &str = "data/entities.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything one generation run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Directory containing the category subdirectories.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Where the JSON snapshot is written.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Curated summaries keyed by entity id.
    #[serde(default, skip_serializing_if = "SummaryOverrides::is_empty")]
    pub summary_overrides: SummaryOverrides,
}

fn default_root() -> PathBuf {
    PathBuf::from(DEFAULT_ROOT)
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            output: default_output(),
            summary_overrides: SummaryOverrides::default(),
        }
    }
}

impl GraphConfig {
    /// Creates a config with explicit paths and no overrides.
    pub fn new(root: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            output: output.into(),
            summary_overrides: SummaryOverrides::default(),
        }
    }

    /// Sets the summary overrides.
    pub fn with_overrides(mut self, overrides: SummaryOverrides) -> Self {
        self.summary_overrides = overrides;
        self
    }

    /// Path of the config file for a project directory.
    pub fn path_in(project: &Path) -> PathBuf {
        project.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Loads a config file. Relative paths inside it are resolved against
    /// `project`.
    pub fn load(path: &Path, project: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.resolved_against(project))
    }

    /// Loads `<project>/.entigraph/config.json`, falling back to defaults when
    /// the file does not exist.
    pub fn load_from_project(project: &Path) -> Result<Self, ConfigError> {
        let path = Self::path_in(project);
        if path.is_file() {
            Self::load(&path, project)
        } else {
            Ok(Self::default().resolved_against(project))
        }
    }

    /// Writes this config as pretty JSON, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(io_err)
    }

    /// Makes relative `root` and `output` relative to `base`.
    pub fn resolved_against(mut self, base: &Path) -> Self {
        if self.root.is_relative() {
            self.root = base.join(&self.root);
        }
        if self.output.is_relative() {
            self.output = base.join(&self.output);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::EntitySummary;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = tempdir().unwrap();
        let config = GraphConfig::load_from_project(dir.path()).unwrap();

        assert_eq!(config.root, dir.path().join(DEFAULT_ROOT));
        assert_eq!(config.output, dir.path().join(DEFAULT_OUTPUT));
        assert!(config.summary_overrides.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let mut overrides = SummaryOverrides::new();
        overrides.insert(
            "people/izzy",
            EntitySummary {
                philosophy: Some("Fail fast".into()),
                ..Default::default()
            },
        );
        let config = GraphConfig::new("notes", "/abs/graph.json").with_overrides(overrides);

        let path = GraphConfig::path_in(dir.path());
        config.save(&path).unwrap();
        let loaded = GraphConfig::load(&path, dir.path()).unwrap();

        assert_eq!(loaded.root, dir.path().join("notes"));
        assert_eq!(loaded.output, PathBuf::from("/abs/graph.json"));
        assert_eq!(
            loaded
                .summary_overrides
                .get("people/izzy")
                .and_then(|s| s.philosophy.as_deref()),
            Some("Fail fast")
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = GraphConfig::path_in(dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"output": "out/graph.json"}"#).unwrap();

        let config = GraphConfig::load_from_project(dir.path()).unwrap();
        assert_eq!(config.root, dir.path().join(DEFAULT_ROOT));
        assert_eq!(config.output, dir.path().join("out/graph.json"));
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let dir = tempdir().unwrap();
        let path = GraphConfig::path_in(dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let err = GraphConfig::load_from_project(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
