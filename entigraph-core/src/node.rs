//! Entity nodes and the fixed category enumeration.
//!
//! An entity is one markdown file. Its id is `<category>/<stem>`, which is
//! also the string other entities use to reference it in prose.

use crate::error::{EntityError, Result};
use crate::summary::EntitySummary;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};

/// Entity identifier: `<category>/<stem>`.
pub type EntityId = String;

/// Type reported for files sitting directly in the root directory.
pub const ROOT_TYPE: &str = "root";

/// Colour used for entity types outside the known categories.
pub const FALLBACK_COLOR: &str = "#CCCCCC";

/// The fixed set of entity categories, one directory per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    People,
    Projects,
    Concepts,
    Patterns,
    Protocols,
    Organizations,
    AntiPatterns,
    Skills,
}

impl Category {
    /// All categories, in discovery order.
    pub const ALL: [Category; 8] = [
        Category::People,
        Category::Projects,
        Category::Concepts,
        Category::Patterns,
        Category::Protocols,
        Category::Organizations,
        Category::AntiPatterns,
        Category::Skills,
    ];

    /// Directory name of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::People => "people",
            Self::Projects => "projects",
            Self::Concepts => "concepts",
            Self::Patterns => "patterns",
            Self::Protocols => "protocols",
            Self::Organizations => "organizations",
            Self::AntiPatterns => "anti-patterns",
            Self::Skills => "skills",
        }
    }

    /// Looks up a category by its directory name.
    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Display colour for the visualizer.
    pub fn color(&self) -> &'static str {
        match self {
            Self::People => "#4A90E2",
            Self::Projects => "#7ED321",
            Self::Concepts => "#9013FE",
            Self::Patterns => "#F5A623",
            Self::Protocols => "#F8E71C",
            Self::Organizations => "#D0021B",
            Self::AntiPatterns => "#8B572A",
            Self::Skills => "#50E3C2",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returns the display colour for an entity type string.
pub fn type_color(entity_type: &str) -> &'static str {
    Category::from_dir_name(entity_type)
        .map(|c| c.color())
        .unwrap_or(FALLBACK_COLOR)
}

/// A single entity in the memory graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityNode {
    /// Unique id, e.g. `concepts/archaeological_engineering`.
    pub id: EntityId,

    /// Display name for the node.
    pub label: String,

    /// Entity type: the containing directory name.
    #[serde(rename = "type")]
    pub entity_type: String,

    /// Path of the markdown file as it was discovered.
    pub path: String,

    /// Structured summary, when any section could be mapped.
    pub summary: Option<EntitySummary>,
}

impl EntityNode {
    /// Creates a node without a summary.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        entity_type: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            entity_type: entity_type.into(),
            path: path.into(),
            summary: None,
        }
    }

    /// Sets the summary.
    pub fn with_summary(mut self, summary: Option<EntitySummary>) -> Self {
        self.summary = summary;
        self
    }

    /// Display colour for the visualizer.
    pub fn color(&self) -> &'static str {
        type_color(&self.entity_type)
    }
}

/// Computes the entity id of `path` relative to `root`.
///
/// The extension is stripped and components are joined with `/` on every
/// platform, so `root/concepts/foo.md` becomes `concepts/foo`.
pub fn entity_id(path: &Path, root: &Path) -> Result<EntityId> {
    let segments = relative_segments(path, root)?;
    Ok(segments.join("/"))
}

/// Splits `path` relative to `root` into its segments, the last one being the
/// file stem.
pub(crate) fn relative_segments(path: &Path, root: &Path) -> Result<Vec<String>> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| EntityError::OutsideRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })?;

    let stem = relative
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| EntityError::InvalidPath(path.to_path_buf()))?;

    let mut segments = Vec::new();
    if let Some(parent) = relative.parent() {
        for component in parent.components() {
            match component {
                Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return Err(EntityError::InvalidPath(path.to_path_buf())),
            }
        }
    }
    segments.push(stem.to_string());

    Ok(segments)
}
