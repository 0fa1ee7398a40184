//! Cross-reference extraction.
//!
//! References are purely lexical: any `<category>/<token>` text that happens to
//! equal an existing entity id becomes an edge, whether it sits in a link, a
//! code span or plain prose. Everything else is ignored without warning.

use crate::error::{EntityError, Result};
use crate::node::{Category, EntityId};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

/// Relationship type carried by every extracted edge.
pub const REFERENCES: &str = "references";

fn default_relationship() -> String {
    REFERENCES.to_string()
}

/// A directed relationship between two entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityEdge {
    /// Source entity id.
    pub from_id: EntityId,
    /// Target entity id.
    pub to_id: EntityId,
    /// Type of relationship.
    #[serde(default = "default_relationship")]
    pub relationship_type: String,
}

impl EntityEdge {
    /// Creates a `references` edge.
    pub fn references(from_id: impl Into<EntityId>, to_id: impl Into<EntityId>) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            relationship_type: default_relationship(),
        }
    }
}

/// Finds mentions of other entities in raw markdown.
#[derive(Debug, Clone)]
pub struct CrossReferenceExtractor {
    pattern: Regex,
}

impl CrossReferenceExtractor {
    /// Compiles the reference pattern for every known category.
    pub fn new() -> Result<Self> {
        Self::for_categories(&Category::ALL)
    }

    /// Compiles the reference pattern for a subset of categories.
    pub fn for_categories(categories: &[Category]) -> Result<Self> {
        let alternatives = categories
            .iter()
            .map(|c| regex::escape(c.as_str()))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"\b(?:{})/[\w-]+\b", alternatives))?;
        Ok(Self { pattern })
    }

    /// Every distinct id-shaped string in `content`, sorted.
    pub fn mentions<'a>(&self, content: &'a str) -> BTreeSet<&'a str> {
        self.pattern
            .find_iter(content)
            .map(|m| m.as_str())
            .collect()
    }

    /// Builds edges from `entity_id` to every valid entity it mentions.
    ///
    /// Repeated mentions collapse to one edge, self references and unknown
    /// ids are dropped. Edges come out sorted by target id.
    pub fn extract(
        &self,
        content: &str,
        entity_id: &str,
        valid_ids: &HashSet<EntityId>,
    ) -> Vec<EntityEdge> {
        self.mentions(content)
            .into_iter()
            .filter(|m| *m != entity_id && valid_ids.contains(*m))
            .map(|m| EntityEdge::references(entity_id, m))
            .collect()
    }

    /// Reads `path` and extracts its edges.
    pub fn extract_file(
        &self,
        path: &Path,
        entity_id: &str,
        valid_ids: &HashSet<EntityId>,
    ) -> Result<Vec<EntityEdge>> {
        let content = fs::read_to_string(path).map_err(|e| EntityError::io(path, e))?;
        Ok(self.extract(&content, entity_id, valid_ids))
    }
}
