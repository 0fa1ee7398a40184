//! Query result types shared by the server and the CLI.

use entigraph_core::EntityNode;
use serde::{Deserialize, Serialize};

/// Compact node description for search results and listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub color: String,
    pub path: String,
    pub has_summary: bool,
}

impl From<&EntityNode> for NodeInfo {
    fn from(node: &EntityNode) -> Self {
        Self {
            id: node.id.clone(),
            label: node.label.clone(),
            entity_type: node.entity_type.clone(),
            color: node.color().to_string(),
            path: node.path.clone(),
            has_summary: node.summary.is_some(),
        }
    }
}
