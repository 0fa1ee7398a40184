//! Graph builder for constructing the entity graph from parsed nodes.
//!
//! The builder mirrors the two passes of generation:
//! 1. Add every node, so the full id set is known
//! 2. Add extracted edges, keeping only those whose endpoints exist

use crate::graph::{EntityGraph, GraphError};
use entigraph_core::{EntityEdge, EntityId, EntityNode};
use std::collections::HashSet;
use tracing::debug;

/// Builds an EntityGraph from parsed nodes and extracted edges.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: EntityGraph,
}

impl GraphBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one parsed node. Fails if its id is already taken.
    pub fn add_node(&mut self, node: EntityNode) -> Result<(), GraphError> {
        self.graph.add_node(node).map(|_| ())
    }

    /// Ids of every node added so far.
    ///
    /// Call this once all nodes are in; it is the set references are
    /// validated against.
    pub fn entity_ids(&self) -> HashSet<EntityId> {
        self.graph.entity_ids()
    }

    /// Adds edges extracted from one file.
    ///
    /// Self loops and edges whose endpoints are not in the graph are dropped.
    /// Returns how many edges were kept.
    pub fn add_edges(&mut self, edges: Vec<EntityEdge>) -> usize {
        let mut added = 0;

        for edge in edges {
            let (Some(from), Some(to)) = (
                self.graph.get_index(&edge.from_id),
                self.graph.get_index(&edge.to_id),
            ) else {
                debug!("Dropping edge {} -> {}", edge.from_id, edge.to_id);
                continue;
            };
            if from == to {
                continue;
            }
            self.graph.add_edge(from, to, edge.relationship_type);
            added += 1;
        }

        added
    }

    /// Finishes building and returns the graph.
    pub fn build(self) -> EntityGraph {
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> EntityNode {
        EntityNode::new(id, id, "concepts", format!("{}.md", id))
    }

    #[test]
    fn test_builder_adds_nodes() {
        let mut builder = GraphBuilder::new();
        builder.add_node(node("concepts/foo")).unwrap();
        builder.add_node(node("concepts/bar")).unwrap();

        let graph = builder.build();
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_builder_rejects_duplicates() {
        let mut builder = GraphBuilder::new();
        builder.add_node(node("concepts/foo")).unwrap();

        assert!(builder.add_node(node("concepts/foo")).is_err());
    }

    #[test]
    fn test_builder_validates_edges() {
        let mut builder = GraphBuilder::new();
        builder.add_node(node("concepts/foo")).unwrap();
        builder.add_node(node("concepts/bar")).unwrap();

        let added = builder.add_edges(vec![
            EntityEdge::references("concepts/foo", "concepts/bar"),
            EntityEdge::references("concepts/foo", "concepts/foo"),
            EntityEdge::references("concepts/foo", "concepts/missing"),
        ]);

        assert_eq!(added, 1);
        assert_eq!(builder.build().edge_count(), 1);
    }

    #[test]
    fn test_parallel_edges_from_different_sources_are_kept() {
        let mut builder = GraphBuilder::new();
        for id in ["concepts/a", "concepts/b", "concepts/c"] {
            builder.add_node(node(id)).unwrap();
        }

        builder.add_edges(vec![EntityEdge::references("concepts/a", "concepts/c")]);
        builder.add_edges(vec![EntityEdge::references("concepts/b", "concepts/c")]);

        let graph = builder.build();
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.backlinks("concepts/c").len(), 2);
    }
}
