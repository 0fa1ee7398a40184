//! Core graph data structure.
//!
//! The EntityGraph wraps petgraph and adds an id index for fast lookups.
//! Node and edge insertion order is preserved, which is what makes exported
//! snapshots byte-stable across runs.

use entigraph_core::{EntityEdge, EntityId, EntityNode};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

/// Unique identifier for a node in the graph.
pub type NodeId = NodeIndex;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Two files produced the same entity id.
    #[error("duplicate entity id: {0}")]
    DuplicateId(EntityId),

    /// An edge points at an id that is not in the graph.
    #[error("unknown entity: {0}")]
    UnknownEntity(EntityId),
}

/// The serialized snapshot: every node and every edge, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<EntityNode>,
    #[serde(default)]
    pub edges: Vec<EntityEdge>,
}

/// The entity relationship graph.
#[derive(Debug, Default, Clone)]
pub struct EntityGraph {
    /// The underlying petgraph graph. Edge weights are relationship types.
    graph: DiGraph<EntityNode, String>,

    /// Maps entity ids to graph node indexes.
    id_index: HashMap<EntityId, NodeId>,
}

impl EntityGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a graph from a snapshot.
    pub fn from_data(data: GraphData) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for node in data.nodes {
            graph.add_node(node)?;
        }
        for edge in data.edges {
            let from = graph
                .get_index(&edge.from_id)
                .ok_or_else(|| GraphError::UnknownEntity(edge.from_id.clone()))?;
            let to = graph
                .get_index(&edge.to_id)
                .ok_or_else(|| GraphError::UnknownEntity(edge.to_id.clone()))?;
            graph.add_edge(from, to, edge.relationship_type);
        }
        Ok(graph)
    }

    /// Adds an entity node. Ids must be unique.
    pub fn add_node(&mut self, node: EntityNode) -> Result<NodeId, GraphError> {
        if self.id_index.contains_key(&node.id) {
            return Err(GraphError::DuplicateId(node.id));
        }
        let id = node.id.clone();
        let index = self.graph.add_node(node);
        self.id_index.insert(id, index);
        Ok(index)
    }

    /// Adds an edge between two nodes.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, relationship: impl Into<String>) {
        self.graph.add_edge(from, to, relationship.into());
    }

    /// Gets a node's index by entity id.
    pub fn get_index(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    /// Gets a node by entity id.
    pub fn get_by_id(&self, id: &str) -> Option<&EntityNode> {
        self.get(self.get_index(id)?)
    }

    /// Gets a node by its graph index.
    pub fn get(&self, index: NodeId) -> Option<&EntityNode> {
        self.graph.node_weight(index)
    }

    /// All entity ids, used to validate references.
    pub fn entity_ids(&self) -> HashSet<EntityId> {
        self.id_index.keys().cloned().collect()
    }

    /// Entities that `id` references, sorted by id.
    pub fn references(&self, id: &str) -> Vec<&EntityNode> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Entities that reference `id`, sorted by id.
    pub fn backlinks(&self, id: &str) -> Vec<&EntityNode> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<&EntityNode> {
        let Some(index) = self.get_index(id) else {
            return Vec::new();
        };
        let mut nodes: Vec<&EntityNode> = self
            .graph
            .neighbors_directed(index, direction)
            .filter_map(|idx| self.graph.node_weight(idx))
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes.dedup_by(|a, b| a.id == b.id);
        nodes
    }

    /// Searches ids and labels, case-insensitively, in node order.
    pub fn search(&self, query: &str) -> Vec<&EntityNode> {
        let query_lower = query.to_lowercase();
        self.graph
            .node_weights()
            .filter(|node| {
                node.id.to_lowercase().contains(&query_lower)
                    || node.label.to_lowercase().contains(&query_lower)
            })
            .collect()
    }

    /// Number of nodes per entity type.
    pub fn type_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for node in self.graph.node_weights() {
            *counts.entry(node.entity_type.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterates over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &EntityNode> {
        self.graph.node_weights()
    }

    /// Returns all edges with source and target ids, in insertion order.
    pub fn export_edges(&self) -> Vec<EntityEdge> {
        self.graph
            .edge_references()
            .filter_map(|edge_ref| {
                let source = self.graph.node_weight(edge_ref.source())?;
                let target = self.graph.node_weight(edge_ref.target())?;
                Some(EntityEdge {
                    from_id: source.id.clone(),
                    to_id: target.id.clone(),
                    relationship_type: edge_ref.weight().clone(),
                })
            })
            .collect()
    }

    /// Exports the whole graph as a snapshot document.
    pub fn to_data(&self) -> GraphData {
        GraphData {
            nodes: self.nodes().cloned().collect(),
            edges: self.export_edges(),
        }
    }
}
