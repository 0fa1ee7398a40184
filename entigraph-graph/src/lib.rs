//! Entigraph Graph - assembly and storage of the entity graph
//!
//! This crate takes the building blocks produced by `entigraph-core` and
//! turns them into a graph:
//!
//! - [`generate`] runs discovery, parsing and reference extraction and
//!   returns an in-memory [`EntityGraph`]
//! - [`regenerate`] does the same and writes the JSON snapshot
//! - [`GraphStore`] reads and writes that snapshot
//!
//! # Example
//!
//! ```no_run
//! use entigraph_core::GraphConfig;
//! use entigraph_graph::regenerate;
//!
//! let config = GraphConfig::new("memory", "data/entities.json");
//! let (graph, summary) = regenerate(&config).unwrap();
//!
//! println!("{} nodes, {} edges", summary.nodes, summary.edges);
//! let backlinks = graph.backlinks("concepts/fail_fast");
//! ```

mod builder;
mod graph;
mod pipeline;
mod query;
mod store;

pub use builder::GraphBuilder;
pub use graph::{EntityGraph, GraphData, GraphError, NodeId};
pub use pipeline::{generate, regenerate, GenerateResult, PipelineError, RegenerateSummary};
pub use query::NodeInfo;
pub use store::{GraphStore, StoreError};
