//! Entigraph Core - entity discovery and markdown extraction
//!
//! This crate turns a directory of markdown "entity" files into graph
//! building blocks. It knows nothing about graphs or storage; it only
//! answers three questions:
//!
//! - Which files are entities? ([`discover_entity_files`])
//! - What does each entity look like? ([`EntityParser`])
//! - Which other entities does it mention? ([`CrossReferenceExtractor`])
//!
//! # Example
//!
//! ```no_run
//! use entigraph_core::{discover_entity_files, EntityParser};
//! use std::path::Path;
//!
//! let root = Path::new("memory");
//! let parser = EntityParser::new();
//!
//! for file in discover_entity_files(root).unwrap() {
//!     let node = parser.parse_file(&file, root).unwrap();
//!     println!("{} -> {}", node.id, node.label);
//! }
//! ```

pub mod config;
pub mod error;
pub mod node;
pub mod parser;
pub mod scanner;
pub mod summary;
pub mod xref;

pub use config::{ConfigError, GraphConfig};
pub use error::{EntityError, Result};
pub use node::{entity_id, type_color, Category, EntityId, EntityNode};
pub use parser::{EntityParser, Section};
pub use scanner::{discover_entity_files, ENTITY_EXTENSION};
pub use summary::{EntitySummary, KeywordTable, SummaryField, SummaryOverrides};
pub use xref::{CrossReferenceExtractor, EntityEdge, REFERENCES};
