//! Entigraph Server - WebSocket server for the entity graph
//!
//! This crate exposes the generation pipeline to the visualizer and other
//! clients over JSON-RPC 2.0 on a WebSocket:
//!
//! - `graph.regenerate` re-runs the pipeline, writes the snapshot and reports counts
//! - `graph.info`, `graph.snapshot`, `node.get` and `search` read the current graph
//!
//! Regeneration requests are serialized, so concurrent callers never race on
//! the snapshot file. Readers keep seeing the previous graph until a run
//! completes successfully.

mod handlers;
mod protocol;
mod server;

pub use handlers::{FailureKind, RegenerateFailure, ServerState, SharedGraph, SharedState};
pub use protocol::{codes, NodeGetParams, Request, Response, RpcError, SearchParams};
pub use server::{process_message, EntigraphServer, ServerConfig, DEFAULT_ADDR};
