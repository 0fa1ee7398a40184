//! Request handlers for protocol methods.
//!
//! Each handler implements one method of the Entigraph protocol.

use crate::protocol::{codes, NodeGetParams, Response, SearchParams};
use chrono::{DateTime, Utc};
use entigraph_core::GraphConfig;
use entigraph_graph::{regenerate, EntityGraph, NodeInfo, PipelineError, RegenerateSummary};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

/// Shared graph state across connections.
pub type SharedGraph = Arc<RwLock<EntityGraph>>;

/// Everything the handlers need, shared by all connections.
#[derive(Debug)]
pub struct ServerState {
    /// The graph served to readers; replaced after each successful run.
    pub graph: SharedGraph,
    /// Where to read entities from and write the snapshot to.
    pub config: GraphConfig,
    /// Serializes regeneration so two runs never write the snapshot at once.
    regen_lock: Mutex<()>,
    last_generated: RwLock<Option<DateTime<Utc>>>,
}

impl ServerState {
    pub fn new(graph: SharedGraph, config: GraphConfig) -> Self {
        Self {
            graph,
            config,
            regen_lock: Mutex::new(()),
            last_generated: RwLock::new(None),
        }
    }

    /// Records that the current graph was just generated.
    pub async fn mark_generated(&self) {
        *self.last_generated.write().await = Some(Utc::now());
    }
}

pub type SharedState = Arc<ServerState>;

/// How a failed regeneration is reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Discovery, parsing or extraction stopped the run.
    PipelineAborted,
    /// Anything else: write failures, a crashed worker.
    Unexpected,
}

/// Payload attached to a failed `graph.regenerate` response.
#[derive(Debug, Clone, Serialize)]
pub struct RegenerateFailure {
    pub success: bool,
    pub error: String,
    pub kind: FailureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl RegenerateFailure {
    fn unexpected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            kind: FailureKind::Unexpected,
            stage: None,
            file: None,
        }
    }

    fn code(&self) -> i32 {
        match self.kind {
            FailureKind::PipelineAborted => codes::PIPELINE_ABORTED,
            FailureKind::Unexpected => codes::UNEXPECTED,
        }
    }
}

impl From<&PipelineError> for RegenerateFailure {
    fn from(err: &PipelineError) -> Self {
        Self {
            success: false,
            error: err.to_string(),
            kind: if err.is_aborted() {
                FailureKind::PipelineAborted
            } else {
                FailureKind::Unexpected
            },
            stage: Some(err.stage()),
            file: err.file().map(|p| p.display().to_string()),
        }
    }
}

/// Handles the graph.regenerate method.
pub async fn handle_regenerate(state: SharedState, id: Option<Value>) -> Response {
    let _guard = state.regen_lock.lock().await;
    let config = state.config.clone();

    info!("Regenerating graph from {}", config.root.display());

    let failure = match tokio::task::spawn_blocking(move || regenerate(&config)).await {
        Ok(Ok((graph, summary))) => {
            *state.graph.write().await = graph;
            state.mark_generated().await;
            return regenerate_success(id, &summary, Utc::now());
        }
        Ok(Err(e)) => {
            error!("Regeneration failed at {}: {}", e.stage(), e);
            RegenerateFailure::from(&e)
        }
        Err(e) => {
            error!("Regeneration worker failed: {}", e);
            RegenerateFailure::unexpected(e.to_string())
        }
    };

    Response::error_with_data(id, failure.code(), failure.error.clone(), failure)
}

fn regenerate_success(
    id: Option<Value>,
    summary: &RegenerateSummary,
    generated_at: DateTime<Utc>,
) -> Response {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct RegenerateResult {
        success: bool,
        nodes: usize,
        edges: usize,
        message: &'static str,
        output: String,
        duration_ms: u64,
        generated_at: DateTime<Utc>,
    }

    Response::success(
        id,
        RegenerateResult {
            success: true,
            nodes: summary.nodes,
            edges: summary.edges,
            message: "Graph data regenerated successfully",
            output: summary.output.display().to_string(),
            duration_ms: summary.duration_ms,
            generated_at,
        },
    )
}

/// Handles the graph.info method.
pub async fn handle_info(state: SharedState, id: Option<Value>) -> Response {
    let g = state.graph.read().await;
    let generated_at = *state.last_generated.read().await;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct InfoResult {
        node_count: usize,
        edge_count: usize,
        types: BTreeMap<String, usize>,
        generated_at: Option<DateTime<Utc>>,
        version: &'static str,
    }

    Response::success(
        id,
        InfoResult {
            node_count: g.node_count(),
            edge_count: g.edge_count(),
            types: g.type_counts(),
            generated_at,
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

/// Handles the graph.snapshot method.
pub async fn handle_snapshot(state: SharedState, id: Option<Value>) -> Response {
    let g = state.graph.read().await;
    Response::success(id, g.to_data())
}

/// Handles the search method.
pub async fn handle_search(state: SharedState, id: Option<Value>, params: SearchParams) -> Response {
    let start = Instant::now();
    let g = state.graph.read().await;

    debug!("Search: {}", params.query);

    let mut matches: Vec<_> = g
        .search(&params.query)
        .into_iter()
        .filter(|node| match params.entity_type {
            Some(ref t) => node.entity_type == *t,
            None => true,
        })
        .map(NodeInfo::from)
        .collect();

    let total = matches.len();
    matches.truncate(params.limit);

    Response::success(
        id,
        serde_json::json!({
            "nodes": matches,
            "total": total,
            "queryTime": start.elapsed().as_millis() as u64
        }),
    )
}

/// Handles the node.get method.
pub async fn handle_node_get(
    state: SharedState,
    id: Option<Value>,
    params: NodeGetParams,
) -> Response {
    let g = state.graph.read().await;

    match g.get_by_id(&params.id) {
        Some(node) => {
            let references: Vec<_> = g.references(&node.id).iter().map(|n| &n.id).collect();
            let backlinks: Vec<_> = g.backlinks(&node.id).iter().map(|n| &n.id).collect();

            Response::success(
                id,
                serde_json::json!({
                    "id": node.id,
                    "label": node.label,
                    "type": node.entity_type,
                    "color": node.color(),
                    "path": node.path,
                    "summary": node.summary,
                    "edges": {
                        "references": references,
                        "referencedBy": backlinks
                    }
                }),
            )
        }
        None => Response::error(id, codes::NOT_FOUND, format!("Node not found: {}", params.id)),
    }
}
