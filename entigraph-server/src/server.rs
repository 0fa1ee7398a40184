//! WebSocket server implementation.
//!
//! Handles client connections and routes messages to handlers.

use crate::handlers::{
    handle_info, handle_node_get, handle_regenerate, handle_search, handle_snapshot, ServerState,
    SharedState,
};
use crate::protocol::{NodeGetParams, Request, Response, SearchParams};
use entigraph_core::GraphConfig;
use entigraph_graph::EntityGraph;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Default listen address.
pub const DEFAULT_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 7432);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(DEFAULT_ADDR),
        }
    }
}

/// The Entigraph WebSocket server.
pub struct EntigraphServer {
    config: ServerConfig,
    state: SharedState,
}

impl EntigraphServer {
    /// Creates a server for an already generated graph.
    ///
    /// `graph_config` is what `graph.regenerate` runs against.
    pub fn new(graph: EntityGraph, graph_config: GraphConfig, config: ServerConfig) -> Self {
        let graph = Arc::new(RwLock::new(graph));
        Self {
            config,
            state: Arc::new(ServerState::new(graph, graph_config)),
        }
    }

    /// Returns the shared handler state.
    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    /// Runs the server, accepting connections forever.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        info!("Entigraph server listening on {}", self.config.addr);

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let conn_id = Uuid::new_v4();
                    debug!("New connection {} from {}", conn_id, addr);
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, addr, conn_id, state).await {
                            error!("Connection {} error from {}: {}", conn_id, addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handles a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    conn_id: Uuid,
    state: SharedState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ws_stream = accept_async(stream).await?;
    info!("WebSocket connection {} established with {}", conn_id, addr);

    let (mut write, mut read) = ws_stream.split();

    while let Some(msg) = read.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                warn!("Message error from {}: {}", addr, e);
                break;
            }
        };

        if msg.is_close() {
            debug!("Client {} disconnected", conn_id);
            break;
        }

        if msg.is_ping() {
            write.send(Message::Pong(msg.into_data())).await?;
            continue;
        }

        if msg.is_text() {
            let text = msg.to_text().unwrap_or("");
            let response = process_message(text, state.clone()).await;
            let json = serde_json::to_string(&response)?;
            write.send(Message::Text(json)).await?;
        }
    }

    info!("Connection closed: {}", conn_id);
    Ok(())
}

/// Processes a JSON-RPC message and returns a response.
pub async fn process_message(text: &str, state: SharedState) -> Response {
    let request: Request = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(_) => return Response::parse_error(),
    };

    let id = request.id.clone();
    if matches!(request.jsonrpc.as_deref(), Some(v) if v != "2.0") {
        return Response::invalid_request(id, "Unsupported jsonrpc version");
    }

    let method = request.method.as_str();
    debug!("Processing method: {}", method);

    match method {
        "graph.regenerate" => handle_regenerate(state, id).await,

        "graph.info" => handle_info(state, id).await,

        "graph.snapshot" => handle_snapshot(state, id).await,

        "search" => match serde_json::from_value::<SearchParams>(request.params) {
            Ok(params) => handle_search(state, id, params).await,
            Err(e) => Response::invalid_params(id, e.to_string()),
        },

        "node.get" => match serde_json::from_value::<NodeGetParams>(request.params) {
            Ok(params) => handle_node_get(state, id, params).await,
            Err(e) => Response::invalid_params(id, e.to_string()),
        },

        _ => Response::method_not_found(id, method),
    }
}
