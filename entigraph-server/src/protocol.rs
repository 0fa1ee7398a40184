//! JSON-RPC 2.0 message types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard JSON-RPC error codes.
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    /// An entity id was not found.
    pub const NOT_FOUND: i32 = -32001;
    /// Regeneration stopped on bad input.
    pub const PIPELINE_ABORTED: i32 = -32010;
    /// Regeneration failed for any other reason.
    pub const UNEXPECTED: i32 = -32011;
}

/// An incoming request.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Option<Value>,
}

/// Error object of a failed response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// An outgoing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Option<Value>,
}

impl Response {
    /// A successful response carrying `result`.
    pub fn success(id: Option<Value>, result: impl Serialize) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self {
                jsonrpc: "2.0".into(),
                result: Some(value),
                error: None,
                id,
            },
            Err(e) => Self::error(id, codes::UNEXPECTED, e.to_string()),
        }
    }

    /// A failed response.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
                data: None,
            }),
            id,
        }
    }

    /// A failed response with a structured payload.
    pub fn error_with_data(
        id: Option<Value>,
        code: i32,
        message: impl Into<String>,
        data: impl Serialize,
    ) -> Self {
        let mut response = Self::error(id, code, message);
        if let Some(err) = response.error.as_mut() {
            err.data = serde_json::to_value(data).ok();
        }
        response
    }

    pub fn parse_error() -> Self {
        Self::error(None, codes::PARSE_ERROR, "Parse error")
    }

    pub fn invalid_request(id: Option<Value>, message: impl Into<String>) -> Self {
        Self::error(id, codes::INVALID_REQUEST, message)
    }

    pub fn invalid_params(id: Option<Value>, message: impl Into<String>) -> Self {
        Self::error(id, codes::INVALID_PARAMS, message)
    }

    pub fn method_not_found(id: Option<Value>, method: &str) -> Self {
        Self::error(
            id,
            codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        )
    }
}

fn default_limit() -> usize {
    20
}

/// Params for `node.get`.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeGetParams {
    pub id: String,
}

/// Params for `search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    pub query: String,
    /// Restrict to one entity type.
    #[serde(default, rename = "type")]
    pub entity_type: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}
