//! Shared types between the inline editor and the attribute store
//!
//! These types are used by both:
//! - the attribute store (axum + ractor, native Rust)
//! - the inline editor client (native or WASM)
//!
//! Serializable with serde for JSON-RPC over HTTP

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ============================================================================
// Attribute Addressing
// ============================================================================

/// Identifies one attribute of one remote item.
///
/// Both parts are non-empty; use [`AttributePath::new`] to construct one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct AttributePath {
    /// Repository path of the item, e.g. `//userdata/alice`
    pub item: String,
    /// Attribute name on that item, e.g. `displayName`
    pub attribute: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPath {
    #[error("item path must not be empty")]
    EmptyItem,
    #[error("attribute name must not be empty")]
    EmptyAttribute,
}

impl AttributePath {
    pub fn new(item: impl Into<String>, attribute: impl Into<String>) -> Result<Self, InvalidPath> {
        let item = item.into();
        let attribute = attribute.into();
        if item.trim().is_empty() {
            return Err(InvalidPath::EmptyItem);
        }
        if attribute.trim().is_empty() {
            return Err(InvalidPath::EmptyAttribute);
        }
        Ok(Self { item, attribute })
    }
}

impl std::fmt::Display for AttributePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.item, self.attribute)
    }
}

// ============================================================================
// RPC Envelope
// ============================================================================

pub const JSONRPC_VERSION: &str = "2.0";

pub const METHOD_GET_ATTRIBUTE: &str = "getAttribute";
pub const METHOD_SET_ATTRIBUTE: &str = "setAttribute";
pub const METHOD_DEL_ATTRIBUTE: &str = "delAttribute";
pub const METHOD_COMMIT: &str = "commit";

/// JSON-RPC request as sent by the client.
///
/// Params are positional: `[item, attribute]`, `[item, attribute, value]` or `[]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    #[serde(default)]
    #[ts(type = "unknown[]")]
    pub params: Vec<serde_json::Value>,
}

impl RpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Vec<serde_json::Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// Standard and store-specific JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    pub const ITEM_NOT_FOUND: i64 = -32001;
    pub const ATTRIBUTE_NOT_FOUND: i64 = -32002;
    pub const INVALID_VALUE: i64 = -32003;
}

/// JSON-RPC response. Exactly one of `result` / `error` is non-null.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Option<u64>,
    #[serde(default)]
    #[ts(type = "unknown")]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(id: u64, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<u64>, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }

    /// Collapse the envelope into a single result.
    ///
    /// A response with both or neither of `result` / `error` set (or a JSON
    /// `null` result) violates the protocol and is reported as an error.
    pub fn into_result(self) -> Result<serde_json::Value, RpcError> {
        match (self.result, self.error) {
            (Some(result), None) if !result.is_null() => Ok(result),
            (None, Some(error)) | (Some(serde_json::Value::Null), Some(error)) => Err(error),
            (Some(_), Some(error)) => Err(RpcError {
                code: error_codes::INVALID_REQUEST,
                message: format!("response carried both a result and an error: {}", error.message),
            }),
            _ => Err(RpcError {
                code: error_codes::INVALID_REQUEST,
                message: "response carried neither a result nor an error".to_string(),
            }),
        }
    }
}

// ============================================================================
// UI State
// ============================================================================

/// Visible state of the page-wide status indicator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub enum StatusState {
    #[default]
    Idle,
    Busy,
    Error,
}

impl StatusState {
    /// Class name rendered onto the status region
    pub fn as_class(&self) -> &'static str {
        match self {
            StatusState::Idle => "idle",
            StatusState::Busy => "busy",
            StatusState::Error => "error",
        }
    }
}

/// Status indicator snapshot for UI display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct StatusSnapshot {
    pub state: StatusState,
    pub log: Vec<String>,
}

// ============================================================================
// Tests
// ============================================================================
