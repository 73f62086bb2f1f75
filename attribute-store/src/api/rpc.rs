//! JSON-RPC endpoint
//!
//! Exposes the four repository procedures the inline editor relies on:
//! `getAttribute(path, attr)`, `setAttribute(path, attr, value)`,
//! `delAttribute(path, attr)` and `commit()`.
//!
//! Protocol-level failures are answered with HTTP 200 and a JSON-RPC error
//! object, so a client only ever has to inspect one envelope.

use axum::body::Bytes;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};
use shared_types::{
    error_codes, AttributePath, RpcError, RpcRequest, RpcResponse, JSONRPC_VERSION,
    METHOD_COMMIT, METHOD_DEL_ATTRIBUTE, METHOD_GET_ATTRIBUTE, METHOD_SET_ATTRIBUTE,
};

use crate::actors::attribute_store::{self, StoreError};
use crate::api::ApiState;

/// A request decoded into one of the store's procedures
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Get(AttributePath),
    Set(AttributePath, Value),
    Del(AttributePath),
    Commit,
}

impl StoreCall {
    pub fn parse(method: &str, params: Vec<Value>) -> Result<Self, RpcError> {
        match method {
            METHOD_GET_ATTRIBUTE => {
                expect_arity(method, &params, 2)?;
                Ok(StoreCall::Get(path_param(&params)?))
            }
            METHOD_SET_ATTRIBUTE => {
                expect_arity(method, &params, 3)?;
                let path = path_param(&params)?;
                let mut params = params;
                let value = params.pop().unwrap_or(Value::Null);
                Ok(StoreCall::Set(path, value))
            }
            METHOD_DEL_ATTRIBUTE => {
                expect_arity(method, &params, 2)?;
                Ok(StoreCall::Del(path_param(&params)?))
            }
            METHOD_COMMIT => {
                expect_arity(method, &params, 0)?;
                Ok(StoreCall::Commit)
            }
            other => Err(RpcError {
                code: error_codes::METHOD_NOT_FOUND,
                message: format!("Unknown method: {other}"),
            }),
        }
    }
}

fn expect_arity(method: &str, params: &[Value], arity: usize) -> Result<(), RpcError> {
    if params.len() == arity {
        return Ok(());
    }
    Err(invalid_params(format!(
        "{method} expects {arity} params, got {}",
        params.len()
    )))
}

fn path_param(params: &[Value]) -> Result<AttributePath, RpcError> {
    let item = params
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| invalid_params("item path must be a string"))?;
    let attribute = params
        .get(1)
        .and_then(Value::as_str)
        .ok_or_else(|| invalid_params("attribute name must be a string"))?;
    AttributePath::new(item, attribute).map_err(|e| invalid_params(e.to_string()))
}

fn invalid_params(message: impl Into<String>) -> RpcError {
    RpcError {
        code: error_codes::INVALID_PARAMS,
        message: message.into(),
    }
}

impl From<StoreError> for RpcError {
    fn from(e: StoreError) -> Self {
        let code = match &e {
            StoreError::ItemNotFound(_) => error_codes::ITEM_NOT_FOUND,
            StoreError::AttributeNotFound { .. } => error_codes::ATTRIBUTE_NOT_FOUND,
            StoreError::InvalidValue { .. } => error_codes::INVALID_VALUE,
        };
        RpcError {
            code,
            message: e.to_string(),
        }
    }
}

fn actor_unavailable(e: impl std::fmt::Display) -> RpcError {
    RpcError {
        code: error_codes::INTERNAL_ERROR,
        message: format!("Attribute store unavailable: {e}"),
    }
}

/// Run one decoded call against the store actor
pub async fn dispatch(state: &ApiState, call: StoreCall) -> Result<Value, RpcError> {
    let store = &state.store;
    match call {
        StoreCall::Get(path) => {
            let value = attribute_store::get_attribute(store, path)
                .await
                .map_err(actor_unavailable)??;
            Ok(value)
        }
        StoreCall::Set(path, value) => {
            attribute_store::set_attribute(store, path, value)
                .await
                .map_err(actor_unavailable)??;
            Ok(json!(true))
        }
        StoreCall::Del(path) => {
            attribute_store::del_attribute(store, path)
                .await
                .map_err(actor_unavailable)??;
            Ok(json!(true))
        }
        StoreCall::Commit => {
            let version = attribute_store::commit(store)
                .await
                .map_err(actor_unavailable)??;
            Ok(json!(version))
        }
    }
}

/// POST /rpc
pub async fn handle_rpc(State(state): State<ApiState>, body: Bytes) -> impl IntoResponse {
    let request: RpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected malformed RPC request");
            return Json(RpcResponse::failure(
                None,
                error_codes::PARSE_ERROR,
                format!("Invalid JSON-RPC request: {e}"),
            ));
        }
    };

    let id = request.id;
    if request.jsonrpc != JSONRPC_VERSION {
        return Json(RpcResponse::failure(
            Some(id),
            error_codes::INVALID_REQUEST,
            format!("Unsupported jsonrpc version: {}", request.jsonrpc),
        ));
    }

    tracing::debug!(id, method = %request.method, "RPC call");
    let result = match StoreCall::parse(&request.method, request.params) {
        Ok(call) => dispatch(&state, call).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(value) => Json(RpcResponse::success(id, value)),
        Err(error) => {
            tracing::warn!(id, method = %request.method, code = error.code, error = %error.message, "RPC call failed");
            Json(RpcResponse {
                jsonrpc: JSONRPC_VERSION.to_string(),
                id: Some(id),
                result: None,
                error: Some(error),
            })
        }
    }
}
