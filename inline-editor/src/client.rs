//! Remote attribute client.
//!
//! Every call resolves to exactly one [`OperationOutcome`]. Transport errors,
//! HTTP error statuses, malformed envelopes and errors raised by the store all
//! collapse into the same [`RemoteError`]; callers cannot and should not tell
//! them apart.
//!
//! Callers own the status indicator: mark it busy before awaiting any of these.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use shared_types::{
    AttributePath, RpcRequest, RpcResponse, METHOD_COMMIT, METHOD_DEL_ATTRIBUTE,
    METHOD_GET_ATTRIBUTE, METHOD_SET_ATTRIBUTE,
};

use crate::config::EditorConfig;
use crate::error::EditorError;

/// The single failure shape of a remote call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct RemoteError {
    pub message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type OperationOutcome<T> = Result<T, RemoteError>;

#[async_trait]
pub trait RemoteAttributeClient: Send + Sync {
    /// `getAttribute(path, attr)`
    async fn read(&self, path: &AttributePath) -> OperationOutcome<Value>;

    /// `setAttribute(path, attr, value)`; `value` is passed through untouched.
    async fn write(&self, path: &AttributePath, value: Value) -> OperationOutcome<()>;

    /// `delAttribute(path, attr)`
    async fn delete(&self, path: &AttributePath) -> OperationOutcome<()>;

    /// `commit()`
    async fn commit_all(&self) -> OperationOutcome<()>;
}

/// JSON-RPC over HTTP POST
pub struct HttpAttributeClient {
    http: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl HttpAttributeClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, EditorError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EditorError::HttpClient(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &EditorConfig) -> Result<Self, EditorError> {
        Self::new(config.store_url.clone(), config.request_timeout)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call(&self, method: &str, params: Vec<Value>) -> OperationOutcome<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);
        tracing::debug!(id, method, endpoint = %self.endpoint, "Dispatching RPC call");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| RemoteError::new(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(RemoteError::new(describe_http_error(response).await));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::new(format!("Failed to parse JSON: {e}")))?;

        if envelope.id.is_some_and(|reply_id| reply_id != id) {
            return Err(RemoteError::new(format!(
                "Response id {:?} does not match request id {id}",
                envelope.id
            )));
        }

        envelope.into_result().map_err(|e| {
            tracing::debug!(id, method, code = e.code, error = %e.message, "RPC call failed");
            RemoteError::new(e.message)
        })
    }
}

async fn describe_http_error(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if body.trim().is_empty() {
        return format!("HTTP error: {status}");
    }

    if let Ok(json) = serde_json::from_str::<Value>(&body) {
        if let Some(error) = json.get("error").and_then(|v| v.as_str()) {
            return format!("HTTP error: {status} ({error})");
        }
        if let Some(message) = json.get("message").and_then(|v| v.as_str()) {
            return format!("HTTP error: {status} ({message})");
        }
    }

    format!("HTTP error: {status} ({body})")
}

fn path_params(path: &AttributePath) -> Vec<Value> {
    vec![json!(path.item), json!(path.attribute)]
}

#[async_trait]
impl RemoteAttributeClient for HttpAttributeClient {
    async fn read(&self, path: &AttributePath) -> OperationOutcome<Value> {
        self.call(METHOD_GET_ATTRIBUTE, path_params(path)).await
    }

    async fn write(&self, path: &AttributePath, value: Value) -> OperationOutcome<()> {
        let mut params = path_params(path);
        params.push(value);
        self.call(METHOD_SET_ATTRIBUTE, params).await.map(|_| ())
    }

    async fn delete(&self, path: &AttributePath) -> OperationOutcome<()> {
        self.call(METHOD_DEL_ATTRIBUTE, path_params(path))
            .await
            .map(|_| ())
    }

    async fn commit_all(&self) -> OperationOutcome<()> {
        let version = self.call(METHOD_COMMIT, Vec::new()).await?;
        tracing::info!(%version, "Committed remote attribute view");
        Ok(())
    }
}
