//! HTTP API routes for the attribute store
//!
//! The store speaks one JSON-RPC endpoint; the health route exists for
//! process supervisors and smoke tests.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use ractor::ActorRef;
use serde_json::json;

pub mod rpc;

use crate::actors::AttributeStoreMsg;

#[derive(Clone)]
pub struct ApiState {
    pub store: ActorRef<AttributeStoreMsg>,
}

/// Configure all API routes
pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/rpc", post(rpc::handle_rpc))
}

/// Health check endpoint
pub async fn health_check(State(_state): State<ApiState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
        "status": "healthy",
        "service": "attribute-store",
        "version": env!("CARGO_PKG_VERSION")
        })),
    )
}
