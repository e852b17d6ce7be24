//! Health check endpoint.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;

use qbridge_core::CapabilityFlags;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub capabilities: CapabilityFlags,
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        capabilities: state.flags(),
    })
}
