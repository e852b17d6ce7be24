//! Capability manifest.

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /schema and GET /mcp.json - the manifest file, verbatim.
pub async fn schema(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let body = tokio::fs::read(&state.schema_path).await.map_err(|e| {
        tracing::error!(path = %state.schema_path.display(), "cannot read manifest: {e}");
        ApiError::SchemaUnavailable(format!("{}: {e}", state.schema_path.display()))
    })?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}
