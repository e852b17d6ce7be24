//! Function dispatch endpoint.

use std::sync::Arc;

use axum::{Json, extract::State};

use qbridge_core::{DispatchResponse, FunctionCall};

use crate::error::ApiError;
use crate::state::AppState;

/// POST /function - route `{name, parameters}` through the dispatcher.
///
/// Execution failures come back with status 200 and `status: "error"`.
/// Routing and input failures are a 400.
pub async fn call_function(
    State(state): State<Arc<AppState>>,
    Json(call): Json<FunctionCall>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let response = state.dispatcher.dispatch(&call).await?;
    Ok(Json(response))
}
