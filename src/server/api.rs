use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, error};

use crate::server::AppState;

/// GET /api/heatmap - the current sector heatmap snapshot
///
/// Serves from cache when possible; a refresh only blocks the request when
/// no usable snapshot exists in either tier. 503 means every path failed.
pub async fn heatmap_handler(State(state): State<AppState>) -> Response {
    debug!("Received heatmap request");

    match state.cache.get_snapshot().await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => {
            error!(error = %e, "Heatmap request failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// GET /api/health - liveness probe
pub async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
