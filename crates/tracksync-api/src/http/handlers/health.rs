//! GET /api/v1/health - Liveness plus cache occupancy.

use std::time::Instant;

use axum::Json;
use axum::extract::State;

use crate::http::response::{ApiResponse, request_id};
use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<serde_json::Value>> {
    let start = Instant::now();

    let data = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "project_id": state.config.project_id,
        "environment": state.config.environment,
        "cache": state.engine.cache().stats(),
        "event_subscribers": state.events.receiver_count(),
    });

    let elapsed = start.elapsed().as_millis() as u64;
    Json(ApiResponse::success(data, request_id(), elapsed).with_link("self", "/api/v1/health"))
}
