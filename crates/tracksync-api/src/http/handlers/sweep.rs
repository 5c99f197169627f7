//! POST /api/v1/sweep - Run one eviction pass immediately.

use std::time::Instant;

use axum::Json;
use axum::extract::State;

use tracksync_core::sweeper::SweepReport;

use crate::http::response::{ApiResponse, request_id};
use crate::state::AppState;

pub async fn sweep(State(state): State<AppState>) -> Json<ApiResponse<SweepReport>> {
    let start = Instant::now();
    let report = state.engine.sweeper().sweep_now();
    let elapsed = start.elapsed().as_millis() as u64;
    Json(ApiResponse::success(report, request_id(), elapsed))
}
