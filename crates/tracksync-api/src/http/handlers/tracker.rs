//! Tracker handlers.
//!
//! GET /api/v1/trackers/{sender_id} - Retrieve (and sync) a conversation.
//! PUT /api/v1/trackers/{sender_id} - Persist a serialized conversation.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};

use tracksync_types::tracker::{ConversationRecord, DialogueTracker, Event};

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, request_id};
use crate::state::AppState;

/// GET /api/v1/trackers/{sender_id} - Rebuilt tracker for `sender_id`.
///
/// Syncs with the remote store first. 404 when the conversation is unknown
/// everywhere or no domain is loaded.
pub async fn get_tracker(
    State(state): State<AppState>,
    Path(sender_id): Path<String>,
) -> Result<Json<ApiResponse<DialogueTracker>>, AppError> {
    let start = Instant::now();

    let tracker = state
        .engine
        .retrieve(&sender_id)
        .await
        .ok_or_else(|| AppError::TrackerNotFound(sender_id.clone()))?;

    let elapsed = start.elapsed().as_millis() as u64;
    let href = format!("/api/v1/trackers/{sender_id}");
    Ok(Json(
        ApiResponse::success(tracker, request_id(), elapsed).with_link("self", &href),
    ))
}

/// PUT /api/v1/trackers/{sender_id} - Save a serialized conversation.
///
/// Returns the anonymized events that were persisted. A body without a
/// `sender_id` takes the one from the path.
pub async fn put_tracker(
    State(state): State<AppState>,
    Path(sender_id): Path<String>,
    Json(mut record): Json<ConversationRecord>,
) -> Result<Json<ApiResponse<Vec<Event>>>, AppError> {
    let start = Instant::now();

    if record.sender_id.is_empty() {
        record.sender_id = sender_id.clone();
    } else if record.sender_id != sender_id {
        return Err(AppError::Validation(format!(
            "Body sender_id '{}' does not match path '{sender_id}'",
            record.sender_id
        )));
    }

    let events = state.engine.save(record).await;

    let elapsed = start.elapsed().as_millis() as u64;
    let href = format!("/api/v1/trackers/{sender_id}");
    Ok(Json(
        ApiResponse::success(events, request_id(), elapsed).with_link("self", &href),
    ))
}
