//! RemoteSyncClient trait definition.
//!
//! The remote tracker store is the source of truth shared by every process.
//! It exposes three operations: fetch the events after a known index, insert
//! a full tracker, and append the events of a partial tracker.

use serde::Serialize;

use tracksync_types::error::RemoteError;
use tracksync_types::sync::{RemoteCursor, RemoteSnapshot};
use tracksync_types::tracker::ConversationRecord;

/// Variables of a fetch-since-index call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    pub sender_id: String,
    pub project_id: String,
    /// Remote index to fetch after; -1 fetches everything.
    pub after: i64,
    pub max_events: usize,
}

/// Variables of an insert or update call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteRequest {
    pub sender_id: String,
    pub project_id: String,
    pub tracker: ConversationRecord,
    /// Deployment environment label.
    pub env: String,
}

/// Client for the remote tracker store.
///
/// Implementations live in tracksync-infra (e.g., `GraphqlRemoteClient`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait RemoteSyncClient: Send + Sync {
    /// Fetch the tracker events after `request.after`.
    ///
    /// `Ok(None)` means the remote has nothing for this sender.
    fn fetch(
        &self,
        request: &FetchRequest,
    ) -> impl std::future::Future<Output = Result<Option<RemoteSnapshot>, RemoteError>> + Send;

    /// Store a tracker the remote has never seen.
    fn insert(
        &self,
        request: &WriteRequest,
    ) -> impl std::future::Future<Output = Result<RemoteCursor, RemoteError>> + Send;

    /// Append the events of a partial tracker to an existing remote tracker.
    fn update(
        &self,
        request: &WriteRequest,
    ) -> impl std::future::Future<Output = Result<RemoteCursor, RemoteError>> + Send;
}
