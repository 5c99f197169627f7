//! Wire types for GraphQL requests and responses.

use serde::{Deserialize, Serialize};

use tracksync_types::sync::{RemoteCursor, RemoteSnapshot};

/// Request body posted to the GraphQL endpoint.
#[derive(Debug, Serialize)]
pub struct GraphqlRequest<'a, V: Serialize> {
    pub query: &'a str,
    pub variables: &'a V,
}

/// Standard GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphqlErrorMessage>>,
}

impl<T> GraphqlResponse<T> {
    /// Messages of the `errors` array, empty when the call succeeded.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .flatten()
            .map(|e| e.message.clone())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct GraphqlErrorMessage {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerStoreData {
    #[serde(default)]
    pub tracker_store: Option<RemoteSnapshot>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertTrackerData {
    #[serde(default)]
    pub insert_tracker_store: Option<RemoteCursor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTrackerData {
    #[serde(default)]
    pub update_tracker_store: Option<RemoteCursor>,
}
