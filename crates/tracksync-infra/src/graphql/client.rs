//! GraphqlRemoteClient -- concrete [`RemoteSyncClient`] implementation for
//! the remote tracker store.
//!
//! Every operation is a single JSON POST. A non-empty `errors` array is a
//! failure even when `data` is present. The API key, when configured, is
//! sent verbatim in the `Authorization` header and never logged.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;

use tracksync_core::remote::{FetchRequest, RemoteSyncClient, WriteRequest};
use tracksync_types::config::StoreConfig;
use tracksync_types::error::RemoteError;
use tracksync_types::sync::{RemoteCursor, RemoteSnapshot};

use super::queries::{GET_TRACKER, INSERT_TRACKER, UPDATE_TRACKER};
use super::types::{
    GraphqlRequest, GraphqlResponse, InsertTrackerData, TrackerStoreData, UpdateTrackerData,
};

/// Remote tracker store reached over GraphQL.
///
/// Does not derive Debug: the API key must never end up in log output.
pub struct GraphqlRemoteClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<SecretString>,
    timeout: Duration,
}

impl GraphqlRemoteClient {
    /// Create a client for the endpoint at `url`.
    ///
    /// `timeout` bounds each request end to end; expiry surfaces as
    /// [`RemoteError::Timeout`].
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        api_key: Option<SecretString>,
    ) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            api_key,
            timeout,
        })
    }

    /// Create a client from the `[remote]` section of `config`.
    pub fn from_config(
        config: &StoreConfig,
        api_key: Option<SecretString>,
    ) -> Result<Self, RemoteError> {
        Self::new(config.remote.url.clone(), config.remote_timeout(), api_key)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Post one operation and return its `data` payload.
    async fn execute<V, T>(
        &self,
        operation: &'static str,
        query: &str,
        variables: &V,
    ) -> Result<Option<T>, RemoteError>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let mut request = self
            .client
            .post(&self.url)
            .json(&GraphqlRequest { query, variables });
        if let Some(key) = &self.api_key {
            request = request.header(reqwest::header::AUTHORIZATION, key.expose_secret());
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GraphqlResponse<T> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                RemoteError::Timeout(self.timeout.as_secs())
            } else {
                RemoteError::Decode(format!("{operation}: {e}"))
            }
        })?;

        let messages = payload.error_messages();
        if !messages.is_empty() {
            return Err(RemoteError::GraphQl { messages });
        }

        Ok(payload.data)
    }

    fn transport_error(&self, e: reqwest::Error) -> RemoteError {
        if e.is_timeout() {
            RemoteError::Timeout(self.timeout.as_secs())
        } else {
            RemoteError::Transport(e.to_string())
        }
    }
}

impl RemoteSyncClient for GraphqlRemoteClient {
    async fn fetch(&self, request: &FetchRequest) -> Result<Option<RemoteSnapshot>, RemoteError> {
        let data: Option<TrackerStoreData> =
            self.execute("trackerStore", GET_TRACKER, request).await?;
        Ok(data.and_then(|d| d.tracker_store))
    }

    async fn insert(&self, request: &WriteRequest) -> Result<RemoteCursor, RemoteError> {
        let data: Option<InsertTrackerData> = self
            .execute("insertTrackerStore", INSERT_TRACKER, request)
            .await?;
        data.and_then(|d| d.insert_tracker_store)
            .ok_or_else(|| RemoteError::EmptyResponse("insertTrackerStore".to_string()))
    }

    async fn update(&self, request: &WriteRequest) -> Result<RemoteCursor, RemoteError> {
        let data: Option<UpdateTrackerData> = self
            .execute("updateTrackerStore", UPDATE_TRACKER, request)
            .await?;
        data.and_then(|d| d.update_tracker_store)
            .ok_or_else(|| RemoteError::EmptyResponse("updateTrackerStore".to_string()))
    }
}
