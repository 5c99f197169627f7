//! GraphQL client for the remote tracker store.
//!
//! This module provides [`GraphqlRemoteClient`], which implements the
//! [`RemoteSyncClient`](tracksync_core::remote::RemoteSyncClient) trait by
//! posting the `trackerStore`, `insertTrackerStore` and `updateTrackerStore`
//! operations as JSON over HTTP.

pub mod client;
pub mod queries;
pub mod types;

pub use client::GraphqlRemoteClient;
