//! HTTP sidecar for tracksync.
//!
//! Axum-based REST API at `/api/v1/` with envelope response format,
//! request tracing, and CORS support.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
