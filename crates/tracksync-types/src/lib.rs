//! Shared domain types for tracksync.
//!
//! This crate contains the types every other crate speaks: serialized
//! conversation records and their events, the remote sync cursor, the
//! reconstructed dialogue tracker, configuration, and error types.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, thiserror.

pub mod config;
pub mod domain;
pub mod error;
pub mod sync;
pub mod tracker;
