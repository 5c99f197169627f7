//! Sync engine and port trait definitions for tracksync.
//!
//! This crate defines the "ports" (remote client, anonymizer, broadcaster)
//! that the infrastructure layer implements, plus the logic that ties them
//! together: the local cache, the merge rules, the sync engine, and the
//! background sweeper. It depends only on `tracksync-types` -- never on
//! `tracksync-infra` or any network crate.

pub mod anonymizer;
pub mod broadcast;
pub mod cache;
pub mod domain;
pub mod engine;
pub mod merge;
pub mod remote;
pub mod sweeper;

pub use engine::SyncEngine;
pub use sweeper::{Sweeper, SweeperHandle};
