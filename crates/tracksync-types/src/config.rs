//! Tracker store configuration.
//!
//! `StoreConfig` represents the `tracksync.toml` file that controls the remote
//! endpoint, sync window, and cache retention. Every field has a default so an
//! empty file (or no file at all) yields a working development setup.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration for the tracker store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Project the conversations belong to on the remote store.
    #[serde(default)]
    pub project_id: String,

    /// Deployment environment label sent with every remote write.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Maximum number of events the remote returns per fetch.
    #[serde(default = "default_max_events")]
    pub max_events: usize,

    /// Seconds of inactivity before a normal conversation is evicted locally.
    #[serde(default = "default_tracker_persist_time")]
    pub tracker_persist_time_secs: u64,

    /// Seconds of inactivity before a test conversation is evicted.
    #[serde(default = "default_test_tracker_persist_time")]
    pub test_tracker_persist_time_secs: u64,

    /// Seconds between two sweep passes.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Regex matched against sender ids to detect regression-test traffic.
    #[serde(default = "default_test_sender_pattern")]
    pub test_sender_pattern: String,

    /// Optional path to a `domain.yml` used to rebuild trackers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_path: Option<PathBuf>,

    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Remote GraphQL endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_remote_url")]
    pub url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_max_events() -> usize {
    100
}

fn default_tracker_persist_time() -> u64 {
    3600
}

fn default_test_tracker_persist_time() -> u64 {
    240
}

fn default_sweep_interval() -> u64 {
    30
}

fn default_test_sender_pattern() -> String {
    "^bot_regression_test_".to_string()
}

fn default_remote_url() -> String {
    "http://localhost:3000/graphql".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            environment: default_environment(),
            max_events: default_max_events(),
            tracker_persist_time_secs: default_tracker_persist_time(),
            test_tracker_persist_time_secs: default_test_tracker_persist_time(),
            sweep_interval_secs: default_sweep_interval(),
            test_sender_pattern: default_test_sender_pattern(),
            domain_path: None,
            remote: RemoteConfig::default(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: default_remote_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl StoreConfig {
    /// Reject values the sync engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_events == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_events",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sweep_interval_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.remote.url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "remote.url",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote.timeout_secs)
    }
}
