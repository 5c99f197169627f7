//! Configuration loader for tracksync.
//!
//! Reads `tracksync.toml` and deserializes it into [`StoreConfig`], then
//! applies environment overrides. Falls back to defaults when the file is
//! missing or malformed.

use std::path::Path;

use secrecy::SecretString;

use tracksync_types::config::StoreConfig;

/// Default file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "tracksync.toml";

pub const ENV_PROJECT_ID: &str = "BF_PROJECT_ID";
pub const ENV_ENVIRONMENT: &str = "BOTFRONT_ENV";
pub const ENV_MAX_EVENTS: &str = "TRACKSYNC_MAX_EVENTS";
pub const ENV_GRAPHQL_URL: &str = "TRACKSYNC_GRAPHQL_URL";
pub const ENV_API_KEY: &str = "API_KEY";

/// Load configuration from `path`.
///
/// - If the file does not exist, returns [`StoreConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_config(path: &Path) -> StoreConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", path.display());
            return StoreConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return StoreConfig::default();
        }
    };

    match toml::from_str::<StoreConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            StoreConfig::default()
        }
    }
}

/// Load configuration from `path` and apply overrides from the process
/// environment.
pub async fn load_config_from_env(path: &Path) -> StoreConfig {
    let mut config = load_config(path).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Override file values with environment variables read through `lookup`.
///
/// Unparseable numeric overrides are ignored with a warning.
pub fn apply_env_overrides(config: &mut StoreConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(project_id) = lookup(ENV_PROJECT_ID) {
        config.project_id = project_id;
    }
    if let Some(environment) = lookup(ENV_ENVIRONMENT) {
        config.environment = environment;
    }
    if let Some(url) = lookup(ENV_GRAPHQL_URL) {
        config.remote.url = url;
    }
    if let Some(raw) = lookup(ENV_MAX_EVENTS) {
        match raw.trim().parse::<usize>() {
            Ok(max_events) => config.max_events = max_events,
            Err(err) => {
                tracing::warn!("Ignoring {ENV_MAX_EVENTS}={raw}: {err}");
            }
        }
    }
}

/// API key for the remote store, if one is configured.
///
/// Empty values count as unset.
pub fn load_api_key(lookup: impl Fn(&str) -> Option<String>) -> Option<SecretString> {
    lookup(ENV_API_KEY)
        .filter(|key| !key.trim().is_empty())
        .map(SecretString::from)
}
