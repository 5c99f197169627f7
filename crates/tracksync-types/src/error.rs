use thiserror::Error;

/// Failures talking to the remote tracker store.
///
/// Never surfaced to callers of the sync engine: every variant degrades to
/// "no new data" or "keep the cached copy".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("graphql error: {}", messages.join(", "))]
    GraphQl { messages: Vec<String> },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("remote returned no data for '{0}'")]
    EmptyResponse(String),
}

impl RemoteError {
    /// Human-readable messages describing the failure.
    pub fn messages(&self) -> Vec<String> {
        match self {
            RemoteError::GraphQl { messages } => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// A cached entry whose age cannot be evaluated during a sweep.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvictionError {
    #[error("tracker '{sender_id}' has an invalid latest event time: {value}")]
    InvalidTimestamp { sender_id: String, value: f64 },
}

/// Tracker reconstruction was requested without a domain.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot rebuild tracker '{sender_id}': no domain is loaded")]
pub struct MissingDomainError {
    pub sender_id: String,
}

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("invalid test sender pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("failed to read config: {0}")]
    Io(String),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Errors loading a domain file.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("failed to read domain file: {0}")]
    Io(String),

    #[error("failed to parse domain file: {0}")]
    Parse(String),
}
