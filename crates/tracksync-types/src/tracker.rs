//! Conversation tracker types.
//!
//! `ConversationRecord` is the serialized form of one conversation as it is
//! cached locally and exchanged with the remote store. `DialogueTracker` is the
//! reconstructed, domain-aware view handed back to callers of `retrieve`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EvictionError;

/// Event kind of messages authored by the end user.
pub const USER_EVENT: &str = "user";

/// A single tracker event.
///
/// Only `event` (the kind) and `timestamp` are interpreted by the sync logic.
/// Every other field is carried through verbatim in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event kind, e.g. "user", "bot", "action", "slot".
    #[serde(rename = "event")]
    pub kind: String,
    /// Seconds since the Unix epoch. Non-decreasing within a conversation.
    pub timestamp: f64,
    /// Kind-specific payload.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Event {
    /// Create an event with no payload.
    pub fn new(kind: impl Into<String>, timestamp: f64) -> Self {
        Self {
            kind: kind.into(),
            timestamp,
            fields: Map::new(),
        }
    }

    /// Builder-style setter for a payload field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Whether this event was authored by the end user.
    pub fn is_user(&self) -> bool {
        self.kind == USER_EVENT
    }

    /// Look up a payload field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The raw message text, if this event carries one.
    pub fn text(&self) -> Option<&str> {
        self.fields.get("text").and_then(Value::as_str)
    }

    /// Rewrite the user-authored text of this event: `text` and
    /// `parse_data.text`. Missing or non-string fields are left alone.
    pub fn rewrite_user_text(&mut self, rewrite: impl Fn(&str) -> String) {
        if let Some(Value::String(text)) = self.fields.get_mut("text") {
            *text = rewrite(text);
        }
        if let Some(Value::String(text)) = self
            .fields
            .get_mut("parse_data")
            .and_then(|p| p.get_mut("text"))
        {
            *text = rewrite(text);
        }
    }
}

/// The `latest_message` object of a serialized tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestMessage {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Serialized state of one conversation.
///
/// Fields the sync logic does not interpret (slots, paused, active loop, ...)
/// live in `extra` so they survive caching and shallow merges untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Conversation key. Remote payloads may omit it.
    #[serde(default)]
    pub sender_id: String,

    /// Chronologically ordered events.
    #[serde(default)]
    pub events: Vec<Event>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_event_time: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_message: Option<LatestMessage>,

    /// All remaining top-level fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConversationRecord {
    /// Create a record for `sender_id` from an event list.
    ///
    /// `latest_event_time` is taken from the last event.
    pub fn new(sender_id: impl Into<String>, events: Vec<Event>) -> Self {
        let latest_event_time = events.last().map(|e| e.timestamp);
        Self {
            sender_id: sender_id.into(),
            events,
            latest_event_time,
            latest_message: None,
            extra: Map::new(),
        }
    }

    /// Copy of this record with its event list replaced.
    pub fn with_events(&self, events: Vec<Event>) -> Self {
        Self {
            sender_id: self.sender_id.clone(),
            events,
            latest_event_time: self.latest_event_time,
            latest_message: self.latest_message.clone(),
            extra: self.extra.clone(),
        }
    }

    /// Events strictly newer than `after` (seconds since epoch).
    pub fn events_after(&self, after: f64) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| e.timestamp > after)
            .cloned()
            .collect()
    }

    /// Time of the most recent activity in this conversation.
    ///
    /// Uses `latest_event_time` when present, otherwise the timestamp of the
    /// last event. `Ok(None)` means freshness is unknown; callers must treat
    /// that as "fresh".
    pub fn freshness(&self) -> Result<Option<f64>, EvictionError> {
        let latest = self
            .latest_event_time
            .or_else(|| self.events.last().map(|e| e.timestamp));
        match latest {
            Some(value) if !value.is_finite() => Err(EvictionError::InvalidTimestamp {
                sender_id: self.sender_id.clone(),
                value,
            }),
            other => Ok(other),
        }
    }
}

/// Domain-aware conversation state rebuilt from a record's events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueTracker {
    pub sender_id: String,
    /// Current slot values, keyed by slot name.
    pub slots: BTreeMap<String, Value>,
    /// The last user event, if any.
    pub latest_message: Option<Event>,
    pub latest_event_time: Option<f64>,
    pub paused: bool,
    pub events: Vec<Event>,
}

impl DialogueTracker {
    /// View of a stored record as is, without replaying it against a domain.
    ///
    /// Slots and the paused flag are read from the record's own `slots` and
    /// `paused` fields when present.
    pub fn from_record(record: &ConversationRecord) -> Self {
        let slots = match record.extra.get("slots") {
            Some(Value::Object(slots)) => slots
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            _ => BTreeMap::new(),
        };
        Self {
            sender_id: record.sender_id.clone(),
            slots,
            latest_message: record.events.iter().rev().find(|e| e.is_user()).cloned(),
            latest_event_time: record
                .latest_event_time
                .or_else(|| record.events.last().map(|e| e.timestamp)),
            paused: record
                .extra
                .get("paused")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            events: record.events.clone(),
        }
    }
}
