//! Remote synchronization bookkeeping.
//!
//! `SyncCursor` records how much of the remote event log a process has seen
//! for one sender. `RemoteCursor` and `RemoteSnapshot` mirror the payloads
//! returned by the remote tracker store.

use serde::{Deserialize, Deserializer, Serialize};

use crate::tracker::ConversationRecord;

/// Remote sync progress for one sender.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncCursor {
    /// Index of the last remote event fetched or acknowledged; -1 if never synced.
    pub last_index: i64,
    /// Timestamp of the last acknowledged event; 0 if never synced.
    pub last_timestamp: f64,
}

impl SyncCursor {
    /// Sentinel index meaning "fetch everything".
    pub const NEVER_SYNCED: i64 = -1;

    pub fn is_synced(&self) -> bool {
        self.last_index != Self::NEVER_SYNCED
    }
}

impl Default for SyncCursor {
    fn default() -> Self {
        Self {
            last_index: Self::NEVER_SYNCED,
            last_timestamp: 0.0,
        }
    }
}

/// Cursor as reported by the remote store. Either field may be null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCursor {
    #[serde(default)]
    pub last_index: Option<i64>,
    #[serde(default)]
    pub last_timestamp: Option<f64>,
}

impl From<RemoteCursor> for SyncCursor {
    fn from(remote: RemoteCursor) -> Self {
        let initial = SyncCursor::default();
        Self {
            last_index: remote.last_index.unwrap_or(initial.last_index),
            last_timestamp: remote.last_timestamp.unwrap_or(initial.last_timestamp),
        }
    }
}

/// Result of a remote fetch: the events after the requested index plus the
/// remote cursor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tracker: ConversationRecord,
    #[serde(default)]
    pub last_index: Option<i64>,
    #[serde(default)]
    pub last_timestamp: Option<f64>,
}

impl RemoteSnapshot {
    pub fn cursor(&self) -> SyncCursor {
        RemoteCursor {
            last_index: self.last_index,
            last_timestamp: self.last_timestamp,
        }
        .into()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_cursor_is_never_synced() {
        let cursor = SyncCursor::default();
        assert_eq!(cursor.last_index, -1);
        assert_eq!(cursor.last_timestamp, 0.0);
        assert!(!cursor.is_synced());
    }

    #[test]
    fn test_remote_cursor_nulls_fall_back_to_initial_values() {
        let remote: RemoteCursor =
            serde_json::from_value(json!({ "lastIndex": null, "lastTimestamp": 12.5 })).unwrap();
        let cursor = SyncCursor::from(remote);
        assert_eq!(cursor.last_index, -1);
        assert_eq!(cursor.last_timestamp, 12.5);
    }

    #[test]
    fn test_snapshot_deserializes_wire_shape() {
        let snapshot: RemoteSnapshot = serde_json::from_value(json!({
            "tracker": { "events": [{ "event": "bot", "timestamp": 3.0 }] },
            "lastIndex": 7,
            "lastTimestamp": 3.0
        }))
        .unwrap();

        assert_eq!(snapshot.tracker.events.len(), 1);
        assert_eq!(
            snapshot.cursor(),
            SyncCursor {
                last_index: 7,
                last_timestamp: 3.0
            }
        );
    }

    #[test]
    fn test_snapshot_null_tracker_is_empty_record() {
        let snapshot: RemoteSnapshot =
            serde_json::from_value(json!({ "tracker": null, "lastIndex": 2 })).unwrap();
        assert!(snapshot.tracker.events.is_empty());
        assert_eq!(snapshot.cursor().last_timestamp, 0.0);
    }
}
