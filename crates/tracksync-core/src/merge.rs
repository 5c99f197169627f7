//! Merge rules for combining a cached record with a remote fetch.
//!
//! The remote fetch returns only events after the local cursor, capped at
//! `max_events`. A response that hits the cap may be a truncated suffix of
//! the remote log, so the local history can no longer be proven contiguous
//! with it and is discarded. Otherwise the remote events are strictly newer
//! than everything cached and are appended.

use tracksync_types::tracker::ConversationRecord;

/// Whether a fetch returning `event_count` events was cut off by the cap.
pub fn is_windowed(event_count: usize, max_events: usize) -> bool {
    event_count == max_events
}

/// Merge a remote snapshot into the cached copy for `sender_id`.
///
/// Top-level fields prefer the remote value and fall back to the local one
/// when the remote payload omits them.
pub fn merge_records(
    sender_id: &str,
    local: Option<&ConversationRecord>,
    remote: ConversationRecord,
    max_events: usize,
) -> ConversationRecord {
    let Some(local) = local else {
        let mut merged = remote;
        if merged.sender_id.is_empty() {
            merged.sender_id = sender_id.to_string();
        }
        return merged;
    };

    let events = if is_windowed(remote.events.len(), max_events) {
        remote.events
    } else {
        let mut events = Vec::with_capacity(local.events.len() + remote.events.len());
        events.extend(local.events.iter().cloned());
        events.extend(remote.events);
        events
    };

    let sender_id = if remote.sender_id.is_empty() {
        local.sender_id.clone()
    } else {
        remote.sender_id
    };

    let mut extra = local.extra.clone();
    extra.extend(remote.extra);

    ConversationRecord {
        sender_id,
        events,
        latest_event_time: remote.latest_event_time.or(local.latest_event_time),
        latest_message: remote.latest_message.or_else(|| local.latest_message.clone()),
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracksync_types::tracker::{Event, LatestMessage};

    fn events(timestamps: &[f64]) -> Vec<Event> {
        timestamps.iter().map(|t| Event::new("bot", *t)).collect()
    }

    fn timestamps(record: &ConversationRecord) -> Vec<f64> {
        record.events.iter().map(|e| e.timestamp).collect()
    }

    #[test]
    fn windowed_fetch_replaces_local_history() {
        let local = ConversationRecord::new("abc", events(&[1.0, 2.0, 3.0]));
        let remote = ConversationRecord::new("abc", events(&[4.0, 5.0]));

        let merged = merge_records("abc", Some(&local), remote, 2);

        assert_eq!(timestamps(&merged), vec![4.0, 5.0]);
    }

    #[test]
    fn partial_fetch_appends_to_local_history() {
        let local = ConversationRecord::new("abc", events(&[1.0, 2.0]));
        let remote = ConversationRecord::new("abc", events(&[3.0]));

        let merged = merge_records("abc", Some(&local), remote, 100);

        assert_eq!(timestamps(&merged), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn empty_fetch_keeps_local_events() {
        let local = ConversationRecord::new("abc", events(&[1.0, 2.0]));
        let remote = ConversationRecord::default();

        let merged = merge_records("abc", Some(&local), remote, 100);

        assert_eq!(timestamps(&merged), vec![1.0, 2.0]);
        assert_eq!(merged.sender_id, "abc");
        assert_eq!(merged.latest_event_time, Some(2.0));
    }

    #[test]
    fn remote_fields_win_and_local_fields_fill_gaps() {
        let mut local = ConversationRecord::new("abc", Vec::new());
        local.extra.insert("paused".to_string(), json!(true));
        local.extra.insert("slots".to_string(), json!({ "city": "Oulu" }));
        local.latest_message = Some(LatestMessage {
            text: Some("old".to_string()),
            ..LatestMessage::default()
        });

        let mut remote = ConversationRecord::default();
        remote.extra.insert("paused".to_string(), json!(false));

        let merged = merge_records("abc", Some(&local), remote, 100);

        assert_eq!(merged.extra["paused"], json!(false));
        assert_eq!(merged.extra["slots"], json!({ "city": "Oulu" }));
        assert_eq!(merged.latest_message.unwrap().text.as_deref(), Some("old"));
    }

    #[test]
    fn no_local_copy_takes_remote_payload() {
        let remote = ConversationRecord {
            events: events(&[1.0]),
            ..ConversationRecord::default()
        };

        let merged = merge_records("abc", None, remote, 100);

        assert_eq!(merged.sender_id, "abc");
        assert_eq!(timestamps(&merged), vec![1.0]);
    }

    #[test]
    fn is_windowed_only_at_cap() {
        assert!(is_windowed(100, 100));
        assert!(!is_windowed(99, 100));
        assert!(!is_windowed(0, 100));
    }
}
