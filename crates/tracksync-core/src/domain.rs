//! Domain-aware tracker reconstruction.
//!
//! Turns a cached `ConversationRecord` into the `DialogueTracker` handed back
//! to callers by replaying its events against the domain's slot definitions.

use tracksync_types::domain::Domain;
use tracksync_types::error::MissingDomainError;
use tracksync_types::tracker::{DialogueTracker, Event};

/// Rebuilds trackers from event lists.
///
/// Without a domain no tracker can be rebuilt; `from_events` then returns
/// `MissingDomainError` and the sync engine reports "absent".
#[derive(Debug, Clone, Default)]
pub struct TrackerFactory {
    domain: Option<Domain>,
}

impl TrackerFactory {
    pub fn new(domain: Option<Domain>) -> Self {
        Self { domain }
    }

    pub fn with_domain(domain: Domain) -> Self {
        Self {
            domain: Some(domain),
        }
    }

    pub fn domain(&self) -> Option<&Domain> {
        self.domain.as_ref()
    }

    /// Replay `events` into a fresh tracker for `sender_id`.
    ///
    /// Slot events for slots the domain does not declare are ignored.
    pub fn from_events(
        &self,
        sender_id: &str,
        events: &[Event],
    ) -> Result<DialogueTracker, MissingDomainError> {
        let domain = self.domain.as_ref().ok_or_else(|| MissingDomainError {
            sender_id: sender_id.to_string(),
        })?;

        let mut tracker = DialogueTracker {
            sender_id: sender_id.to_string(),
            slots: domain.initial_slots(),
            latest_message: None,
            latest_event_time: None,
            paused: false,
            events: Vec::with_capacity(events.len()),
        };

        for event in events {
            apply_event(&mut tracker, domain, event);
            tracker.events.push(event.clone());
        }

        Ok(tracker)
    }
}

fn apply_event(tracker: &mut DialogueTracker, domain: &Domain, event: &Event) {
    tracker.latest_event_time = Some(event.timestamp);

    match event.kind.as_str() {
        "user" => tracker.latest_message = Some(event.clone()),
        "slot" => {
            let name = event.field("name").and_then(|v| v.as_str());
            if let Some(name) = name.filter(|n| domain.has_slot(n)) {
                let value = event.field("value").cloned().unwrap_or_default();
                tracker.slots.insert(name.to_string(), value);
            }
        }
        "reset_slots" => tracker.slots = domain.initial_slots(),
        "restart" => {
            tracker.slots = domain.initial_slots();
            tracker.latest_message = None;
            tracker.paused = false;
        }
        "pause" => tracker.paused = true,
        "resume" => tracker.paused = false,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracksync_types::domain::SlotDefinition;

    fn domain() -> Domain {
        let mut domain = Domain::default();
        domain.slots.insert(
            "city".to_string(),
            SlotDefinition {
                slot_type: Some("text".to_string()),
                initial_value: json!("unknown"),
            },
        );
        domain
    }

    fn slot(name: &str, value: serde_json::Value, ts: f64) -> Event {
        Event::new("slot", ts)
            .with_field("name", json!(name))
            .with_field("value", value)
    }

    #[test]
    fn test_from_events_without_domain_fails() {
        let factory = TrackerFactory::default();
        let err = factory.from_events("abc", &[]).unwrap_err();
        assert_eq!(err.sender_id, "abc");
    }

    #[test]
    fn test_from_events_replays_slots_and_latest_message() {
        let factory = TrackerFactory::with_domain(domain());
        let events = vec![
            Event::new("user", 1.0).with_field("text", json!("hi")),
            slot("city", json!("Oulu"), 2.0),
            slot("undeclared", json!(1), 3.0),
        ];

        let tracker = factory.from_events("abc", &events).unwrap();

        assert_eq!(tracker.slots["city"], "Oulu");
        assert!(!tracker.slots.contains_key("undeclared"));
        assert_eq!(tracker.latest_message.unwrap().text(), Some("hi"));
        assert_eq!(tracker.latest_event_time, Some(3.0));
        assert_eq!(tracker.events.len(), 3);
    }

    #[test]
    fn test_restart_resets_state() {
        let factory = TrackerFactory::with_domain(domain());
        let events = vec![
            Event::new("user", 1.0),
            slot("city", json!("Oulu"), 2.0),
            Event::new("pause", 3.0),
            Event::new("restart", 4.0),
        ];

        let tracker = factory.from_events("abc", &events).unwrap();

        assert_eq!(tracker.slots["city"], "unknown");
        assert!(tracker.latest_message.is_none());
        assert!(!tracker.paused);
    }

    #[test]
    fn test_pause_and_resume() {
        let factory = TrackerFactory::with_domain(domain());
        let paused = factory
            .from_events("abc", &[Event::new("pause", 1.0)])
            .unwrap();
        assert!(paused.paused);

        let resumed = factory
            .from_events("abc", &[Event::new("pause", 1.0), Event::new("resume", 2.0)])
            .unwrap();
        assert!(!resumed.paused);
    }
}
