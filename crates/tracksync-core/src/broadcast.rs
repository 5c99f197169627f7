//! Event broadcasting for persisted tracker events.
//!
//! `EventBroadcaster` is the hook the sync engine calls after anonymizing a
//! non-test record. `TrackerEventBus` is the in-process implementation, built
//! on `tokio::sync::broadcast`. Publishing with no active subscribers is a
//! no-op.

use serde::Serialize;
use tokio::sync::broadcast;

use tracksync_types::tracker::Event;

/// Fire-and-forget sink for tracker events.
///
/// Delivery failures are the broadcaster's concern; the caller never waits
/// for or observes them.
pub trait EventBroadcaster: Send + Sync {
    fn publish(&self, sender_id: &str, events: &[Event]);
}

/// One event tagged with the conversation it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerEvent {
    pub sender_id: String,
    pub event: Event,
}

/// Multi-consumer bus for tracker events.
///
/// Cloning the bus clones the sender, allowing multiple producers and
/// consumers.
pub struct TrackerEventBus {
    sender: broadcast::Sender<TrackerEvent>,
}

impl TrackerEventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new subscriber that will receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventBroadcaster for TrackerEventBus {
    fn publish(&self, sender_id: &str, events: &[Event]) {
        if self.sender.receiver_count() == 0 {
            return;
        }
        for event in events {
            let _ = self.sender.send(TrackerEvent {
                sender_id: sender_id.to_string(),
                event: event.clone(),
            });
        }
    }
}

impl Clone for TrackerEventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl std::fmt::Debug for TrackerEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerEventBus")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}
