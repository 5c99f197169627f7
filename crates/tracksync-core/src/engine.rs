//! Sync engine: save and retrieve conversations through the local cache and
//! the remote tracker store.
//!
//! Every failure path degrades instead of propagating. A failed remote write
//! keeps the record cached with its old cursor; a failed fetch falls back to
//! the cached copy; a missing domain yields "no tracker". Serving possibly
//! stale local state is preferred over failing a conversation turn.
//!
//! Operations on one sender are serialized by the sender's cache lock, held
//! across the remote round-trip. Distinct senders never wait on each other.

use std::sync::Arc;

use regex::Regex;

use tracksync_types::config::StoreConfig;
use tracksync_types::error::{ConfigError, RemoteError};
use tracksync_types::sync::{RemoteCursor, SyncCursor};
use tracksync_types::tracker::{ConversationRecord, DialogueTracker, Event};

use crate::anonymizer::{Anonymizer, anonymize_record};
use crate::broadcast::EventBroadcaster;
use crate::cache::{LocalCache, Partition};
use crate::domain::TrackerFactory;
use crate::merge::merge_records;
use crate::remote::{FetchRequest, RemoteSyncClient, WriteRequest};
use crate::sweeper::{RetentionPolicy, Sweeper, SweeperHandle};

/// Tracker store that mirrors conversations to a remote store.
///
/// Generic over the remote client and the anonymizer so that tracksync-core
/// never depends on tracksync-infra.
pub struct SyncEngine<R: RemoteSyncClient, A: Anonymizer> {
    remote: R,
    anonymizer: A,
    cache: Arc<LocalCache>,
    config: StoreConfig,
    test_senders: Regex,
    broadcaster: Option<Arc<dyn EventBroadcaster>>,
    trackers: TrackerFactory,
}

impl<R: RemoteSyncClient, A: Anonymizer> SyncEngine<R, A> {
    /// Create an engine with an empty cache.
    ///
    /// Fails if the configuration is invalid or the test sender pattern does
    /// not compile.
    pub fn new(config: StoreConfig, remote: R, anonymizer: A) -> Result<Self, ConfigError> {
        config.validate()?;
        let test_senders =
            Regex::new(&config.test_sender_pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: config.test_sender_pattern.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            remote,
            anonymizer,
            cache: Arc::new(LocalCache::new()),
            config,
            test_senders,
            broadcaster: None,
            trackers: TrackerFactory::default(),
        })
    }

    /// Publish the events of every non-test save to `broadcaster`.
    pub fn with_broadcaster(mut self, broadcaster: Arc<dyn EventBroadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    /// Rebuild trackers with `trackers` on retrieve.
    pub fn with_tracker_factory(mut self, trackers: TrackerFactory) -> Self {
        self.trackers = trackers;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<LocalCache> {
        &self.cache
    }

    /// Whether `sender_id` names a regression-test conversation.
    pub fn is_test_sender(&self, sender_id: &str) -> bool {
        self.test_senders.is_match(sender_id)
    }

    /// Anonymize and persist `record`, returning the events just persisted.
    ///
    /// Test conversations stay in the local test map. Everything else is
    /// broadcast, then written to the remote: a full insert the first time
    /// this process sees the sender, afterwards an update carrying only the
    /// events newer than the acknowledged cursor.
    #[tracing::instrument(
        name = "tracker_save",
        skip(self, record),
        fields(sender_id = %record.sender_id, event_count = record.events.len())
    )]
    pub async fn save(&self, mut record: ConversationRecord) -> Vec<Event> {
        anonymize_record(&mut record, &self.anonymizer);
        let sender_id = record.sender_id.clone();
        let events = record.events.clone();

        let _guard = self.cache.lock(&sender_id).await;

        if self.is_test_sender(&sender_id) {
            self.cache.put(Partition::Test, &sender_id, record);
            return events;
        }

        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.publish(&sender_id, &record.events);
        }

        if self.cache.contains(Partition::Normal, &sender_id) {
            let cursor = self.cache.cursor(&sender_id);
            let partial = record.with_events(record.events_after(cursor.last_timestamp));
            tracing::debug!(
                new_events = partial.events.len(),
                after = cursor.last_timestamp,
                "Sending incremental tracker update"
            );
            let result = self.remote.update(&self.write_request(&sender_id, partial)).await;
            self.store_cursor(&sender_id, "update", result);
        } else {
            let result = self
                .remote
                .insert(&self.write_request(&sender_id, record.clone()))
                .await;
            self.store_cursor(&sender_id, "insert", result);
        }

        self.cache.put(Partition::Normal, &sender_id, record);
        events
    }

    /// Retrieve the conversation for `sender_id` as a domain-aware tracker.
    ///
    /// Returns `None` when the conversation is unknown both locally and
    /// remotely, or when no domain is loaded. Test conversations are handed
    /// back as stored and need no domain.
    pub async fn retrieve(&self, sender_id: &str) -> Option<DialogueTracker> {
        let record = self.retrieve_record(sender_id).await?;
        if self.is_test_sender(sender_id) {
            return Some(DialogueTracker::from_record(&record));
        }
        self.to_tracker(sender_id, &record)
    }

    /// Retrieve the merged serialized record for `sender_id`.
    ///
    /// Always asks the remote for events after the local cursor first and
    /// merges them into the cache; only when the remote has nothing (or is
    /// unreachable) is the cached copy served as is. Another process sharing
    /// the remote store may have advanced the conversation.
    #[tracing::instrument(name = "tracker_retrieve", skip(self))]
    pub async fn retrieve_record(&self, sender_id: &str) -> Option<ConversationRecord> {
        let guard = self.cache.lock(sender_id).await;
        let record = self.fetch_and_merge(sender_id).await;
        self.cache.release(sender_id, guard);
        record
    }

    async fn fetch_and_merge(&self, sender_id: &str) -> Option<ConversationRecord> {
        if self.is_test_sender(sender_id) {
            return self.cache.get(Partition::Test, sender_id);
        }

        let cursor = self.cache.cursor(sender_id);
        let request = FetchRequest {
            sender_id: sender_id.to_string(),
            project_id: self.config.project_id.clone(),
            after: cursor.last_index,
            max_events: self.config.max_events,
        };

        let snapshot = match self.remote.fetch(&request).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(error = %e, host = %self.config.remote.url, "Failed to fetch tracker");
                None
            }
        };

        if let Some(snapshot) = snapshot {
            let remote_cursor = snapshot.cursor();
            self.cache.set_cursor(sender_id, remote_cursor);

            let local = self.cache.get(Partition::Normal, sender_id);
            let merged = merge_records(
                sender_id,
                local.as_ref(),
                snapshot.tracker,
                self.config.max_events,
            );
            tracing::debug!(
                last_index = remote_cursor.last_index,
                event_count = merged.events.len(),
                "Merged remote tracker into local cache"
            );
            self.cache.put(Partition::Normal, sender_id, merged.clone());
            return Some(merged);
        }

        self.cache.get(Partition::Normal, sender_id)
    }

    /// Sweeper over this engine's cache with the configured retention.
    pub fn sweeper(&self) -> Sweeper {
        Sweeper::new(self.cache.clone(), RetentionPolicy::from(&self.config))
    }

    /// Start the background sweep loop at the configured interval.
    ///
    /// Must be called from within a tokio runtime. The loop runs until the
    /// returned handle is stopped or dropped.
    pub fn spawn_sweeper(&self) -> SweeperHandle {
        self.sweeper().spawn(self.config.sweep_interval())
    }

    fn write_request(&self, sender_id: &str, tracker: ConversationRecord) -> WriteRequest {
        WriteRequest {
            sender_id: sender_id.to_string(),
            project_id: self.config.project_id.clone(),
            tracker,
            env: self.config.environment.clone(),
        }
    }

    fn store_cursor(
        &self,
        sender_id: &str,
        operation: &str,
        result: Result<RemoteCursor, RemoteError>,
    ) {
        match result {
            Ok(remote) => self.cache.set_cursor(sender_id, SyncCursor::from(remote)),
            Err(e) => tracing::error!(
                operation,
                error = %e,
                host = %self.config.remote.url,
                "Failed to write tracker, keeping previous cursor"
            ),
        }
    }

    fn to_tracker(&self, sender_id: &str, record: &ConversationRecord) -> Option<DialogueTracker> {
        match self.trackers.from_events(sender_id, &record.events) {
            Ok(tracker) => Some(tracker),
            Err(e) => {
                tracing::warn!("{e}, returning no tracker");
                None
            }
        }
    }
}
