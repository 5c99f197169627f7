//! Local conversation cache shared by the sync engine and the sweeper.
//!
//! Holds three maps -- cached records, cached test records, and remote sync
//! cursors -- plus one async mutex per sender. Callers that read-modify-write
//! a sender's record and cursor hold that sender's lock for the duration, so
//! operations on one conversation are serialized while distinct
//! conversations proceed independently.
//!
//! All reads return cloned values; no `DashMap` guard ever outlives a method
//! call, so none can be held across an `.await`.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};

use tracksync_types::sync::SyncCursor;
use tracksync_types::tracker::ConversationRecord;

/// Exclusive access to one sender's cache entries.
pub type SenderGuard = OwnedMutexGuard<()>;

/// Which record map an entry lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    /// Regular conversations, mirrored to the remote store.
    Normal,
    /// Regression-test conversations, kept local only.
    Test,
}

/// Entry counts, for status output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub records: usize,
    pub test_records: usize,
    pub cursors: usize,
}

#[derive(Debug, Default)]
pub struct LocalCache {
    records: DashMap<String, ConversationRecord>,
    test_records: DashMap<String, ConversationRecord>,
    cursors: DashMap<String, SyncCursor>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LocalCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, partition: Partition) -> &DashMap<String, ConversationRecord> {
        match partition {
            Partition::Normal => &self.records,
            Partition::Test => &self.test_records,
        }
    }

    fn lock_handle(&self, sender_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(sender_id.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Wait for exclusive access to `sender_id`.
    pub async fn lock(&self, sender_id: &str) -> SenderGuard {
        self.lock_handle(sender_id).lock_owned().await
    }

    /// Take exclusive access to `sender_id` only if nobody holds it.
    pub fn try_lock(&self, sender_id: &str) -> Option<SenderGuard> {
        self.lock_handle(sender_id).try_lock_owned().ok()
    }

    /// Cloned copy of the cached record.
    pub fn get(&self, partition: Partition, sender_id: &str) -> Option<ConversationRecord> {
        self.map(partition).get(sender_id).map(|r| r.value().clone())
    }

    pub fn contains(&self, partition: Partition, sender_id: &str) -> bool {
        self.map(partition).contains_key(sender_id)
    }

    /// Insert or overwrite the cached record for `sender_id`.
    pub fn put(&self, partition: Partition, sender_id: &str, record: ConversationRecord) {
        self.map(partition).insert(sender_id.to_string(), record);
    }

    /// Snapshot of the sender ids currently cached in `partition`.
    pub fn sender_ids(&self, partition: Partition) -> Vec<String> {
        self.map(partition).iter().map(|r| r.key().clone()).collect()
    }

    /// Sync cursor for `sender_id`, or the "never synced" cursor.
    pub fn cursor(&self, sender_id: &str) -> SyncCursor {
        self.cursors
            .get(sender_id)
            .map(|c| *c.value())
            .unwrap_or_default()
    }

    pub fn set_cursor(&self, sender_id: &str, cursor: SyncCursor) {
        self.cursors.insert(sender_id.to_string(), cursor);
    }

    /// Give back `guard`, dropping the sender's lock entry when the sender
    /// has nothing cached and nobody else holds or waits on the lock.
    pub fn release(&self, sender_id: &str, guard: SenderGuard) {
        if !self.has_entries(sender_id) {
            self.locks
                .remove_if(sender_id, |_, lock| Arc::strong_count(lock) == 2);
        }
        drop(guard);
    }

    /// Drop every idle lock entry whose sender has nothing cached.
    ///
    /// Returns the number of entries removed.
    pub fn prune_locks(&self) -> usize {
        let before = self.locks.len();
        self.locks
            .retain(|sender_id, lock| Arc::strong_count(lock) > 1 || self.has_entries(sender_id));
        before.saturating_sub(self.locks.len())
    }

    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }

    fn has_entries(&self, sender_id: &str) -> bool {
        self.records.contains_key(sender_id)
            || self.test_records.contains_key(sender_id)
            || self.cursors.contains_key(sender_id)
    }

    /// Drop the record and cursor of `sender_id`.
    ///
    /// The caller must hold `guard` for this sender. The sender's lock entry
    /// is released as well when no other task is waiting on it.
    pub fn evict(&self, partition: Partition, sender_id: &str, guard: SenderGuard) -> bool {
        let removed = self.map(partition).remove(sender_id).is_some();
        self.cursors.remove(sender_id);
        // One reference in the map plus the one inside `guard`: nobody else
        // holds or waits on this lock.
        self.locks
            .remove_if(sender_id, |_, lock| Arc::strong_count(lock) == 2);
        drop(guard);
        removed
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            records: self.records.len(),
            test_records: self.test_records.len(),
            cursors: self.cursors.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracksync_types::tracker::Event;

    fn record(sender_id: &str) -> ConversationRecord {
        ConversationRecord::new(sender_id, vec![Event::new("user", 1.0)])
    }

    #[test]
    fn put_get_roundtrip_per_partition() {
        let cache = LocalCache::new();
        cache.put(Partition::Normal, "a", record("a"));

        assert_eq!(cache.get(Partition::Normal, "a"), Some(record("a")));
        assert!(cache.get(Partition::Test, "a").is_none());
        assert!(cache.contains(Partition::Normal, "a"));
    }

    #[test]
    fn cursor_defaults_to_never_synced() {
        let cache = LocalCache::new();
        assert_eq!(cache.cursor("a"), SyncCursor::default());

        let cursor = SyncCursor {
            last_index: 4,
            last_timestamp: 9.0,
        };
        cache.set_cursor("a", cursor);
        assert_eq!(cache.cursor("a"), cursor);
    }

    #[tokio::test]
    async fn evict_removes_record_cursor_and_idle_lock() {
        let cache = LocalCache::new();
        cache.put(Partition::Normal, "a", record("a"));
        cache.set_cursor("a", SyncCursor::default());

        let guard = cache.lock("a").await;
        assert!(cache.evict(Partition::Normal, "a", guard));

        assert!(!cache.contains(Partition::Normal, "a"));
        assert_eq!(cache.stats(), CacheStats::default());
        assert!(cache.locks.is_empty());
    }

    #[tokio::test]
    async fn try_lock_fails_while_sender_is_locked() {
        let cache = LocalCache::new();
        let guard = cache.lock("a").await;

        assert!(cache.try_lock("a").is_none());
        assert!(cache.try_lock("b").is_some());

        drop(guard);
        assert!(cache.try_lock("a").is_some());
    }

    #[tokio::test]
    async fn lock_serializes_same_sender() {
        let cache = Arc::new(LocalCache::new());
        let guard = cache.lock("a").await;

        let waiter = {
            let cache = cache.clone();
            tokio::spawn(async move {
                let _guard = cache.lock("a").await;
                cache.put(Partition::Normal, "a", record("a"));
            })
        };

        tokio::task::yield_now().await;
        assert!(!cache.contains(Partition::Normal, "a"));

        drop(guard);
        waiter.await.unwrap();
        assert!(cache.contains(Partition::Normal, "a"));
    }

    #[tokio::test]
    async fn release_drops_lock_of_sender_without_entries() {
        let cache = LocalCache::new();

        let guard = cache.lock("gone").await;
        cache.release("gone", guard);
        assert_eq!(cache.lock_count(), 0);

        let guard = cache.lock("a").await;
        cache.put(Partition::Normal, "a", record("a"));
        cache.release("a", guard);
        assert_eq!(cache.lock_count(), 1);
    }

    #[tokio::test]
    async fn release_keeps_lock_others_are_waiting_on() {
        let cache = Arc::new(LocalCache::new());
        let guard = cache.lock("a").await;

        let waiter = {
            let cache = cache.clone();
            tokio::spawn(async move {
                let guard = cache.lock("a").await;
                cache.release("a", guard);
            })
        };
        tokio::task::yield_now().await;

        cache.release("a", guard);
        assert_eq!(cache.lock_count(), 1);

        waiter.await.unwrap();
        assert_eq!(cache.lock_count(), 0);
    }

    #[tokio::test]
    async fn prune_locks_skips_held_and_cached_senders() {
        let cache = LocalCache::new();
        drop(cache.try_lock("idle"));
        let _held = cache.lock("held").await;
        drop(cache.try_lock("a"));
        cache.put(Partition::Normal, "a", record("a"));

        assert_eq!(cache.prune_locks(), 1);
        assert_eq!(cache.lock_count(), 2);
    }

    #[test]
    fn stats_counts_each_map() {
        let cache = LocalCache::new();
        cache.put(Partition::Normal, "a", record("a"));
        cache.put(Partition::Test, "bot_regression_test_1", record("t"));
        cache.set_cursor("a", SyncCursor::default());

        assert_eq!(
            cache.stats(),
            CacheStats {
                records: 1,
                test_records: 1,
                cursors: 1,
            }
        );
    }
}
