//! Periodic eviction of stale conversations from the local cache.
//!
//! A conversation is stale when its latest event is older than the retention
//! window of its partition. Evicting drops the cached record and its cursor;
//! the next retrieve re-fetches everything from the remote store.
//!
//! A sweep never blocks on a busy sender: entries whose lock is held are
//! skipped and reconsidered on the next tick.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use tracksync_types::config::StoreConfig;

use crate::cache::{LocalCache, Partition};

/// Retention window per partition, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionPolicy {
    pub normal_secs: f64,
    pub test_secs: f64,
}

impl RetentionPolicy {
    pub fn for_partition(&self, partition: Partition) -> f64 {
        match partition {
            Partition::Normal => self.normal_secs,
            Partition::Test => self.test_secs,
        }
    }
}

impl From<&StoreConfig> for RetentionPolicy {
    fn from(config: &StoreConfig) -> Self {
        Self {
            normal_secs: config.tracker_persist_time_secs as f64,
            test_secs: config.test_tracker_persist_time_secs as f64,
        }
    }
}

/// An entry the sweep could not judge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepFailure {
    pub sender_id: String,
    pub error: String,
}

/// Outcome of one sweep over both partitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    pub evicted: Vec<String>,
    pub retained: usize,
    /// Senders locked by an in-flight operation.
    pub skipped: Vec<String>,
    pub failures: Vec<SweepFailure>,
    /// Idle lock entries of senders with nothing cached.
    pub pruned_locks: usize,
}

#[derive(Debug, Clone)]
pub struct Sweeper {
    cache: Arc<LocalCache>,
    policy: RetentionPolicy,
}

impl Sweeper {
    pub fn new(cache: Arc<LocalCache>, policy: RetentionPolicy) -> Self {
        Self { cache, policy }
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Sweep using the current wall-clock time.
    pub fn sweep_now(&self) -> SweepReport {
        self.sweep_at(now_secs())
    }

    /// Sweep treating `now` (seconds since the epoch) as the current time.
    ///
    /// An entry is evicted when `now - latest_event_time` exceeds the
    /// partition's retention. Entries with no known freshness are retained.
    /// An invalid timestamp is reported as a failure and the entry retained;
    /// it never aborts the sweep of the remaining entries.
    pub fn sweep_at(&self, now: f64) -> SweepReport {
        let mut report = SweepReport::default();

        for partition in [Partition::Test, Partition::Normal] {
            let persist = self.policy.for_partition(partition);

            for sender_id in self.cache.sender_ids(partition) {
                let Some(guard) = self.cache.try_lock(&sender_id) else {
                    report.skipped.push(sender_id);
                    continue;
                };

                // Evicted or replaced between listing and locking.
                let Some(record) = self.cache.get(partition, &sender_id) else {
                    continue;
                };

                match record.freshness() {
                    Ok(Some(latest)) if now - latest > persist => {
                        self.cache.evict(partition, &sender_id, guard);
                        report.evicted.push(sender_id);
                    }
                    Ok(_) => report.retained += 1,
                    Err(e) => {
                        tracing::warn!(sender_id = %sender_id, error = %e, "Could not evict tracker");
                        report.failures.push(SweepFailure {
                            sender_id,
                            error: e.to_string(),
                        });
                        report.retained += 1;
                    }
                }
            }
        }

        report.pruned_locks = self.cache.prune_locks();

        if report.evicted.is_empty() && report.failures.is_empty() {
            tracing::debug!(
                retained = report.retained,
                skipped = report.skipped.len(),
                pruned_locks = report.pruned_locks,
                "Sweep finished"
            );
        } else {
            tracing::info!(
                evicted = report.evicted.len(),
                retained = report.retained,
                skipped = report.skipped.len(),
                failures = report.failures.len(),
                "Sweep evicted stale trackers"
            );
        }

        report
    }

    /// Run `sweep_now` every `interval` on the current tokio runtime.
    ///
    /// The first sweep happens one interval after spawning.
    pub fn spawn(self, interval: Duration) -> SweeperHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            tracing::info!(interval_secs = interval.as_secs(), "Tracker sweeper started");
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        self.sweep_now();
                    }
                }
            }
            tracing::info!("Tracker sweeper stopped");
        });

        SweeperHandle {
            cancel,
            task: Some(task),
        }
    }
}

/// Handle to a running sweep loop. Dropping it cancels the loop.
pub struct SweeperHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Cancel the loop and wait for it to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!(error = %e, "Sweeper task ended abnormally");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracksync_types::tracker::{ConversationRecord, Event};

    const NOW: f64 = 1_000_000.0;

    fn policy() -> RetentionPolicy {
        RetentionPolicy {
            normal_secs: 3600.0,
            test_secs: 240.0,
        }
    }

    fn record_at(sender_id: &str, ts: f64) -> ConversationRecord {
        ConversationRecord::new(sender_id, vec![Event::new("bot", ts)])
    }

    fn sweeper_with(cache: &Arc<LocalCache>) -> Sweeper {
        Sweeper::new(cache.clone(), policy())
    }

    #[test]
    fn evicts_only_past_retention() {
        let cache = Arc::new(LocalCache::new());
        cache.put(Partition::Normal, "old", record_at("old", NOW - 3601.0));
        cache.put(Partition::Normal, "fresh", record_at("fresh", NOW - 3599.0));

        let report = sweeper_with(&cache).sweep_at(NOW);

        assert_eq!(report.evicted, vec!["old".to_string()]);
        assert_eq!(report.retained, 1);
        assert!(!cache.contains(Partition::Normal, "old"));
        assert!(cache.contains(Partition::Normal, "fresh"));
    }

    #[test]
    fn test_partition_uses_shorter_retention() {
        let cache = Arc::new(LocalCache::new());
        let sender = "bot_regression_test_1";
        cache.put(Partition::Test, sender, record_at(sender, NOW - 300.0));
        cache.put(Partition::Normal, "abc", record_at("abc", NOW - 300.0));

        let report = sweeper_with(&cache).sweep_at(NOW);

        assert_eq!(report.evicted, vec![sender.to_string()]);
        assert!(cache.contains(Partition::Normal, "abc"));
    }

    #[test]
    fn eviction_drops_cursor() {
        let cache = Arc::new(LocalCache::new());
        cache.put(Partition::Normal, "old", record_at("old", NOW - 7200.0));
        cache.set_cursor(
            "old",
            tracksync_types::sync::SyncCursor {
                last_index: 3,
                last_timestamp: NOW - 7200.0,
            },
        );

        sweeper_with(&cache).sweep_at(NOW);

        assert!(!cache.cursor("old").is_synced());
        assert_eq!(cache.stats().cursors, 0);
    }

    #[test]
    fn unknown_freshness_is_retained() {
        let cache = Arc::new(LocalCache::new());
        cache.put(Partition::Normal, "empty", ConversationRecord::new("empty", Vec::new()));

        let report = sweeper_with(&cache).sweep_at(NOW);

        assert!(report.evicted.is_empty());
        assert_eq!(report.retained, 1);
        assert!(cache.contains(Partition::Normal, "empty"));
    }

    #[test]
    fn invalid_timestamp_is_reported_and_sweep_continues() {
        let cache = Arc::new(LocalCache::new());
        let mut broken = record_at("broken", NOW);
        broken.latest_event_time = Some(f64::NAN);
        cache.put(Partition::Normal, "broken", broken);
        cache.put(Partition::Normal, "old", record_at("old", NOW - 7200.0));

        let report = sweeper_with(&cache).sweep_at(NOW);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].sender_id, "broken");
        assert_eq!(report.evicted, vec!["old".to_string()]);
        assert!(cache.contains(Partition::Normal, "broken"));
    }

    #[tokio::test]
    async fn busy_sender_is_skipped() {
        let cache = Arc::new(LocalCache::new());
        cache.put(Partition::Normal, "busy", record_at("busy", NOW - 7200.0));
        let guard = cache.lock("busy").await;

        let report = sweeper_with(&cache).sweep_at(NOW);
        assert_eq!(report.skipped, vec!["busy".to_string()]);
        assert!(cache.contains(Partition::Normal, "busy"));

        drop(guard);
        let report = sweeper_with(&cache).sweep_at(NOW);
        assert_eq!(report.evicted, vec!["busy".to_string()]);
    }

    #[tokio::test]
    async fn sweep_prunes_locks_of_uncached_senders() {
        let cache = Arc::new(LocalCache::new());
        cache.put(Partition::Normal, "fresh", record_at("fresh", NOW));
        for i in 0..10 {
            drop(cache.try_lock(&format!("abandoned-{i}")));
        }

        let report = sweeper_with(&cache).sweep_at(NOW);

        assert_eq!(report.pruned_locks, 10);
        assert_eq!(cache.lock_count(), 1);
        assert!(cache.contains(Partition::Normal, "fresh"));
    }

    #[test]
    fn policy_from_config() {
        let policy = RetentionPolicy::from(&StoreConfig::default());
        assert_eq!(policy.for_partition(Partition::Normal), 3600.0);
        assert_eq!(policy.for_partition(Partition::Test), 240.0);
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_loop_evicts_and_stops() {
        let cache = Arc::new(LocalCache::new());
        cache.put(Partition::Normal, "old", record_at("old", 1.0));

        let handle = sweeper_with(&cache).spawn(Duration::from_secs(30));
        assert!(handle.is_running());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(!cache.contains(Partition::Normal, "old"));

        handle.stop().await;
    }
}
