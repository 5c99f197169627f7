//! Application state wiring the sync engine to its infrastructure.
//!
//! The engine is generic over the remote client and anonymizer; AppState pins
//! it to the GraphQL client and the regex anonymizer.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracksync_core::SyncEngine;
use tracksync_core::broadcast::TrackerEventBus;
use tracksync_core::domain::TrackerFactory;
use tracksync_infra::config::load_api_key;
use tracksync_infra::domain::load_domain;
use tracksync_infra::{GraphqlRemoteClient, RegexAnonymizer};
use tracksync_types::config::StoreConfig;
use tracksync_types::domain::Domain;

/// Capacity of the in-process tracker event channel.
const EVENT_BUS_CAPACITY: usize = 256;

pub type ConcreteSyncEngine = SyncEngine<GraphqlRemoteClient, RegexAnonymizer>;

/// Shared application state, used by both CLI commands and HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConcreteSyncEngine>,
    pub config: Arc<StoreConfig>,
    pub events: TrackerEventBus,
}

impl AppState {
    /// Build the state from a loaded configuration: create the GraphQL
    /// client and load the domain file if one is configured.
    pub async fn init(config: StoreConfig) -> anyhow::Result<Self> {
        let api_key = load_api_key(|key| std::env::var(key).ok());
        if api_key.is_none() {
            tracing::debug!("No API key configured, remote calls are unauthenticated");
        }
        let remote = GraphqlRemoteClient::from_config(&config, api_key)?;

        let domain = match &config.domain_path {
            Some(path) => Some(load_domain(path).await?),
            None => {
                tracing::warn!("No domain_path configured, trackers cannot be rebuilt");
                None
            }
        };

        Self::from_parts(config, remote, domain)
    }

    pub fn from_parts(
        config: StoreConfig,
        remote: GraphqlRemoteClient,
        domain: Option<Domain>,
    ) -> anyhow::Result<Self> {
        let events = TrackerEventBus::new(EVENT_BUS_CAPACITY);
        let engine = SyncEngine::new(config.clone(), remote, RegexAnonymizer::new())?
            .with_broadcaster(Arc::new(events.clone()))
            .with_tracker_factory(TrackerFactory::new(domain));

        Ok(Self {
            engine: Arc::new(engine),
            config: Arc::new(config),
            events,
        })
    }

    /// Log every tracker event published on the bus at debug level.
    ///
    /// The task runs until aborted or until every bus sender is gone.
    pub fn spawn_event_log(&self) -> JoinHandle<()> {
        let mut rx = self.events.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(tracked) => tracing::debug!(
                        sender_id = %tracked.sender_id,
                        kind = %tracked.event.kind,
                        timestamp = tracked.event.timestamp,
                        "Tracker event"
                    ),
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Tracker event log fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::time::Duration;

    /// State whose remote store refuses every connection, so all calls fall
    /// back to the local cache.
    pub async fn offline_state() -> AppState {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let remote =
            GraphqlRemoteClient::new(format!("http://{addr}/graphql"), Duration::from_secs(2), None)
                .unwrap();
        let config = StoreConfig {
            project_id: "bf".to_string(),
            ..StoreConfig::default()
        };
        AppState::from_parts(config, remote, Some(Domain::default())).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::offline_state;
    use tracksync_core::cache::Partition;
    use tracksync_types::tracker::{ConversationRecord, Event};

    #[tokio::test]
    async fn saves_are_broadcast_on_the_event_bus() {
        let state = offline_state().await;
        let mut rx = state.events.subscribe();

        state
            .engine
            .save(ConversationRecord::new("abc", vec![Event::new("bot", 1.0)]))
            .await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.sender_id, "abc");
        assert!(state.engine.cache().contains(Partition::Normal, "abc"));
    }

    #[tokio::test]
    async fn event_log_subscribes_until_aborted() {
        let state = offline_state().await;
        assert_eq!(state.events.receiver_count(), 0);

        let log = state.spawn_event_log();
        assert_eq!(state.events.receiver_count(), 1);

        state
            .engine
            .save(ConversationRecord::new("abc", vec![Event::new("bot", 1.0)]))
            .await;
        tokio::task::yield_now().await;
        assert!(!log.is_finished());

        log.abort();
        assert!(log.await.unwrap_err().is_cancelled());
        assert_eq!(state.events.receiver_count(), 0);
    }
}
