//! Orchestrator module for the route network indexer.
//!
//! The catch-up controller builds a new collection generation, replays the
//! event log into it, swaps the alias onto it, removes superseded
//! generations, and then follows the log until shutdown.
//!
//! Only one instance should run against a given alias at a time: concurrent
//! instances each build and swap their own generation, and the alias ends up
//! on whichever swapped last.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, instrument, warn};

use crate::consumer::EventSource;
use crate::errors::OrchestratorError;
use crate::health::ReadinessProbe;
use crate::loader::ProjectionDispatcher;
use route_network_indexer_repository::{
    CollectionConfig, CollectionSchema, SearchIndexError, SearchIndexProvider,
};

/// Default pause between catch-up rounds.
const DEFAULT_CATCH_UP_INTERVAL_MS: u64 = 125;

/// Default interval between progress log lines while live.
const DEFAULT_PROGRESS_INTERVAL_SECS: u64 = 10;

/// Configuration for the catch-up controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Pause between catch-up rounds while live.
    pub catch_up_interval: Duration,
    /// Interval between progress log lines while live.
    pub progress_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            catch_up_interval: Duration::from_millis(DEFAULT_CATCH_UP_INTERVAL_MS),
            progress_interval: Duration::from_secs(DEFAULT_PROGRESS_INTERVAL_SECS),
        }
    }
}

/// Lifecycle state of the catch-up controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Creating the new collection generation.
    Bootstrapping,
    /// Replaying the full event log into the new generation.
    Replaying,
    /// Pointing the alias at the new generation.
    Swapping,
    /// Deleting superseded generations.
    Cleaning,
    /// Ready, following the event log.
    Live,
    /// Stopped after a shutdown request or signal. No longer ready.
    Stopped,
}

/// Requests shutdown of a running controller.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    shutdown_tx: broadcast::Sender<()>,
}

impl ShutdownHandle {
    /// Stop the live loop at its next sleep boundary.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Controller driving the replay-then-follow lifecycle.
pub struct CatchUpController {
    provider: Arc<dyn SearchIndexProvider>,
    event_source: Box<dyn EventSource>,
    collection_config: CollectionConfig,
    readiness: ReadinessProbe,
    config: ControllerConfig,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_rx: broadcast::Receiver<()>,
    state_tx: watch::Sender<ControllerState>,
    generation: Option<String>,
    /// When a replay or catch-up round last delivered at least one batch.
    last_batch_received_at: Option<DateTime<Utc>>,
}

impl CatchUpController {
    /// Create a new controller with the default configuration.
    pub fn new(
        provider: Arc<dyn SearchIndexProvider>,
        event_source: Box<dyn EventSource>,
        collection_config: CollectionConfig,
        readiness: ReadinessProbe,
    ) -> Self {
        Self::with_config(
            provider,
            event_source,
            collection_config,
            readiness,
            ControllerConfig::default(),
        )
    }

    /// Create a new controller with custom configuration.
    pub fn with_config(
        provider: Arc<dyn SearchIndexProvider>,
        event_source: Box<dyn EventSource>,
        collection_config: CollectionConfig,
        readiness: ReadinessProbe,
        config: ControllerConfig,
    ) -> Self {
        // Subscribed up front so a shutdown requested before `run` is not lost.
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (state_tx, _) = watch::channel(ControllerState::Bootstrapping);

        Self {
            provider,
            event_source,
            collection_config,
            readiness,
            config,
            shutdown_tx,
            shutdown_rx,
            state_tx,
            generation: None,
            last_batch_received_at: None,
        }
    }

    /// A handle that can stop the controller from another task.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shutdown_tx: self.shutdown_tx.clone(),
        }
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Observe lifecycle state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ControllerState> {
        self.state_tx.subscribe()
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ControllerState {
        *self.state_tx.borrow()
    }

    /// The collection generation built by this run, once created.
    pub fn generation(&self) -> Option<&str> {
        self.generation.as_deref()
    }

    /// When the event source last delivered a batch.
    pub fn last_batch_received_at(&self) -> Option<DateTime<Utc>> {
        self.last_batch_received_at
    }

    fn set_state(&self, state: ControllerState) {
        info!(state = ?state, "Controller state changed");
        self.state_tx.send_replace(state);
    }

    fn record_delivery(&mut self, batches: u64) {
        if batches > 0 {
            self.last_batch_received_at = Some(Utc::now());
        }
    }

    /// Run the controller.
    ///
    /// Returns once shutdown is requested while live. Any error is fatal:
    /// the caller should exit so that a supervisor restarts the process.
    #[instrument(skip(self), fields(alias = %self.collection_config.alias))]
    pub async fn run(&mut self) -> Result<(), OrchestratorError> {
        info!("Starting route network catch-up controller");

        self.readiness.reset().await?;

        let generation = self.bootstrap().await?;
        let dispatcher = Arc::new(ProjectionDispatcher::new(
            self.provider.clone(),
            generation.clone(),
        ));

        self.replay(&generation, &dispatcher).await?;
        self.swap(&generation).await?;
        self.clean(&generation).await;

        self.readiness.mark_ready().await?;
        self.set_state(ControllerState::Live);

        self.follow(&dispatcher).await;

        let stats = dispatcher.stats();
        info!(
            collection = %generation,
            events_processed = stats.events_processed,
            documents_written = stats.documents_written,
            documents_deleted = stats.documents_deleted,
            failed_events = stats.failed_events,
            "Controller shutdown complete"
        );

        if let Err(e) = self.readiness.reset().await {
            warn!(error = %e, "Failed to remove readiness sentinel");
        }
        self.set_state(ControllerState::Stopped);
        Ok(())
    }

    /// Create a fresh collection generation.
    async fn bootstrap(&mut self) -> Result<String, OrchestratorError> {
        self.set_state(ControllerState::Bootstrapping);

        let alias = &self.collection_config.alias;
        let previous = self
            .provider
            .retrieve_collection_alias(alias)
            .await
            .map_err(OrchestratorError::Bootstrap)?;

        let generation = self.collection_config.new_generation();
        info!(
            collection = %generation,
            previous = ?previous,
            "Creating collection generation"
        );

        self.provider
            .create_collection(&generation, &CollectionSchema::route_node())
            .await
            .map_err(OrchestratorError::Bootstrap)?;

        self.generation = Some(generation.clone());
        Ok(generation)
    }

    /// Replay the full event log into the new generation.
    async fn replay(
        &mut self,
        generation: &str,
        dispatcher: &Arc<ProjectionDispatcher>,
    ) -> Result<(), OrchestratorError> {
        self.set_state(ControllerState::Replaying);
        info!(collection = %generation, "Starting initial replay of the event log");

        let started = Instant::now();
        match self.event_source.replay_all(dispatcher.as_ref()).await {
            Ok(batches) => {
                self.record_delivery(batches);
                let stats = dispatcher.stats();
                info!(
                    batches,
                    events_processed = stats.events_processed,
                    documents_written = stats.documents_written,
                    documents_deleted = stats.documents_deleted,
                    failed_events = stats.failed_events,
                    elapsed_secs = started.elapsed().as_secs(),
                    "Finished initial replay"
                );
                Ok(())
            }
            Err(e) => {
                error!(collection = %generation, error = %e, "Replay failed, cleaning up");
                self.discard_generation(generation).await;
                Err(OrchestratorError::Replay(e))
            }
        }
    }

    /// Point the alias at the new generation.
    async fn swap(&mut self, generation: &str) -> Result<(), OrchestratorError> {
        self.set_state(ControllerState::Swapping);

        let alias = self.collection_config.alias.clone();
        info!(alias = %alias, collection = %generation, "Upserting alias");

        if let Err(e) = self.provider.upsert_collection_alias(&alias, generation).await {
            error!(alias = %alias, collection = %generation, error = %e, "Alias swap failed, cleaning up");
            self.discard_generation(generation).await;
            return Err(OrchestratorError::Swap(e));
        }
        Ok(())
    }

    /// Delete every generation of the alias except `current`.
    ///
    /// Best effort: failures are logged and left for the next run.
    ///
    /// # Returns
    ///
    /// The number of collections deleted.
    async fn clean(&mut self, current: &str) -> usize {
        self.set_state(ControllerState::Cleaning);

        let collections = match self.provider.list_collections().await {
            Ok(collections) => collections,
            Err(e) => {
                warn!(error = %e, "Failed to list collections, skipping cleanup");
                return 0;
            }
        };

        let mut deleted = 0;
        for collection in collections
            .iter()
            .filter(|c| self.collection_config.is_generation(c) && c.as_str() != current)
        {
            info!(collection = %collection, "Deleting superseded collection");
            match self.provider.delete_collection(collection).await {
                Ok(()) => deleted += 1,
                Err(e) if e.is_not_found() => {
                    info!(collection = %collection, "Collection already deleted");
                }
                Err(e) => {
                    warn!(collection = %collection, error = %e, "Failed to delete superseded collection");
                }
            }
        }
        deleted
    }

    /// Delete a partially built generation so it is not left orphaned.
    async fn discard_generation(&self, generation: &str) {
        match self.provider.delete_collection(generation).await {
            Ok(()) => info!(collection = %generation, "Deleted partial collection"),
            Err(SearchIndexError::CollectionNotFound(_)) => {
                debug!(collection = %generation, "Partial collection already gone")
            }
            Err(e) => {
                error!(collection = %generation, error = %e, "Failed to delete partial collection")
            }
        }
    }

    /// Follow the event log until shutdown.
    ///
    /// A catch-up round always runs to completion; shutdown requests and
    /// signals received meanwhile are observed once the round returns.
    async fn follow(&mut self, dispatcher: &Arc<ProjectionDispatcher>) {
        info!(collection = %dispatcher.collection(), "Starting listening for new events");

        let signal_listener = spawn_signal_listener(self.shutdown_tx.clone());

        let mut last_progress = Instant::now();
        let mut prev_events = dispatcher.stats().events_processed;

        loop {
            match self.event_source.catch_up(dispatcher.as_ref()).await {
                Ok(batches) => {
                    if batches > 0 {
                        debug!(batches, "Caught up with new batches");
                    }
                    self.record_delivery(batches);
                }
                Err(e) => {
                    error!(error = %e, "Catch-up failed, retrying next round");
                }
            }

            if last_progress.elapsed() >= self.config.progress_interval {
                let stats = dispatcher.stats();
                let elapsed_secs = last_progress.elapsed().as_secs_f64();
                let events_per_sec =
                    (stats.events_processed.saturating_sub(prev_events) as f64) / elapsed_secs;

                info!(
                    events_processed = stats.events_processed,
                    documents_written = stats.documents_written,
                    documents_deleted = stats.documents_deleted,
                    failed_events = stats.failed_events,
                    events_per_sec = format!("{:.2}", events_per_sec),
                    last_batch_received_at = ?self.last_batch_received_at,
                    "Processing progress"
                );

                prev_events = stats.events_processed;
                last_progress = Instant::now();
            }

            tokio::select! {
                _ = sleep(self.config.catch_up_interval) => {}
                _ = self.shutdown_rx.recv() => {
                    info!("Received shutdown request");
                    break;
                }
            }
        }

        signal_listener.abort();
    }
}

/// Forward SIGINT and SIGTERM to the shutdown channel.
///
/// The listener is installed once, so a signal arriving while a catch-up
/// round is in flight is kept until the loop next checks for shutdown.
fn spawn_signal_listener(shutdown_tx: broadcast::Sender<()>) -> JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(());
    })
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            warn!(error = %e, "Failed to install SIGTERM handler, listening for Ctrl-C only");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
