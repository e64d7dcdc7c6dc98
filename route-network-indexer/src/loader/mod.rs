//! Loader module for the route network indexer.
//!
//! Applies route network edit operations to one collection generation of the
//! route node index.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, instrument};

use crate::consumer::{EditOperationHandler, RouteNetworkEditOperation, RouteNetworkEvent};
use crate::processor::{DocumentMutation, RouteNodeProcessor};
use route_network_indexer_repository::{SearchIndexError, SearchIndexProvider};

/// Counters of the work done by a dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Events seen, including those that produce no mutation.
    pub events_processed: u64,
    /// Documents created or upserted.
    pub documents_written: u64,
    /// Documents deleted.
    pub documents_deleted: u64,
    /// Mutations that found no document to act on.
    pub documents_not_found: u64,
    /// Events whose mutation failed.
    pub failed_events: u64,
}

/// Dispatcher that projects edit operations into the search index.
///
/// Events are applied strictly in order. Each event is isolated: a failing
/// mutation is logged and counted, and processing continues with the next
/// event. A missing document on delete is an expected outcome of duplicate
/// or divergent delivery and is not treated as a failure.
pub struct ProjectionDispatcher {
    provider: Arc<dyn SearchIndexProvider>,
    processor: RouteNodeProcessor,
    collection: String,
    events_processed: AtomicU64,
    documents_written: AtomicU64,
    documents_deleted: AtomicU64,
    documents_not_found: AtomicU64,
    failed_events: AtomicU64,
}

impl ProjectionDispatcher {
    /// Create a dispatcher writing into `collection`.
    pub fn new(provider: Arc<dyn SearchIndexProvider>, collection: impl Into<String>) -> Self {
        Self {
            provider,
            processor: RouteNodeProcessor::new(),
            collection: collection.into(),
            events_processed: AtomicU64::new(0),
            documents_written: AtomicU64::new(0),
            documents_deleted: AtomicU64::new(0),
            documents_not_found: AtomicU64::new(0),
            failed_events: AtomicU64::new(0),
        }
    }

    /// The collection this dispatcher writes into.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Apply every event of an edit operation, commands in order, then events
    /// in order.
    #[instrument(skip(self, operation), fields(event_count = operation.event_count()))]
    pub async fn apply(&self, operation: &RouteNetworkEditOperation) {
        for event in operation.events() {
            self.apply_event(event).await;
        }
    }

    /// Apply a single event, absorbing any failure.
    async fn apply_event(&self, event: &RouteNetworkEvent) {
        self.events_processed.fetch_add(1, Ordering::Relaxed);

        let Some(mutation) = self.processor.process_event(event) else {
            return;
        };

        match self.apply_mutation(&mutation).await {
            Ok(()) => {}
            Err(SearchIndexError::DocumentNotFound(_)) => {
                self.documents_not_found.fetch_add(1, Ordering::Relaxed);
                debug!(
                    event_kind = event.kind(),
                    aggregate_id = ?event.aggregate_id(),
                    document_id = mutation.document_id(),
                    "Document already absent"
                );
            }
            Err(e) => {
                self.failed_events.fetch_add(1, Ordering::Relaxed);
                error!(
                    event_kind = event.kind(),
                    aggregate_id = ?event.aggregate_id(),
                    document_id = mutation.document_id(),
                    collection = %self.collection,
                    error = %e,
                    "Failed to project event"
                );
            }
        }
    }

    /// Apply one mutation to the collection.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the mutation was applied
    /// * `Err(SearchIndexError)` - As reported by the provider, including
    ///   `DocumentNotFound` for deletes of missing documents
    pub async fn apply_mutation(&self, mutation: &DocumentMutation) -> Result<(), SearchIndexError> {
        match mutation {
            DocumentMutation::Create(doc) => {
                self.provider.create_document(&self.collection, doc).await?;
                self.documents_written.fetch_add(1, Ordering::Relaxed);
                debug!(id = %doc.id, "Route node created");
            }
            DocumentMutation::Upsert(doc) => {
                self.provider.upsert_document(&self.collection, doc).await?;
                self.documents_written.fetch_add(1, Ordering::Relaxed);
                debug!(id = %doc.id, "Route node upserted");
            }
            DocumentMutation::Delete { id } => {
                self.provider.delete_document(&self.collection, id).await?;
                self.documents_deleted.fetch_add(1, Ordering::Relaxed);
                debug!(id = %id, "Route node deleted");
            }
        }
        Ok(())
    }

    /// A snapshot of the dispatcher's counters.
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            events_processed: self.events_processed.load(Ordering::Relaxed),
            documents_written: self.documents_written.load(Ordering::Relaxed),
            documents_deleted: self.documents_deleted.load(Ordering::Relaxed),
            documents_not_found: self.documents_not_found.load(Ordering::Relaxed),
            failed_events: self.failed_events.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl EditOperationHandler for ProjectionDispatcher {
    async fn handle(&self, operation: &RouteNetworkEditOperation) {
        self.apply(operation).await;
    }
}
