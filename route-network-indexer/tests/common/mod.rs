//! Test doubles shared by the integration tests: an in-memory search index
//! and a scripted event source.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use route_network_indexer::consumer::{
    EditOperationHandler, EventSource, NamingInfo, RouteNetworkEditOperation, RouteNetworkEvent,
};
use route_network_indexer::errors::ConsumerError;
use route_network_indexer::health::ReadinessProbe;
use route_network_indexer::orchestrator::{CatchUpController, ControllerConfig};
use route_network_indexer_repository::{
    CollectionConfig, CollectionSchema, SearchIndexError, SearchIndexProvider,
};
use route_network_indexer_shared::RouteNodeDocument;

pub const ALIAS: &str = "route-nodes";
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
pub struct IndexState {
    collections: HashMap<String, HashMap<String, RouteNodeDocument>>,
    aliases: HashMap<String, String>,
    deleted_collections: Vec<String>,
}

// In-memory search index
#[derive(Default)]
pub struct InMemorySearchProvider {
    pub state: Mutex<IndexState>,
    /// Listed by `list_collections` but already gone when deleted.
    pub phantom_collections: Vec<String>,
    /// Deleting these fails with a non-not-found error.
    pub undeletable_collections: Vec<String>,
    pub fail_create_collection: bool,
    pub fail_alias: bool,
}

impl InMemorySearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a previous generation bound to the alias.
    pub fn with_previous_generation(self, collection: &str, docs: &[(&str, &str)]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let documents = docs
                .iter()
                .map(|(id, name)| (id.to_string(), RouteNodeDocument::new(*id, *name)))
                .collect();
            state.collections.insert(collection.to_string(), documents);
            state.aliases.insert(ALIAS.to_string(), collection.to_string());
        }
        self
    }

    pub fn with_collection(self, collection: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .collections
            .insert(collection.to_string(), HashMap::new());
        self
    }

    pub fn alias_target(&self) -> Option<String> {
        self.state.lock().unwrap().aliases.get(ALIAS).cloned()
    }

    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .state
            .lock()
            .unwrap()
            .collections
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn deleted_collections(&self) -> Vec<String> {
        let mut names = self.state.lock().unwrap().deleted_collections.clone();
        names.sort();
        names
    }

    pub fn document(&self, collection: &str, id: &str) -> Option<RouteNodeDocument> {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id).cloned())
    }

    pub fn document_count(&self, collection: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl SearchIndexProvider for InMemorySearchProvider {
    async fn create_collection(
        &self,
        name: &str,
        _schema: &CollectionSchema,
    ) -> Result<(), SearchIndexError> {
        if self.fail_create_collection {
            return Err(SearchIndexError::connection("Mock cluster unavailable"));
        }
        let mut state = self.state.lock().unwrap();
        if state.collections.contains_key(name) {
            return Err(SearchIndexError::collection_already_exists(name));
        }
        state.collections.insert(name.to_string(), HashMap::new());
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), SearchIndexError> {
        if self.undeletable_collections.iter().any(|c| c == name) {
            return Err(SearchIndexError::request("Mock delete failure"));
        }
        let mut state = self.state.lock().unwrap();
        match state.collections.remove(name) {
            Some(_) => {
                state.deleted_collections.push(name.to_string());
                Ok(())
            }
            None => Err(SearchIndexError::collection_not_found(name)),
        }
    }

    async fn list_collections(&self) -> Result<Vec<String>, SearchIndexError> {
        let mut names = self.collection_names();
        names.extend(self.phantom_collections.iter().cloned());
        Ok(names)
    }

    async fn upsert_collection_alias(
        &self,
        alias: &str,
        collection: &str,
    ) -> Result<(), SearchIndexError> {
        if self.fail_alias {
            return Err(SearchIndexError::request("Mock alias failure"));
        }
        let mut state = self.state.lock().unwrap();
        if !state.collections.contains_key(collection) {
            return Err(SearchIndexError::collection_not_found(collection));
        }
        state
            .aliases
            .insert(alias.to_string(), collection.to_string());
        Ok(())
    }

    async fn retrieve_collection_alias(
        &self,
        alias: &str,
    ) -> Result<Option<String>, SearchIndexError> {
        Ok(self.state.lock().unwrap().aliases.get(alias).cloned())
    }

    async fn create_document(
        &self,
        collection: &str,
        document: &RouteNodeDocument,
    ) -> Result<(), SearchIndexError> {
        let mut state = self.state.lock().unwrap();
        let docs = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| SearchIndexError::collection_not_found(collection))?;
        if docs.contains_key(&document.id) {
            return Err(SearchIndexError::document_already_exists(
                collection,
                &document.id,
            ));
        }
        docs.insert(document.id.clone(), document.clone());
        Ok(())
    }

    async fn upsert_document(
        &self,
        collection: &str,
        document: &RouteNodeDocument,
    ) -> Result<(), SearchIndexError> {
        let mut state = self.state.lock().unwrap();
        let docs = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| SearchIndexError::collection_not_found(collection))?;
        docs.insert(document.id.clone(), document.clone());
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), SearchIndexError> {
        let mut state = self.state.lock().unwrap();
        let docs = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| SearchIndexError::collection_not_found(collection))?;
        docs.remove(id)
            .map(|_| ())
            .ok_or_else(|| SearchIndexError::document_not_found(collection, id))
    }

    async fn retrieve_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<RouteNodeDocument, SearchIndexError> {
        self.document(collection, id)
            .ok_or_else(|| SearchIndexError::document_not_found(collection, id))
    }
}

// Scripted event source
pub struct ScriptedEventSource {
    pub history: Vec<RouteNetworkEditOperation>,
    pub live: Arc<Mutex<VecDeque<RouteNetworkEditOperation>>>,
    pub fail_replay_after: Option<usize>,
    pub catch_up_rounds: Arc<AtomicUsize>,
    pub completed_rounds: Arc<AtomicUsize>,
    /// How long each catch-up round takes.
    pub round_delay: Duration,
}

impl ScriptedEventSource {
    pub fn new(history: Vec<RouteNetworkEditOperation>) -> Self {
        Self {
            history,
            live: Arc::new(Mutex::new(VecDeque::new())),
            fail_replay_after: None,
            catch_up_rounds: Arc::new(AtomicUsize::new(0)),
            completed_rounds: Arc::new(AtomicUsize::new(0)),
            round_delay: Duration::ZERO,
        }
    }

    pub fn failing_after(history: Vec<RouteNetworkEditOperation>, delivered: usize) -> Self {
        Self {
            fail_replay_after: Some(delivered),
            ..Self::new(history)
        }
    }
}

#[async_trait::async_trait]
impl EventSource for ScriptedEventSource {
    async fn replay_all(
        &mut self,
        handler: &dyn EditOperationHandler,
    ) -> Result<u64, ConsumerError> {
        let mut delivered = 0u64;
        for (i, operation) in self.history.iter().enumerate() {
            if self.fail_replay_after == Some(i) {
                return Err(ConsumerError::source("Mock log unavailable"));
            }
            handler.handle(operation).await;
            delivered += 1;
        }
        Ok(delivered)
    }

    async fn catch_up(
        &mut self,
        handler: &dyn EditOperationHandler,
    ) -> Result<u64, ConsumerError> {
        self.catch_up_rounds.fetch_add(1, Ordering::SeqCst);
        let pending: Vec<RouteNetworkEditOperation> = self.live.lock().unwrap().drain(..).collect();
        if !self.round_delay.is_zero() {
            sleep(self.round_delay).await;
        }
        for operation in &pending {
            handler.handle(operation).await;
        }
        self.completed_rounds.fetch_add(1, Ordering::SeqCst);
        Ok(pending.len() as u64)
    }
}

pub fn named(name: &str) -> Option<NamingInfo> {
    Some(NamingInfo {
        name: Some(name.to_string()),
        description: None,
    })
}

pub fn node_added(id: &str, name: &str) -> RouteNetworkEvent {
    RouteNetworkEvent::RouteNodeAdded {
        node_id: id.to_string(),
        naming_info: named(name),
    }
}

pub fn route_node_renamed(id: &str, name: &str) -> RouteNetworkEvent {
    RouteNetworkEvent::NamingInfoModified {
        aggregate_type: "RouteNode".to_string(),
        aggregate_id: id.to_string(),
        naming_info: named(name),
    }
}

pub fn node_deleted(id: &str) -> RouteNetworkEvent {
    RouteNetworkEvent::RouteNodeMarkedForDeletion {
        node_id: id.to_string(),
    }
}

pub fn batch(events: Vec<RouteNetworkEvent>) -> RouteNetworkEditOperation {
    RouteNetworkEditOperation::from_events(events)
}

pub fn test_config() -> ControllerConfig {
    ControllerConfig {
        catch_up_interval: Duration::from_millis(10),
        progress_interval: Duration::from_secs(10),
    }
}

pub fn controller(
    provider: Arc<InMemorySearchProvider>,
    source: ScriptedEventSource,
    readiness: ReadinessProbe,
) -> CatchUpController {
    CatchUpController::with_config(
        provider,
        Box::new(source),
        CollectionConfig::new(ALIAS).unwrap(),
        readiness,
        test_config(),
    )
}
