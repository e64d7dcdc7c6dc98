//! Search index provider trait definition.
//!
//! This module defines the abstract interface for collection, alias and
//! document operations, allowing for different backend implementations.

use async_trait::async_trait;

use crate::errors::SearchIndexError;
use crate::types::CollectionSchema;
use route_network_indexer_shared::RouteNodeDocument;

/// Abstracts the underlying search engine.
///
/// Implementations are injected into the indexer so the catch-up controller
/// and the projection dispatcher can be tested against in-memory fakes.
///
/// Missing collections and documents surface as
/// [`SearchIndexError::CollectionNotFound`] and
/// [`SearchIndexError::DocumentNotFound`]; callers decide whether that is
/// an error.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Create a collection with the given schema.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the collection was created
    /// * `Err(SearchIndexError::CollectionAlreadyExists)` - If the name is taken
    /// * `Err(SearchIndexError)` - If the operation fails
    async fn create_collection(
        &self,
        name: &str,
        schema: &CollectionSchema,
    ) -> Result<(), SearchIndexError>;

    /// Delete a collection.
    ///
    /// Fails with `CollectionNotFound` if the collection is already gone.
    async fn delete_collection(&self, name: &str) -> Result<(), SearchIndexError>;

    /// List the names of all collections.
    async fn list_collections(&self) -> Result<Vec<String>, SearchIndexError>;

    /// Point `alias` at `collection`, replacing any previous target.
    ///
    /// Readers observe either the previous or the new target, never both and
    /// never neither.
    async fn upsert_collection_alias(
        &self,
        alias: &str,
        collection: &str,
    ) -> Result<(), SearchIndexError>;

    /// The collection the alias currently points at, if any.
    async fn retrieve_collection_alias(
        &self,
        alias: &str,
    ) -> Result<Option<String>, SearchIndexError>;

    /// Create a document. Fails with `DocumentAlreadyExists` if the id is taken.
    async fn create_document(
        &self,
        collection: &str,
        document: &RouteNodeDocument,
    ) -> Result<(), SearchIndexError>;

    /// Create the document, or replace it if the id already exists.
    async fn upsert_document(
        &self,
        collection: &str,
        document: &RouteNodeDocument,
    ) -> Result<(), SearchIndexError>;

    /// Delete a document. Fails with `DocumentNotFound` if it does not exist.
    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), SearchIndexError>;

    /// Retrieve a document. Fails with `DocumentNotFound` if it does not exist.
    async fn retrieve_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<RouteNodeDocument, SearchIndexError>;
}
