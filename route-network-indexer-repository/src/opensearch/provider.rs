//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use opensearch::{
    cat::CatIndicesParts,
    http::{
        response::Response,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
    indices::{IndicesCreateParts, IndicesDeleteParts, IndicesGetAliasParts},
    CreateParts, DeleteParts, GetParts, IndexParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::index_config::get_index_settings;
use crate::types::CollectionSchema;
use route_network_indexer_shared::RouteNodeDocument;

/// OpenSearch provider implementation.
///
/// # Example
///
/// ```ignore
/// use route_network_indexer_repository::{CollectionSchema, OpenSearchProvider, SearchIndexProvider};
///
/// let provider = OpenSearchProvider::new("http://localhost:9200").await?;
/// provider
///     .create_collection("route-nodes-1", &CollectionSchema::route_node())
///     .await?;
/// provider.upsert_collection_alias("route-nodes", "route-nodes-1").await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If connection setup fails
    pub async fn new(url: &str) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, "Created OpenSearch provider");

        Ok(Self { client })
    }

    /// Check that the cluster answers requests.
    pub async fn ping(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Err(SearchIndexError::connection(format!(
                "Ping failed with status {}",
                response.status_code()
            )));
        }
        Ok(())
    }

    /// Turn an unsuccessful response into a request error, logging the body.
    async fn failure(response: Response, operation: &str) -> SearchIndexError {
        let status = response.status_code();
        let error_body = response.text().await.unwrap_or_default();
        error!(status = %status, body = %error_body, operation, "Request failed");
        SearchIndexError::request(format!(
            "{} failed with status {}: {}",
            operation, status, error_body
        ))
    }

    /// Collections currently holding the alias.
    async fn aliased_collections(&self, alias: &str) -> Result<Vec<String>, SearchIndexError> {
        let response = self
            .client
            .indices()
            .get_alias(IndicesGetAliasParts::Name(&[alias]))
            .send()
            .await
            .map_err(|e| SearchIndexError::request(e.to_string()))?;

        if response.status_code().as_u16() == 404 {
            return Ok(Vec::new());
        }
        if !response.status_code().is_success() {
            return Err(Self::failure(response, "Get alias").await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;
        Ok(collections_from_alias_response(&body))
    }
}

/// Index names from a `GET /_alias/<name>` response, sorted.
///
/// The response is an object keyed by index name.
fn collections_from_alias_response(body: &Value) -> Vec<String> {
    let mut collections: Vec<String> = body
        .as_object()
        .map(|indices| indices.keys().cloned().collect())
        .unwrap_or_default();
    collections.sort();
    collections
}

/// Index names from a `GET /_cat/indices?format=json` response.
fn collections_from_cat_response(body: &Value) -> Vec<String> {
    body.as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| row.get("index").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Build the `_aliases` actions that move `alias` onto `collection`.
///
/// All actions are applied atomically by OpenSearch.
fn alias_swap_actions(alias: &str, previous: &[String], collection: &str) -> Value {
    let mut actions: Vec<Value> = previous
        .iter()
        .filter(|index| index.as_str() != collection)
        .map(|index| json!({ "remove": { "index": index, "alias": alias } }))
        .collect();
    actions.push(json!({ "add": { "index": collection, "alias": alias } }));
    json!({ "actions": actions })
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    async fn create_collection(
        &self,
        name: &str,
        schema: &CollectionSchema,
    ) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(name))
            .body(get_index_settings(schema))
            .send()
            .await
            .map_err(|e| SearchIndexError::request(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            if error_body.contains("resource_already_exists_exception") {
                return Err(SearchIndexError::collection_already_exists(name));
            }
            error!(status = %status, body = %error_body, "Create collection request failed");
            return Err(SearchIndexError::request(format!(
                "Create collection failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(collection = %name, "Collection created");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| SearchIndexError::request(e.to_string()))?;

        if response.status_code().as_u16() == 404 {
            return Err(SearchIndexError::collection_not_found(name));
        }
        if !response.status_code().is_success() {
            return Err(Self::failure(response, "Delete collection").await);
        }

        debug!(collection = %name, "Collection deleted");
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>, SearchIndexError> {
        let response = self
            .client
            .cat()
            .indices(CatIndicesParts::None)
            .format("json")
            .h(&["index"])
            .send()
            .await
            .map_err(|e| SearchIndexError::request(e.to_string()))?;

        if !response.status_code().is_success() {
            return Err(Self::failure(response, "List collections").await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;
        Ok(collections_from_cat_response(&body))
    }

    async fn upsert_collection_alias(
        &self,
        alias: &str,
        collection: &str,
    ) -> Result<(), SearchIndexError> {
        let previous = self.aliased_collections(alias).await?;

        let response = self
            .client
            .indices()
            .update_aliases()
            .body(alias_swap_actions(alias, &previous, collection))
            .send()
            .await
            .map_err(|e| SearchIndexError::request(e.to_string()))?;

        if response.status_code().as_u16() == 404 {
            return Err(SearchIndexError::collection_not_found(collection));
        }
        if !response.status_code().is_success() {
            return Err(Self::failure(response, "Upsert alias").await);
        }

        debug!(alias = %alias, collection = %collection, previous = ?previous, "Alias upserted");
        Ok(())
    }

    async fn retrieve_collection_alias(
        &self,
        alias: &str,
    ) -> Result<Option<String>, SearchIndexError> {
        Ok(self.aliased_collections(alias).await?.into_iter().next())
    }

    async fn create_document(
        &self,
        collection: &str,
        document: &RouteNodeDocument,
    ) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .create(CreateParts::IndexId(collection, document.document_id()))
            .body(document)
            .send()
            .await
            .map_err(|e| SearchIndexError::request(e.to_string()))?;

        let status = response.status_code();
        match status.as_u16() {
            409 => {
                return Err(SearchIndexError::document_already_exists(
                    collection,
                    document.document_id(),
                ))
            }
            404 => return Err(SearchIndexError::collection_not_found(collection)),
            _ => {}
        }
        if !status.is_success() {
            return Err(Self::failure(response, "Create document").await);
        }

        debug!(collection = %collection, id = %document.id, "Document created");
        Ok(())
    }

    async fn upsert_document(
        &self,
        collection: &str,
        document: &RouteNodeDocument,
    ) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .index(IndexParts::IndexId(collection, document.document_id()))
            .body(document)
            .send()
            .await
            .map_err(|e| SearchIndexError::request(e.to_string()))?;

        if response.status_code().as_u16() == 404 {
            return Err(SearchIndexError::collection_not_found(collection));
        }
        if !response.status_code().is_success() {
            return Err(Self::failure(response, "Upsert document").await);
        }

        debug!(collection = %collection, id = %document.id, "Document upserted");
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .delete(DeleteParts::IndexId(collection, id))
            .send()
            .await
            .map_err(|e| SearchIndexError::request(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            // A 404 is either a missing document or a missing index.
            let error_body = response.text().await.unwrap_or_default();
            if error_body.contains("index_not_found_exception") {
                return Err(SearchIndexError::collection_not_found(collection));
            }
            return Err(SearchIndexError::document_not_found(collection, id));
        }
        if !status.is_success() {
            return Err(Self::failure(response, "Delete document").await);
        }

        debug!(collection = %collection, id = %id, "Document deleted");
        Ok(())
    }

    async fn retrieve_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<RouteNodeDocument, SearchIndexError> {
        let response = self
            .client
            .get(GetParts::IndexId(collection, id))
            .send()
            .await
            .map_err(|e| SearchIndexError::request(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            let error_body = response.text().await.unwrap_or_default();
            if error_body.contains("index_not_found_exception") {
                return Err(SearchIndexError::collection_not_found(collection));
            }
            return Err(SearchIndexError::document_not_found(collection, id));
        }
        if !status.is_success() {
            return Err(Self::failure(response, "Retrieve document").await);
        }

        let mut body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;
        serde_json::from_value(body["_source"].take())
            .map_err(|e| SearchIndexError::parse(format!("Invalid document source: {}", e)))
    }
}
