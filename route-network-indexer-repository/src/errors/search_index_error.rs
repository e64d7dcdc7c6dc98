//! Search index error types.
//!
//! This module defines the unified error type for all collection, alias and
//! document operations against the search engine.

use thiserror::Error;

/// Unified errors from search index operations.
///
/// Used by the `SearchIndexProvider` trait. The not-found variants are kept
/// distinct from other failures so callers can treat them as expected
/// outcomes (duplicate delivery, idempotent cleanup) rather than errors.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// Validation error (e.g., empty names, invalid alias).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to establish connection to the search index backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The backend rejected or failed a request.
    #[error("Request error: {0}")]
    RequestError(String),

    /// Collection does not exist.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// A collection with the same name already exists.
    #[error("Collection already exists: {0}")]
    CollectionAlreadyExists(String),

    /// Document not found.
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// A document with the same id already exists.
    #[error("Document already exists: {0}")]
    DocumentAlreadyExists(String),

    /// Failed to parse response from search index backend.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl SearchIndexError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a request error.
    pub fn request(msg: impl Into<String>) -> Self {
        Self::RequestError(msg.into())
    }

    /// Create a collection not found error.
    pub fn collection_not_found(collection: &str) -> Self {
        Self::CollectionNotFound(collection.to_string())
    }

    /// Create a collection already exists error.
    pub fn collection_already_exists(collection: &str) -> Self {
        Self::CollectionAlreadyExists(collection.to_string())
    }

    /// Create a document not found error.
    pub fn document_not_found(collection: &str, id: &str) -> Self {
        Self::DocumentNotFound(format!("collection={}, id={}", collection, id))
    }

    /// Create a document already exists error.
    pub fn document_already_exists(collection: &str, id: &str) -> Self {
        Self::DocumentAlreadyExists(format!("collection={}, id={}", collection, id))
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Whether the error reports a missing collection or document.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::CollectionNotFound(_) | Self::DocumentNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_not_found() {
        assert!(SearchIndexError::document_not_found("route-nodes-a", "42").is_not_found());
        assert!(SearchIndexError::collection_not_found("route-nodes-a").is_not_found());
        assert!(!SearchIndexError::document_already_exists("route-nodes-a", "42").is_not_found());
        assert!(!SearchIndexError::request("boom").is_not_found());
    }

    #[test]
    fn test_document_not_found_message() {
        let err = SearchIndexError::document_not_found("route-nodes-a", "42");
        assert_eq!(
            err.to_string(),
            "Document not found: collection=route-nodes-a, id=42"
        );
    }
}
