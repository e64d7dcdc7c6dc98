//! Route node document type for the search index.
//!
//! This module defines the document structure that is indexed in the search engine.

use serde::{Deserialize, Serialize};

/// Document representation of a route node in the search index.
///
/// # Fields
///
/// - `id`: The route node identifier, used as the document's primary key
/// - `name`: The trimmed, non-empty node name (the only searchable field)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteNodeDocument {
    pub id: String,
    pub name: String,
}

impl RouteNodeDocument {
    /// Create a new route node document.
    ///
    /// # Example
    ///
    /// ```
    /// use route_network_indexer_shared::RouteNodeDocument;
    ///
    /// let doc = RouteNodeDocument::new("0b2f6c1e-3c55-4a4e-9d6c-1f1b1b1b1b1b", "Central Hub");
    /// assert_eq!(doc.name, "Central Hub");
    /// ```
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// The document ID used in the search index.
    pub fn document_id(&self) -> &str {
        &self.id
    }
}
