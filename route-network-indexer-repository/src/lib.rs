//! # Route Network Indexer Repository
//!
//! This crate provides the search index client used by the route network
//! indexer: the `SearchIndexProvider` trait, its error type, collection
//! schema and generation naming, and a concrete implementation for OpenSearch.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod types;

pub use config::CollectionConfig;
pub use errors::SearchIndexError;
pub use interfaces::SearchIndexProvider;
pub use opensearch::OpenSearchProvider;
pub use types::{CollectionSchema, FieldType, SchemaField};
