//! # Route Network Indexer Shared
//!
//! This crate defines shared data structures used across the route network
//! search indexer. It includes the document type stored in the route node index.

pub mod types;

pub use types::route_node_document::RouteNodeDocument;
