//! Core data structures shared by the indexer and the repository.
//! It re-exports specific types like `RouteNodeDocument`.

pub mod route_node_document;

pub use route_node_document::RouteNodeDocument;
