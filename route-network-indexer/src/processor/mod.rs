//! Processor module for the route network indexer.
//!
//! Maps route network events onto route node document mutations.

mod route_node_processor;

pub use route_node_processor::{normalized_name, DocumentMutation, RouteNodeProcessor};
