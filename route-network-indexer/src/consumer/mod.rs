//! Consumer module for the route network indexer.
//!
//! Provides the event source contract, the route network event model and a
//! Kafka event source.

mod event_source;
mod kafka_consumer;
mod messages;

pub use event_source::{EditOperationHandler, EventSource};
pub use kafka_consumer::KafkaEventSource;
pub use messages::{NamingInfo, RouteNetworkCommand, RouteNetworkEditOperation, RouteNetworkEvent};
