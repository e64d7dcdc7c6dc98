//! Error types for the route network indexer.

use thiserror::Error;

use route_network_indexer_repository::SearchIndexError;

/// Errors raised while reading the event log.
#[derive(Error, Debug)]
pub enum ConsumerError {
    /// Kafka-related error.
    #[error("Kafka error: {0}")]
    KafkaError(String),

    /// The configured topic does not exist.
    #[error("Topic not found: {0}")]
    TopicNotFound(String),

    /// Any other event source failure.
    #[error("Event source error: {0}")]
    SourceError(String),
}

impl ConsumerError {
    /// Create a Kafka error.
    pub fn kafka(msg: impl Into<String>) -> Self {
        Self::KafkaError(msg.into())
    }

    /// Create a generic event source error.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::SourceError(msg.into())
    }
}

impl From<rdkafka::error::KafkaError> for ConsumerError {
    fn from(err: rdkafka::error::KafkaError) -> Self {
        Self::KafkaError(err.to_string())
    }
}

/// Fatal errors of the catch-up controller.
///
/// Any of these leaves the process unable to serve a consistent index; the
/// process exits non-zero and its supervisor restarts it.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// The new collection generation could not be created.
    #[error("Bootstrap failed: {0}")]
    Bootstrap(#[source] SearchIndexError),

    /// Replaying the event log failed.
    #[error("Replay failed: {0}")]
    Replay(#[from] ConsumerError),

    /// The alias could not be moved to the new generation.
    #[error("Alias swap failed: {0}")]
    Swap(#[source] SearchIndexError),

    /// The readiness sentinel could not be written.
    #[error("Readiness error: {0}")]
    Readiness(#[from] std::io::Error),
}
