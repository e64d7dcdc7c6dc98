//! # Route Network Indexer
//!
//! Keeps a searchable index of route network nodes consistent with the route
//! network event log. Every start rebuilds the index into a fresh collection
//! generation, swaps the reader-facing alias onto it once fully replayed, and
//! then follows the log.
//!
//! ## Architecture
//!
//! The indexer follows the Consumer-Processor-Loader pattern:
//!
//! 1. **Consumer**: Reads edit operations from the event log
//! 2. **Processor**: Maps events onto document mutations
//! 3. **Loader**: Applies mutations to a collection generation
//! 4. **Orchestrator**: Drives replay, alias swap, cleanup and live catch-up
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`consumer`]: Event source contract, event model and Kafka source
//! - [`processor`]: Maps events onto document mutations
//! - [`loader`]: Projects edit operations into the index
//! - [`orchestrator`]: The catch-up controller
//! - [`health`]: Readiness sentinel
//! - [`errors`]: Error types for the indexer

pub mod config;
pub mod consumer;
pub mod errors;
pub mod health;
pub mod loader;
pub mod orchestrator;
pub mod processor;

pub use config::{Dependencies, IndexerConfig};
pub use errors::OrchestratorError;

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Controller error.
    #[error("Controller error: {0}")]
    OrchestratorError(#[from] OrchestratorError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
