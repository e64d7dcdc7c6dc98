//! Dependency initialization and wiring for the route network indexer.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{ConnectionMode, IndexerConfig};
use crate::consumer::KafkaEventSource;
use crate::health::ReadinessProbe;
use crate::orchestrator::{CatchUpController, ControllerConfig};
use crate::IndexingError;
use route_network_indexer_repository::OpenSearchProvider;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured controller ready to run.
    pub controller: CatchUpController,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// See [`IndexerConfig::from_env`] for the variables read.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If configuration is invalid or a client
    ///   cannot be created (connection failures only in fail-fast mode)
    pub async fn new() -> Result<Self, IndexingError> {
        let config = IndexerConfig::from_env()?;
        Self::from_config(config).await
    }

    /// Initialize all dependencies from explicit settings.
    pub async fn from_config(config: IndexerConfig) -> Result<Self, IndexingError> {
        info!(
            opensearch_url = %config.opensearch_url,
            index_alias = %config.collection.alias,
            kafka_broker = %config.kafka_broker,
            kafka_group_id = %config.kafka_group_id,
            kafka_topic = %config.kafka_topic,
            connection_mode = ?config.connection_mode,
            retry_interval_secs = config.retry_interval.as_secs(),
            catch_up_interval_ms = config.catch_up_interval.as_millis() as u64,
            "Initializing dependencies"
        );

        let search_provider = Self::connect_to_opensearch(
            &config.opensearch_url,
            config.connection_mode,
            config.retry_interval,
        )
        .await?;

        info!("OpenSearch connection established");

        let event_source =
            KafkaEventSource::new(&config.kafka_broker, &config.kafka_group_id, &config.kafka_topic)
                .map_err(|e| {
                    IndexingError::config(format!("Failed to create Kafka event source: {}", e))
                })?;

        let controller = CatchUpController::with_config(
            Arc::new(search_provider),
            Box::new(event_source),
            config.collection,
            ReadinessProbe::new(config.health_file_path),
            ControllerConfig {
                catch_up_interval: config.catch_up_interval,
                ..ControllerConfig::default()
            },
        );

        Ok(Self { controller })
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    async fn connect_to_opensearch(
        url: &str,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchProvider, IndexingError> {
        loop {
            match Self::try_connect_opensearch(url).await {
                Ok(provider) => return Ok(provider),
                Err(e) => match mode {
                    ConnectionMode::FailFast => return Err(e),
                    ConnectionMode::Retry => {
                        warn!(
                            opensearch_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }

    /// Attempt to connect to OpenSearch.
    async fn try_connect_opensearch(url: &str) -> Result<OpenSearchProvider, IndexingError> {
        let search_provider = OpenSearchProvider::new(url).await.map_err(|e| {
            IndexingError::config(format!("Failed to create OpenSearch provider: {}", e))
        })?;

        search_provider
            .ping()
            .await
            .map_err(|e| IndexingError::config(format!("Failed to connect to OpenSearch: {}", e)))?;

        Ok(search_provider)
    }
}
