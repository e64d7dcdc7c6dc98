//! Configuration for the route network indexer.
//!
//! Settings are read from environment variables. Invalid values fall back to
//! their defaults with a warning; only an invalid alias is rejected, since no
//! sensible default can stand in for it.

mod dependencies;

pub use dependencies::Dependencies;

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::health::DEFAULT_HEALTH_FILE_PATH;
use crate::IndexingError;
use route_network_indexer_repository::CollectionConfig;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default Kafka broker address.
const DEFAULT_KAFKA_BROKER: &str = "localhost:9092";

/// Default Kafka consumer group prefix.
const DEFAULT_KAFKA_GROUP_ID: &str = "route-network-indexer";

/// Default Kafka topic carrying route network edit operations.
const DEFAULT_KAFKA_TOPIC: &str = "domain.route-network";

/// Default alias queried by readers.
const DEFAULT_INDEX_ALIAS: &str = "route-nodes";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Default pause between catch-up rounds in milliseconds.
const DEFAULT_CATCHUP_INTERVAL_MS: u64 = 125;

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection until successful.
    Retry,
}

impl ConnectionMode {
    /// Parse a connection mode.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Defaults to "retry" if not set or invalid.
    fn parse(value: Option<&str>) -> Self {
        match value.unwrap_or("retry").to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Runtime settings of the indexer.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub opensearch_url: String,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
    pub collection: CollectionConfig,
    pub kafka_broker: String,
    pub kafka_group_id: String,
    pub kafka_topic: String,
    pub catch_up_interval: Duration,
    pub health_file_path: PathBuf,
}

impl IndexerConfig {
    /// Load settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `INDEX_ALIAS`: Alias queried by readers (default: route-nodes)
    /// - `KAFKA_BROKER`: Kafka broker address (default: localhost:9092)
    /// - `KAFKA_GROUP_ID`: Consumer group prefix (default: route-network-indexer)
    /// - `KAFKA_TOPIC`: Event log topic (default: domain.route-network)
    /// - `CATCHUP_INTERVAL_MS`: Pause between catch-up rounds (default: 125)
    /// - `HEALTH_FILE_PATH`: Readiness sentinel (default: /tmp/healthy)
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string_or = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let number_or = |key: &str, default: u64| match lookup(key) {
            None => default,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(value) if value > 0 => value,
                _ => {
                    warn!(variable = key, value = %raw, default, "Invalid value, using default");
                    default
                }
            },
        };

        let alias = string_or("INDEX_ALIAS", DEFAULT_INDEX_ALIAS);
        let collection = CollectionConfig::new(alias)
            .map_err(|e| IndexingError::config(format!("Invalid INDEX_ALIAS: {}", e)))?;

        Ok(Self {
            opensearch_url: string_or("OPENSEARCH_URL", DEFAULT_OPENSEARCH_URL),
            connection_mode: ConnectionMode::parse(lookup("OPENSEARCH_CONNECTION_MODE").as_deref()),
            retry_interval: Duration::from_secs(number_or(
                "OPENSEARCH_RETRY_INTERVAL_SECS",
                DEFAULT_RETRY_INTERVAL_SECS,
            )),
            collection,
            kafka_broker: string_or("KAFKA_BROKER", DEFAULT_KAFKA_BROKER),
            kafka_group_id: string_or("KAFKA_GROUP_ID", DEFAULT_KAFKA_GROUP_ID),
            kafka_topic: string_or("KAFKA_TOPIC", DEFAULT_KAFKA_TOPIC),
            catch_up_interval: Duration::from_millis(number_or(
                "CATCHUP_INTERVAL_MS",
                DEFAULT_CATCHUP_INTERVAL_MS,
            )),
            health_file_path: PathBuf::from(string_or("HEALTH_FILE_PATH", DEFAULT_HEALTH_FILE_PATH)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<IndexerConfig, IndexingError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        IndexerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.opensearch_url, "http://localhost:9200");
        assert_eq!(config.connection_mode, ConnectionMode::Retry);
        assert_eq!(config.retry_interval, Duration::from_secs(15));
        assert_eq!(config.collection.alias, "route-nodes");
        assert_eq!(config.kafka_broker, "localhost:9092");
        assert_eq!(config.kafka_group_id, "route-network-indexer");
        assert_eq!(config.kafka_topic, "domain.route-network");
        assert_eq!(config.catch_up_interval, Duration::from_millis(125));
        assert_eq!(config.health_file_path, PathBuf::from("/tmp/healthy"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("OPENSEARCH_URL", "http://search:9200"),
            ("OPENSEARCH_CONNECTION_MODE", "Fail-Fast"),
            ("INDEX_ALIAS", "nodes"),
            ("KAFKA_TOPIC", "route-network"),
            ("CATCHUP_INTERVAL_MS", "500"),
            ("HEALTH_FILE_PATH", "/var/run/ready"),
        ])
        .unwrap();

        assert_eq!(config.opensearch_url, "http://search:9200");
        assert_eq!(config.connection_mode, ConnectionMode::FailFast);
        assert_eq!(config.collection.alias, "nodes");
        assert_eq!(config.kafka_topic, "route-network");
        assert_eq!(config.catch_up_interval, Duration::from_millis(500));
        assert_eq!(config.health_file_path, PathBuf::from("/var/run/ready"));
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = load(&[
            ("CATCHUP_INTERVAL_MS", "soon"),
            ("OPENSEARCH_RETRY_INTERVAL_SECS", "0"),
            ("OPENSEARCH_CONNECTION_MODE", "sometimes"),
        ])
        .unwrap();

        assert_eq!(config.catch_up_interval, Duration::from_millis(125));
        assert_eq!(config.retry_interval, Duration::from_secs(15));
        assert_eq!(config.connection_mode, ConnectionMode::Retry);
    }

    #[test]
    fn test_invalid_alias_is_rejected() {
        let result = load(&[("INDEX_ALIAS", "RouteNodes")]);

        assert!(matches!(result, Err(IndexingError::ConfigError(_))));
    }
}
