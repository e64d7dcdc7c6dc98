//! Route Network Indexer Main Entry Point
//!
//! Every start builds a fresh route node collection from the full event log,
//! points the alias at it and then follows the log. The readiness sentinel
//! exists only while the indexer is live.
//!
//! Exit status:
//!
//! - `0` after SIGINT or SIGTERM, once the catch-up round in flight finished
//! - non-zero on invalid configuration, or when the index cannot be built,
//!   replayed or swapped; a partially built collection is removed first and
//!   the supervisor is expected to restart the process

use dotenv::dotenv;
use route_network_indexer::{Dependencies, IndexingError};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing.
///
/// `RUST_LOG` overrides the default filter. `LOG_FORMAT=json` switches to
/// JSON lines for log shippers; anything else logs in a readable format.
fn init_tracing() -> Result<(), IndexingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("route_network_indexer=info,route_network_indexer_repository=info")
    });

    let json = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| IndexingError::config(e.to_string()))?;

        info!(
            service_name = "route-network-indexer",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| IndexingError::config(e.to_string()))?;

        info!(
            service_name = "route-network-indexer",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing()?;

    info!("Starting Route Network Indexer");

    // Blocks until OpenSearch answers when OPENSEARCH_CONNECTION_MODE=retry.
    let mut deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    match deps.controller.run().await {
        Ok(()) => {
            info!("Route network indexer stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Route network indexer failed");
            Err(e.into())
        }
    }
}
