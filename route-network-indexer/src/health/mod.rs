//! Readiness sentinel for external health checks.
//!
//! The indexer reports ready by creating a file once the new collection
//! generation is live. Absence of the file means "not ready".

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default location of the readiness sentinel.
pub const DEFAULT_HEALTH_FILE_PATH: &str = "/tmp/healthy";

/// File-based readiness probe.
#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    path: PathBuf,
}

impl ReadinessProbe {
    /// Create a probe backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The sentinel file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove a sentinel left behind by a previous run.
    pub async fn reset(&self) -> std::io::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Removed stale readiness sentinel");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Create the sentinel, flipping external health checks to ready.
    pub async fn mark_ready(&self) -> std::io::Result<()> {
        tokio::fs::write(&self.path, b"").await?;
        info!(path = %self.path.display(), "Marked as healthy");
        Ok(())
    }

    /// Whether the sentinel currently exists.
    pub async fn is_ready(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }
}

impl Default for ReadinessProbe {
    fn default() -> Self {
        Self::new(DEFAULT_HEALTH_FILE_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mark_ready_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let probe = ReadinessProbe::new(dir.path().join("healthy"));

        assert!(!probe.is_ready().await);

        probe.mark_ready().await.unwrap();
        assert!(probe.is_ready().await);

        probe.reset().await.unwrap();
        assert!(!probe.is_ready().await);
    }

    #[tokio::test]
    async fn test_reset_without_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let probe = ReadinessProbe::new(dir.path().join("healthy"));

        assert!(probe.reset().await.is_ok());
    }

    #[test]
    fn test_default_path() {
        assert_eq!(ReadinessProbe::default().path(), Path::new("/tmp/healthy"));
    }
}
