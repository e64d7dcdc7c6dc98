//! The event source contract.
//!
//! An event source replays the whole route network log from the beginning and
//! then follows it incrementally. Batches are handed to an
//! [`EditOperationHandler`] one at a time, in log order.

use async_trait::async_trait;

use crate::consumer::messages::RouteNetworkEditOperation;
use crate::errors::ConsumerError;

/// Receives edit operations from an event source.
///
/// Implementations must not fail: per-event problems are handled (and logged)
/// inside the handler so that one bad event never halts the stream.
#[async_trait]
pub trait EditOperationHandler: Send + Sync {
    /// Apply one edit operation.
    async fn handle(&self, operation: &RouteNetworkEditOperation);
}

/// An ordered, replayable log of route network edit operations.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Deliver every historical batch, in order, then return once caught up
    /// to the head of the log.
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - The number of batches delivered
    /// * `Err(ConsumerError)` - If the log cannot be read
    async fn replay_all(
        &mut self,
        handler: &dyn EditOperationHandler,
    ) -> Result<u64, ConsumerError>;

    /// Deliver only the batches appended since the last delivered position.
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - The number of batches delivered (zero when idle)
    /// * `Err(ConsumerError)` - If the log cannot be read
    async fn catch_up(&mut self, handler: &dyn EditOperationHandler)
        -> Result<u64, ConsumerError>;
}
