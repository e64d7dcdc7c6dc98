//! Kafka event source implementation for the route network indexer.
//!
//! Reads route network edit operations from a Kafka topic. Every process uses
//! a fresh consumer group and keeps its positions in memory, so each start
//! replays the full topic into a new collection generation.

use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    consumer::{Consumer, StreamConsumer},
    message::Message as KafkaMessage,
    Offset, TopicPartitionList,
};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::consumer::event_source::{EditOperationHandler, EventSource};
use crate::consumer::messages::RouteNetworkEditOperation;
use crate::errors::ConsumerError;

/// Default time to wait for a message before a catch-up round ends.
const DEFAULT_POLL_TIMEOUT_MS: u64 = 50;

/// Timeout for metadata and watermark requests.
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Idle time during replay after which consumer positions are consulted.
const REPLAY_IDLE_TIMEOUT: Duration = Duration::from_secs(1);

/// Upper bound on batches delivered by one catch-up round.
const MAX_BATCHES_PER_ROUND: u64 = 1000;

/// Upper bound on the duration of one catch-up round.
const MAX_ROUND_DURATION: Duration = Duration::from_secs(1);

/// Limits that end a catch-up round even while messages keep arriving.
#[derive(Debug, Clone, Copy)]
struct RoundLimits {
    max_batches: u64,
    max_duration: Duration,
}

impl RoundLimits {
    fn reached(&self, delivered: u64, elapsed: Duration) -> bool {
        delivered >= self.max_batches || elapsed >= self.max_duration
    }
}

impl Default for RoundLimits {
    fn default() -> Self {
        Self {
            max_batches: MAX_BATCHES_PER_ROUND,
            max_duration: MAX_ROUND_DURATION,
        }
    }
}

/// A message taken off the consumer, detached from its borrowed buffer.
struct ReceivedMessage {
    partition: i32,
    offset: i64,
    operation: Option<RouteNetworkEditOperation>,
}

/// Kafka-backed event source.
pub struct KafkaEventSource {
    consumer: StreamConsumer,
    topic: String,
    poll_timeout: Duration,
    round_limits: RoundLimits,
    assigned: bool,
}

impl KafkaEventSource {
    /// Create a new Kafka event source.
    ///
    /// # Arguments
    ///
    /// * `brokers` - Kafka broker addresses (comma-separated)
    /// * `group_id` - Consumer group prefix; a unique suffix is appended
    /// * `topic` - The route network event topic
    ///
    /// # Returns
    ///
    /// * `Ok(KafkaEventSource)` - A new event source
    /// * `Err(ConsumerError)` - If consumer creation fails
    pub fn new(brokers: &str, group_id: &str, topic: &str) -> Result<Self, ConsumerError> {
        let group_id = format!("{}-{}", group_id, Uuid::new_v4());

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", &group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .create()
            .map_err(|e| ConsumerError::kafka(e.to_string()))?;

        info!(
            brokers = %brokers,
            group_id = %group_id,
            topic = %topic,
            "Created Kafka event source"
        );

        Ok(Self {
            consumer,
            topic: topic.to_string(),
            poll_timeout: Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS),
            round_limits: RoundLimits::default(),
            assigned: false,
        })
    }

    /// Fetch the low and high watermark of every partition of the topic.
    fn fetch_watermarks(&self) -> Result<Vec<(i32, i64, i64)>, ConsumerError> {
        let metadata = self
            .consumer
            .fetch_metadata(Some(self.topic.as_str()), METADATA_TIMEOUT)?;

        let topic = metadata
            .topics()
            .iter()
            .find(|t| t.name() == self.topic)
            .ok_or_else(|| ConsumerError::TopicNotFound(self.topic.clone()))?;

        if topic.error().is_some() || topic.partitions().is_empty() {
            return Err(ConsumerError::TopicNotFound(self.topic.clone()));
        }

        topic
            .partitions()
            .iter()
            .map(|partition| -> Result<(i32, i64, i64), ConsumerError> {
                let (low, high) = self.consumer.fetch_watermarks(
                    &self.topic,
                    partition.id(),
                    METADATA_TIMEOUT,
                )?;
                Ok((partition.id(), low, high))
            })
            .collect()
    }

    /// Assign every partition of the topic, starting at the beginning.
    fn assign_from_beginning(&mut self, partitions: &[i32]) -> Result<(), ConsumerError> {
        let mut tpl = TopicPartitionList::new();
        for partition in partitions {
            tpl.add_partition_offset(&self.topic, *partition, Offset::Beginning)
                .map_err(|e| ConsumerError::kafka(e.to_string()))?;
        }
        self.consumer.assign(&tpl)?;
        self.assigned = true;

        info!(topic = %self.topic, partitions = ?partitions, "Assigned partitions from beginning");
        Ok(())
    }

    /// The next offset to be read on each assigned partition of the topic.
    ///
    /// Partitions without a known position yet are left out.
    fn positions(&self) -> Result<Vec<(i32, i64)>, ConsumerError> {
        let tpl = self.consumer.position()?;
        Ok(tpl
            .elements_for_topic(&self.topic)
            .iter()
            .filter_map(|element| match element.offset() {
                Offset::Offset(offset) => Some((element.partition(), offset)),
                _ => None,
            })
            .collect())
    }

    /// Receive the next message and decode it.
    async fn receive(&self) -> Result<ReceivedMessage, ConsumerError> {
        let msg = self.consumer.recv().await?;
        Ok(ReceivedMessage {
            partition: msg.partition(),
            offset: msg.offset(),
            operation: decode_payload(msg.payload(), msg.partition(), msg.offset()),
        })
    }
}

/// The offset each partition must reach for a replay to be complete.
///
/// Empty partitions (low == high) are already caught up and are left out.
fn replay_targets(watermarks: &[(i32, i64, i64)]) -> HashMap<i32, i64> {
    watermarks
        .iter()
        .filter(|(_, low, high)| high > low)
        .map(|(partition, _, high)| (*partition, *high))
        .collect()
}

/// Record that `partition` will next be read at `next_offset`.
///
/// The partition is replayed once that reaches its target, even if the
/// offset just below the target was never delivered (transaction markers
/// occupy offsets without producing messages).
///
/// # Returns
///
/// `true` if the partition was completed by this call.
fn mark_replayed(remaining: &mut HashMap<i32, i64>, partition: i32, next_offset: i64) -> bool {
    match remaining.get(&partition) {
        Some(high) if next_offset >= *high => {
            remaining.remove(&partition);
            true
        }
        _ => false,
    }
}

/// Decode a message payload, logging and discarding anything undecodable.
fn decode_payload(
    payload: Option<&[u8]>,
    partition: i32,
    offset: i64,
) -> Option<RouteNetworkEditOperation> {
    let payload = match payload {
        Some(p) => p,
        None => {
            debug!(partition, offset, "Received message with empty payload");
            return None;
        }
    };

    match RouteNetworkEditOperation::from_json(payload) {
        Ok(operation) => Some(operation),
        Err(e) => {
            error!(
                partition,
                offset,
                error = %e,
                "Failed to decode route network edit operation"
            );
            None
        }
    }
}

#[async_trait]
impl EventSource for KafkaEventSource {
    #[instrument(skip(self, handler), fields(topic = %self.topic))]
    async fn replay_all(
        &mut self,
        handler: &dyn EditOperationHandler,
    ) -> Result<u64, ConsumerError> {
        let watermarks = self.fetch_watermarks()?;
        let partitions: Vec<i32> = watermarks.iter().map(|(p, _, _)| *p).collect();
        let mut remaining = replay_targets(&watermarks);

        info!(
            partitions = partitions.len(),
            targets = ?remaining,
            "Replaying topic up to current high watermarks"
        );

        self.assign_from_beginning(&partitions)?;

        let mut delivered = 0u64;
        while !remaining.is_empty() {
            let received = match timeout(REPLAY_IDLE_TIMEOUT, self.receive()).await {
                Ok(received) => received?,
                Err(_) => {
                    // Nothing arrived; the tail may be markers only.
                    for (partition, position) in self.positions()? {
                        if mark_replayed(&mut remaining, partition, position) {
                            debug!(partition, position, "Partition replayed");
                        }
                    }
                    continue;
                }
            };

            if let Some(operation) = received.operation {
                handler.handle(&operation).await;
                delivered += 1;
            }

            if mark_replayed(&mut remaining, received.partition, received.offset + 1) {
                debug!(partition = received.partition, "Partition replayed");
            }
        }

        Ok(delivered)
    }

    async fn catch_up(
        &mut self,
        handler: &dyn EditOperationHandler,
    ) -> Result<u64, ConsumerError> {
        if !self.assigned {
            warn!("Catch-up requested before replay, assigning from beginning");
            let partitions: Vec<i32> = self
                .fetch_watermarks()?
                .iter()
                .map(|(p, _, _)| *p)
                .collect();
            self.assign_from_beginning(&partitions)?;
        }

        let started = Instant::now();
        let mut delivered = 0u64;
        while !self.round_limits.reached(delivered, started.elapsed()) {
            let received = match timeout(self.poll_timeout, self.receive()).await {
                Ok(received) => received?,
                // Nothing new within the poll timeout.
                Err(_) => break,
            };

            if let Some(operation) = received.operation {
                debug!(
                    partition = received.partition,
                    offset = received.offset,
                    "Delivering edit operation"
                );
                handler.handle(&operation).await;
                delivered += 1;
            }
        }

        Ok(delivered)
    }
}
