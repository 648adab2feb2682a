//! Kafka source consumer implementation
//!
//! Reads JSON login events from the source topic. Offsets are committed by
//! the client in the background; a message is never redelivered by this
//! process once it has been received.

use async_trait::async_trait;
use login_pipeline_config::KafkaSettings;
use login_pipeline_types::RawEvent;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, ConsumerContext, Rebalance, StreamConsumer};
use rdkafka::error::KafkaError as RdKafkaError;
use rdkafka::message::BorrowedMessage;
use rdkafka::{ClientContext, Message};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::error::{KafkaError, Result};
use super::traits::EventSource;

/// Counters tracked by the Kafka source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KafkaSourceMetrics {
    /// Messages received and decoded
    pub messages_consumed: u64,
    /// Messages that failed to decode
    pub messages_failed: u64,
    /// Payload bytes received
    pub bytes_consumed: u64,
    /// Partition revocations seen
    pub rebalance_count: u64,
}

#[derive(Debug, Default)]
struct MetricsTracker {
    messages_consumed: AtomicU64,
    messages_failed: AtomicU64,
    bytes_consumed: AtomicU64,
    rebalance_count: AtomicU64,
}

impl MetricsTracker {
    fn snapshot(&self) -> KafkaSourceMetrics {
        KafkaSourceMetrics {
            messages_consumed: self.messages_consumed.load(Ordering::Relaxed),
            messages_failed: self.messages_failed.load(Ordering::Relaxed),
            bytes_consumed: self.bytes_consumed.load(Ordering::Relaxed),
            rebalance_count: self.rebalance_count.load(Ordering::Relaxed),
        }
    }
}

/// Consumer context that logs group rebalances
struct SourceConsumerContext {
    metrics: Arc<MetricsTracker>,
}

impl ClientContext for SourceConsumerContext {}

impl ConsumerContext for SourceConsumerContext {
    fn pre_rebalance(&self, rebalance: &Rebalance) {
        match rebalance {
            Rebalance::Revoke(tpl) => {
                info!("Partition revocation: {:?}", tpl);
                self.metrics.rebalance_count.fetch_add(1, Ordering::Relaxed);
            }
            Rebalance::Assign(tpl) => {
                info!("Partition assignment: {:?}", tpl);
            }
            Rebalance::Error(err) => {
                error!("Rebalance error: {}", err);
            }
        }
    }

    fn post_rebalance(&self, rebalance: &Rebalance) {
        if let Rebalance::Assign(tpl) = rebalance {
            let partitions: Vec<i32> = tpl.elements().iter().map(|e| e.partition()).collect();
            info!("Successfully assigned partitions: {:?}", partitions);
        }
    }
}

/// Kafka consumer for raw login events
pub struct KafkaEventSource {
    consumer: StreamConsumer<SourceConsumerContext>,
    topic: String,
    metrics: Arc<MetricsTracker>,
}

impl KafkaEventSource {
    /// Create the consumer and subscribe to the source topic
    pub fn new(settings: &KafkaSettings) -> Result<Self> {
        let metrics = Arc::new(MetricsTracker::default());
        let context = SourceConsumerContext {
            metrics: metrics.clone(),
        };

        let consumer: StreamConsumer<SourceConsumerContext> = Self::client_config(settings)
            .create_with_context(context)
            .map_err(|e| KafkaError::configuration(e.to_string()))?;

        consumer
            .subscribe(&[settings.source_topic.as_str()])
            .map_err(|e| KafkaError::connection(e.to_string(), &settings.brokers))?;

        info!(
            topic = %settings.source_topic,
            group_id = %settings.group_id,
            "Subscribed to source topic"
        );

        Ok(Self {
            consumer,
            topic: settings.source_topic.clone(),
            metrics,
        })
    }

    fn client_config(settings: &KafkaSettings) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &settings.brokers)
            .set("group.id", &settings.group_id)
            .set("auto.offset.reset", &settings.auto_offset_reset)
            .set("enable.auto.commit", "true")
            .set("enable.partition.eof", "false");
        config
    }

    /// Current consumption counters
    pub fn metrics(&self) -> KafkaSourceMetrics {
        self.metrics.snapshot()
    }

    fn decode(&self, msg: &BorrowedMessage<'_>) -> Result<RawEvent> {
        let payload = msg.payload();
        self.metrics
            .bytes_consumed
            .fetch_add(payload.map_or(0, <[u8]>::len) as u64, Ordering::Relaxed);

        match decode_payload(payload, msg.topic(), msg.partition(), msg.offset()) {
            Ok(event) => {
                self.metrics.messages_consumed.fetch_add(1, Ordering::Relaxed);
                Ok(event)
            }
            Err(e) => {
                self.metrics.messages_failed.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }
}

/// Decode one message payload into a raw event
pub fn decode_payload(
    payload: Option<&[u8]>,
    topic: &str,
    partition: i32,
    offset: i64,
) -> Result<RawEvent> {
    let bytes = payload
        .ok_or_else(|| KafkaError::decode("message has no payload", topic, partition, offset))?;

    RawEvent::from_json(bytes)
        .map_err(|e| KafkaError::decode(e.to_string(), topic, partition, offset))
}

#[async_trait]
impl EventSource for KafkaEventSource {
    async fn recv(&mut self) -> Result<Option<RawEvent>> {
        loop {
            match self.consumer.recv().await {
                Ok(msg) => {
                    debug!(
                        topic = msg.topic(),
                        partition = msg.partition(),
                        offset = msg.offset(),
                        "Received message"
                    );
                    return self.decode(&msg).map(Some);
                }
                Err(RdKafkaError::PartitionEOF(partition)) => {
                    debug!(partition, "Reached end of partition");
                }
                Err(e) => {
                    error!(error = %e, "Error polling message");
                    return Err(KafkaError::consumption(e.to_string(), &self.topic));
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        info!("Stopping Kafka source consumer");
        self.consumer.unsubscribe();

        let metrics = self.metrics.snapshot();
        if metrics.messages_failed > 0 {
            warn!(failed = metrics.messages_failed, "Source saw undecodable messages");
        }
        info!(
            consumed = metrics.messages_consumed,
            bytes = metrics.bytes_consumed,
            "Kafka source consumer stopped"
        );
        Ok(())
    }
}
