//! Kafka sink for publishing enriched events
//!
//! Publishing hands the encoded event to the producer queue and returns. The
//! broker acknowledgment is awaited on a background task that only logs and
//! counts failures, so a lost delivery never reaches the pipeline counters.

use async_trait::async_trait;
use login_pipeline_config::KafkaSettings;
use login_pipeline_types::EnrichedEvent;
use rdkafka::config::ClientConfig;
use rdkafka::error::{KafkaError as RdKafkaError, RDKafkaErrorCode};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::error::{KafkaError, Result};
use super::traits::EventSink;

/// Wait between attempts while the local producer queue is full
const QUEUE_FULL_BACKOFF: Duration = Duration::from_millis(10);

/// Delivery statistics for the Kafka sink
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkMetrics {
    /// Events handed to the producer queue
    pub messages_enqueued: u64,
    /// Events acknowledged by the broker
    pub messages_delivered: u64,
    /// Events the broker rejected or the producer gave up on
    pub messages_failed: u64,
    /// Encoded bytes enqueued
    pub bytes_enqueued: u64,
}

#[derive(Debug, Default)]
struct MetricsTracker {
    messages_enqueued: AtomicU64,
    messages_delivered: AtomicU64,
    messages_failed: AtomicU64,
    bytes_enqueued: AtomicU64,
}

impl MetricsTracker {
    fn snapshot(&self) -> SinkMetrics {
        SinkMetrics {
            messages_enqueued: self.messages_enqueued.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            messages_failed: self.messages_failed.load(Ordering::Relaxed),
            bytes_enqueued: self.bytes_enqueued.load(Ordering::Relaxed),
        }
    }
}

/// Kafka producer for enriched events
pub struct KafkaEventSink {
    producer: FutureProducer,
    topic: String,
    enqueue_timeout: Duration,
    flush_timeout: Duration,
    metrics: Arc<MetricsTracker>,
}

impl KafkaEventSink {
    /// Create the producer for the destination topic
    pub fn new(settings: &KafkaSettings) -> Result<Self> {
        let producer: FutureProducer = Self::client_config(settings)
            .create()
            .map_err(|e| KafkaError::configuration(e.to_string()))?;

        info!(
            topic = %settings.destination_topic,
            acks = %settings.acks,
            compression = %settings.compression_type,
            "Kafka sink ready"
        );

        Ok(Self {
            producer,
            topic: settings.destination_topic.clone(),
            enqueue_timeout: Duration::from_millis(settings.message_timeout_ms),
            flush_timeout: Duration::from_millis(settings.flush_timeout_ms),
            metrics: Arc::new(MetricsTracker::default()),
        })
    }

    fn client_config(settings: &KafkaSettings) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &settings.brokers)
            .set("acks", &settings.acks)
            .set("compression.type", &settings.compression_type)
            .set("batch.size", settings.batch_size.to_string())
            .set("linger.ms", settings.linger_ms.to_string())
            .set("message.timeout.ms", settings.message_timeout_ms.to_string());
        config
    }

    /// Current delivery statistics
    pub fn metrics(&self) -> SinkMetrics {
        self.metrics.snapshot()
    }

    /// Hand one encoded record to the producer, waiting out a full queue
    async fn enqueue(&self, key: &str, payload: &[u8]) -> Result<()> {
        let started = Instant::now();
        let mut record = FutureRecord::to(&self.topic).key(key).payload(payload);

        let delivery = loop {
            match self.producer.send_result(record) {
                Ok(delivery) => break delivery,
                Err((RdKafkaError::MessageProduction(RDKafkaErrorCode::QueueFull), returned))
                    if started.elapsed() < self.enqueue_timeout =>
                {
                    debug!("Producer queue full, backing off");
                    record = returned;
                    sleep(QUEUE_FULL_BACKOFF).await;
                }
                Err((e, _)) => {
                    return Err(KafkaError::production(e.to_string(), &self.topic));
                }
            }
        };

        self.metrics.messages_enqueued.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .bytes_enqueued
            .fetch_add(payload.len() as u64, Ordering::Relaxed);

        let metrics = self.metrics.clone();
        tokio::spawn(async move {
            match delivery.await {
                Ok(Ok((partition, offset))) => {
                    metrics.messages_delivered.fetch_add(1, Ordering::Relaxed);
                    debug!(partition, offset, "Message delivered");
                }
                Ok(Err((e, _))) => {
                    metrics.messages_failed.fetch_add(1, Ordering::Relaxed);
                    error!(error = %e, "Message delivery failed");
                }
                Err(_) => {
                    metrics.messages_failed.fetch_add(1, Ordering::Relaxed);
                    warn!("Delivery report dropped before completion");
                }
            }
        });

        Ok(())
    }
}

#[async_trait]
impl EventSink for KafkaEventSink {
    async fn publish(&mut self, event: &EnrichedEvent) -> Result<()> {
        let payload = event.to_json()?;
        self.enqueue(&event.user_id, &payload).await
    }

    async fn close(&mut self) -> Result<()> {
        info!("Flushing pending messages...");

        let producer = self.producer.clone();
        let timeout = self.flush_timeout;
        let flushed = tokio::task::spawn_blocking(move || producer.flush(Timeout::After(timeout)))
            .await
            .map_err(|e| KafkaError::production(e.to_string(), &self.topic))?;

        let metrics = self.metrics.snapshot();
        info!(
            enqueued = metrics.messages_enqueued,
            delivered = metrics.messages_delivered,
            failed = metrics.messages_failed,
            "Kafka sink shut down"
        );

        flushed.map_err(|e| KafkaError::production(e.to_string(), &self.topic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config() {
        let settings = KafkaSettings::default();
        let config = KafkaEventSink::client_config(&settings);

        assert_eq!(config.get("bootstrap.servers"), Some("localhost:29092"));
        assert_eq!(config.get("acks"), Some("all"));
        assert_eq!(config.get("compression.type"), Some("snappy"));
        assert_eq!(config.get("batch.size"), Some("16384"));
        assert_eq!(config.get("linger.ms"), Some("5"));
    }

    #[tokio::test]
    async fn test_new_sink_has_empty_metrics() {
        // Producer creation does not contact the brokers.
        let sink = KafkaEventSink::new(&KafkaSettings::default()).unwrap();
        assert_eq!(sink.metrics(), SinkMetrics::default());
        assert_eq!(sink.flush_timeout, Duration::from_millis(10_000));
    }
}
