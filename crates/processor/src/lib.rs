//! Stateful login event processor
//!
//! Consumes raw login events, enriches each one with cross-message analytics
//! (repeat IPs, shared devices, per-category counts and the most common device
//! type) and publishes the result.
//!
//! - [`state`]: accumulated histories and counters
//! - [`enrichment`]: per-event validation, filtering and annotation
//! - [`metrics`]: throughput, latency and host usage reporting
//! - [`kafka`]: stream endpoints and topic provisioning
//! - [`pipeline`]: the driver loop tying the above together

pub mod enrichment;
pub mod error;
pub mod kafka;
pub mod metrics;
pub mod pipeline;
pub mod state;
pub mod testing;

pub use enrichment::{DropReason, EnrichmentEngine, EnrichmentOutcome};
pub use error::{ProcessorError, Result as ProcessorResult, StateError};
pub use kafka::{EventSink, EventSource, KafkaError, KafkaEventSink, KafkaEventSource, TopicProvisioner};
pub use metrics::{MetricsSampler, MetricsSnapshot, PipelineCounters};
pub use pipeline::{DriverState, PipelineBuilder, PipelineDriver, PipelineSummary, StopCause};
pub use state::{Category, InMemoryLoginState, LoginStateStore, SharedLoginState};
