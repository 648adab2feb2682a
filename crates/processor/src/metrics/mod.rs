//! Throughput, latency and host resource reporting
//!
//! The pipeline driver owns a [`PipelineCounters`] and asks the
//! [`MetricsSampler`] for a [`MetricsSnapshot`] every N enriched events.
//! Host CPU and memory are sampled at report time only.

mod probe;
mod sampler;

pub use probe::{ResourceProbe, ResourceUsage, StaticProbe, SystemProbe};
pub use sampler::{MetricsSampler, MetricsSnapshot, PipelineCounters};
