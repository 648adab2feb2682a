//! Periodic pipeline metrics

use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::info;

use super::probe::{ResourceProbe, ResourceUsage, SystemProbe};

/// Cumulative counters maintained by the pipeline driver
#[derive(Debug, Clone)]
pub struct PipelineCounters {
    /// Events enriched and handed to the sink
    pub processed: u64,
    /// Events dropped for validation failures, faults or publish errors
    pub errors: u64,
    /// Events dropped by the device-type filter
    pub filtered: u64,
    /// Summed per-message processing time of processed events
    pub latency_total: Duration,
    started_at: Instant,
}

impl PipelineCounters {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(started_at: Instant) -> Self {
        Self {
            processed: 0,
            errors: 0,
            filtered: 0,
            latency_total: Duration::ZERO,
            started_at,
        }
    }

    pub fn record_processed(&mut self, latency: Duration) {
        self.processed += 1;
        self.latency_total += latency;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    pub fn record_filtered(&mut self) {
        self.filtered += 1;
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for PipelineCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of pipeline performance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub elapsed: Duration,
    pub processed: u64,
    pub errors: u64,
    pub filtered: u64,
    /// Processed events per second since start
    pub throughput_per_sec: f64,
    /// Mean per-message processing time
    pub avg_latency: Duration,
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

impl MetricsSnapshot {
    /// Derive a snapshot from counters, wall-clock time and host usage
    pub fn compute(counters: &PipelineCounters, elapsed: Duration, usage: ResourceUsage) -> Self {
        let secs = elapsed.as_secs_f64();
        let throughput_per_sec = if secs > 0.0 {
            counters.processed as f64 / secs
        } else {
            0.0
        };

        let avg_latency = if counters.processed > 0 {
            let nanos = counters.latency_total.as_nanos() / u128::from(counters.processed);
            Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
        } else {
            Duration::ZERO
        };

        Self {
            elapsed,
            processed: counters.processed,
            errors: counters.errors,
            filtered: counters.filtered,
            throughput_per_sec,
            avg_latency,
            cpu_percent: usage.cpu_percent,
            memory_percent: usage.memory_percent,
        }
    }

    /// Emit the report block
    pub fn log(&self) {
        info!(
            throughput = format_args!("{:.2} msgs/sec", self.throughput_per_sec),
            "Throughput"
        );
        info!(
            avg_latency = format_args!("{:.4} secs", self.avg_latency.as_secs_f64()),
            "Avg Latency"
        );
        info!(
            cpu_percent = format_args!("{:.1}", self.cpu_percent),
            memory_percent = format_args!("{:.1}", self.memory_percent),
            "Resource usage"
        );
        info!(
            errors = self.errors,
            processed = self.processed,
            filtered = self.filtered,
            elapsed_secs = self.elapsed.as_secs(),
            "Message counts"
        );
    }
}

/// Decides when to report and builds snapshots
pub struct MetricsSampler {
    interval: u64,
    probe: Box<dyn ResourceProbe>,
}

impl MetricsSampler {
    /// Sampler using the host probe
    pub fn new(interval: u64) -> Self {
        Self::with_probe(interval, Box::new(SystemProbe::new()))
    }

    /// An interval of zero is treated as one
    pub fn with_probe(interval: u64, probe: Box<dyn ResourceProbe>) -> Self {
        Self {
            interval: interval.max(1),
            probe,
        }
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// True when `processed` has just reached a multiple of the interval
    pub fn should_report(&self, processed: u64) -> bool {
        processed > 0 && processed % self.interval == 0
    }

    /// Snapshot now, sampling the host
    pub fn sample(&mut self, counters: &PipelineCounters) -> MetricsSnapshot {
        let usage = self.probe.sample();
        MetricsSnapshot::compute(counters, counters.elapsed(), usage)
    }
}

impl std::fmt::Debug for MetricsSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsSampler")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
