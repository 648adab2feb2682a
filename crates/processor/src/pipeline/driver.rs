//! Pipeline driver
//!
//! Pulls raw events one at a time, enriches them, publishes the results and
//! keeps the cumulative counters. Each event is fully handled before the next
//! receive, so output order matches input order.

use login_pipeline_types::RawEvent;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::enrichment::{EnrichmentEngine, EnrichmentOutcome};
use crate::error::{ProcessorError, Result};
use crate::kafka::{EventSink, EventSource};
use crate::metrics::{MetricsSampler, PipelineCounters};
use crate::state::LoginStateStore;

/// Lifecycle of a [`PipelineDriver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DriverState {
    /// Endpoints open, not yet pulling
    Starting,
    /// Pulling and processing events
    Running,
    /// No new events are pulled; endpoints are being closed
    Draining,
    /// Both endpoints closed
    Stopped,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverState::Starting => "starting",
            DriverState::Running => "running",
            DriverState::Draining => "draining",
            DriverState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Why the driver left the running state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StopCause {
    /// The shutdown signal fired
    Interrupted,
    /// The source reported the end of its stream
    EndOfStream,
    /// A connection-level failure on either endpoint
    StreamFault(String),
}

impl fmt::Display for StopCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopCause::Interrupted => f.write_str("interrupted"),
            StopCause::EndOfStream => f.write_str("end of stream"),
            StopCause::StreamFault(message) => write!(f, "stream fault: {}", message),
        }
    }
}

/// Final counters of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub processed: u64,
    pub errors: u64,
    pub filtered: u64,
    pub elapsed: Duration,
    pub stop_cause: StopCause,
}

/// Sequential source → engine → sink loop
pub struct PipelineDriver<S, Src, Snk> {
    engine: EnrichmentEngine<S>,
    source: Src,
    sink: Snk,
    sampler: MetricsSampler,
    counters: PipelineCounters,
    state: DriverState,
}

impl<S, Src, Snk> PipelineDriver<S, Src, Snk>
where
    S: LoginStateStore,
    Src: EventSource,
    Snk: EventSink,
{
    /// Wrap already opened endpoints
    pub fn new(
        engine: EnrichmentEngine<S>,
        source: Src,
        sink: Snk,
        sampler: MetricsSampler,
    ) -> Self {
        Self {
            engine,
            source,
            sink,
            sampler,
            counters: PipelineCounters::new(),
            state: DriverState::Starting,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn engine(&self) -> &EnrichmentEngine<S> {
        &self.engine
    }

    pub fn counters(&self) -> &PipelineCounters {
        &self.counters
    }

    /// Run until `shutdown` completes, the source ends, or a stream fault
    ///
    /// A pending receive is abandoned when `shutdown` completes. Both
    /// endpoints are closed before returning whatever the stop cause; close
    /// failures are logged and do not change the summary. Fails only when
    /// called on a driver that is not in the starting state.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<PipelineSummary>
    where
        F: Future<Output = ()>,
    {
        if self.state != DriverState::Starting {
            return Err(ProcessorError::Unexpected(format!(
                "pipeline cannot run from state {}",
                self.state
            )));
        }

        self.counters = PipelineCounters::new();
        self.state = DriverState::Running;
        info!(report_interval = self.sampler.interval(), "Pipeline running");

        tokio::pin!(shutdown);
        let stop_cause = loop {
            let received = tokio::select! {
                biased;
                _ = &mut shutdown => break StopCause::Interrupted,
                received = self.source.recv() => received,
            };
            let received_at = Instant::now();

            match received {
                Ok(Some(raw)) => {
                    if let Err(cause) = self.handle(&raw, received_at).await {
                        break cause;
                    }
                }
                Ok(None) => break StopCause::EndOfStream,
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "Input stream failed");
                    break StopCause::StreamFault(e.to_string());
                }
                Err(e) => {
                    warn!(error = %e, "Dropping undecodable message");
                    self.counters.record_error();
                }
            }
        };

        self.state = DriverState::Draining;
        info!(cause = %stop_cause, "Pipeline draining");
        self.close_endpoints().await;
        self.state = DriverState::Stopped;

        let summary = PipelineSummary {
            processed: self.counters.processed,
            errors: self.counters.errors,
            filtered: self.counters.filtered,
            elapsed: self.counters.elapsed(),
            stop_cause,
        };
        info!(
            processed = summary.processed,
            errors = summary.errors,
            filtered = summary.filtered,
            elapsed_secs = summary.elapsed.as_secs_f64(),
            "Pipeline stopped"
        );
        Ok(summary)
    }

    /// Process one received event; `Err` carries a fatal publish failure
    async fn handle(
        &mut self,
        raw: &RawEvent,
        received_at: Instant,
    ) -> std::result::Result<(), StopCause> {
        let event = match self.engine.enrich(raw) {
            EnrichmentOutcome::Enriched(event) => event,
            EnrichmentOutcome::Dropped(reason) => {
                if reason.is_error() {
                    self.counters.record_error();
                } else {
                    self.counters.record_filtered();
                }
                debug!(reason = %reason, "Event dropped");
                return Ok(());
            }
        };

        match self.sink.publish(&event).await {
            Ok(()) => {}
            Err(e) if e.is_fatal() => {
                error!(user_id = %event.user_id, error = %e, "Output stream failed");
                return Err(StopCause::StreamFault(e.to_string()));
            }
            Err(e) => {
                warn!(user_id = %event.user_id, error = %e, "Failed to publish event");
                self.counters.record_error();
                return Ok(());
            }
        }

        self.counters.record_processed(received_at.elapsed());
        info!(
            user_id = %event.user_id,
            device_type = %event.device_type,
            suspicious_login = event.suspicious_login,
            shared_device = event.shared_device,
            "Processed message"
        );

        if self.sampler.should_report(self.counters.processed) {
            self.sampler.sample(&self.counters).log();
        }
        Ok(())
    }

    async fn close_endpoints(&mut self) {
        if let Err(e) = self.source.close().await {
            error!(error = %e, "Failed to close input stream");
        }
        if let Err(e) = self.sink.close().await {
            error!(error = %e, "Failed to close output stream");
        }
    }
}

impl<S, Src, Snk> fmt::Debug for PipelineDriver<S, Src, Snk> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineDriver")
            .field("state", &self.state)
            .field("counters", &self.counters)
            .field("sampler", &self.sampler)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::StaticProbe;
    use crate::state::InMemoryLoginState;
    use crate::testing::{MemorySink, MemorySource};

    #[test]
    fn test_display() {
        assert_eq!(DriverState::Draining.to_string(), "draining");
        assert_eq!(
            StopCause::StreamFault("broker down".into()).to_string(),
            "stream fault: broker down"
        );
    }

    #[tokio::test]
    async fn test_run_twice_is_rejected() {
        let mut driver = PipelineDriver::new(
            EnrichmentEngine::new(InMemoryLoginState::new()),
            MemorySource::new(Vec::new()),
            MemorySink::new(),
            MetricsSampler::with_probe(1, Box::new(StaticProbe::default())),
        );
        assert_eq!(driver.state(), DriverState::Starting);

        let summary = driver.run(std::future::pending()).await.unwrap();
        assert_eq!(summary.stop_cause, StopCause::EndOfStream);
        assert_eq!(driver.state(), DriverState::Stopped);

        assert!(driver.run(std::future::pending()).await.is_err());
    }
}
