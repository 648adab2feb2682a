//! Pipeline assembly from settings

use login_pipeline_config::PipelineSettings;

use crate::enrichment::EnrichmentEngine;
use crate::error::Result;
use crate::kafka::{EventSink, EventSource, KafkaEventSink, KafkaEventSource};
use crate::metrics::{MetricsSampler, ResourceProbe};
use crate::pipeline::driver::PipelineDriver;
use crate::state::{InMemoryLoginState, LoginStateStore};

/// Driver wired to Kafka on both ends
pub type KafkaPipeline = PipelineDriver<InMemoryLoginState, KafkaEventSource, KafkaEventSink>;

/// Builder for pipeline drivers
///
/// # Example
///
/// ```rust,no_run
/// use login_pipeline_config::PipelineSettings;
/// use login_processor::pipeline::PipelineBuilder;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = PipelineSettings::load(None)?;
/// let mut pipeline = PipelineBuilder::new(settings).build_kafka()?;
/// let summary = pipeline.run(async { let _ = tokio::signal::ctrl_c().await; }).await?;
/// println!("processed {}", summary.processed);
/// # Ok(())
/// # }
/// ```
pub struct PipelineBuilder {
    settings: PipelineSettings,
    probe: Option<Box<dyn ResourceProbe>>,
}

impl PipelineBuilder {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            settings,
            probe: None,
        }
    }

    /// Override the metrics report interval
    pub fn with_report_interval(mut self, interval: u64) -> Self {
        self.settings.metrics.report_interval = interval;
        self
    }

    /// Sample host usage with `probe` instead of the system
    pub fn with_probe(mut self, probe: Box<dyn ResourceProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Assemble a driver around the given state and endpoints
    pub fn build<S, Src, Snk>(self, state: S, source: Src, sink: Snk) -> PipelineDriver<S, Src, Snk>
    where
        S: LoginStateStore,
        Src: EventSource,
        Snk: EventSink,
    {
        let interval = self.settings.metrics.report_interval;
        let sampler = match self.probe {
            Some(probe) => MetricsSampler::with_probe(interval, probe),
            None => MetricsSampler::new(interval),
        };

        PipelineDriver::new(EnrichmentEngine::new(state), source, sink, sampler)
    }

    /// Validate settings and open both Kafka endpoints
    pub fn build_kafka(self) -> Result<KafkaPipeline> {
        self.settings.validate()?;

        let source = KafkaEventSource::new(&self.settings.kafka)?;
        let sink = KafkaEventSink::new(&self.settings.kafka)?;

        Ok(self.build(InMemoryLoginState::new(), source, sink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::StaticProbe;
    use crate::testing::{MemorySink, MemorySource};

    #[test]
    fn test_report_interval_override() {
        let builder = PipelineBuilder::new(PipelineSettings::default()).with_report_interval(7);
        assert_eq!(builder.settings().metrics.report_interval, 7);

        let driver = builder.with_probe(Box::new(StaticProbe::default())).build(
            InMemoryLoginState::new(),
            MemorySource::new(Vec::new()),
            MemorySink::new(),
        );
        assert!(format!("{:?}", driver).contains("interval: 7"));
    }
}
