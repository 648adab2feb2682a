//! Run command - start the enrichment pipeline

use anyhow::{bail, Context, Result};
use clap::Args;
use login_pipeline_config::PipelineSettings;
use login_processor::pipeline::{PipelineBuilder, StopCause};
use tracing::{error, info};

/// Consume, enrich and publish login events until interrupted
#[derive(Args, Debug, Clone)]
pub struct RunCommand {
    /// Override the metrics report interval (enriched events per report)
    #[arg(long, value_name = "EVENTS")]
    pub report_interval: Option<u64>,
}

impl RunCommand {
    pub async fn execute(&self, settings: PipelineSettings) -> Result<()> {
        let mut builder = PipelineBuilder::new(settings);
        if let Some(interval) = self.report_interval {
            builder = builder.with_report_interval(interval);
        }

        let kafka = &builder.settings().kafka;
        info!(
            brokers = %kafka.brokers,
            source_topic = %kafka.source_topic,
            destination_topic = %kafka.destination_topic,
            "Starting login pipeline"
        );

        let mut pipeline = builder
            .build_kafka()
            .context("failed to open Kafka endpoints")?;
        let summary = pipeline.run(shutdown_signal()).await?;

        if let StopCause::StreamFault(message) = summary.stop_cause {
            bail!("pipeline stopped on stream fault: {}", message);
        }
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received interrupt, shutting down"),
        Err(e) => {
            error!(error = %e, "Unable to listen for interrupt");
            std::future::pending::<()>().await;
        }
    }
}
