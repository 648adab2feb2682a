//! Topic provisioning command

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use login_pipeline_config::{PipelineSettings, TopicSettings};
use login_processor::kafka::TopicProvisioner;

/// Create a topic, by default the destination topic
#[derive(Args, Debug, Clone)]
pub struct CreateTopicCommand {
    /// Topic name [default: kafka.destination_topic]
    #[arg(long, value_name = "TOPIC")]
    pub name: Option<String>,

    /// Partition count [default: topic.partitions]
    #[arg(long)]
    pub partitions: Option<i32>,

    /// Replication factor [default: topic.replication_factor]
    #[arg(long)]
    pub replication_factor: Option<i32>,
}

impl CreateTopicCommand {
    /// Topic name and layout after applying overrides
    pub fn resolve(&self, settings: &PipelineSettings) -> Result<(String, TopicSettings)> {
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| settings.kafka.destination_topic.clone());
        let layout = TopicSettings {
            partitions: self.partitions.unwrap_or(settings.topic.partitions),
            replication_factor: self
                .replication_factor
                .unwrap_or(settings.topic.replication_factor),
        };
        layout.validate().context("invalid topic layout")?;
        Ok((name, layout))
    }

    pub async fn execute(&self, settings: PipelineSettings) -> Result<()> {
        let (name, layout) = self.resolve(&settings)?;

        let provisioner = TopicProvisioner::new(&settings.kafka)?;
        provisioner
            .create_topic(&name, &layout)
            .await
            .with_context(|| format!("could not create topic {}", name))?;

        println!(
            "{} {} ({} partitions, replication factor {})",
            "Created topic".green().bold(),
            name,
            layout.partitions,
            layout.replication_factor
        );
        Ok(())
    }
}
