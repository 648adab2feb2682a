//! Topic provisioning

use login_pipeline_config::{KafkaSettings, TopicSettings};
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use std::time::Duration;
use tracing::{error, info};

use super::error::{KafkaError, Result};

const OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Creates topics on the cluster
pub struct TopicProvisioner {
    admin: AdminClient<DefaultClientContext>,
    brokers: String,
}

impl TopicProvisioner {
    pub fn new(settings: &KafkaSettings) -> Result<Self> {
        let admin: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &settings.brokers)
            .create()
            .map_err(|e| KafkaError::configuration(e.to_string()))?;

        Ok(Self {
            admin,
            brokers: settings.brokers.clone(),
        })
    }

    /// Create `name` with the given layout
    ///
    /// Fails if the topic already exists.
    pub async fn create_topic(&self, name: &str, layout: &TopicSettings) -> Result<()> {
        let topic = NewTopic::new(
            name,
            layout.partitions,
            TopicReplication::Fixed(layout.replication_factor),
        );
        let options = AdminOptions::new().operation_timeout(Some(OPERATION_TIMEOUT));

        let results = self
            .admin
            .create_topics(&[topic], &options)
            .await
            .map_err(|e| KafkaError::connection(e.to_string(), &self.brokers))?;

        for result in results {
            match result {
                Ok(created) => {
                    info!(
                        topic = %created,
                        partitions = layout.partitions,
                        replication_factor = layout.replication_factor,
                        "Topic created"
                    );
                }
                Err((topic, code)) => {
                    error!(topic = %topic, error = %code, "Topic creation failed");
                    return Err(KafkaError::topic_creation(code.to_string(), topic));
                }
            }
        }

        Ok(())
    }
}
