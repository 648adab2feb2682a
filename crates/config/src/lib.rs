//! Configuration management for the login event enrichment pipeline

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Environment variable prefix for overrides, e.g. `LOGIN_PIPELINE_KAFKA__BROKERS`
pub const ENV_PREFIX: &str = "LOGIN_PIPELINE_";

/// Main pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Broker connection and client tuning
    #[serde(default)]
    pub kafka: KafkaSettings,

    /// Output topic provisioning
    #[serde(default)]
    pub topic: TopicSettings,

    /// Periodic metrics reporting
    #[serde(default)]
    pub metrics: MetricsSettings,

    /// Logging settings
    #[serde(default)]
    pub observability: ObservabilitySettings,
}

impl PipelineSettings {
    /// Load configuration from defaults, an optional YAML file and environment
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(PipelineSettings::default()));

        if let Some(path) = config_path {
            figment = figment.merge(Yaml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let settings: PipelineSettings = figment
            .extract()
            .map_err(|e| ConfigError::LoadError(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.kafka.validate()?;
        self.topic.validate()?;
        self.metrics.validate()?;
        Ok(())
    }
}

/// Kafka connection settings shared by the consumer, producer and admin client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KafkaSettings {
    /// Bootstrap servers (comma-separated)
    pub brokers: String,

    /// Topic raw login events are read from
    pub source_topic: String,

    /// Topic enriched events are published to
    pub destination_topic: String,

    /// Consumer group ID
    pub group_id: String,

    /// Where to start without a committed offset: earliest, latest
    pub auto_offset_reset: String,

    /// Producer compression (none, gzip, snappy, lz4, zstd)
    pub compression_type: String,

    /// Producer acknowledgment level (0, 1, all)
    pub acks: String,

    /// Producer batch size in bytes
    pub batch_size: usize,

    /// Producer linger window in milliseconds
    pub linger_ms: u64,

    /// Local delivery timeout for produced messages in milliseconds
    pub message_timeout_ms: u64,

    /// Upper bound on the producer flush at shutdown in milliseconds
    pub flush_timeout_ms: u64,
}

impl Default for KafkaSettings {
    fn default() -> Self {
        Self {
            brokers: "localhost:29092".to_string(),
            source_topic: "user-login".to_string(),
            destination_topic: "processed-user-login".to_string(),
            group_id: "user-login-group".to_string(),
            auto_offset_reset: "earliest".to_string(),
            compression_type: "snappy".to_string(),
            acks: "all".to_string(),
            batch_size: 16384,
            linger_ms: 5,
            message_timeout_ms: 30000,
            flush_timeout_ms: 10000,
        }
    }
}

impl KafkaSettings {
    pub fn validate(&self) -> Result<()> {
        if self.brokers.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "kafka.brokers must not be empty".to_string(),
            ));
        }

        if self.source_topic.trim().is_empty() || self.destination_topic.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "kafka source and destination topics are required".to_string(),
            ));
        }

        if self.source_topic == self.destination_topic {
            return Err(ConfigError::ValidationError(format!(
                "source and destination topic are both '{}'",
                self.source_topic
            )));
        }

        if self.group_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "kafka.group_id must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Output topic layout used by `create-topic`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicSettings {
    pub partitions: i32,
    pub replication_factor: i32,
}

impl Default for TopicSettings {
    fn default() -> Self {
        Self {
            partitions: 1,
            replication_factor: 1,
        }
    }
}

impl TopicSettings {
    pub fn validate(&self) -> Result<()> {
        if self.partitions < 1 {
            return Err(ConfigError::ValidationError(
                "topic.partitions must be at least 1".to_string(),
            ));
        }
        if self.replication_factor < 1 {
            return Err(ConfigError::ValidationError(
                "topic.replication_factor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Metrics reporting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Report after every N successfully enriched events
    pub report_interval: u64,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            report_interval: 100,
        }
    }
}

impl MetricsSettings {
    pub fn validate(&self) -> Result<()> {
        if self.report_interval == 0 {
            return Err(ConfigError::ValidationError(
                "metrics.report_interval must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilitySettings {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,

    /// Enable structured JSON logging
    pub json_logging: bool,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}
