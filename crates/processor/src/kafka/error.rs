//! Stream endpoint error types.
//!
//! Errors are split by whether they concern a single message or the stream
//! connection itself. The pipeline driver drops the message for the former
//! and shuts down for the latter.

use thiserror::Error;

/// Result type alias for stream endpoint operations.
pub type Result<T> = std::result::Result<T, KafkaError>;

/// Error type for input/output stream operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KafkaError {
    /// The client could not be created from its configuration.
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// Error establishing or keeping a connection to the brokers.
    #[error("Failed to connect to Kafka broker {broker}: {message}")]
    Connection {
        /// Error message describing the connection failure.
        message: String,
        /// Broker list that failed.
        broker: String,
    },

    /// Error receiving from the input topic.
    #[error("Failed to consume message from topic {topic}: {message}")]
    Consumption {
        /// Error message describing the consumption failure.
        message: String,
        /// Topic from which consumption failed.
        topic: String,
    },

    /// A received message could not be decoded into a raw event.
    #[error("Failed to decode message from {topic}[{partition}]@{offset}: {message}")]
    Decode {
        message: String,
        topic: String,
        partition: i32,
        offset: i64,
    },

    /// An enriched event could not be encoded.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure.
        message: String,
    },

    /// Error handing a message to the producer.
    #[error("Failed to produce message to topic {topic}: {message}")]
    Production {
        /// Error message describing the production failure.
        message: String,
        /// Topic to which production failed.
        topic: String,
    },

    /// The admin client could not create a topic.
    #[error("Failed to create topic {topic}: {message}")]
    TopicCreation {
        message: String,
        topic: String,
    },
}

impl KafkaError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>, broker: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            broker: broker.into(),
        }
    }

    /// Create a consumption error.
    pub fn consumption(message: impl Into<String>, topic: impl Into<String>) -> Self {
        Self::Consumption {
            message: message.into(),
            topic: topic.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(
        message: impl Into<String>,
        topic: impl Into<String>,
        partition: i32,
        offset: i64,
    ) -> Self {
        Self::Decode {
            message: message.into(),
            topic: topic.into(),
            partition,
            offset,
        }
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a production error.
    pub fn production(message: impl Into<String>, topic: impl Into<String>) -> Self {
        Self::Production {
            message: message.into(),
            topic: topic.into(),
        }
    }

    /// Create a topic creation error.
    pub fn topic_creation(message: impl Into<String>, topic: impl Into<String>) -> Self {
        Self::TopicCreation {
            message: message.into(),
            topic: topic.into(),
        }
    }

    /// Check if the error is fatal for the stream.
    ///
    /// Returns `false` for errors confined to one message.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            KafkaError::Decode { .. } | KafkaError::Serialization { .. }
        )
    }
}

impl From<serde_json::Error> for KafkaError {
    fn from(err: serde_json::Error) -> Self {
        KafkaError::serialization(err.to_string())
    }
}
