//! Error types for the login processor
//!
//! Per-message problems never surface here: the enrichment engine converts
//! them into drop reasons. These types cover state store failures and the
//! conditions that stop the pipeline.

use thiserror::Error;

use crate::kafka::KafkaError;

/// Main processor error type
#[derive(Error, Debug)]
pub enum ProcessorError {
    /// State store errors
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// Stream endpoint errors
    #[error("stream error: {0}")]
    Stream(#[from] KafkaError),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Configuration(#[from] login_pipeline_config::ConfigError),

    /// Generic error for unexpected conditions
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// State store operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// A running counter cannot be incremented any further
    #[error("counter overflow for {category} key '{key}'")]
    CounterOverflow { category: String, key: String },
}

/// Result type alias for processor operations
pub type Result<T> = std::result::Result<T, ProcessorError>;

/// Result type alias for state operations
pub type StateResult<T> = std::result::Result<T, StateError>;
