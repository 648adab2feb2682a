//! Kafka endpoints for the login pipeline
//!
//! - [`KafkaEventSource`] consumes raw login events from the source topic
//! - [`KafkaEventSink`] publishes enriched events to the destination topic
//! - [`TopicProvisioner`] creates topics on the cluster
//!
//! The pipeline driver only sees the [`EventSource`] and [`EventSink`]
//! traits. Errors are [`KafkaError`]s; [`KafkaError::is_fatal`] tells the
//! driver whether to drop one message or stop.
//!
//! # Example
//!
//! ```rust,no_run
//! use login_pipeline_config::KafkaSettings;
//! use login_processor::kafka::{EventSource, KafkaEventSource};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut source = KafkaEventSource::new(&KafkaSettings::default())?;
//! while let Some(event) = source.recv().await? {
//!     println!("login from {:?}", event.user_id);
//! }
//! source.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod admin;
pub mod error;
pub mod sink;
pub mod source;
pub mod traits;

pub use admin::TopicProvisioner;
pub use error::{KafkaError, Result as KafkaResult};
pub use sink::{KafkaEventSink, SinkMetrics};
pub use source::{decode_payload, KafkaEventSource, KafkaSourceMetrics};
pub use traits::{EventSink, EventSource};
