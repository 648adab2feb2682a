//! Stream endpoint traits
//!
//! The pipeline driver talks to its input and output through these traits,
//! so the Kafka implementations and the in-memory ones used in tests are
//! interchangeable.

use async_trait::async_trait;
use login_pipeline_types::{EnrichedEvent, RawEvent};

use super::error::Result;

/// Input stream of raw login events
#[async_trait]
pub trait EventSource: Send {
    /// Wait for the next event
    ///
    /// `Ok(None)` means the stream has ended. A non-fatal error concerns one
    /// message only; the caller may keep receiving.
    async fn recv(&mut self) -> Result<Option<RawEvent>>;

    /// Release the connection
    async fn close(&mut self) -> Result<()>;
}

/// Output stream of enriched events
#[async_trait]
pub trait EventSink: Send {
    /// Hand an event to the stream without waiting for broker acknowledgment
    async fn publish(&mut self, event: &EnrichedEvent) -> Result<()>;

    /// Flush pending events and release the connection
    async fn close(&mut self) -> Result<()>;
}
