//! In-memory stream endpoints
//!
//! Used by tests to drive a pipeline without a broker. Each endpoint hands
//! out a cloneable handle so a test can inspect it after the driver has
//! taken ownership.

use async_trait::async_trait;
use login_pipeline_types::{EnrichedEvent, RawEvent};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::kafka::{EventSink, EventSource, KafkaError, KafkaResult};

/// Source replaying a fixed list of receive results
#[derive(Debug)]
pub struct MemorySource {
    items: VecDeque<KafkaResult<RawEvent>>,
    hold_open: bool,
    fail_close: bool,
    closed: Arc<AtomicBool>,
}

impl MemorySource {
    /// Source that ends the stream once `events` are exhausted
    pub fn new(events: impl IntoIterator<Item = RawEvent>) -> Self {
        Self::from_results(events.into_iter().map(Ok))
    }

    /// Source replaying events and receive errors in order
    pub fn from_results(items: impl IntoIterator<Item = KafkaResult<RawEvent>>) -> Self {
        Self {
            items: items.into_iter().collect(),
            hold_open: false,
            fail_close: false,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Block forever instead of ending the stream once exhausted
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Make `close` report a connection error
    pub fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }
}

#[async_trait]
impl EventSource for MemorySource {
    async fn recv(&mut self) -> KafkaResult<Option<RawEvent>> {
        match self.items.pop_front() {
            Some(item) => item.map(Some),
            None if self.hold_open => std::future::pending().await,
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> KafkaResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        if self.fail_close {
            return Err(KafkaError::connection("close failed", "memory"));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SinkLog {
    published: Vec<EnrichedEvent>,
    closed: bool,
}

/// Inspection handle for a [`MemorySink`]
#[derive(Debug, Clone, Default)]
pub struct MemorySinkHandle {
    log: Arc<Mutex<SinkLog>>,
}

impl MemorySinkHandle {
    /// Events published so far, in order
    pub fn published(&self) -> Vec<EnrichedEvent> {
        self.log.lock().published.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.log.lock().closed
    }
}

/// Sink collecting published events
#[derive(Debug, Default)]
pub struct MemorySink {
    handle: MemorySinkHandle,
    failures: HashMap<String, KafkaError>,
    fail_close: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every publish of an event for `user_id` with `error`
    pub fn fail_for_user(mut self, user_id: impl Into<String>, error: KafkaError) -> Self {
        self.failures.insert(user_id.into(), error);
        self
    }

    /// Make `close` report a production error
    pub fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn handle(&self) -> MemorySinkHandle {
        self.handle.clone()
    }
}

#[async_trait]
impl EventSink for MemorySink {
    async fn publish(&mut self, event: &EnrichedEvent) -> KafkaResult<()> {
        if let Some(error) = self.failures.get(&event.user_id) {
            return Err(error.clone());
        }
        self.handle.log.lock().published.push(event.clone());
        Ok(())
    }

    async fn close(&mut self) -> KafkaResult<()> {
        self.handle.log.lock().closed = true;
        if self.fail_close {
            return Err(KafkaError::production("flush failed", "memory"));
        }
        Ok(())
    }
}
