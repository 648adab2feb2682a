//! Wire types for the login event enrichment pipeline
//!
//! This crate holds the records exchanged with the input and output streams:
//! the raw login event as received and the enriched event as republished.

pub mod events;

pub use events::{DeviceType, EnrichedEvent, RawEvent, RawTimestamp, UNKNOWN};
