//! Login pipeline driver and assembly
//!
//! [`PipelineDriver`] runs the receive → enrich → publish loop through the
//! `Starting → Running → Draining → Stopped` lifecycle. [`PipelineBuilder`]
//! wires a driver from [`PipelineSettings`](login_pipeline_config::PipelineSettings).

pub mod builder;
pub mod driver;

pub use builder::{KafkaPipeline, PipelineBuilder};
pub use driver::{DriverState, PipelineDriver, PipelineSummary, StopCause};
