//! gmond-bridge pipeline
//!
//! The seam between the ingest front ends and the message bus:
//! - `MetricEvent` - the canonical event envelope both front ends produce
//! - `EventEmitter` - serializes events and forwards them to the sink
//! - `EventSink` - the publish trait message-bus sinks implement
//!
//! # Design
//!
//! The emitter owns the topic and a shared sink handle; handlers call
//! `emit` and get the sink's verdict back. There are no retries here - a
//! failed publish is surfaced to the caller, which logs and continues, and
//! never touches decoder or correlation state.

mod emitter;
mod event;
mod sink;

pub use emitter::{EmitError, EmitterMetrics, EmitterSnapshot, EventEmitter};
pub use event::{MetricEvent, EVENT_CONTEXT, EVENT_SOURCE};
pub use sink::{EventSink, SinkError};

/// Default topic events are published on
pub const DEFAULT_TOPIC: &str = "gmond";
