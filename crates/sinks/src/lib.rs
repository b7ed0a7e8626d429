//! gmond-bridge sinks
//!
//! `EventSink` implementations the emitter can publish through. The real
//! message bus lives behind the same trait, outside this repository.
//!
//! # Available Sinks
//!
//! | Sink     | Purpose                        |
//! |----------|--------------------------------|
//! | `stdout` | Human-readable debug output    |
//! | `null`   | Discard all events (counting)  |
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gmond_pipeline::{EventEmitter, EventSink};
//! use gmond_sinks::stdout::StdoutSink;
//!
//! let sink: Arc<dyn EventSink> = Arc::new(StdoutSink::default());
//! let emitter = EventEmitter::new("gmond", sink);
//! ```

/// Null sink - discards all events (for benchmarking)
pub mod null;

/// Stdout sink - human-readable debug output
pub mod stdout;

pub use null::{NullSink, NullSinkMetricsSnapshot};
pub use stdout::{StdoutConfig, StdoutSink, StdoutSinkMetricsSnapshot};
