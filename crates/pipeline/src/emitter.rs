//! Event emitter
//!
//! Builds the serialized envelope and hands it to the sink. Failures come
//! straight back to the calling handler; emitter state is only counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::event::MetricEvent;
use crate::sink::{EventSink, SinkError};

/// Errors surfaced from [`EventEmitter::emit`]
#[derive(Debug, Error)]
pub enum EmitError {
    /// Envelope could not be serialized
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Sink rejected the publish
    #[error("publish failed: {0}")]
    Publish(#[from] SinkError),
}

/// Counters for emitted events
#[derive(Debug, Default)]
pub struct EmitterMetrics {
    /// Events successfully handed to the sink
    pub events_emitted: AtomicU64,

    /// Serialized bytes handed to the sink
    pub bytes_emitted: AtomicU64,

    /// Publish failures surfaced by the sink
    pub publish_errors: AtomicU64,
}

impl EmitterMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            events_emitted: AtomicU64::new(0),
            bytes_emitted: AtomicU64::new(0),
            publish_errors: AtomicU64::new(0),
        }
    }

    /// Record a successful emit
    #[inline]
    pub fn event_emitted(&self, bytes: u64) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
        self.bytes_emitted.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a publish failure
    #[inline]
    pub fn publish_error(&self) {
        self.publish_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> EmitterSnapshot {
        EmitterSnapshot {
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            bytes_emitted: self.bytes_emitted.load(Ordering::Relaxed),
            publish_errors: self.publish_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of emitter counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitterSnapshot {
    pub events_emitted: u64,
    pub bytes_emitted: u64,
    pub publish_errors: u64,
}

/// Serializes events and forwards them to the sink on a fixed topic
///
/// Cheap to clone: clones share the sink and the counters.
#[derive(Clone)]
pub struct EventEmitter {
    topic: Arc<str>,
    sink: Arc<dyn EventSink>,
    metrics: Arc<EmitterMetrics>,
}

impl EventEmitter {
    /// Create an emitter publishing on `topic`
    pub fn new(topic: impl Into<String>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            topic: topic.into().into(),
            sink,
            metrics: Arc::new(EmitterMetrics::new()),
        }
    }

    /// Topic events are published on
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Get snapshot of emitter counters
    pub fn snapshot(&self) -> EmitterSnapshot {
        self.metrics.snapshot()
    }

    /// Serialize `event` and publish it
    ///
    /// A failure leaves no state behind beyond the error counter; the
    /// caller logs and continues.
    pub async fn emit(&self, event: &MetricEvent) -> Result<(), EmitError> {
        let bytes = event.to_json()?;

        match self.sink.publish(&self.topic, &bytes).await {
            Ok(()) => {
                self.metrics.event_emitted(bytes.len() as u64);
                tracing::trace!(
                    topic = %self.topic,
                    metric = event.metric_name().unwrap_or("?"),
                    bytes = bytes.len(),
                    "event emitted"
                );
                Ok(())
            }
            Err(e) => {
                self.metrics.publish_error();
                Err(e.into())
            }
        }
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("topic", &self.topic)
            .field("sink", &self.sink.name())
            .finish()
    }
}
