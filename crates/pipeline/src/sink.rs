//! Sink seam
//!
//! `EventSink` is the contract between the emitter and whatever carries
//! events off-process. Implementations live in the sinks crate; the real
//! message-bus socket sits behind the same trait.

use async_trait::async_trait;
use thiserror::Error;

/// Errors a sink can surface from `publish`
#[derive(Debug, Error)]
pub enum SinkError {
    /// I/O error talking to the destination
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write the event
    #[error("write failed: {0}")]
    Write(String),

    /// Sink has shut down and accepts no more events
    #[error("sink closed")]
    Closed,
}

impl SinkError {
    /// Create a write error
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }
}

/// Destination for serialized events
///
/// `publish` must be safe under concurrent invocation: the snapshot source
/// runs one task per connection and all of them share one sink.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Sink name for logging
    fn name(&self) -> &str;

    /// Publish one serialized event on `topic`
    async fn publish(&self, topic: &str, event: &[u8]) -> Result<(), SinkError>;
}
