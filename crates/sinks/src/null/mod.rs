//! Null Sink - discards all events
//!
//! Counts what it throws away. Useful for benchmarking the ingest path
//! without a bus attached.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use gmond_pipeline::{EventSink, SinkError};

/// Sink that accepts and discards every event
#[derive(Debug, Default)]
pub struct NullSink {
    events_discarded: AtomicU64,
    bytes_discarded: AtomicU64,
}

impl NullSink {
    /// Create a new null sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Get snapshot of discard counters
    pub fn snapshot(&self) -> NullSinkMetricsSnapshot {
        NullSinkMetricsSnapshot {
            events_discarded: self.events_discarded.load(Ordering::Relaxed),
            bytes_discarded: self.bytes_discarded.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of null sink counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullSinkMetricsSnapshot {
    pub events_discarded: u64,
    pub bytes_discarded: u64,
}

#[async_trait]
impl EventSink for NullSink {
    fn name(&self) -> &str {
        "null"
    }

    async fn publish(&self, _topic: &str, event: &[u8]) -> Result<(), SinkError> {
        self.events_discarded.fetch_add(1, Ordering::Relaxed);
        self.bytes_discarded
            .fetch_add(event.len() as u64, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
#[path = "null_test.rs"]
mod null_test;
