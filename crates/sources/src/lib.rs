//! gmond-bridge sources
//!
//! Ingest front ends that receive gmond telemetry and emit normalized
//! metric events through the pipeline:
//!
//! - **Packet** - the binary record protocol over UDP: decodes each
//!   datagram, correlates data records with previously announced metadata
//!   per sending agent, and emits joined events.
//! - **Snapshot** - full-state XML documents over TCP: each connection
//!   delivers one document, which is walked in a single pass and emitted
//!   with per-metric corrected timestamps.
//!
//! The two front ends never share state; they only share the emitter.
//!
//! # Design
//!
//! - **Async I/O**: built on `tokio`, one task per snapshot connection,
//!   one task for the packet socket
//! - **Explicit connection context**: per-agent correlation state is an
//!   owned value keyed by peer address, torn down on idle expiry
//! - **Bounded buffering**: datagram and document sizes are capped

pub mod packet;
pub mod snapshot;
pub mod walker;

mod common;
mod metadata;

pub use common::{MetricsSnapshot, SourceMetrics};
pub use metadata::{MetadataStore, MetricMetadata};
pub use packet::{
    PacketMetricsSnapshot, PacketSource, PacketSourceConfig, PacketSourceError,
    PacketSourceMetrics,
};
pub use snapshot::{
    SnapshotMetricsSnapshot, SnapshotSource, SnapshotSourceConfig, SnapshotSourceError,
    SnapshotSourceMetrics,
};
pub use walker::{walk_document, MalformedDocument, SnapshotMetric};

// Test modules - only compiled during testing
// (packet and snapshot register their tests as child modules)
#[cfg(test)]
mod metadata_test;
