//! XML snapshot source
//!
//! Accepts TCP connections that each push one full-state XML document.
//! The whole document is read to EOF (bounded, with a per-read timeout to
//! reject stalled peers), walked in a single pass, and its metrics are
//! emitted with corrected timestamps. A parse error anywhere discards the
//! whole document; the listener keeps accepting further pushes.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use gmond_pipeline::{EventEmitter, MetricEvent};

use crate::common::SourceMetrics;
use crate::walker::{walk_document, MalformedDocument};

// =============================================================================
// Constants
// =============================================================================

/// Default snapshot listen port
const DEFAULT_PORT: u16 = 8651;

/// Default maximum document size (16MB)
const DEFAULT_MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

/// Default per-read timeout for a pushing peer
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Initial read buffer capacity per connection (64KB)
const INITIAL_BUFFER_CAPACITY: usize = 64 * 1024;

// =============================================================================
// Configuration
// =============================================================================

/// XML snapshot source configuration
#[derive(Debug, Clone)]
pub struct SnapshotSourceConfig {
    /// Source identifier for logging
    pub id: String,

    /// Bind address (e.g., "0.0.0.0")
    pub address: String,

    /// Listen port
    pub port: u16,

    /// Maximum accepted document size
    pub max_document_size: usize,

    /// Timeout for each read from a pushing peer
    pub read_timeout: Duration,
}

impl Default for SnapshotSourceConfig {
    fn default() -> Self {
        Self {
            id: "snapshot".into(),
            address: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl SnapshotSourceConfig {
    /// Create config with custom port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Get the socket address to bind to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

// =============================================================================
// Metrics
// =============================================================================

/// XML snapshot source metrics
#[derive(Debug, Default)]
pub struct SnapshotSourceMetrics {
    /// Base source metrics (messages = documents)
    pub base: SourceMetrics,

    /// Documents aborted by a parse error
    pub documents_malformed: AtomicU64,

    /// Documents dropped for exceeding the size bound
    pub documents_oversized: AtomicU64,

    /// Connections dropped for stalling mid-push
    pub read_timeouts: AtomicU64,
}

impl SnapshotSourceMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            base: SourceMetrics::new(),
            documents_malformed: AtomicU64::new(0),
            documents_oversized: AtomicU64::new(0),
            read_timeouts: AtomicU64::new(0),
        }
    }

    /// Record a malformed document
    #[inline]
    pub fn document_malformed(&self) {
        self.documents_malformed.fetch_add(1, Ordering::Relaxed);
        self.base.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an oversized document
    #[inline]
    pub fn document_oversized(&self) {
        self.documents_oversized.fetch_add(1, Ordering::Relaxed);
        self.base.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a stalled peer
    #[inline]
    pub fn read_timeout(&self) {
        self.read_timeouts.fetch_add(1, Ordering::Relaxed);
        self.base.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get extended metrics snapshot
    pub fn snapshot(&self) -> SnapshotMetricsSnapshot {
        let base = self.base.snapshot();
        SnapshotMetricsSnapshot {
            connections_active: base.connections_active,
            connections_total: base.connections_total,
            documents_received: base.messages_received,
            bytes_received: base.bytes_received,
            events_emitted: base.events_emitted,
            errors: base.errors,
            documents_malformed: self.documents_malformed.load(Ordering::Relaxed),
            documents_oversized: self.documents_oversized.load(Ordering::Relaxed),
            read_timeouts: self.read_timeouts.load(Ordering::Relaxed),
        }
    }
}

/// Extended metrics snapshot for the snapshot source
#[derive(Debug, Clone, Copy)]
pub struct SnapshotMetricsSnapshot {
    pub connections_active: u64,
    pub connections_total: u64,
    pub documents_received: u64,
    pub bytes_received: u64,
    pub events_emitted: u64,
    pub errors: u64,
    pub documents_malformed: u64,
    pub documents_oversized: u64,
    pub read_timeouts: u64,
}

// =============================================================================
// Errors
// =============================================================================

/// XML snapshot source errors
#[derive(Debug, thiserror::Error)]
pub enum SnapshotSourceError {
    /// Failed to bind to address
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document exceeds the configured size bound
    #[error("document size {size} exceeds limit {limit}")]
    DocumentTooLarge { size: usize, limit: usize },

    /// Peer stalled mid-push
    #[error("read timed out after {0:?}")]
    ReadTimeout(Duration),

    /// Document could not be parsed
    #[error(transparent)]
    Malformed(#[from] MalformedDocument),
}

// =============================================================================
// Source Implementation
// =============================================================================

/// XML snapshot source
///
/// One accepted connection delivers one document; connections are handled
/// in their own tasks and only share the emitter.
pub struct SnapshotSource {
    /// Configuration
    config: SnapshotSourceConfig,

    /// Emitter shared with the other front end
    emitter: EventEmitter,

    /// Metrics
    metrics: Arc<SnapshotSourceMetrics>,
}

impl SnapshotSource {
    /// Create a new snapshot source
    pub fn new(config: SnapshotSourceConfig, emitter: EventEmitter) -> Self {
        Self {
            config,
            emitter,
            metrics: Arc::new(SnapshotSourceMetrics::new()),
        }
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &Arc<SnapshotSourceMetrics> {
        &self.metrics
    }

    /// Run the source until cancelled
    pub async fn run(self, cancel: CancellationToken) -> Result<(), SnapshotSourceError> {
        let bind_addr = self.config.bind_address();

        let listener =
            TcpListener::bind(&bind_addr)
                .await
                .map_err(|e| SnapshotSourceError::Bind {
                    address: bind_addr.clone(),
                    source: e,
                })?;

        tracing::info!(
            source_id = %self.config.id,
            address = %bind_addr,
            max_document_size = %self.config.max_document_size,
            read_timeout_secs = %self.config.read_timeout.as_secs(),
            "snapshot source listening"
        );

        let source = Arc::new(self);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    break;
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            source.metrics.base.connection_opened();

                            let source = Arc::clone(&source);
                            tokio::spawn(async move {
                                if let Err(e) = source.handle_connection(stream, peer_addr).await {
                                    tracing::warn!(
                                        peer = %peer_addr,
                                        error = %e,
                                        "snapshot connection failed"
                                    );
                                }
                                source.metrics.base.connection_closed();
                            });
                        }
                        Err(e) => {
                            // Transient accept errors - log and continue
                            tracing::warn!(error = %e, "accept error");
                            source.metrics.base.error();
                        }
                    }
                }
            }
        }

        tracing::info!(source_id = %source.config.id, "snapshot source stopped");

        Ok(())
    }

    /// Read one pushed document and process it
    async fn handle_connection(
        &self,
        stream: TcpStream,
        peer_addr: SocketAddr,
    ) -> Result<(), SnapshotSourceError> {
        let document = self.read_document(stream).await?;
        self.metrics.base.message_received(document.len() as u64);

        let text = match std::str::from_utf8(&document) {
            Ok(text) => text,
            Err(e) => {
                self.metrics.document_malformed();
                return Err(MalformedDocument(format!("invalid UTF-8: {e}")).into());
            }
        };

        match self.process_document(text).await {
            Ok(count) => {
                tracing::debug!(
                    peer = %peer_addr,
                    bytes = document.len(),
                    events = count,
                    "snapshot processed"
                );
                Ok(())
            }
            Err(e) => {
                self.metrics.document_malformed();
                Err(e.into())
            }
        }
    }

    /// Read the stream to EOF, bounded in size and per-read time
    async fn read_document<S>(&self, mut stream: S) -> Result<BytesMut, SnapshotSourceError>
    where
        S: AsyncRead + Unpin,
    {
        let mut buf = BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY);

        loop {
            let read = match timeout(self.config.read_timeout, stream.read_buf(&mut buf)).await {
                Ok(result) => result?,
                Err(_) => {
                    self.metrics.read_timeout();
                    return Err(SnapshotSourceError::ReadTimeout(self.config.read_timeout));
                }
            };

            if read == 0 {
                return Ok(buf);
            }

            if buf.len() > self.config.max_document_size {
                self.metrics.document_oversized();
                return Err(SnapshotSourceError::DocumentTooLarge {
                    size: buf.len(),
                    limit: self.config.max_document_size,
                });
            }
        }
    }

    /// Walk a complete document and emit every corrected metric
    ///
    /// All-or-nothing per snapshot: a parse error yields zero events.
    /// Publish failures are logged per event and do not abort the rest of
    /// the document.
    async fn process_document(&self, text: &str) -> Result<usize, MalformedDocument> {
        let metrics = walk_document(text)?;

        let mut emitted = 0usize;
        for metric in metrics {
            let event = MetricEvent::new(metric.timestamp, metric.payload);
            match self.emitter.emit(&event).await {
                Ok(()) => {
                    self.metrics.base.event_emitted();
                    emitted += 1;
                }
                Err(e) => {
                    self.metrics.base.error();
                    tracing::warn!(
                        metric = event.metric_name().unwrap_or("?"),
                        error = %e,
                        "event publish failed"
                    );
                }
            }
        }

        Ok(emitted)
    }
}

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod snapshot_test;
