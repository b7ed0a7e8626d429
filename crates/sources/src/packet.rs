//! Binary packet source
//!
//! Receives gmond binary protocol packets over UDP, one record per
//! datagram. Each sending agent gets its own correlation state: metadata
//! records announce a metric, later data records for the same name join
//! against that announcement and become normalized events. Heartbeats only
//! refresh the agent's liveness.
//!
//! # Design
//!
//! - Single socket task: datagrams are processed strictly in arrival
//!   order, so per-agent state needs no locking
//! - Agent state is keyed by peer address and expired after an idle
//!   period - UDP has no close, so expiry stands in for teardown
//! - A data record whose metric was never announced on that agent is
//!   dropped (startup race, not a fault)
//! - A decode failure drops that datagram only; the socket keeps serving

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde_json::{Map, Value};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use gmond_pipeline::{EventEmitter, MetricEvent};
use gmond_protocol::{decode_record, DataRecord, MetricValue, Record};

use crate::common::SourceMetrics;
use crate::metadata::{MetadataStore, MetricMetadata};

// =============================================================================
// Constants
// =============================================================================

/// Default gmond UDP port
const DEFAULT_PORT: u16 = 8649;

/// Default socket receive buffer size (64KB)
const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Default maximum datagram size (8KB)
const DEFAULT_MAX_PACKET_SIZE: usize = 8192;

/// Default idle period before an agent's state is torn down
const DEFAULT_AGENT_IDLE: Duration = Duration::from_secs(600);

/// Socket buffer multiplier for UDP bursts
const UDP_BUFFER_MULTIPLIER: usize = 4;

// =============================================================================
// Configuration
// =============================================================================

/// Binary packet source configuration
#[derive(Debug, Clone)]
pub struct PacketSourceConfig {
    /// Source identifier for logging
    pub id: String,

    /// Bind address (e.g., "0.0.0.0")
    pub address: String,

    /// Listen port
    pub port: u16,

    /// Socket receive buffer size
    pub buffer_size: usize,

    /// Maximum accepted datagram size
    pub max_packet_size: usize,

    /// Idle period after which an agent's correlation state is dropped
    pub agent_idle_timeout: Duration,
}

impl Default for PacketSourceConfig {
    fn default() -> Self {
        Self {
            id: "packet".into(),
            address: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            agent_idle_timeout: DEFAULT_AGENT_IDLE,
        }
    }
}

impl PacketSourceConfig {
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

/// Binary packet source metrics
#[derive(Debug, Default)]
pub struct PacketSourceMetrics {
    /// Base source metrics (connections = tracked agents)
    pub base: SourceMetrics,

    /// Metadata records stored
    pub metadata_records: AtomicU64,

    /// Heartbeats seen
    pub heartbeats: AtomicU64,

    /// Data records dropped because their metric was never announced
    pub unknown_metrics: AtomicU64,

    /// Datagrams that failed to decode
    pub decode_errors: AtomicU64,

    /// Datagrams dropped for exceeding the size bound
    pub packets_oversized: AtomicU64,
}

impl PacketSourceMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            base: SourceMetrics::new(),
            metadata_records: AtomicU64::new(0),
            heartbeats: AtomicU64::new(0),
            unknown_metrics: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            packets_oversized: AtomicU64::new(0),
        }
    }

    /// Record a stored metadata record
    #[inline]
    pub fn metadata_record(&self) {
        self.metadata_records.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a heartbeat
    #[inline]
    pub fn heartbeat(&self) {
        self.heartbeats.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a data record with no matching metadata
    #[inline]
    pub fn unknown_metric(&self) {
        self.unknown_metrics.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a decode failure
    #[inline]
    pub fn decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
        self.base.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an oversized datagram
    #[inline]
    pub fn packet_oversized(&self) {
        self.packets_oversized.fetch_add(1, Ordering::Relaxed);
        self.base.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get extended metrics snapshot
    pub fn snapshot(&self) -> PacketMetricsSnapshot {
        let base = self.base.snapshot();
        PacketMetricsSnapshot {
            agents_active: base.connections_active,
            agents_total: base.connections_total,
            packets_received: base.messages_received,
            bytes_received: base.bytes_received,
            events_emitted: base.events_emitted,
            errors: base.errors,
            metadata_records: self.metadata_records.load(Ordering::Relaxed),
            heartbeats: self.heartbeats.load(Ordering::Relaxed),
            unknown_metrics: self.unknown_metrics.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            packets_oversized: self.packets_oversized.load(Ordering::Relaxed),
        }
    }
}

/// Extended metrics snapshot for the packet source
#[derive(Debug, Clone, Copy)]
pub struct PacketMetricsSnapshot {
    pub agents_active: u64,
    pub agents_total: u64,
    pub packets_received: u64,
    pub bytes_received: u64,
    pub events_emitted: u64,
    pub errors: u64,
    pub metadata_records: u64,
    pub heartbeats: u64,
    pub unknown_metrics: u64,
    pub decode_errors: u64,
    pub packets_oversized: u64,
}

// =============================================================================
// Errors
// =============================================================================

/// Binary packet source errors
#[derive(Debug, thiserror::Error)]
pub enum PacketSourceError {
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
}

// =============================================================================
// Connection state
// =============================================================================

/// Correlation state for one sending agent
///
/// Owned by the source task, keyed by peer address. Dropping it is the
/// connection teardown: the metadata map goes with it.
#[derive(Debug)]
struct ConnectionState {
    store: MetadataStore,
    last_activity: Instant,
}

impl ConnectionState {
    fn new(now: Instant) -> Self {
        Self {
            store: MetadataStore::new(),
            last_activity: now,
        }
    }

    #[inline]
    fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }
}

// =============================================================================
// Source Implementation
// =============================================================================

/// Binary packet source
///
/// Binds a UDP socket, decodes each datagram as one record, and drives the
/// metadata/data correlation per sending agent.
pub struct PacketSource {
    /// Configuration
    config: PacketSourceConfig,

    /// Emitter shared with the other front end
    emitter: EventEmitter,

    /// Metrics
    metrics: Arc<PacketSourceMetrics>,
}

impl PacketSource {
    /// Create a new packet source
    pub fn new(config: PacketSourceConfig, emitter: EventEmitter) -> Self {
        Self {
            config,
            emitter,
            metrics: Arc::new(PacketSourceMetrics::new()),
        }
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &Arc<PacketSourceMetrics> {
        &self.metrics
    }

    /// Run the source until cancelled
    pub async fn run(self, cancel: CancellationToken) -> Result<(), PacketSourceError> {
        let bind_addr = self.config.bind_address();
        let socket_addr: SocketAddr =
            bind_addr.parse().map_err(|_| PacketSourceError::Bind {
                address: bind_addr.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "invalid socket address",
                ),
            })?;

        let socket = self
            .create_socket(socket_addr)
            .map_err(|e| PacketSourceError::Bind {
                address: bind_addr.clone(),
                source: e,
            })?;

        tracing::info!(
            source_id = %self.config.id,
            address = %bind_addr,
            max_packet_size = %self.config.max_packet_size,
            agent_idle_secs = %self.config.agent_idle_timeout.as_secs(),
            "packet source listening"
        );

        // Per-agent correlation state, owned by this task
        let mut agents: HashMap<SocketAddr, ConnectionState> = HashMap::new();

        // Receive buffer sized one past the bound so oversized datagrams
        // are detectable rather than silently clipped
        let mut recv_buf = vec![0u8; self.config.max_packet_size + 1];

        // Idle agents are swept periodically, not per packet
        let mut sweep_interval = interval(sweep_period(self.config.agent_idle_timeout));
        sweep_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    break;
                }

                _ = sweep_interval.tick() => {
                    self.sweep_idle(&mut agents, Instant::now());
                }

                recv_result = socket.recv_from(&mut recv_buf) => {
                    match recv_result {
                        Ok((len, peer_addr)) => {
                            if len > self.config.max_packet_size {
                                self.metrics.packet_oversized();
                                tracing::debug!(
                                    peer = %peer_addr,
                                    size = len,
                                    max = self.config.max_packet_size,
                                    "datagram too large, dropping"
                                );
                                continue;
                            }
                            self.process_datagram(&mut agents, peer_addr, &recv_buf[..len])
                                .await;
                        }
                        Err(e) => {
                            self.metrics.base.error();
                            tracing::debug!(error = %e, "recv error");
                        }
                    }
                }
            }
        }

        tracing::info!(
            source_id = %self.config.id,
            agents = agents.len(),
            "packet source stopped"
        );

        Ok(())
    }

    /// Decode one datagram and drive the correlation state machine
    ///
    /// Decode failures and unmatched data records drop the packet and
    /// nothing else; the socket task keeps serving.
    async fn process_datagram(
        &self,
        agents: &mut HashMap<SocketAddr, ConnectionState>,
        peer_addr: SocketAddr,
        data: &[u8],
    ) {
        self.metrics.base.message_received(data.len() as u64);

        let now = Instant::now();
        let state = agents.entry(peer_addr).or_insert_with(|| {
            self.metrics.base.connection_opened();
            tracing::debug!(peer = %peer_addr, "new agent");
            ConnectionState::new(now)
        });
        state.touch(now);

        let record = match decode_record(data) {
            Ok((record, _consumed)) => record,
            Err(e) => {
                self.metrics.decode_error();
                tracing::debug!(peer = %peer_addr, error = %e, "packet decode failed");
                return;
            }
        };

        match record {
            Record::Metadata(meta) => {
                tracing::debug!(
                    peer = %peer_addr,
                    metric = %meta.metric_name,
                    metric_type = %meta.metric_type,
                    "metadata stored"
                );
                state.store.upsert(MetricMetadata::from(meta));
                self.metrics.metadata_record();
            }
            Record::Heartbeat(_) => {
                // Liveness only; last_activity was already refreshed
                self.metrics.heartbeat();
            }
            Record::Data(data_record) => {
                self.handle_data(peer_addr, &state.store, data_record).await;
            }
        }
    }

    /// Join a data record with stored metadata and emit the event
    async fn handle_data(
        &self,
        peer_addr: SocketAddr,
        store: &MetadataStore,
        record: DataRecord,
    ) {
        let Some(metadata) = store.lookup(&record.metric_name) else {
            // Expected startup race: data arrived before any announcement
            self.metrics.unknown_metric();
            tracing::debug!(
                peer = %peer_addr,
                metric = %record.metric_name,
                "no metadata for data record, dropping"
            );
            return;
        };

        let Some(value) = &record.value else {
            tracing::debug!(
                peer = %peer_addr,
                metric = %record.metric_name,
                format = %record.format,
                "data record carries no value, dropping"
            );
            return;
        };

        let payload = build_payload(&record, value, metadata);
        let event = MetricEvent::new(unix_now(), payload);

        match self.emitter.emit(&event).await {
            Ok(()) => self.metrics.base.event_emitted(),
            Err(e) => {
                // Publish failure never rolls back the store
                self.metrics.base.error();
                tracing::warn!(
                    peer = %peer_addr,
                    metric = %record.metric_name,
                    error = %e,
                    "event publish failed"
                );
            }
        }
    }

    /// Drop agents idle past the configured timeout
    fn sweep_idle(&self, agents: &mut HashMap<SocketAddr, ConnectionState>, now: Instant) -> usize {
        let idle = self.config.agent_idle_timeout;
        let before = agents.len();
        agents.retain(|peer, state| {
            let keep = now.duration_since(state.last_activity) < idle;
            if !keep {
                self.metrics.base.connection_closed();
                tracing::debug!(peer = %peer, metrics = state.store.len(), "idle agent dropped");
            }
            keep
        });
        before - agents.len()
    }

    /// Create the UDP socket with a sized receive buffer
    fn create_socket(&self, addr: SocketAddr) -> std::io::Result<UdpSocket> {
        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;

        let recv_buffer_size = self.config.buffer_size * UDP_BUFFER_MULTIPLIER;
        if let Err(e) = socket.set_recv_buffer_size(recv_buffer_size) {
            tracing::warn!(
                error = %e,
                requested_size = recv_buffer_size,
                "failed to set UDP SO_RCVBUF"
            );
        }

        socket.bind(&addr.into())?;
        socket.set_nonblocking(true)?;

        let std_socket: std::net::UdpSocket = socket.into();
        UdpSocket::from_std(std_socket)
    }
}

// =============================================================================
// Payload construction
// =============================================================================

/// Build the canonical payload for a joined data record
///
/// Field order is fixed: name, value, hostname, then the metadata fields,
/// then extra attributes in wire order with lower-cased keys (matching the
/// snapshot walker's normalization).
fn build_payload(
    record: &DataRecord,
    value: &MetricValue,
    metadata: &MetricMetadata,
) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("name".to_string(), Value::from(record.metric_name.clone()));
    payload.insert("value".to_string(), value_to_json(value));
    payload.insert("hostname".to_string(), Value::from(record.hostname.clone()));
    payload.insert("type".to_string(), Value::from(metadata.metric_type.clone()));
    payload.insert("units".to_string(), Value::from(metadata.units.clone()));
    payload.insert("slope".to_string(), Value::from(metadata.slope));
    payload.insert("tmax".to_string(), Value::from(metadata.tmax));
    payload.insert("dmax".to_string(), Value::from(metadata.dmax));
    for (key, val) in &metadata.extra {
        payload.insert(key.to_lowercase(), Value::from(val.clone()));
    }
    payload
}

/// Convert a decoded metric value to its JSON form
fn value_to_json(value: &MetricValue) -> Value {
    match value {
        MetricValue::Float(v) => Value::from(f64::from(*v)),
        MetricValue::Uint(v) => Value::from(*v),
        MetricValue::Str(v) => Value::from(v.clone()),
    }
}

/// Current time as unix seconds
fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Sweep cadence for a given idle timeout
fn sweep_period(idle: Duration) -> Duration {
    (idle / 4).max(Duration::from_secs(1))
}

#[cfg(test)]
#[path = "packet_test.rs"]
mod packet_test;
