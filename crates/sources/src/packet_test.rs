//! Tests for the binary packet source

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;

use gmond_pipeline::{EventSink, SinkError};
use gmond_protocol::{encode_data, encode_heartbeat, encode_metadata, DataRecord, MetadataRecord, MetricValue};

use super::*;

/// Sink that records every publish
#[derive(Default)]
struct CaptureSink {
    published: Mutex<Vec<(String, Vec<u8>)>>,
}

impl CaptureSink {
    fn events(&self) -> Vec<Value> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(_, bytes)| serde_json::from_slice(bytes).unwrap())
            .collect()
    }
}

#[async_trait]
impl EventSink for CaptureSink {
    fn name(&self) -> &str {
        "capture"
    }

    async fn publish(&self, topic: &str, event: &[u8]) -> Result<(), SinkError> {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), event.to_vec()));
        Ok(())
    }
}

/// Sink that fails the first publish, then recovers
#[derive(Default)]
struct FailOnceSink {
    failed: AtomicBool,
    published: Mutex<Vec<Vec<u8>>>,
}

#[async_trait]
impl EventSink for FailOnceSink {
    fn name(&self) -> &str {
        "fail_once"
    }

    async fn publish(&self, _topic: &str, event: &[u8]) -> Result<(), SinkError> {
        if !self.failed.swap(true, std::sync::atomic::Ordering::Relaxed) {
            return Err(SinkError::write("bus unavailable"));
        }
        self.published.lock().unwrap().push(event.to_vec());
        Ok(())
    }
}

fn capture_source() -> (PacketSource, Arc<CaptureSink>) {
    let sink = Arc::new(CaptureSink::default());
    let emitter = EventEmitter::new("gmond", Arc::clone(&sink) as Arc<dyn EventSink>);
    let source = PacketSource::new(PacketSourceConfig::default(), emitter);
    (source, sink)
}

fn peer(s: &str) -> SocketAddr {
    s.parse().unwrap()
}

fn load_one_metadata() -> Vec<u8> {
    encode_metadata(&MetadataRecord {
        hostname: "h1".to_string(),
        metric_name: "load_one".to_string(),
        spoof: 0,
        metric_type: "float".to_string(),
        metric_name_dup: "load_one".to_string(),
        units: "".to_string(),
        slope: 3,
        tmax: 60,
        dmax: 0,
        extra: vec![],
    })
}

fn load_one_data(value: f32) -> Vec<u8> {
    encode_data(&DataRecord {
        hostname: "h1".to_string(),
        metric_name: "load_one".to_string(),
        spoof: 0,
        format: "%f".to_string(),
        value: Some(MetricValue::Float(value)),
    })
}

#[tokio::test]
async fn test_metadata_then_data_emits_joined_event() {
    let (source, sink) = capture_source();
    let mut agents = HashMap::new();
    let agent = peer("10.0.0.1:8649");

    source
        .process_datagram(&mut agents, agent, &load_one_metadata())
        .await;
    source
        .process_datagram(&mut agents, agent, &load_one_data(0.5))
        .await;

    let events = sink.events();
    assert_eq!(events.len(), 1);

    let payload = &events[0]["payload"];
    assert_eq!(payload["name"], "load_one");
    assert_eq!(payload["value"], 0.5);
    assert_eq!(payload["hostname"], "h1");
    assert_eq!(payload["type"], "float");
    assert_eq!(payload["units"], "");
    assert_eq!(payload["slope"], 3);
    assert_eq!(payload["tmax"], 60);
    assert_eq!(payload["dmax"], 0);
    assert!(payload.get("spoof").is_none());

    assert_eq!(events[0]["context"], "METRIC");
    assert_eq!(events[0]["source"], "GMOND");
}

#[tokio::test]
async fn test_data_without_metadata_is_dropped() {
    let (source, sink) = capture_source();
    let mut agents = HashMap::new();

    source
        .process_datagram(&mut agents, peer("10.0.0.1:8649"), &load_one_data(0.5))
        .await;

    assert!(sink.events().is_empty());
    assert_eq!(source.metrics().snapshot().unknown_metrics, 1);
    assert_eq!(source.metrics().snapshot().events_emitted, 0);
}

#[tokio::test]
async fn test_truncated_packet_does_not_poison_the_agent() {
    let (source, sink) = capture_source();
    let mut agents = HashMap::new();
    let agent = peer("10.0.0.1:8649");

    let mut truncated = load_one_metadata();
    truncated.truncate(truncated.len() - 6);
    source.process_datagram(&mut agents, agent, &truncated).await;

    assert_eq!(source.metrics().snapshot().decode_errors, 1);
    assert!(sink.events().is_empty());

    // The next well-formed packets on the same agent still work
    source
        .process_datagram(&mut agents, agent, &load_one_metadata())
        .await;
    source
        .process_datagram(&mut agents, agent, &load_one_data(1.25))
        .await;

    assert_eq!(sink.events().len(), 1);
}

#[tokio::test]
async fn test_heartbeat_is_liveness_only() {
    let (source, sink) = capture_source();
    let mut agents = HashMap::new();
    let agent = peer("10.0.0.1:8649");

    let heartbeat = encode_heartbeat(&DataRecord {
        hostname: "h1".to_string(),
        metric_name: "heartbeat".to_string(),
        spoof: 0,
        format: "".to_string(),
        value: None,
    });
    source.process_datagram(&mut agents, agent, &heartbeat).await;

    assert!(sink.events().is_empty());
    assert_eq!(source.metrics().snapshot().heartbeats, 1);
    assert_eq!(agents.len(), 1);
    assert!(agents[&agent].store.is_empty());
}

#[tokio::test]
async fn test_metadata_is_scoped_to_one_agent() {
    let (source, sink) = capture_source();
    let mut agents = HashMap::new();

    source
        .process_datagram(&mut agents, peer("10.0.0.1:8649"), &load_one_metadata())
        .await;

    // A different agent sending the same metric name has no announcement
    source
        .process_datagram(&mut agents, peer("10.0.0.2:8649"), &load_one_data(0.5))
        .await;

    assert!(sink.events().is_empty());
    assert_eq!(source.metrics().snapshot().unknown_metrics, 1);
    assert_eq!(agents.len(), 2);
}

#[tokio::test]
async fn test_extra_attributes_join_with_lowercased_keys() {
    let (source, sink) = capture_source();
    let mut agents = HashMap::new();
    let agent = peer("10.0.0.1:8649");

    let metadata = encode_metadata(&MetadataRecord {
        hostname: "h1".to_string(),
        metric_name: "load_one".to_string(),
        spoof: 0,
        metric_type: "float".to_string(),
        metric_name_dup: "load_one".to_string(),
        units: "".to_string(),
        slope: 3,
        tmax: 60,
        dmax: 0,
        extra: vec![("GROUP".to_string(), "load".to_string())],
    });
    source.process_datagram(&mut agents, agent, &metadata).await;
    source
        .process_datagram(&mut agents, agent, &load_one_data(0.5))
        .await;

    let events = sink.events();
    assert_eq!(events[0]["payload"]["group"], "load");
}

#[tokio::test]
async fn test_later_metadata_does_not_rewrite_emitted_events() {
    let (source, sink) = capture_source();
    let mut agents = HashMap::new();
    let agent = peer("10.0.0.1:8649");

    source
        .process_datagram(&mut agents, agent, &load_one_metadata())
        .await;
    source
        .process_datagram(&mut agents, agent, &load_one_data(0.5))
        .await;

    // Re-announce with a different type, then send another value
    let mut reannounce = MetadataRecord {
        hostname: "h1".to_string(),
        metric_name: "load_one".to_string(),
        spoof: 0,
        metric_type: "double".to_string(),
        metric_name_dup: "load_one".to_string(),
        units: "".to_string(),
        slope: 3,
        tmax: 60,
        dmax: 0,
        extra: vec![],
    };
    reannounce.units = "load".to_string();
    source
        .process_datagram(&mut agents, agent, &encode_metadata(&reannounce))
        .await;
    source
        .process_datagram(&mut agents, agent, &load_one_data(0.75))
        .await;

    let events = sink.events();
    assert_eq!(events.len(), 2);
    // The first event keeps the metadata that was current when it was built
    assert_eq!(events[0]["payload"]["type"], "float");
    assert_eq!(events[1]["payload"]["type"], "double");
    assert_eq!(events[1]["payload"]["units"], "load");
}

#[tokio::test]
async fn test_publish_failure_keeps_store_intact() {
    let sink = Arc::new(FailOnceSink::default());
    let emitter = EventEmitter::new("gmond", Arc::clone(&sink) as Arc<dyn EventSink>);
    let source = PacketSource::new(PacketSourceConfig::default(), emitter);
    let mut agents = HashMap::new();
    let agent = peer("10.0.0.1:8649");

    source
        .process_datagram(&mut agents, agent, &load_one_metadata())
        .await;
    source
        .process_datagram(&mut agents, agent, &load_one_data(0.5))
        .await;

    // First publish failed, but the metadata survived it
    assert_eq!(sink.published.lock().unwrap().len(), 0);

    source
        .process_datagram(&mut agents, agent, &load_one_data(0.75))
        .await;
    assert_eq!(sink.published.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_idle_agents_are_swept() {
    let sink = Arc::new(CaptureSink::default());
    let emitter = EventEmitter::new("gmond", sink as Arc<dyn EventSink>);
    let config = PacketSourceConfig {
        agent_idle_timeout: Duration::from_secs(60),
        ..Default::default()
    };
    let source = PacketSource::new(config, emitter);
    let mut agents = HashMap::new();

    let start = Instant::now();
    let sweep_time = start + Duration::from_secs(120);
    agents.insert(peer("10.0.0.1:8649"), ConnectionState::new(sweep_time));
    agents.insert(peer("10.0.0.2:8649"), ConnectionState::new(start));
    source.metrics().base.connection_opened();
    source.metrics().base.connection_opened();

    let removed = source.sweep_idle(&mut agents, sweep_time);
    assert_eq!(removed, 1);
    assert_eq!(agents.len(), 1);
    assert!(agents.contains_key(&peer("10.0.0.1:8649")));
}

#[test]
fn test_sweep_period_is_bounded_below() {
    assert_eq!(sweep_period(Duration::from_secs(600)), Duration::from_secs(150));
    assert_eq!(sweep_period(Duration::from_secs(2)), Duration::from_secs(1));
}
