//! Canonical metric-event envelope
//!
//! Both the binary packet path and the XML snapshot path normalize into
//! this one shape before anything reaches the bus.

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Context marker carried by every event
pub const EVENT_CONTEXT: &str = "METRIC";

/// Source marker carried by every event
pub const EVENT_SOURCE: &str = "GMOND";

/// One normalized metric event
///
/// Immutable once built. The payload is an ordered map so extra attributes
/// keep their wire order: `{name, value, hostname, type, units, slope,
/// tmax, dmax, ...extra}`.
#[derive(Debug, Clone, Serialize)]
pub struct MetricEvent {
    /// Globally unique event id
    pub id: String,

    /// Unix seconds
    pub timestamp: i64,

    /// Always [`EVENT_CONTEXT`]
    pub context: &'static str,

    /// Always [`EVENT_SOURCE`]
    pub source: &'static str,

    /// Metric fields, normalized by the producing front end
    pub payload: Map<String, Value>,
}

impl MetricEvent {
    /// Build an event with a fresh id
    pub fn new(timestamp: i64, payload: Map<String, Value>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp,
            context: EVENT_CONTEXT,
            source: EVENT_SOURCE,
            payload,
        }
    }

    /// Serialize the envelope to JSON bytes
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Metric name from the payload, for logging
    pub fn metric_name(&self) -> Option<&str> {
        self.payload.get("name").and_then(Value::as_str)
    }
}
