//! Stdout Sink - human-readable debug output
//!
//! Prints one line per published event. Not intended for production use at
//! high throughput; this is what the bridge runs with when no bus is
//! attached.
//!
//! # Example Output
//!
//! ```text
//! 14:02:51 gmond h1 load_one 0.5 {"type":"float","units":"","slope":3,"tmax":60,"dmax":0}
//! 14:02:52 gmond h2 m1 5 {"type":"uint32","tn":"10","tmax":"60"}
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use owo_colors::{OwoColorize, Style};
use serde_json::Value;

use gmond_pipeline::{EventSink, SinkError};

/// Configuration for stdout sink
#[derive(Debug, Clone)]
pub struct StdoutConfig {
    /// Enable colored output
    pub color: bool,
}

impl Default for StdoutConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

impl StdoutConfig {
    /// Create config with colors disabled (for piped output)
    pub fn no_color() -> Self {
        Self { color: false }
    }
}

// =============================================================================
// Color Styles
// =============================================================================

/// Color styles for terminal output
struct Styles {
    timestamp: Style,
    label: Style,
    payload: Style,
}

impl Styles {
    fn new(enabled: bool) -> Self {
        if enabled {
            Self {
                timestamp: Style::new().dimmed(),
                label: Style::new().dimmed(),
                payload: Style::new().dimmed(),
            }
        } else {
            Self {
                timestamp: Style::new(),
                label: Style::new(),
                payload: Style::new(),
            }
        }
    }
}

// =============================================================================
// StdoutSink Implementation
// =============================================================================

/// Stdout sink for debug output
#[derive(Debug, Default)]
pub struct StdoutSink {
    /// Configuration
    config: StdoutConfig,

    /// Events printed
    events_published: AtomicU64,

    /// Serialized bytes received
    bytes_published: AtomicU64,
}

impl StdoutSink {
    /// Create a new stdout sink with default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new stdout sink with custom config
    pub fn with_config(config: StdoutConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Get snapshot of publish counters
    pub fn snapshot(&self) -> StdoutSinkMetricsSnapshot {
        StdoutSinkMetricsSnapshot {
            events_published: self.events_published.load(Ordering::Relaxed),
            bytes_published: self.bytes_published.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of stdout sink counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StdoutSinkMetricsSnapshot {
    pub events_published: u64,
    pub bytes_published: u64,
}

#[async_trait]
impl EventSink for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn publish(&self, topic: &str, event: &[u8]) -> Result<(), SinkError> {
        self.events_published.fetch_add(1, Ordering::Relaxed);
        self.bytes_published
            .fetch_add(event.len() as u64, Ordering::Relaxed);

        // println! locks stdout per call, so concurrent publishes stay
        // line-atomic
        match serde_json::from_slice::<Value>(event) {
            Ok(value) => println!("{}", format_event(topic, &value, self.config.color)),
            Err(_) => println!("{} {}", topic, String::from_utf8_lossy(event)),
        }

        Ok(())
    }
}

// =============================================================================
// Formatting Helpers
// =============================================================================

/// Render one event as a single line
fn format_event(topic: &str, event: &Value, color: bool) -> String {
    let styles = Styles::new(color);

    let ts = format_timestamp(event["timestamp"].as_i64().unwrap_or(0));
    let payload = &event["payload"];
    let hostname = payload["hostname"].as_str().unwrap_or("-");
    let name = payload["name"].as_str().unwrap_or("-");
    let value = format_value(&payload["value"]);
    let rest = format_rest(payload);

    format!(
        "{} {} {} {} {} {}",
        ts.style(styles.timestamp),
        topic.style(styles.label),
        hostname.style(styles.label),
        name,
        value,
        rest.style(styles.payload)
    )
}

/// Format timestamp as HH:MM:SS (from unix seconds)
fn format_timestamp(ts_secs: i64) -> String {
    Utc.timestamp_opt(ts_secs, 0)
        .single()
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| format!("{}", ts_secs))
}

/// Render the metric value without JSON string quoting
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

/// Compact JSON of the payload minus the fields already on the line
fn format_rest(payload: &Value) -> String {
    let Value::Object(map) = payload else {
        return String::new();
    };

    let rest: serde_json::Map<String, Value> = map
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "name" | "value" | "hostname"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    if rest.is_empty() {
        String::new()
    } else {
        serde_json::to_string(&rest).unwrap_or_default()
    }
}
