//! Per-agent metric metadata
//!
//! A metadata record must precede data records for the same metric name on
//! the same agent. The store keeps the last announcement per name; data
//! records join against whatever is present at the moment they arrive.

use std::collections::HashMap;

use gmond_protocol::MetadataRecord;

/// Last-known metadata for one metric on one agent
#[derive(Debug, Clone, PartialEq)]
pub struct MetricMetadata {
    /// Metric name, the store key
    pub name: String,

    /// Announced value type
    pub metric_type: String,

    /// Unit label
    pub units: String,

    /// Expected value trend
    pub slope: i32,

    /// Maximum seconds between reports
    pub tmax: i32,

    /// Maximum seconds before the value goes stale
    pub dmax: i32,

    /// Extra attributes in wire order
    pub extra: Vec<(String, String)>,
}

impl From<MetadataRecord> for MetricMetadata {
    fn from(record: MetadataRecord) -> Self {
        Self {
            name: record.metric_name,
            metric_type: record.metric_type,
            units: record.units,
            slope: record.slope,
            tmax: record.tmax,
            dmax: record.dmax,
            extra: record.extra,
        }
    }
}

/// Metric-name keyed metadata for one agent
///
/// Owned by the agent's connection state and dropped with it. No history,
/// no TTL, no sharing across agents.
#[derive(Debug, Default)]
pub struct MetadataStore {
    entries: HashMap<String, MetricMetadata>,
}

impl MetadataStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or overwrite the metadata for its metric name
    ///
    /// Last write wins; extra attributes are replaced, never merged.
    pub fn upsert(&mut self, metadata: MetricMetadata) {
        self.entries.insert(metadata.name.clone(), metadata);
    }

    /// Current metadata for `name`, if any announcement has been seen
    pub fn lookup(&self, name: &str) -> Option<&MetricMetadata> {
        self.entries.get(name)
    }

    /// Number of metrics announced on this agent
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether any metric has been announced
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
