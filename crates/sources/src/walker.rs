//! Snapshot document walker
//!
//! A single forward pass over one `GANGLIA_XML` document:
//! `(GRID >) CLUSTER(LOCALTIME) > HOST(NAME) > METRIC(...)`. Metric
//! payloads are buffered in document order because the final timestamp
//! needs both the cluster's base time and the metric's own `tn` (seconds
//! since last report), and `tn` is only combined at end of document.
//!
//! Attribute names are lower-cased into payload field names; `NAME` and
//! `VAL` map to the canonical `name` and `value` fields. A
//! `METRIC/EXTRA_DATA/EXTRA_ELEMENT[@NAME="GROUP"]` child contributes a
//! `group` field. The raw `source` attribute is removed before emission
//! because the envelope overwrites it.

use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};
use thiserror::Error;

/// A document that could not be parsed
///
/// All buffered candidates are discarded with it: a snapshot emits all of
/// its events or none of them.
#[derive(Debug, Error)]
#[error("malformed snapshot document: {0}")]
pub struct MalformedDocument(pub String);

impl From<quick_xml::Error> for MalformedDocument {
    fn from(e: quick_xml::Error) -> Self {
        Self(e.to_string())
    }
}

impl From<AttrError> for MalformedDocument {
    fn from(e: AttrError) -> Self {
        Self(e.to_string())
    }
}

/// One metric lifted out of a snapshot, timestamp already corrected
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotMetric {
    /// `cluster localtime - tn`, unix seconds
    pub timestamp: i64,

    /// Normalized metric fields
    pub payload: Map<String, Value>,
}

/// Walk one complete document into corrected metrics
///
/// Returns every metric in document order, or the parse error that
/// aborted the document.
pub fn walk_document(xml: &str) -> Result<Vec<SnapshotMetric>, MalformedDocument> {
    let mut reader = Reader::from_str(xml);

    let mut base_timestamp: Option<i64> = None;
    let mut host: Option<String> = None;
    let mut pending: Vec<Map<String, Value>> = Vec::new();
    let mut in_metric = false;
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                handle_element(&e, &mut base_timestamp, &mut host, &mut pending, in_metric)?;
                if e.name().as_ref() == b"METRIC" {
                    in_metric = true;
                }
                depth += 1;
            }
            Event::Empty(e) => {
                handle_element(&e, &mut base_timestamp, &mut host, &mut pending, in_metric)?;
            }
            Event::End(e) => {
                if e.name().as_ref() == b"METRIC" {
                    in_metric = false;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => {
                // The reader does not treat a document that stops mid-tree
                // as an error; all-or-nothing emission requires it
                if depth != 0 {
                    return Err(MalformedDocument("unexpected end of document".to_string()));
                }
                break;
            }
            _ => {}
        }
    }

    let base = base_timestamp.unwrap_or_else(|| {
        tracing::warn!("snapshot document carries no cluster localtime, using 0");
        0
    });

    Ok(pending
        .into_iter()
        .map(|mut payload| {
            // Seconds since the metric last reported, per the sender
            let tn = payload
                .get("tn")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<i64>().ok())
                .unwrap_or(0);
            payload.remove("source");
            SnapshotMetric {
                timestamp: base - tn,
                payload,
            }
        })
        .collect())
}

/// Dispatch one start/empty element into the walk state
fn handle_element(
    e: &BytesStart<'_>,
    base_timestamp: &mut Option<i64>,
    host: &mut Option<String>,
    pending: &mut Vec<Map<String, Value>>,
    in_metric: bool,
) -> Result<(), MalformedDocument> {
    match e.name().as_ref() {
        b"CLUSTER" => {
            if let Some(localtime) = attr_value(e, b"LOCALTIME")? {
                match localtime.parse::<i64>() {
                    Ok(ts) => *base_timestamp = Some(ts),
                    Err(_) => {
                        tracing::warn!(localtime = %localtime, "non-numeric cluster localtime");
                    }
                }
            }
        }
        b"HOST" => {
            if let Some(name) = attr_value(e, b"NAME")? {
                *host = Some(name);
            }
        }
        b"METRIC" => {
            pending.push(metric_payload(e, host.as_deref())?);
        }
        b"EXTRA_ELEMENT" if in_metric => {
            // Only the GROUP element is lifted into the payload
            if attr_value(e, b"NAME")?.as_deref() == Some("GROUP") {
                if let (Some(val), Some(payload)) = (attr_value(e, b"VAL")?, pending.last_mut()) {
                    payload.insert("group".to_string(), Value::from(val));
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Build a candidate payload from a METRIC element's attributes
fn metric_payload(
    e: &BytesStart<'_>,
    host: Option<&str>,
) -> Result<Map<String, Value>, MalformedDocument> {
    let mut payload = Map::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = match attr.key.as_ref() {
            b"NAME" => "name".to_string(),
            b"VAL" => "value".to_string(),
            other => String::from_utf8_lossy(other).to_lowercase(),
        };
        let value = attr.unescape_value()?.into_owned();
        payload.insert(key, Value::from(value));
    }
    payload.insert(
        "hostname".to_string(),
        Value::from(host.unwrap_or("unknown")),
    );
    Ok(payload)
}

/// Read one attribute's unescaped value by name
fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, MalformedDocument> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
