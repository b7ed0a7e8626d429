//! XDR-style writer and record encoders
//!
//! The bridge itself never sends packets; the writer exists so tests and
//! test clients can produce wire-compatible packets without a live gmond.

use crate::record::{DataRecord, MetadataRecord, MetricValue, TAG_DATA, TAG_HEARTBEAT, TAG_METADATA};

/// Growable buffer with XDR-style primitive writes
///
/// The mirror image of [`crate::XdrReader`]: big-endian fixed-width values,
/// strings length-prefixed and padded to 4-byte boundaries.
#[derive(Debug, Default)]
pub struct XdrWriter {
    buf: Vec<u8>,
}

impl XdrWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a big-endian i32
    pub fn write_i32(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Append a big-endian u32
    pub fn write_u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Append a big-endian IEEE-754 single
    pub fn write_f32(&mut self, v: f32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Append a length-prefixed string padded to the next 4-byte boundary
    pub fn write_string(&mut self, s: &str) -> &mut Self {
        let bytes = s.as_bytes();
        self.write_i32(bytes.len() as i32);
        self.buf.extend_from_slice(bytes);
        let padding = (4 - bytes.len() % 4) % 4;
        self.buf.extend_from_slice(&[0u8; 3][..padding]);
        self
    }

    /// Consume the writer, returning the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Encode a metadata packet (tag 128)
pub fn encode_metadata(record: &MetadataRecord) -> Vec<u8> {
    let mut w = XdrWriter::new();
    w.write_i32(TAG_METADATA)
        .write_string(&record.hostname)
        .write_string(&record.metric_name)
        .write_i32(record.spoof)
        .write_string(&record.metric_type)
        .write_string(&record.metric_name_dup)
        .write_string(&record.units)
        .write_i32(record.slope)
        .write_i32(record.tmax)
        .write_i32(record.dmax)
        .write_i32(record.extra.len() as i32);
    for (key, value) in &record.extra {
        w.write_string(key).write_string(value);
    }
    w.into_bytes()
}

/// Encode a data packet (tag 134)
pub fn encode_data(record: &DataRecord) -> Vec<u8> {
    encode_blob(TAG_DATA, record)
}

/// Encode a heartbeat packet (tag 132)
pub fn encode_heartbeat(record: &DataRecord) -> Vec<u8> {
    encode_blob(TAG_HEARTBEAT, record)
}

fn encode_blob(tag: i32, record: &DataRecord) -> Vec<u8> {
    let mut w = XdrWriter::new();
    w.write_i32(tag)
        .write_string(&record.hostname)
        .write_string(&record.metric_name)
        .write_i32(record.spoof)
        .write_string(&record.format);
    match &record.value {
        Some(MetricValue::Float(v)) => {
            w.write_f32(*v);
        }
        Some(MetricValue::Uint(v)) => {
            w.write_u32(*v);
        }
        Some(MetricValue::Str(v)) => {
            w.write_string(v);
        }
        None => {}
    }
    w.into_bytes()
}
