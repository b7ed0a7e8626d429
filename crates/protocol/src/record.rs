//! Decoded record types and the packet decoder
//!
//! One packet carries one record. The leading i32 tag selects the layout;
//! metadata records announce a metric, data records carry one value, and
//! heartbeats reuse the data layout as a liveness signal.

use crate::error::DecodeError;
use crate::xdr::XdrReader;
use crate::Result;

// =============================================================================
// Record tags
// =============================================================================

/// Metadata record: announces a metric's name, type, units and limits
pub const TAG_METADATA: i32 = 128;

/// Heartbeat record: liveness signal, data-blob layout with no value
pub const TAG_HEARTBEAT: i32 = 132;

/// Data record (older tag), same blob layout as [`TAG_DATA`]
pub const TAG_DATA_LEGACY: i32 = 133;

/// Data record: carries one metric's current value
pub const TAG_DATA: i32 = 134;

// =============================================================================
// Decoded records
// =============================================================================

/// One decoded packet
///
/// Heartbeats share the data-blob layout, so both carry a [`DataRecord`];
/// the variant preserves which tag arrived.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Metric announcement (tag 128)
    Metadata(MetadataRecord),
    /// Liveness signal (tag 132)
    Heartbeat(DataRecord),
    /// Metric value (tags 133/134)
    Data(DataRecord),
}

/// Contents of a metadata record
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    /// Reporting host
    pub hostname: String,

    /// Metric name, the correlation key for later data records
    pub metric_name: String,

    /// Spoof flag: the sender reports on behalf of another host
    pub spoof: i32,

    /// Value type announced by the sender ("float", "uint32", "string", ...)
    pub metric_type: String,

    /// Duplicate of the metric name carried on the wire; decoded for
    /// compatibility, never read
    pub metric_name_dup: String,

    /// Unit label ("", "bytes/sec", ...)
    pub units: String,

    /// Expected value trend
    pub slope: i32,

    /// Maximum seconds between reports
    pub tmax: i32,

    /// Maximum seconds before the value is considered stale
    pub dmax: i32,

    /// Trailing key/value attribute pairs, in wire order
    pub extra: Vec<(String, String)>,
}

/// Contents of a data or heartbeat record
#[derive(Debug, Clone, PartialEq)]
pub struct DataRecord {
    /// Reporting host
    pub hostname: String,

    /// Metric name to correlate with previously seen metadata
    pub metric_name: String,

    /// Spoof flag, as on [`MetadataRecord`]
    pub spoof: i32,

    /// printf-style format string whose type indicator selects the value
    /// encoding
    pub format: String,

    /// Decoded value; `None` when the format names no known indicator
    /// (the heartbeat case)
    pub value: Option<MetricValue>,
}

/// One metric value, typed by the format indicator that selected it
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// `f` indicator: big-endian IEEE-754 single
    Float(f32),
    /// `u` indicator: big-endian unsigned 32-bit
    Uint(u32),
    /// `s` indicator: length-prefixed padded string
    Str(String),
}

// =============================================================================
// Decoder
// =============================================================================

/// Decode one record from the front of `buf`
///
/// Returns the record and the number of bytes consumed. Any field that reads
/// past the end of the buffer fails the whole record; no partial record is
/// ever returned.
pub fn decode_record(buf: &[u8]) -> Result<(Record, usize)> {
    let mut r = XdrReader::new(buf);

    let tag = r.read_i32()?;
    let record = match tag {
        TAG_METADATA => Record::Metadata(decode_metadata_body(&mut r)?),
        TAG_HEARTBEAT => Record::Heartbeat(decode_data_blob(&mut r)?),
        TAG_DATA | TAG_DATA_LEGACY => Record::Data(decode_data_blob(&mut r)?),
        other => return Err(DecodeError::UnknownRecordTag(other)),
    };

    Ok((record, r.consumed()))
}

/// Decode the metadata layout after the tag
fn decode_metadata_body(r: &mut XdrReader<'_>) -> Result<MetadataRecord> {
    let hostname = r.read_string()?;
    let metric_name = r.read_string()?;
    let spoof = r.read_i32()?;
    let metric_type = r.read_string()?;
    let metric_name_dup = r.read_string()?;
    let units = r.read_string()?;
    let slope = r.read_i32()?;
    let tmax = r.read_i32()?;
    let dmax = r.read_i32()?;

    // Capacity comes from the reads, not the wire-declared count: a hostile
    // count would otherwise pre-allocate unbounded memory
    let element_count = r.read_i32()?;
    let mut extra = Vec::new();
    for _ in 0..element_count.max(0) {
        let key = r.read_string()?;
        let value = r.read_string()?;
        extra.push((key, value));
    }

    Ok(MetadataRecord {
        hostname,
        metric_name,
        spoof,
        metric_type,
        metric_name_dup,
        units,
        slope,
        tmax,
        dmax,
        extra,
    })
}

/// Decode the blob layout shared by data and heartbeat records
///
/// The format string is scanned left-to-right; the first `f`/`u`/`s`
/// indicator selects the value decode. No indicator means no value follows.
fn decode_data_blob(r: &mut XdrReader<'_>) -> Result<DataRecord> {
    let hostname = r.read_string()?;
    let metric_name = r.read_string()?;
    let spoof = r.read_i32()?;
    let format = r.read_string()?;

    let value = match format.chars().find(|c| matches!(c, 'f' | 'u' | 's')) {
        Some('f') => Some(MetricValue::Float(r.read_f32()?)),
        Some('u') => Some(MetricValue::Uint(r.read_u32()?)),
        Some('s') => Some(MetricValue::Str(r.read_string()?)),
        _ => None,
    };

    Ok(DataRecord {
        hostname,
        metric_name,
        spoof,
        format,
        value,
    })
}
