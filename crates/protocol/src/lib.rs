//! gmond binary packet protocol
//!
//! This crate provides the wire-format types for the gmond binary protocol
//! and a decoder from raw packet bytes to typed records:
//! - `Record` - tagged union over the three record kinds on the wire
//! - `MetadataRecord` / `DataRecord` - decoded record contents
//! - `XdrReader` / `XdrWriter` - XDR-style primitive codec (big-endian,
//!   length-prefixed strings padded to 4-byte boundaries)
//!
//! # Wire Format
//!
//! Every packet starts with a big-endian i32 type tag:
//!
//! | Tag | Record    | Layout                                             |
//! |-----|-----------|----------------------------------------------------|
//! | 128 | Metadata  | host, name, spoof, type, name dup, units, slope,   |
//! |     |           | tmax, dmax, count, count x (key, value)            |
//! | 132 | Heartbeat | host, name, spoof, format, [value per format]      |
//! | 133 | Data      | host, name, spoof, format, value per format        |
//! | 134 | Data      | same blob as 133                                   |
//!
//! Strings are encoded as a 4-byte big-endian length prefix, the content
//! bytes, then padding to the next multiple of 4.
//!
//! # Design
//!
//! - **Per-packet framing**: `decode_record` consumes one record and reports
//!   how many bytes it took; a truncated field fails the whole record and the
//!   caller drops the packet.
//! - **Tagged dispatch**: unknown tags are a typed error, never a silent skip
//!   at this layer - the caller decides what to drop.
//! - **No allocation beyond field contents**: the reader borrows the packet.

mod encode;
mod error;
mod record;
mod xdr;

pub use encode::{encode_data, encode_heartbeat, encode_metadata, XdrWriter};
pub use error::DecodeError;
pub use record::{
    decode_record, DataRecord, MetadataRecord, MetricValue, Record, TAG_DATA, TAG_DATA_LEGACY,
    TAG_HEARTBEAT, TAG_METADATA,
};
pub use xdr::XdrReader;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, DecodeError>;

// Test modules - only compiled during testing
#[cfg(test)]
mod encode_test;
#[cfg(test)]
mod xdr_test;
