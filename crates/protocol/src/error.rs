//! Protocol error types
//!
//! Errors that can occur while decoding binary packets.

use thiserror::Error;

/// Errors that can occur during packet decode
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Packet ends before a declared field does
    #[error("packet truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    /// String length prefix is negative
    #[error("invalid string length: {0}")]
    InvalidLength(i32),

    /// String content is not valid UTF-8
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,

    /// Leading type tag does not name a known record kind
    #[error("unknown record tag: {0}")]
    UnknownRecordTag(i32),
}

impl DecodeError {
    /// Create a truncation error
    #[inline]
    pub fn truncated(needed: usize, available: usize) -> Self {
        Self::Truncated { needed, available }
    }

    /// Whether this error means the packet was cut short
    ///
    /// Truncation is the one decode failure the caller can attribute to the
    /// transport rather than to the sender's encoder.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}
