//! Tests for the XDR primitive reader

use crate::error::DecodeError;
use crate::xdr::XdrReader;

/// Hand-build a length-prefixed padded string field
fn string_field(content: &str) -> Vec<u8> {
    let mut buf = (content.len() as i32).to_be_bytes().to_vec();
    buf.extend_from_slice(content.as_bytes());
    buf.extend(std::iter::repeat(0u8).take((4 - content.len() % 4) % 4));
    buf
}

#[test]
fn test_read_i32_big_endian() {
    let mut r = XdrReader::new(&[0x00, 0x00, 0x00, 0x80]);
    assert_eq!(r.read_i32().unwrap(), 128);
    assert_eq!(r.consumed(), 4);
}

#[test]
fn test_read_i32_negative() {
    let mut r = XdrReader::new(&[0xff, 0xff, 0xff, 0xfe]);
    assert_eq!(r.read_i32().unwrap(), -2);
}

#[test]
fn test_read_f32_big_endian() {
    let bytes = 0.5f32.to_be_bytes();
    let mut r = XdrReader::new(&bytes);
    assert_eq!(r.read_f32().unwrap(), 0.5);
}

#[test]
fn test_read_i32_truncated() {
    let mut r = XdrReader::new(&[0x00, 0x00]);
    assert!(matches!(
        r.read_i32(),
        Err(DecodeError::Truncated {
            needed: 4,
            available: 2
        })
    ));
}

#[test]
fn test_string_consumes_prefix_content_and_padding() {
    // For every content length L the field occupies 4 + L + ((4 - L) mod 4)
    // bytes, so the reader always lands on a 4-byte boundary.
    for content in ["", "a", "ab", "abc", "abcd", "abcde"] {
        let len = content.len();
        let buf = string_field(content);
        let mut r = XdrReader::new(&buf);
        assert_eq!(r.read_string().unwrap(), content);
        assert_eq!(r.consumed(), 4 + len + (4 - len % 4) % 4, "length {len}");
        assert_eq!(r.remaining(), 0, "length {len}");
    }
}

#[test]
fn test_string_truncated_content() {
    // Prefix declares 8 bytes but only 3 follow
    let mut buf = 8i32.to_be_bytes().to_vec();
    buf.extend_from_slice(b"abc");
    let mut r = XdrReader::new(&buf);
    assert!(matches!(r.read_string(), Err(DecodeError::Truncated { .. })));
}

#[test]
fn test_string_truncated_padding() {
    // Content fits but the padding bytes are missing
    let mut buf = 3i32.to_be_bytes().to_vec();
    buf.extend_from_slice(b"abc");
    let mut r = XdrReader::new(&buf);
    assert!(matches!(r.read_string(), Err(DecodeError::Truncated { .. })));
}

#[test]
fn test_string_negative_length() {
    let buf = (-1i32).to_be_bytes().to_vec();
    let mut r = XdrReader::new(&buf);
    assert!(matches!(r.read_string(), Err(DecodeError::InvalidLength(-1))));
}

#[test]
fn test_string_invalid_utf8() {
    let mut buf = 2i32.to_be_bytes().to_vec();
    buf.extend_from_slice(&[0xff, 0xfe, 0x00, 0x00]);
    let mut r = XdrReader::new(&buf);
    assert!(matches!(r.read_string(), Err(DecodeError::InvalidUtf8)));
}

#[test]
fn test_sequential_reads_advance() {
    let mut buf = 7i32.to_be_bytes().to_vec();
    buf.extend_from_slice(&string_field("host"));
    let mut r = XdrReader::new(&buf);
    assert_eq!(r.read_i32().unwrap(), 7);
    assert_eq!(r.read_string().unwrap(), "host");
    assert_eq!(r.remaining(), 0);
}
