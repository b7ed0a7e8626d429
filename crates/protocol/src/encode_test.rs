//! Tests for the XDR writer and record encoders

use crate::encode::{encode_data, encode_metadata, XdrWriter};
use crate::record::{
    decode_record, DataRecord, MetadataRecord, MetricValue, Record, TAG_METADATA,
};

#[test]
fn test_writer_string_layout() {
    // "abc" -> prefix 3, content, one padding byte
    let mut w = XdrWriter::new();
    w.write_string("abc");
    assert_eq!(w.into_bytes(), vec![0, 0, 0, 3, b'a', b'b', b'c', 0]);
}

#[test]
fn test_writer_string_no_padding_on_boundary() {
    let mut w = XdrWriter::new();
    w.write_string("abcd");
    assert_eq!(
        w.into_bytes(),
        vec![0, 0, 0, 4, b'a', b'b', b'c', b'd']
    );
}

#[test]
fn test_writer_empty_string() {
    let mut w = XdrWriter::new();
    w.write_string("");
    assert_eq!(w.into_bytes(), vec![0, 0, 0, 0]);
}

#[test]
fn test_metadata_packet_starts_with_tag() {
    let packet = encode_metadata(&sample_metadata());
    assert_eq!(&packet[..4], &TAG_METADATA.to_be_bytes());
}

#[test]
fn test_encoder_and_decoder_agree_on_metadata() {
    let meta = sample_metadata();
    let packet = encode_metadata(&meta);
    let (record, consumed) = decode_record(&packet).unwrap();
    assert_eq!(consumed, packet.len());
    assert_eq!(record, Record::Metadata(meta));
}

#[test]
fn test_encoder_and_decoder_agree_on_data() {
    let data = DataRecord {
        hostname: "h1".to_string(),
        metric_name: "load_one".to_string(),
        spoof: 0,
        format: "%f".to_string(),
        value: Some(MetricValue::Float(0.5)),
    };
    let packet = encode_data(&data);
    let (record, consumed) = decode_record(&packet).unwrap();
    assert_eq!(consumed, packet.len());
    assert_eq!(record, Record::Data(data));
}

fn sample_metadata() -> MetadataRecord {
    MetadataRecord {
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
    }
}
