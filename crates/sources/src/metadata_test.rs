//! Tests for the per-agent metadata store

use gmond_protocol::MetadataRecord;

use crate::metadata::{MetadataStore, MetricMetadata};

fn sample_metadata(name: &str, metric_type: &str) -> MetricMetadata {
    MetricMetadata {
        name: name.to_string(),
        metric_type: metric_type.to_string(),
        units: "".to_string(),
        slope: 3,
        tmax: 60,
        dmax: 0,
        extra: vec![],
    }
}

#[test]
fn test_lookup_absent() {
    let store = MetadataStore::new();
    assert!(store.lookup("load_one").is_none());
    assert!(store.is_empty());
}

#[test]
fn test_upsert_then_lookup() {
    let mut store = MetadataStore::new();
    store.upsert(sample_metadata("load_one", "float"));

    let found = store.lookup("load_one").unwrap();
    assert_eq!(found.metric_type, "float");
    assert_eq!(found.tmax, 60);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_upsert_is_idempotent() {
    let mut store = MetadataStore::new();
    store.upsert(sample_metadata("load_one", "float"));
    store.upsert(sample_metadata("load_one", "float"));

    assert_eq!(store.len(), 1);
    assert_eq!(store.lookup("load_one").unwrap().metric_type, "float");
}

#[test]
fn test_upsert_last_write_wins() {
    let mut store = MetadataStore::new();

    let mut first = sample_metadata("load_one", "float");
    first.extra = vec![("GROUP".to_string(), "load".to_string())];
    store.upsert(first);

    // A re-announcement replaces everything, extra attributes included
    store.upsert(sample_metadata("load_one", "double"));

    let found = store.lookup("load_one").unwrap();
    assert_eq!(found.metric_type, "double");
    assert!(found.extra.is_empty());
}

#[test]
fn test_names_are_independent() {
    let mut store = MetadataStore::new();
    store.upsert(sample_metadata("load_one", "float"));
    store.upsert(sample_metadata("proc_total", "uint32"));

    assert_eq!(store.len(), 2);
    assert_eq!(store.lookup("load_one").unwrap().metric_type, "float");
    assert_eq!(store.lookup("proc_total").unwrap().metric_type, "uint32");
}

#[test]
fn test_from_metadata_record_drops_wire_only_fields() {
    let record = MetadataRecord {
        hostname: "h1".to_string(),
        metric_name: "load_one".to_string(),
        spoof: 1,
        metric_type: "float".to_string(),
        metric_name_dup: "load_one".to_string(),
        units: "".to_string(),
        slope: 3,
        tmax: 60,
        dmax: 0,
        extra: vec![("TITLE".to_string(), "Load".to_string())],
    };

    let metadata = MetricMetadata::from(record);
    assert_eq!(metadata.name, "load_one");
    assert_eq!(metadata.metric_type, "float");
    assert_eq!(metadata.extra, vec![("TITLE".to_string(), "Load".to_string())]);
}
