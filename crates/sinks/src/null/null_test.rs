//! Tests for the null sink

use gmond_pipeline::EventSink;

use super::NullSink;

#[tokio::test]
async fn test_discards_and_counts() {
    let sink = NullSink::new();

    sink.publish("gmond", b"{\"id\":\"1\"}").await.unwrap();
    sink.publish("gmond", b"{\"id\":\"22\"}").await.unwrap();

    let snapshot = sink.snapshot();
    assert_eq!(snapshot.events_discarded, 2);
    assert_eq!(snapshot.bytes_discarded, 21);
}

#[test]
fn test_name() {
    assert_eq!(NullSink::new().name(), "null");
}
