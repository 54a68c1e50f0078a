use std::collections::HashMap;

use conduit::test_utils::generators::{quit_all, spawn_immediate_all};
use conduit::test_utils::wait::TimedWait;
use conduit::workers::fan_in::{fan_in, fan_in_select};
use conduit_telemetry::tracing::init_test_tracing;

/// Splits `"<label> <index>"` into its parts.
fn parse(content: &str) -> (String, u64) {
    let (label, index) = content.rsplit_once(' ').unwrap();
    (label.to_string(), index.parse().unwrap())
}

#[tokio::test(flavor = "multi_thread")]
async fn fan_in_delivers_every_message_exactly_once() {
    init_test_tracing();

    let wait = TimedWait::new();
    let labels = ["Joe", "Ann", "Bob"];
    let (streams, handles) = spawn_immediate_all(&labels);
    let mut merged = fan_in(streams);

    // Next expected index per source: no loss, no duplication, per-source order kept.
    let mut next_index: HashMap<String, u64> = HashMap::new();
    for _ in 0..300 {
        let message = wait.within(merged.recv()).await.unwrap();
        let (label, index) = parse(message.content());

        let expected = next_index.entry(label).or_default();
        assert_eq!(index, *expected);
        *expected += 1;

        assert!(message.acknowledge());
    }

    assert_eq!(next_index.values().sum::<u64>(), 300);
    assert_eq!(next_index.len(), labels.len());

    quit_all(handles).await;
    assert!(wait.within(merged.recv()).await.is_none());
}

#[tokio::test]
async fn select_fan_in_delivers_every_message_exactly_once() {
    init_test_tracing();

    let wait = TimedWait::new();
    let (streams, handles) = spawn_immediate_all(&["Joe", "Ann"]);
    let mut merged = fan_in_select(streams);

    let mut next_index: HashMap<String, u64> = HashMap::new();
    for _ in 0..50 {
        let message = wait.within(merged.recv()).await.unwrap();
        let (label, index) = parse(message.content());

        let expected = next_index.entry(label).or_default();
        assert_eq!(index, *expected);
        *expected += 1;

        assert!(message.acknowledge());
    }

    quit_all(handles).await;
    assert!(wait.within(merged.recv()).await.is_none());
}
