use std::collections::BTreeSet;
use std::time::Duration;

use conduit::concurrency::shutdown::ShutdownResult;
use conduit::concurrency::stream::BatchStream;
use conduit::error::ErrorKind;
use conduit::sequencer::next_batch;
use conduit::test_utils::generators::{quit_all, spawn_immediate_all};
use conduit::test_utils::wait::TimedWait;
use conduit::workers::fan_in::fan_in;
use conduit::workers::group::GeneratorGroup;
use conduit_config::shared::{GeneratorConfig, SequencerConfig};
use conduit_telemetry::tracing::init_test_tracing;
use futures::StreamExt;

#[tokio::test(flavor = "multi_thread")]
async fn batch_of_all_sources_holds_one_message_per_source() {
    init_test_tracing();

    let wait = TimedWait::new();
    let labels = ["Joe", "Ann", "Bob"];
    let (streams, handles) = spawn_immediate_all(&labels);
    let mut merged = fan_in(streams);

    for round in 0..10 {
        let batch = wait
            .within(next_batch(&mut merged, labels.len()))
            .await
            .unwrap();

        let contents: BTreeSet<String> = batch.contents().into_iter().map(String::from).collect();
        let expected: BTreeSet<String> = labels
            .iter()
            .map(|label| format!("{label} {round}"))
            .collect();
        assert_eq!(contents, expected);

        assert_eq!(batch.acknowledge_all(), labels.len());
    }

    quit_all(handles).await;
}

#[tokio::test]
async fn zero_sized_batch_is_rejected() {
    init_test_tracing();

    let (streams, handles) = spawn_immediate_all(&["Joe"]);
    let mut merged = fan_in(streams);

    let err = next_batch(&mut merged, 0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidBatchSize);

    quit_all(handles).await;
}

#[tokio::test]
async fn batch_larger_than_the_live_sources_fails_once_they_stop() {
    init_test_tracing();

    let wait = TimedWait::new();
    let (streams, handles) = spawn_immediate_all(&["Joe", "Ann"]);
    let mut merged = fan_in(streams);

    let collect = tokio::spawn(async move { next_batch(&mut merged, 3).await.map(|_| ()) });

    // Two sources can never fill a batch of three; stopping them ends the wait.
    tokio::task::yield_now().await;
    quit_all(handles).await;

    let err = wait.within(collect).await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StreamClosed);
}

#[tokio::test]
async fn timed_out_batch_releases_its_sources() {
    init_test_tracing();

    let wait = TimedWait::new();
    let (streams, handles) = spawn_immediate_all(&["Joe", "Ann"]);
    let mut merged = fan_in(streams);

    // Two sources can never fill a batch of three, so the collection is cut short.
    let timed_out = tokio::time::timeout(Duration::from_millis(200), next_batch(&mut merged, 3))
        .await
        .is_err();
    assert!(timed_out);

    // The messages held by the cancelled collection were acknowledged, so both sources
    // keep emitting.
    for _ in 0..3 {
        let batch = wait.within(next_batch(&mut merged, 2)).await.unwrap();
        let labels: BTreeSet<&str> = batch
            .iter()
            .filter_map(|message| message.content().split_whitespace().next())
            .collect();
        assert_eq!(labels, BTreeSet::from(["Ann", "Joe"]));
        assert_eq!(batch.acknowledge_all(), 2);
    }

    quit_all(handles).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn batch_stream_returns_the_partial_batch_on_shutdown() {
    init_test_tracing();

    let wait = TimedWait::new();
    let mut group = GeneratorGroup::start(["Joe", "Ann"], &GeneratorConfig::immediate());
    let merged = group.merged().unwrap();
    let config = SequencerConfig { batch_size: 2 };
    let mut batches = BatchStream::wrap(merged, &config, group.shutdown_rx()).unwrap();

    for _ in 0..5 {
        match wait.within(batches.next()).await {
            Some(ShutdownResult::Ok(batch)) => {
                assert_eq!(batch.len(), 2);
                assert_eq!(batch.acknowledge_all(), 2);
            }
            _ => panic!("expected a full batch"),
        }
    }

    let farewells = wait.within(group.shutdown()).await.unwrap();
    assert_eq!(farewells.len(), 2);

    let last = wait.within(batches.next()).await.unwrap();
    assert!(last.should_shutdown());
    if let ShutdownResult::Shutdown(batch) = last {
        assert!(batch.len() <= 2);
        batch.acknowledge_all();
    }
    assert!(wait.within(batches.next()).await.is_none());
}
