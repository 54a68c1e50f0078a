use std::time::Duration;

use conduit::deadline::{DeadlineGuard, DrainEnd, Guarded, with_timeout};
use conduit::workers::fan_in::fan_in;
use conduit::workers::generator::start_generator;
use conduit_config::shared::{CadenceConfig, DeadlineConfig, DeadlineMode, GeneratorConfig};
use conduit_telemetry::tracing::init_test_tracing;

fn every(delay: Duration) -> GeneratorConfig {
    GeneratorConfig {
        cadence: CadenceConfig::fixed(delay),
        ..GeneratorConfig::immediate()
    }
}

#[tokio::test(start_paused = true)]
async fn deadline_shorter_than_the_cadence_times_out() {
    init_test_tracing();

    let (joe, joe_handle) = start_generator("Joe", every(Duration::from_secs(1)));
    let (ann, ann_handle) = start_generator("Ann", every(Duration::from_secs(1)));
    let mut merged = fan_in([joe, ann]);

    // First emissions are immediate, the cadence applies after each acknowledgment.
    for _ in 0..2 {
        let message = with_timeout(&mut merged, Duration::from_millis(500))
            .await
            .unwrap();
        assert!(message.acknowledge());
    }

    assert!(
        with_timeout(&mut merged, Duration::from_millis(500))
            .await
            .is_none()
    );

    joe_handle.quit_and_wait().await.unwrap();
    ann_handle.quit_and_wait().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn absolute_deadline_ends_a_busy_conversation() {
    init_test_tracing();

    let (stream, handle) = start_generator("Joe", every(Duration::from_millis(100)));
    let config = DeadlineConfig {
        timeout_ms: 1000,
        mode: DeadlineMode::Absolute,
    };
    let mut guard = DeadlineGuard::new(stream, &config);

    let mut contents = Vec::new();
    let summary = guard
        .drain(|message| {
            contents.push(message.content().to_string());
            message.acknowledge();
        })
        .await;

    // Messages at 0ms, 100ms, ..., 900ms; the deadline at 1000ms wins over the next one.
    assert_eq!(summary.end, DrainEnd::TimedOut);
    assert_eq!(summary.received, 10);
    assert_eq!(contents.first().map(String::as_str), Some("Joe 0"));
    assert_eq!(contents.last().map(String::as_str), Some("Joe 9"));

    handle.quit_and_wait().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn per_receive_deadline_tolerates_a_steady_cadence() {
    init_test_tracing();

    let (stream, handle) = start_generator("Joe", every(Duration::from_millis(300)));
    let config = DeadlineConfig {
        timeout_ms: 500,
        mode: DeadlineMode::PerReceive,
    };
    let mut guard = DeadlineGuard::new(stream, &config);

    for _ in 0..20 {
        match guard.recv().await {
            Guarded::Message(message) => assert!(message.acknowledge()),
            other => panic!("expected a message, got {other:?}"),
        }
    }

    handle.quit_and_wait().await.unwrap();
    assert!(matches!(guard.recv().await, Guarded::Closed));
}
