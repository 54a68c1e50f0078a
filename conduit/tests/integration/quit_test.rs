use std::time::Duration;

use conduit::error::ErrorKind;
use conduit::test_utils::generators::spawn_immediate;
use conduit::test_utils::wait::TimedWait;
use conduit::workers::generator::{GeneratorState, start_generator};
use conduit::workers::group::GeneratorGroup;
use conduit_config::shared::{CadenceConfig, GeneratorConfig};
use conduit_telemetry::tracing::init_test_tracing;

#[tokio::test]
async fn quit_and_wait_returns_the_farewell_and_ends_the_stream() {
    init_test_tracing();

    let wait = TimedWait::new();
    let (mut stream, mut handle) = spawn_immediate("Joe");

    for _ in 0..3 {
        let message = wait.within(stream.recv()).await.unwrap();
        assert!(message.acknowledge());
    }

    let farewell = wait.within(handle.quit_and_wait()).await.unwrap();
    assert!(!farewell.is_empty());

    // Nothing is observed from a generator after its farewell.
    assert!(wait.within(stream.recv()).await.is_none());

    wait.within(handle.stopped()).await;
    assert_eq!(handle.state(), GeneratorState::Stopped);
}

#[tokio::test]
async fn quit_is_served_while_nobody_receives() {
    init_test_tracing();

    let wait = TimedWait::new();
    let (_stream, handle) = spawn_immediate("Joe");

    // Nobody receives, so the first message is never acknowledged.
    tokio::task::yield_now().await;

    let farewell = wait.within(handle.quit_and_wait()).await.unwrap();
    assert_eq!(farewell, GeneratorConfig::DEFAULT_FAREWELL);
}

#[tokio::test(start_paused = true)]
async fn quit_is_served_during_the_cadence_delay() {
    init_test_tracing();

    let config = GeneratorConfig {
        cadence: CadenceConfig::fixed(Duration::from_secs(60)),
        farewell: "Bye!".to_string(),
    };
    let (mut stream, handle) = start_generator("Ann", config);

    let message = stream.recv().await.unwrap();
    assert!(message.acknowledge());

    assert_eq!(handle.quit_and_wait().await.unwrap(), "Bye!");
    assert_eq!(handle.wait().await.unwrap(), 1);
}

#[tokio::test]
async fn concurrent_quits_stop_the_generator_exactly_once() {
    init_test_tracing();

    let wait = TimedWait::new();
    let (mut stream, handle) = spawn_immediate("Joe");
    let quit_handle = handle.quit_handle();

    // The first request fills the quit slot and the second one is ignored.
    assert!(quit_handle.quit());
    assert!(!handle.quit());

    assert!(wait.within(stream.recv()).await.is_none());

    // Once stopped, a confirmed request fails instead of blocking.
    let err = wait.within(quit_handle.quit_and_wait()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GeneratorStopped);
    assert!(quit_handle.is_stopped());
    assert!(!quit_handle.quit());

    assert_eq!(handle.state(), GeneratorState::Stopped);
    assert_eq!(wait.within(handle.wait()).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn racing_confirmed_quits_yield_one_farewell() {
    init_test_tracing();

    let wait = TimedWait::new();
    let (_stream, handle) = spawn_immediate("Joe");

    let requests = (0..4).map(|_| {
        let quit_handle = handle.quit_handle();
        tokio::spawn(async move { quit_handle.quit_and_wait().await })
    });
    let results = wait.within(futures::future::join_all(requests)).await;

    let farewells = results
        .into_iter()
        .map(|result| result.unwrap())
        .filter(|result| result.is_ok())
        .count();
    assert_eq!(farewells, 1);

    wait.within(handle.wait()).await.unwrap();
}

#[tokio::test]
async fn group_shutdown_quits_every_member() {
    init_test_tracing();

    let wait = TimedWait::new();
    let mut group = GeneratorGroup::start(["Joe", "Ann", "Bob"], &GeneratorConfig::immediate());
    let mut merged = group.merged().unwrap();

    for _ in 0..9 {
        let message = wait.within(merged.recv()).await.unwrap();
        assert!(message.acknowledge());
    }

    let farewells = wait.within(group.shutdown()).await.unwrap();
    assert_eq!(farewells.len(), 3);
    assert!(wait.within(merged.recv()).await.is_none());
}
