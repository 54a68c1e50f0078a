use std::time::Duration;

use conduit::test_utils::generators::{quit_all, spawn_immediate};
use conduit::test_utils::wait::{TimedWait, is_pending_now};
use conduit::workers::generator::GeneratorState;
use conduit_telemetry::tracing::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn zero_cadence_generator_emits_in_order() {
    init_test_tracing();

    let wait = TimedWait::new();
    let (mut stream, handle) = spawn_immediate("Joe");

    for index in 0..100 {
        let message = wait.within(stream.recv()).await.unwrap();
        assert_eq!(message.content(), format!("Joe {index}"));
        assert!(message.acknowledge());
    }

    assert_eq!(handle.state(), GeneratorState::Running);
    quit_all(vec![handle]).await;
}

#[tokio::test]
async fn unacknowledged_message_holds_back_the_next_one() {
    init_test_tracing();

    let wait = TimedWait::new();
    let (mut stream, handle) = spawn_immediate("Ann");

    let first = wait.within(stream.recv()).await.unwrap();
    tokio::task::yield_now().await;
    assert!(is_pending_now(stream.recv()));

    assert!(first.acknowledge());
    let second = wait.within(stream.recv()).await.unwrap();
    assert_eq!(second.content(), "Ann 1");
    assert!(second.acknowledge());

    quit_all(vec![handle]).await;
}

#[tokio::test]
async fn dropped_message_parks_the_generator_until_quit() {
    init_test_tracing();

    let wait = TimedWait::new();
    let (mut stream, handle) = spawn_immediate("Joe");

    let message = wait.within(stream.recv()).await.unwrap();
    drop(message);

    let short = TimedWait::with_timeout(Duration::from_millis(50));
    assert!(short.stays_pending(stream.recv()).await);
    assert_eq!(handle.state(), GeneratorState::Running);

    let farewell = wait.within(handle.quit_and_wait()).await.unwrap();
    assert_eq!(farewell, "See you!");
    assert_eq!(wait.within(handle.wait()).await.unwrap(), 1);
}
