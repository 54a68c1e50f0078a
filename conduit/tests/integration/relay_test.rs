use conduit::error::ErrorKind;
use conduit::workers::relay::{RelayChain, relay};
use conduit_telemetry::tracing::init_test_tracing;

#[tokio::test]
async fn chain_of_six_turns_one_into_seven() {
    init_test_tracing();

    assert_eq!(relay(6, 1).await.unwrap(), 7);
}

#[tokio::test(flavor = "multi_thread")]
async fn default_length_chain_completes() {
    init_test_tracing();

    let (trigger, output) = RelayChain::new(10_000).start();
    trigger.send(1).unwrap();

    assert_eq!(output.recv().await.unwrap(), 10_001);
}

#[tokio::test]
async fn seed_can_be_sent_after_the_output_is_awaited() {
    init_test_tracing();

    let (trigger, output) = RelayChain::new(3).start();
    let result = tokio::spawn(output.recv());

    tokio::task::yield_now().await;
    trigger.send(10).unwrap();

    assert_eq!(result.await.unwrap().unwrap(), 13);
}

#[tokio::test]
async fn unseeded_chain_is_broken() {
    init_test_tracing();

    let (trigger, output) = RelayChain::new(2).start();
    drop(trigger);

    assert_eq!(
        output.recv().await.unwrap_err().kind(),
        ErrorKind::RelayBroken
    );
}
