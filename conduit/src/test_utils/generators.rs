use conduit_config::shared::GeneratorConfig;

use crate::types::MessageStream;
use crate::workers::generator::{GeneratorHandle, start_generator};

/// Starts a generator labelled `label` that emits without any delay.
pub fn spawn_immediate(label: &str) -> (MessageStream, GeneratorHandle) {
    start_generator(label, GeneratorConfig::immediate())
}

/// Starts one zero-cadence generator per label, returning streams and handles in label
/// order.
pub fn spawn_immediate_all(labels: &[&str]) -> (Vec<MessageStream>, Vec<GeneratorHandle>) {
    labels.iter().map(|label| spawn_immediate(label)).unzip()
}

/// Quits every handle with confirmation and joins its task, panicking on failure.
pub async fn quit_all(handles: Vec<GeneratorHandle>) {
    for handle in handles {
        let label = handle.label().to_string();

        handle
            .quit_and_wait()
            .await
            .unwrap_or_else(|err| panic!("generator {label} did not confirm quit: {err}"));
        handle
            .wait()
            .await
            .unwrap_or_else(|err| panic!("generator {label} did not finish: {err}"));
    }
}
