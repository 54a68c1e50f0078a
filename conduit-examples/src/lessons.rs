//! One function per lesson. Each prints what the lesson prints and shuts its generators
//! down before returning.

use anyhow::{Context, bail};
use conduit::deadline::{DeadlineGuard, DrainEnd};
use conduit::sequencer::next_batch;
use conduit::workers::generator::start_generator;
use conduit::workers::group::GeneratorGroup;
use conduit::workers::relay::RelayChain;
use conduit_config::shared::LessonsConfig;
use tracing::info;

/// Prints messages from every source as they arrive.
pub async fn fan_in(config: &LessonsConfig) -> anyhow::Result<()> {
    let mut group = GeneratorGroup::start(&config.sources, &config.generator);
    let Some(mut merged) = group.merged() else {
        bail!("generator streams were already taken");
    };

    for _ in 0..config.rounds * group.len() {
        let Some(message) = merged.recv().await else {
            break;
        };
        println!("{}", message.content());
        message.acknowledge();
    }

    finish(group).await
}

/// Prints messages batch by batch, one message per source and batch.
pub async fn sequence(config: &LessonsConfig) -> anyhow::Result<()> {
    let mut group = GeneratorGroup::start(&config.sources, &config.generator);
    let Some(mut merged) = group.merged() else {
        bail!("generator streams were already taken");
    };

    for round in 0..config.rounds {
        let batch = next_batch(&mut merged, config.sequencer.batch_size)
            .await
            .with_context(|| format!("failed to collect batch {round}"))?;

        for content in batch.contents() {
            println!("{content}");
        }
        batch.acknowledge_all();
    }

    finish(group).await
}

/// Prints messages until the deadline elapses.
pub async fn timeout(config: &LessonsConfig) -> anyhow::Result<()> {
    let mut group = GeneratorGroup::start(&config.sources, &config.generator);
    let Some(merged) = group.merged() else {
        bail!("generator streams were already taken");
    };

    let mut guard = DeadlineGuard::new(merged, &config.deadline);
    let summary = guard
        .drain(|message| {
            println!("{}", message.content());
            message.acknowledge();
        })
        .await;

    match summary.end {
        DrainEnd::TimedOut => println!("You talk too much."),
        DrainEnd::Closed => println!("Everybody left."),
    }

    finish(group).await
}

/// Listens to the first source for a few messages, then asks it to quit.
pub async fn quit(config: &LessonsConfig) -> anyhow::Result<()> {
    let Some(label) = config.sources.first() else {
        bail!("no source configured");
    };
    let (mut stream, handle) = start_generator(label.clone(), config.generator.clone());

    for _ in 0..config.rounds {
        let Some(message) = stream.recv().await else {
            break;
        };
        println!("{}", message.content());
        message.acknowledge();
    }

    let farewell = handle.quit_and_wait().await?;
    println!("{label} says: {farewell}");

    let emitted = handle.wait().await?;
    info!(%label, emitted, "generator finished");

    Ok(())
}

/// Passes the seed through a chain of incrementing stages.
pub async fn relay(config: &LessonsConfig) -> anyhow::Result<()> {
    let (trigger, output) = RelayChain::new(config.relay.length).start();
    trigger.send(config.relay.seed)?;

    let value = output.recv().await?;
    println!("{value}");

    Ok(())
}

async fn finish(group: GeneratorGroup) -> anyhow::Result<()> {
    let labels: Vec<String> = group.labels().into_iter().map(String::from).collect();
    let farewells = group.shutdown().await?;

    for (label, farewell) in labels.iter().zip(farewells) {
        println!("{label} says: {farewell}");
    }

    Ok(())
}
