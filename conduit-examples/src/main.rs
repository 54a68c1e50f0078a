//! Runs the channel coordination lessons end to end.
//!
//! Each subcommand starts its generators from the lessons configuration, prints what it
//! receives and shuts every generator down before exiting.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use conduit_config::Environment;
use conduit_config::shared::LessonsConfig;
use conduit_telemetry::tracing::init_tracing_for;
use tracing::info;

use crate::config::load_lessons_config;

mod config;
mod lessons;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing the `configuration` folder.
    #[arg(long, default_value = ".")]
    base_path: PathBuf,

    /// Runtime environment (`dev` or `prod`), overriding `APP_ENVIRONMENT`.
    #[arg(long)]
    environment: Option<String>,

    /// Lesson to run.
    #[command(subcommand)]
    lesson: Lesson,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Lesson {
    /// Merges every source into one stream.
    FanIn,
    /// Collects one message per source before acknowledging any of them.
    Sequence,
    /// Stops listening once the deadline elapses.
    Timeout,
    /// Asks a source to quit and waits for its farewell.
    Quit,
    /// Passes a value down a chain of stages.
    Relay,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let environment = match args.environment.clone() {
        Some(name) => Environment::try_from(name)?,
        None => Environment::load()?,
    };

    let _log_flusher = init_tracing_for(env!("CARGO_BIN_NAME"), environment)?;

    let config = load_lessons_config(&args.base_path, environment)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(args.lesson, config))
}

async fn async_main(lesson: Lesson, config: LessonsConfig) -> anyhow::Result<()> {
    info!(?lesson, sources = ?config.sources, "starting lesson");

    match lesson {
        Lesson::FanIn => lessons::fan_in(&config).await?,
        Lesson::Sequence => lessons::sequence(&config).await?,
        Lesson::Timeout => lessons::timeout(&config).await?,
        Lesson::Quit => lessons::quit(&config).await?,
        Lesson::Relay => lessons::relay(&config).await?,
    }

    info!(?lesson, "lesson finished");

    Ok(())
}
