use std::path::Path;

use anyhow::Context;
use conduit_config::shared::LessonsConfig;
use conduit_config::{Environment, LoadConfigError, load_config_from};
use tracing::info;

/// Loads and validates the lessons configuration of `environment` rooted at `base_path`.
///
/// Falls back to the built-in defaults when there is no `configuration` directory, so the
/// binary runs from any working directory.
pub fn load_lessons_config(
    base_path: &Path,
    environment: Environment,
) -> anyhow::Result<LessonsConfig> {
    let config = match load_config_from::<LessonsConfig>(base_path, environment) {
        Ok(config) => config,
        Err(LoadConfigError::MissingConfigurationDirectory(directory)) => {
            info!(
                directory = %directory.display(),
                "no configuration directory found, using defaults"
            );
            LessonsConfig::default()
        }
        Err(err) => return Err(err).context("failed to load the lessons configuration"),
    };

    config
        .validate()
        .context("invalid lessons configuration")?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_configuration_directory_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let config = load_lessons_config(dir.path(), Environment::Dev).unwrap();

        assert_eq!(config, LessonsConfig::default());
    }

    #[test]
    fn bundled_configuration_is_valid() {
        for environment in [Environment::Dev, Environment::Prod] {
            let config =
                load_lessons_config(Path::new(env!("CARGO_MANIFEST_DIR")), environment).unwrap();

            assert_eq!(config.sources, vec!["Joe", "Ann"]);
            assert_eq!(config.sequencer.batch_size, config.sources.len());
            assert_eq!(config.relay.length, 10_000);
        }
    }

    #[test]
    fn selected_environment_is_loaded_without_touching_the_process_environment() {
        let base_path = Path::new(env!("CARGO_MANIFEST_DIR"));

        let dev = load_lessons_config(base_path, Environment::Dev).unwrap();
        let prod = load_lessons_config(base_path, Environment::Prod).unwrap();

        assert_eq!(prod.rounds, 10);
        assert_ne!(dev.generator, prod.generator);
    }
}
