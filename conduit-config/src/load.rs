use std::io;
use std::path::{Path, PathBuf};

use config::FileFormat;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::environment::Environment;

/// Directory holding the configuration files, relative to the base path.
const CONFIGURATION_DIR: &str = "configuration";

/// Stem of the file every environment starts from.
const BASE_FILE_STEM: &str = "base";

const CONFIG_FILE_EXTENSION: &str = "yaml";

/// Prefix of environment variable overrides, as in `APP_ROUNDS`.
const ENV_PREFIX: &str = "APP";

const ENV_PREFIX_SEPARATOR: &str = "_";

/// Separator of nested keys, as in `APP_SEQUENCER__BATCH_SIZE`.
const ENV_SEPARATOR: &str = "__";

const LIST_SEPARATOR: &str = ",";

/// Implemented by configuration roots that can be loaded with [`load_config`].
pub trait Config {
    /// Keys whose environment overrides are comma-separated lists.
    const LIST_PARSE_KEYS: &'static [&'static str];
}

/// Errors raised while loading a configuration.
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    /// The base path has no `configuration` directory.
    #[error("configuration directory `{0}` does not exist")]
    MissingConfigurationDirectory(PathBuf),

    /// The base file or the file of the selected environment is missing.
    #[error("configuration file `{0}` does not exist")]
    ConfigurationFileMissing(PathBuf),

    /// A configuration file exists but is not valid YAML.
    #[error("failed to load configuration file `{path}`: {source}")]
    ConfigurationFileLoad {
        path: PathBuf,
        source: config::ConfigError,
    },

    #[error("failed to deserialize configuration: {0}")]
    Deserialization(#[source] config::ConfigError),

    /// `APP_ENVIRONMENT` names an unknown environment.
    #[error("failed to determine runtime environment: {0}")]
    Environment(#[from] io::Error),

    #[error("failed to merge configuration sources: {0}")]
    Builder(#[source] config::ConfigError),
}

/// Loads the configuration of the environment named by `APP_ENVIRONMENT` from the working
/// directory.
///
/// See [`load_config_from`] for the layering rules.
pub fn load_config<T>() -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    let base_path = std::env::current_dir().map_err(LoadConfigError::CurrentDir)?;
    load_config_from(&base_path, Environment::load()?)
}

/// Loads the configuration of `environment` rooted at `base_path`.
///
/// `configuration/base.yaml` is read first and `configuration/{environment}.yaml` is layered
/// on top of it. Both files must exist. `APP_`-prefixed environment variables are applied
/// last; nested keys are joined with `__` and list values are comma-separated.
pub fn load_config_from<T>(
    base_path: &Path,
    environment: Environment,
) -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    let directory = base_path.join(CONFIGURATION_DIR);
    if !directory.is_dir() {
        return Err(LoadConfigError::MissingConfigurationDirectory(directory));
    }

    let mut builder = config::Config::builder();
    for stem in [BASE_FILE_STEM, environment.as_str()] {
        let path = directory.join(stem).with_extension(CONFIG_FILE_EXTENSION);
        if !path.is_file() {
            return Err(LoadConfigError::ConfigurationFileMissing(path));
        }

        let file = config::File::from(path.as_path()).format(FileFormat::Yaml);
        builder = builder.add_source(file);

        // Each layer is parsed on its own so that a syntax error names its file.
        if let Err(source) = builder.clone().build() {
            return Err(LoadConfigError::ConfigurationFileLoad { path, source });
        }
    }

    builder
        .add_source(environment_overrides::<T>())
        .build()
        .map_err(LoadConfigError::Builder)?
        .try_deserialize::<T>()
        .map_err(LoadConfigError::Deserialization)
}

fn environment_overrides<T: Config>() -> config::Environment {
    let overrides = config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR);

    if T::LIST_PARSE_KEYS.is_empty() {
        return overrides;
    }

    T::LIST_PARSE_KEYS.iter().fold(
        overrides.try_parsing(true).list_separator(LIST_SEPARATOR),
        |overrides, key| overrides.with_list_parse_key(key),
    )
}
