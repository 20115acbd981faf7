mod env_overrides;
pub mod execution;
pub mod log;
pub mod validation;

use std::path::Path;

use config::{Config, File, FileFormat};
use envconfig::Envconfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    env_overrides::{EnvVarOverrides, EnvVarOverridesError},
    execution::ExecutionConfig,
    log::LoggingConfig,
    validation::ValidationConfig,
};

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// The engine logger configuration.
    ///
    /// The engine is configured to be mostly silent (`info`) level, and will print only important messages, warnings, and errors.
    #[serde(default)]
    pub log: LoggingConfig,

    /// Configuration for the execution of operations: parallelism, deadlines and handling of unexpected failures.
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Configuration for the validation of documents before they are executed.
    #[serde(default)]
    pub validation: ValidationConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineConfigError {
    #[error("Failed to load configuration: {0}")]
    ConfigLoadError(#[from] config::ConfigError),
    #[error("Failed to apply configuration overrides: {0}")]
    EnvVarOverridesError(#[from] EnvVarOverridesError),
    #[error("Failed to load the environment variables: {0}")]
    EnvVarLoadError(#[from] envconfig::Error),
}

/// Looked up in the working directory when no explicit path is given.
static DEFAULT_FILE_NAMES: &[&str] = &[
    "graphql-engine.config.yaml",
    "graphql-engine.config.yml",
    "graphql-engine.config.json",
    "graphql-engine.config.json5",
];

/// Loads the engine configuration.
///
/// An explicit `path` must exist. Without one, every existing file of [`DEFAULT_FILE_NAMES`]
/// is merged, later names winning, and no file at all yields the defaults.
/// Environment overrides are applied last.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, EngineConfigError> {
    let builder = match path {
        Some(path) => Config::builder().add_source(File::from(path).required(true)),
        None => DEFAULT_FILE_NAMES.iter().fold(Config::builder(), |builder, name| {
            builder.add_source(File::with_name(name).required(false))
        }),
    };

    EnvVarOverrides::init_from_env()?
        .apply_overrides(builder)?
        .build()?
        .try_deserialize::<EngineConfig>()
        .map_err(EngineConfigError::ConfigLoadError)
}

pub fn parse_yaml_config(config_raw: &str) -> Result<EngineConfig, EngineConfigError> {
    Config::builder()
        .add_source(File::from_str(config_raw, FileFormat::Yaml))
        .build()?
        .try_deserialize::<EngineConfig>()
        .map_err(EngineConfigError::ConfigLoadError)
}
