use config::{builder::BuilderState, ConfigBuilder, ConfigError};
use envconfig::Envconfig;
use tracing::debug;

use crate::log::{LogFormat, LogLevel};

#[derive(Envconfig)]
pub struct EnvVarOverrides {
    // Logger overrides
    #[envconfig(from = "LOG_LEVEL")]
    pub log_level: Option<LogLevel>,
    #[envconfig(from = "LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
    #[envconfig(from = "LOG_FILTER")]
    pub log_filter: Option<String>,

    // Execution overrides
    #[envconfig(from = "GRAPHQL_MAX_PARALLELISM")]
    pub max_parallelism: Option<u64>,
    #[envconfig(from = "GRAPHQL_EXECUTION_TIMEOUT")]
    pub execution_timeout: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum EnvVarOverridesError {
    #[error("Failed to override configuration: {0}")]
    FailedToOverrideConfig(#[from] ConfigError),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

impl EnvVarOverrides {
    pub fn apply_overrides<T: BuilderState>(
        mut self,
        mut config: ConfigBuilder<T>,
    ) -> Result<ConfigBuilder<T>, EnvVarOverridesError> {
        if let Some(log_level) = self.log_level.take() {
            debug!("[config-override] 'log.level' = {:?}", log_level);
            config = config.set_override("log.level", log_level.as_str())?;
        }
        if let Some(log_format) = self.log_format.take() {
            debug!("[config-override] 'log.format' = {:?}", log_format);
            config = config.set_override("log.format", log_format.as_str())?;
        }
        if let Some(log_filter) = self.log_filter.take() {
            debug!("[config-override] 'log.filter' = {:?}", log_filter);
            config = config.set_override("log.filter", log_filter)?;
        }

        if let Some(max_parallelism) = self.max_parallelism.take() {
            if max_parallelism == 0 {
                return Err(EnvVarOverridesError::InvalidValue(
                    "GRAPHQL_MAX_PARALLELISM",
                    "must be greater than zero".to_string(),
                ));
            }
            debug!(
                "[config-override] 'execution.max_parallelism' = {}",
                max_parallelism
            );
            config = config.set_override("execution.max_parallelism", max_parallelism)?;
        }

        if let Some(timeout) = self.execution_timeout.take() {
            humantime::parse_duration(&timeout).map_err(|err| {
                EnvVarOverridesError::InvalidValue("GRAPHQL_EXECUTION_TIMEOUT", err.to_string())
            })?;
            debug!("[config-override] 'execution.timeout' = {}", timeout);
            config = config.set_override("execution.timeout", timeout)?;
        }

        Ok(config)
    }
}
