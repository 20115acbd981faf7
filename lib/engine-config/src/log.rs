use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How the engine reports what it is doing through `tracing`.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Minimal level of the emitted events. Overridden by `LOG_LEVEL`.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format. Overridden by `LOG_FORMAT`.
    #[serde(default)]
    pub format: LogFormat,

    /// A full `EnvFilter` directive, for example `hive_graphql_engine::validation=trace,info`.
    /// Takes precedence over `level` when set. Overridden by `LOG_FILTER`.
    #[serde(default)]
    pub filter: Option<String>,
}

impl LoggingConfig {
    /// The directive handed to `tracing_subscriber::EnvFilter`.
    pub fn env_filter_str(&self) -> &str {
        match &self.filter {
            Some(filter) if !filter.trim().is_empty() => filter,
            _ => self.level.as_str(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    const ALL: [LogLevel; 5] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            LogLevel::Debug
        } else {
            LogLevel::Info
        }
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    /// Indented span tree, for reading execution flow locally.
    PrettyTree,
    /// One line per event.
    PrettyCompact,
    Json,
}

impl LogFormat {
    const ALL: [LogFormat; 3] = [LogFormat::PrettyTree, LogFormat::PrettyCompact, LogFormat::Json];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::PrettyTree => "pretty-tree",
            LogFormat::PrettyCompact => "pretty-compact",
            LogFormat::Json => "json",
        }
    }
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            LogFormat::PrettyCompact
        } else {
            LogFormat::Json
        }
    }
}

macro_rules! impl_from_str {
    ($ty:ident, $what:literal) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                $ty::ALL
                    .into_iter()
                    .find(|candidate| candidate.as_str().eq_ignore_ascii_case(raw.trim()))
                    .ok_or_else(|| format!("Invalid {}: {}", $what, raw))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_from_str!(LogLevel, "log level");
impl_from_str!(LogFormat, "log format");

#[cfg(test)]
mod tests {
    use super::{LogFormat, LogLevel, LoggingConfig};

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!(" Pretty-Tree ".parse::<LogFormat>(), Ok(LogFormat::PrettyTree));
        assert_eq!(
            "loud".parse::<LogLevel>(),
            Err("Invalid log level: loud".to_string())
        );
    }

    #[test]
    fn filter_wins_over_level() {
        let mut config = LoggingConfig {
            level: LogLevel::Error,
            ..Default::default()
        };
        assert_eq!(config.env_filter_str(), "error");

        config.filter = Some("hive_graphql_engine=trace".to_string());
        assert_eq!(config.env_filter_str(), "hive_graphql_engine=trace");

        config.filter = Some("  ".to_string());
        assert_eq!(config.env_filter_str(), "error");
    }
}
