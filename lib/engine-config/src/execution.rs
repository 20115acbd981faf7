use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Limits the amount of field resolvers that can be in-flight at the same time
    /// while executing a query.
    ///
    /// Resolvers that complete synchronously are not counted.
    /// Can also be set via the `GRAPHQL_MAX_PARALLELISM` environment variable.
    #[serde(default = "default_max_parallelism")]
    pub max_parallelism: usize,

    /// Optional deadline for a single execution. Once it passes, the execution is cancelled.
    ///
    /// Accepts human readable values such as `5s` or `250ms`.
    /// Can also be set via the `GRAPHQL_EXECUTION_TIMEOUT` environment variable.
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub timeout: Option<Duration>,

    /// When enabled, a panic raised inside a resolver is resumed on the caller
    /// instead of being reported as an `UNHANDLED` GraphQL error.
    #[serde(default)]
    pub throw_on_unhandled: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_parallelism: default_max_parallelism(),
            timeout: None,
            throw_on_unhandled: false,
        }
    }
}

fn default_max_parallelism() -> usize {
    32
}
