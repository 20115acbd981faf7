use std::fmt;
use std::time::Duration;

use futures::stream::BoxStream;
use serde::Serialize;
use serde_json::{Map, Value};

use super::graphql_error::GraphQLError;

/// A stream of per-event results, produced by subscription operations.
pub type ResponseStream = BoxStream<'static, ExecutionResult>;

/// Wall-clock timings of a single request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionMetrics {
    pub validation: Duration,
    pub execution: Duration,
    pub total: Duration,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Whether execution started. `false` when the request was rejected before any resolver ran.
    #[serde(skip)]
    pub executed: bool,
    /// `Some(Value::Null)` when a null propagated all the way to the root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
    /// Filled by resolvers through `ResolverContext::set_extension` and by listeners through
    /// `ExecutionContext::set_extension` in `before_execution`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
    #[serde(skip)]
    pub metrics: ExecutionMetrics,
    #[serde(skip)]
    pub stream: Option<ResponseStream>,
}

impl ExecutionResult {
    pub fn new(
        data: Option<Value>,
        errors: Vec<GraphQLError>,
        extensions: Option<Map<String, Value>>,
    ) -> ExecutionResult {
        let extensions = match extensions {
            Some(extensions) if extensions.is_empty() => None,
            _ => extensions,
        };

        ExecutionResult {
            executed: true,
            data,
            errors,
            extensions,
            metrics: ExecutionMetrics::default(),
            stream: None,
        }
    }

    /// A result for a request that was rejected before execution started.
    pub fn rejected(errors: Vec<GraphQLError>) -> ExecutionResult {
        ExecutionResult {
            executed: false,
            errors,
            ..Default::default()
        }
    }

    pub fn streaming(stream: ResponseStream) -> ExecutionResult {
        ExecutionResult {
            executed: true,
            stream: Some(stream),
            ..Default::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl fmt::Debug for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionResult")
            .field("executed", &self.executed)
            .field("data", &self.data)
            .field("errors", &self.errors)
            .field("extensions", &self.extensions)
            .field("metrics", &self.metrics)
            .field("stream", &self.stream.as_ref().map(|_| "<stream>"))
            .finish()
    }
}
