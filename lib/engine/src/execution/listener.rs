use async_trait::async_trait;
use serde_json::Value;

use crate::ast::query::Document;
use crate::execution::context::ExecutionContext;
use crate::response::graphql_error::GraphQLError;
use crate::validation::validate::ValidationOutcome;

/// Observes a request as it moves through validation and execution.
///
/// Every hook defaults to doing nothing. Listeners are awaited in registration order.
#[async_trait]
#[allow(unused_variables)]
pub trait ExecutionListener: Send + Sync {
    async fn before_validation(&self, document: &Document, operation_name: Option<&str>) {}

    async fn after_validation(&self, outcome: &ValidationOutcome) {}

    /// `ctx.set_extension` adds to the `extensions` of the response.
    async fn before_execution(&self, ctx: &ExecutionContext) {}

    /// Called once execution produced a result. `data` is `None` when no data was produced,
    /// and for subscriptions, whose results are streamed afterwards.
    async fn after_execution(&self, data: Option<&Value>, errors: &[GraphQLError]) {}
}
