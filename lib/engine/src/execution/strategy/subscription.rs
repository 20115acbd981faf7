use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use tracing::{debug, instrument, trace};

use super::parallel;
use crate::coercion::variables::BAD_USER_INPUT;
use crate::execution::context::ExecutionContext;
use crate::execution::field::{
    from_resolver_error, unhandled_error, ExecutionAbort, FieldExecutor,
};
use crate::execution::resolver::{FieldResult, SourceStream};
use crate::response::execution_result::{ExecutionResult, ResponseStream};
use crate::response::graphql_error::{ErrorKind, GraphQLError};

/// Subscribes to the source stream of the single root field and maps every event to a result.
///
/// Failing to create the source stream yields a single result carrying the error.
#[instrument(level = "debug", skip_all)]
pub(crate) async fn subscribe(ctx: Arc<ExecutionContext>) -> Result<ExecutionResult, ExecutionAbort> {
    match create_source_stream(&ctx).await? {
        Ok(source) => Ok(ExecutionResult::streaming(map_source_to_response(ctx, source))),
        Err(error) => Ok(ExecutionResult::new(None, vec![error], None)),
    }
}

async fn create_source_stream(
    ctx: &ExecutionContext,
) -> Result<Result<SourceStream, GraphQLError>, ExecutionAbort> {
    let mut executor = FieldExecutor::new(ctx);
    let Some(task) = executor.root_tasks().into_iter().next() else {
        return Ok(Err(GraphQLError::new(
            "Subscription must select a field with a source stream.",
            ErrorKind::Resolver,
        )));
    };

    let Some(subscriber) = &task.definition.subscriber else {
        let error = GraphQLError::new(
            format!(
                "Subscription field \"{}\" has no source stream.",
                task.definition.name
            ),
            ErrorKind::Resolver,
        );
        return Ok(Err(executor.locate(&task, task.node, error)));
    };

    let resolver_ctx = match executor.resolver_context(&task) {
        Ok(resolver_ctx) => resolver_ctx,
        Err(error) => {
            let error =
                GraphQLError::new(error.message, ErrorKind::Coercion).with_code(BAD_USER_INPUT);
            return Ok(Err(executor.locate(&task, task.node, error)));
        }
    };

    let future = panic::catch_unwind(AssertUnwindSafe(|| subscriber.call(resolver_ctx)))
        .map_err(ExecutionAbort::Panicked)?;

    let source = tokio::select! {
        biased;
        error = ctx.cancellation_token.cancelled() => return Err(error.into()),
        source = AssertUnwindSafe(future.into_inner()).catch_unwind() => {
            source.map_err(ExecutionAbort::Panicked)?
        }
    };

    debug!(field = %task.definition.name, established = source.is_ok(), "source stream created");
    Ok(source.map_err(|error| executor.locate(&task, task.node, from_resolver_error(error))))
}

/// Lazily executes the selection set once per source event. Stops with the source stream or as
/// soon as the request is cancelled, dropping any event still being executed.
fn map_source_to_response(ctx: Arc<ExecutionContext>, source: SourceStream) -> ResponseStream {
    let stream = async_stream::stream! {
        let mut source = source;
        loop {
            let event = tokio::select! {
                biased;
                _ = ctx.cancellation_token.cancelled() => break,
                event = source.next() => event,
            };
            let Some(event) = event else {
                break;
            };
            if ctx.cancellation_token.is_cancelled() {
                break;
            }

            let executed = tokio::select! {
                biased;
                _ = ctx.cancellation_token.cancelled() => break,
                executed = execute_event(&ctx, event) => executed,
            };

            match executed {
                Ok(result) => yield result,
                Err(ExecutionAbort::Cancelled(_)) => break,
                Err(ExecutionAbort::Panicked(payload)) => {
                    if ctx.throw_on_unhandled {
                        panic::resume_unwind(payload);
                    }
                    yield ExecutionResult::new(None, vec![unhandled_error(payload.as_ref())], None);
                }
            }
        }
        trace!("subscription stream ended");
    };

    stream.boxed()
}

async fn execute_event(
    ctx: &ExecutionContext,
    event: FieldResult,
) -> Result<ExecutionResult, ExecutionAbort> {
    match event {
        Ok(root_value) => {
            let event_ctx = ctx.for_event(root_value);
            let data = parallel::execute(&event_ctx).await?;
            Ok(ExecutionResult::new(
                Some(data),
                event_ctx.take_errors(),
                Some(event_ctx.take_extensions()),
            ))
        }
        Err(error) => Ok(ExecutionResult::new(
            None,
            vec![from_resolver_error(error)],
            None,
        )),
    }
}
