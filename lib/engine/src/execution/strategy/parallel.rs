use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use tracing::{instrument, trace};

use crate::execution::context::ExecutionContext;
use crate::execution::field::{ExecutionAbort, FieldExecutor, FieldTask, Started};

#[instrument(level = "debug", skip_all, fields(max_parallelism = ctx.max_parallelism))]
pub(crate) async fn execute(ctx: &ExecutionContext) -> Result<Value, ExecutionAbort> {
    let mut executor = FieldExecutor::new(ctx);
    let tasks = executor.root_tasks();
    run_to_completion(&mut executor, tasks).await?;
    Ok(executor.into_data())
}

/// Resolves `tasks` and everything underneath them, one level of the tree at a time.
///
/// Resolvers that answer synchronously are completed inline. Suspended ones are polled together,
/// at most `max_parallelism` at once; once the bound is reached nothing new is dispatched until
/// one of them completes. Children of a level form the next level.
pub(crate) async fn run_to_completion<'a>(
    executor: &mut FieldExecutor<'a>,
    tasks: Vec<FieldTask<'a>>,
) -> Result<(), ExecutionAbort> {
    let ctx = executor.ctx();
    let max_in_flight = ctx.max_parallelism.max(1);
    let mut level = tasks;
    let mut depth = 0;

    while !level.is_empty() {
        trace!(depth, fields = level.len(), "dispatching level");
        let mut next_level = Vec::new();
        let mut pending = level.into_iter();
        let mut in_flight = FuturesUnordered::new();

        loop {
            while in_flight.len() < max_in_flight {
                let Some(task) = pending.next() else {
                    break;
                };
                if executor.is_discarded(&task) {
                    continue;
                }
                ctx.cancellation_token.bail_if_cancelled()?;

                match executor.start(task) {
                    Started::Completed(task, resolution) => {
                        next_level.extend(executor.finish(task, resolution)?);
                    }
                    Started::Suspended(future) => in_flight.push(future),
                }
            }

            let completed = tokio::select! {
                biased;
                error = ctx.cancellation_token.cancelled() => return Err(error.into()),
                completed = in_flight.next() => completed,
            };
            let Some((task, resolution)) = completed else {
                break;
            };
            ctx.cancellation_token.bail_if_cancelled()?;
            next_level.extend(executor.finish(task, resolution)?);
        }

        level = next_level;
        depth += 1;
    }

    Ok(())
}
