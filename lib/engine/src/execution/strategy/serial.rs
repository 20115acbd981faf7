use serde_json::Value;
use tracing::{instrument, trace};

use super::parallel::run_to_completion;
use crate::execution::context::ExecutionContext;
use crate::execution::field::{ExecutionAbort, FieldExecutor};

/// Executes the top-level fields one at a time, in document order. Each field is completed with
/// its whole subtree before the next one starts.
#[instrument(level = "debug", skip_all)]
pub(crate) async fn execute(ctx: &ExecutionContext) -> Result<Value, ExecutionAbort> {
    let mut executor = FieldExecutor::new(ctx);

    for task in executor.root_tasks() {
        trace!(field = %task.definition.name, "executing top-level field");
        run_to_completion(&mut executor, vec![task]).await?;
    }

    Ok(executor.into_data())
}
