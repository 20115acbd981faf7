use std::any::Any;
use std::panic;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hive_graphql_engine_config::EngineConfig;
use lazy_static::lazy_static;
use serde_json::{Map, Value};
use tracing::{debug, error, instrument};

use crate::ast::query::Document;
use crate::ast::OperationDefinitionExt;
use crate::execution::context::{select_operation, ExecutionContext, OPERATION_RESOLUTION_FAILURE};
use crate::execution::field::{unhandled_error, ExecutionAbort};
use crate::execution::listener::ExecutionListener;
use crate::execution::resolver::FieldValue;
use crate::execution::strategy::{parallel, serial, subscription, ExecutionStrategy};
use crate::response::execution_result::{ExecutionMetrics, ExecutionResult};
use crate::response::graphql_error::{ErrorKind, GraphQLError};
use crate::schema::{Schema, SchemaError};
use crate::utils::cancellation::{CancellationError, CancellationToken};
use crate::validation::rules::default_rules_validation_plan;
use crate::validation::validate::{validate_request, ValidationPlan};

lazy_static! {
    static ref DEFAULT_VALIDATION_PLAN: Arc<ValidationPlan> =
        Arc::new(default_rules_validation_plan());
}

/// Misuse of the engine. Nothing request-shaped can be produced in these cases.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no schema was provided")]
    MissingSchema,
    #[error("no document was provided")]
    MissingDocument,
    #[error("the schema is invalid: {0}")]
    InvalidSchema(#[from] SchemaError),
    #[error("the execution was {0}")]
    Cancelled(#[from] CancellationError),
}

/// Everything a single request needs.
pub struct ExecutionOptions {
    pub schema: Option<Arc<Schema>>,
    pub document: Option<Arc<Document>>,
    pub operation_name: Option<String>,
    pub variables: Option<Map<String, Value>>,
    pub root_value: FieldValue,
    /// Application context, readable by resolvers through `ResolverContext::data`.
    pub data: Option<Arc<dyn Any + Send + Sync>>,
    pub cancellation_token: CancellationToken,
    pub max_parallelism: usize,
    pub timeout: Option<Duration>,
    /// Resume resolver panics on the caller instead of reporting them as `UNHANDLED` errors.
    pub throw_on_unhandled: bool,
    pub validation_plan: Arc<ValidationPlan>,
    pub listeners: Vec<Arc<dyn ExecutionListener>>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        ExecutionOptions {
            schema: None,
            document: None,
            operation_name: None,
            variables: None,
            root_value: FieldValue::Null,
            data: None,
            cancellation_token: CancellationToken::new(),
            max_parallelism: 32,
            timeout: None,
            throw_on_unhandled: false,
            validation_plan: DEFAULT_VALIDATION_PLAN.clone(),
            listeners: Vec::new(),
        }
    }
}

impl ExecutionOptions {
    pub fn new(schema: Arc<Schema>, document: Arc<Document>) -> Self {
        ExecutionOptions {
            schema: Some(schema),
            document: Some(document),
            ..Default::default()
        }
    }

    /// Options carrying the execution and validation settings of `config`. Schema and document
    /// are still to be set.
    pub fn from_config(config: &EngineConfig) -> Self {
        ExecutionOptions {
            max_parallelism: config.execution.max_parallelism,
            timeout: config.execution.timeout,
            throw_on_unhandled: config.execution.throw_on_unhandled,
            validation_plan: Arc::new(
                default_rules_validation_plan().configured(&config.validation),
            ),
            ..Default::default()
        }
    }

    pub fn with_schema(mut self, schema: Arc<Schema>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_document(mut self, document: Arc<Document>) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_operation_name(mut self, operation_name: impl Into<String>) -> Self {
        self.operation_name = Some(operation_name.into());
        self
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn with_root_value(mut self, root_value: impl Into<FieldValue>) -> Self {
        self.root_value = root_value.into();
        self
    }

    pub fn with_data<T: Any + Send + Sync>(mut self, data: T) -> Self {
        self.data = Some(Arc::new(data));
        self
    }

    pub fn with_cancellation_token(mut self, cancellation_token: CancellationToken) -> Self {
        self.cancellation_token = cancellation_token;
        self
    }

    pub fn with_max_parallelism(mut self, max_parallelism: usize) -> Self {
        self.max_parallelism = max_parallelism;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_throw_on_unhandled(mut self, throw_on_unhandled: bool) -> Self {
        self.throw_on_unhandled = throw_on_unhandled;
        self
    }

    pub fn with_validation_plan(mut self, validation_plan: ValidationPlan) -> Self {
        self.validation_plan = Arc::new(validation_plan);
        self
    }

    pub fn with_listener(mut self, listener: impl ExecutionListener + 'static) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }
}

/// Validates and executes one request.
///
/// Validation failures and operation selection errors are returned as a result that was not
/// executed. Resolver failures end up in `errors` next to the partial `data`. Only misuse and
/// cancellation are reported as [`EngineError`].
#[instrument(
    level = "debug",
    skip_all,
    fields(operation_name = options.operation_name.as_deref().unwrap_or_default())
)]
pub async fn execute(options: ExecutionOptions) -> Result<ExecutionResult, EngineError> {
    let started = Instant::now();
    let ExecutionOptions {
        schema,
        document,
        operation_name,
        variables,
        root_value,
        data,
        cancellation_token,
        max_parallelism,
        timeout,
        throw_on_unhandled,
        validation_plan,
        listeners,
    } = options;

    let schema = schema.ok_or(EngineError::MissingSchema)?;
    let document = document.ok_or(EngineError::MissingDocument)?;
    let registry = schema.initialize()?;
    let cancellation_token = match timeout {
        Some(timeout) => cancellation_token.with_deadline_from(timeout),
        None => cancellation_token,
    };
    cancellation_token.bail_if_cancelled()?;

    let mut metrics = ExecutionMetrics::default();
    let (operation_index, operation) =
        match select_operation(&document, operation_name.as_deref()) {
            Ok(selected) => selected,
            Err(error) => {
                debug!(error = %error.message, "no operation to execute");
                return Ok(finalize(ExecutionResult::rejected(vec![error]), metrics, started));
            }
        };

    for listener in &listeners {
        listener
            .before_validation(&document, operation_name.as_deref())
            .await;
    }
    let validation_started = Instant::now();
    let outcome = validate_request(
        &registry,
        &document,
        operation,
        variables.as_ref(),
        &validation_plan,
    );
    metrics.validation = validation_started.elapsed();
    for listener in &listeners {
        listener.after_validation(&outcome).await;
    }

    if !outcome.is_valid() {
        debug!(errors = outcome.errors.len(), "request rejected");
        return Ok(finalize(
            ExecutionResult::rejected(outcome.errors),
            metrics,
            started,
        ));
    }

    let kind = operation.kind();
    if registry.root_type(kind).is_none() {
        let error = GraphQLError::new(
            format!("Schema is not configured to execute {} operation.", kind),
            ErrorKind::Validation(OPERATION_RESOLUTION_FAILURE),
        )
        .with_code(OPERATION_RESOLUTION_FAILURE)
        .with_locations([operation.position()]);
        return Ok(finalize(ExecutionResult::rejected(vec![error]), metrics, started));
    }

    let mut ctx = ExecutionContext::new(
        registry,
        document.clone(),
        operation_index,
        Arc::new(outcome.variables),
    );
    ctx.root_value = Arc::new(root_value);
    ctx.data = data;
    ctx.cancellation_token = cancellation_token;
    ctx.max_parallelism = max_parallelism;
    ctx.throw_on_unhandled = throw_on_unhandled;
    let ctx = Arc::new(ctx);

    for listener in &listeners {
        listener.before_execution(&ctx).await;
    }

    let execution_started = Instant::now();
    let strategy = ExecutionStrategy::for_operation(kind);
    debug!(?strategy, "executing operation");
    let executed = match strategy {
        ExecutionStrategy::Parallel => parallel::execute(&ctx)
            .await
            .map(|data| ExecutionResult::new(Some(data), Vec::new(), None)),
        ExecutionStrategy::Serial => serial::execute(&ctx)
            .await
            .map(|data| ExecutionResult::new(Some(data), Vec::new(), None)),
        ExecutionStrategy::Streaming => subscription::subscribe(ctx.clone()).await,
    };
    metrics.execution = execution_started.elapsed();

    let mut result = match executed {
        Ok(result) => result,
        Err(ExecutionAbort::Cancelled(error)) => {
            debug!(%error, "execution cancelled");
            return Err(EngineError::Cancelled(error));
        }
        Err(ExecutionAbort::Panicked(payload)) => {
            if throw_on_unhandled {
                panic::resume_unwind(payload);
            }
            let error = unhandled_error(payload.as_ref());
            error!(error = %error.message, "resolver panicked");
            ExecutionResult::new(None, vec![error], None)
        }
    };
    result.errors.splice(0..0, ctx.take_errors());
    let extensions = ctx.take_extensions();
    if !extensions.is_empty() {
        result.extensions.get_or_insert_with(Default::default).extend(extensions);
    }

    for listener in &listeners {
        listener
            .after_execution(result.data.as_ref(), &result.errors)
            .await;
    }

    Ok(finalize(result, metrics, started))
}

fn finalize(
    mut result: ExecutionResult,
    mut metrics: ExecutionMetrics,
    started: Instant,
) -> ExecutionResult {
    metrics.total = started.elapsed();
    result.metrics = metrics;
    result
}
