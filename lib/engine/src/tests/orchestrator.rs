use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::ast::query::Document;
use crate::execution::{
    execute, EngineError, ExecutionContext, ExecutionListener, ExecutionOptions, FieldFuture,
    Resolver,
};
use crate::response::graphql_error::GraphQLError;
use crate::schema::types::{FieldDefinition, ObjectType};
use crate::schema::Schema;
use crate::tests::testkit::{init_logger, parse, run_with};
use crate::utils::cancellation::{CancellationError, CancellationToken};
use crate::validation::validate::{ValidationOutcome, ValidationPlan};

fn service() -> Arc<Schema> {
    let query = ObjectType::new("Query")
        .field(FieldDefinition::new("hello", "String").resolver(Resolver::constant("world")))
        .field(
            FieldDefinition::new("slow", "String").resolver(Resolver::new(|_| {
                FieldFuture::new(async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    Ok(Value::from("late").into())
                })
            })),
        )
        .field(
            FieldDefinition::new("explode", "String")
                .resolver(Resolver::new(|_| panic!("resolver exploded"))),
        );

    Arc::new(Schema::build(query).finish())
}

#[derive(Default, Clone)]
struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExecutionListener for Recorder {
    async fn before_validation(&self, _document: &Document, operation_name: Option<&str>) {
        self.push(format!("before_validation {}", operation_name.unwrap_or("-")));
    }

    async fn after_validation(&self, outcome: &ValidationOutcome) {
        self.push(format!("after_validation {}", outcome.errors.len()));
    }

    async fn before_execution(&self, ctx: &ExecutionContext) {
        self.push(format!("before_execution {}", ctx.operation_kind()));
    }

    async fn after_execution(&self, data: Option<&Value>, errors: &[GraphQLError]) {
        self.push(format!(
            "after_execution {} {}",
            data.map_or("none".to_string(), Value::to_string),
            errors.len()
        ));
    }
}

#[tokio::test]
async fn misuse_is_an_error() {
    init_logger();
    let missing_document = execute(ExecutionOptions::default().with_schema(service())).await;
    assert!(matches!(missing_document, Err(EngineError::MissingDocument)));

    let broken = Schema::build(
        ObjectType::new("Query").field(FieldDefinition::new("ghost", "Ghost")),
    )
    .finish();
    let invalid = execute(ExecutionOptions::new(Arc::new(broken), parse("{ ghost }"))).await;
    match invalid {
        Err(EngineError::InvalidSchema(error)) => {
            assert_eq!(
                error.to_string(),
                "Unknown type \"Ghost\" referenced by \"Query.ghost\""
            );
        }
        other => panic!("expected an invalid schema, got {:?}", other.map(|r| r.to_json())),
    }
}

#[tokio::test]
async fn operation_selection_failures_are_not_executed() {
    let document = parse("query A { hello } query B { hello }");

    let ambiguous = run_with(ExecutionOptions::new(service(), document.clone())).await;
    assert!(!ambiguous.executed);
    assert_eq!(
        ambiguous.to_json(),
        json!({
            "errors": [{
                "message": "Must provide operation name if query contains multiple operations.",
                "extensions": { "code": "OPERATION_RESOLUTION_FAILURE" }
            }]
        })
    );

    let unknown = run_with(
        ExecutionOptions::new(service(), document.clone()).with_operation_name("C"),
    )
    .await;
    assert_eq!(unknown.errors[0].message, "Unknown operation named \"C\".");

    let named = run_with(ExecutionOptions::new(service(), document).with_operation_name("B")).await;
    assert!(named.executed);
    assert_eq!(named.to_json(), json!({ "data": { "hello": "world" } }));
}

#[tokio::test]
async fn listeners_observe_every_phase() {
    let recorder = Recorder::default();
    let result = run_with(
        ExecutionOptions::new(service(), parse("query Greet { hello }"))
            .with_operation_name("Greet")
            .with_listener(recorder.clone()),
    )
    .await;

    assert!(result.is_ok());
    assert_eq!(
        recorder.events(),
        vec![
            "before_validation Greet",
            "after_validation 0",
            "before_execution query",
            r#"after_execution {"hello":"world"} 0"#,
        ]
    );
    assert!(result.metrics.total >= result.metrics.execution);
    assert!(result.metrics.total >= result.metrics.validation);
}

#[tokio::test]
async fn invalid_documents_stop_after_validation() {
    let recorder = Recorder::default();
    let result = run_with(
        ExecutionOptions::new(service(), parse("{ hello goodbye }")).with_listener(recorder.clone()),
    )
    .await;

    assert!(!result.executed);
    assert!(result.data.is_none());
    assert_eq!(
        result.to_json(),
        json!({
            "errors": [{
                "message": "Cannot query field \"goodbye\" on type \"Query\".",
                "locations": [{ "line": 1, "column": 9 }],
                "extensions": { "code": "FIELDS_ON_CORRECT_TYPE" }
            }]
        })
    );
    assert_eq!(
        recorder.events(),
        vec!["before_validation -", "after_validation 1"]
    );
}

#[tokio::test]
async fn an_empty_plan_skips_validation() {
    let result = run_with(
        ExecutionOptions::new(service(), parse("{ hello goodbye }"))
            .with_validation_plan(ValidationPlan::new()),
    )
    .await;

    assert!(result.executed);
    assert_eq!(result.to_json(), json!({ "data": { "hello": "world" } }));
}

#[tokio::test]
async fn cancelled_requests_are_aborted() {
    init_logger();
    let token = CancellationToken::new();
    token.cancel();
    let cancelled = execute(
        ExecutionOptions::new(service(), parse("{ hello }")).with_cancellation_token(token),
    )
    .await;
    assert!(matches!(
        cancelled,
        Err(EngineError::Cancelled(CancellationError::Cancelled))
    ));

    let token = CancellationToken::new();
    let in_flight = tokio::spawn(execute(
        ExecutionOptions::new(service(), parse("{ hello slow }"))
            .with_cancellation_token(token.clone()),
    ));
    tokio::time::sleep(Duration::from_millis(20)).await;
    token.cancel();
    let aborted = in_flight.await.expect("execution task should not panic");
    assert!(matches!(
        aborted,
        Err(EngineError::Cancelled(CancellationError::Cancelled))
    ));
}

#[tokio::test]
async fn timeouts_abort_slow_requests() {
    init_logger();
    let timed_out = execute(
        ExecutionOptions::new(service(), parse("{ slow }")).with_timeout(Duration::from_millis(20)),
    )
    .await;

    assert!(matches!(
        timed_out,
        Err(EngineError::Cancelled(CancellationError::TimedOut))
    ));
}

#[tokio::test]
async fn panics_only_null_the_panicking_field() {
    let result = run_with(ExecutionOptions::new(service(), parse("{ hello explode }"))).await;

    assert!(result.executed);
    assert_eq!(
        result.to_json(),
        json!({
            "data": { "hello": "world", "explode": null },
            "errors": [{
                "message": "Unexpected error while executing the operation: resolver exploded",
                "locations": [{ "line": 1, "column": 9 }],
                "path": ["explode"],
                "extensions": { "code": "UNHANDLED" }
            }]
        })
    );
}

struct Tagger;

#[async_trait]
impl ExecutionListener for Tagger {
    async fn before_execution(&self, ctx: &ExecutionContext) {
        ctx.set_extension("tagged", true);
    }
}

#[tokio::test]
async fn resolvers_and_listeners_fill_extensions() {
    let query = ObjectType::new("Query").field(FieldDefinition::new("traced", "String").resolver(
        Resolver::new(|ctx| {
            ctx.set_extension("traceId", "abc");
            FieldFuture::value(Value::from("ok"))
        }),
    ));
    let schema = Arc::new(Schema::build(query).finish());

    let result = run_with(
        ExecutionOptions::new(schema.clone(), parse("{ traced }")).with_listener(Tagger),
    )
    .await;
    assert_eq!(
        result.to_json(),
        json!({
            "data": { "traced": "ok" },
            "extensions": { "tagged": true, "traceId": "abc" }
        })
    );

    let untouched = run_with(ExecutionOptions::new(schema, parse("{ __typename }"))).await;
    assert_eq!(untouched.to_json(), json!({ "data": { "__typename": "Query" } }));
}

#[tokio::test]
async fn panics_can_be_rethrown() {
    init_logger();
    let handle = tokio::spawn(execute(
        ExecutionOptions::new(service(), parse("{ explode }")).with_throw_on_unhandled(true),
    ));

    let error = handle.await.expect_err("the panic should reach the caller");
    assert!(error.is_panic());
}
