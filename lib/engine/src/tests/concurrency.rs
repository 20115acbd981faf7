use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;

use crate::execution::{ExecutionOptions, FieldFuture, Resolver};
use crate::schema::types::{FieldDefinition, InputValueDefinition, ObjectType};
use crate::schema::Schema;
use crate::tests::testkit::{parse, run_with};

const DELAY: Duration = Duration::from_millis(50);

#[derive(Default)]
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

fn slow(name: &'static str, in_flight: Arc<InFlight>) -> Resolver {
    Resolver::new(move |_| {
        let in_flight = in_flight.clone();
        FieldFuture::new(async move {
            let now = in_flight.current.fetch_add(1, Ordering::SeqCst) + 1;
            in_flight.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(DELAY).await;
            in_flight.current.fetch_sub(1, Ordering::SeqCst);
            Ok(json!(name).into())
        })
    })
}

fn slow_schema(in_flight: &Arc<InFlight>) -> Arc<Schema> {
    let query = ["a", "b", "c", "d", "e"]
        .into_iter()
        .fold(ObjectType::new("Query"), |query, name| {
            query.field(FieldDefinition::new(name, "String").resolver(slow(name, in_flight.clone())))
        });
    Arc::new(Schema::build(query).finish())
}

#[tokio::test]
async fn bounded_parallelism_dispatches_in_waves() {
    let in_flight = Arc::new(InFlight::default());
    let started = Instant::now();

    let result = run_with(
        ExecutionOptions::new(slow_schema(&in_flight), parse("{ a b c d e }"))
            .with_max_parallelism(2),
    )
    .await;
    let elapsed = started.elapsed();

    assert_eq!(
        result.to_json(),
        json!({ "data": { "a": "a", "b": "b", "c": "c", "d": "d", "e": "e" } })
    );
    assert_eq!(in_flight.peak.load(Ordering::SeqCst), 2);
    assert!(elapsed >= DELAY * 3, "finished too early: {:?}", elapsed);
    assert!(elapsed < DELAY * 5, "finished too late: {:?}", elapsed);
}

#[tokio::test]
async fn siblings_run_concurrently_by_default() {
    let in_flight = Arc::new(InFlight::default());
    let started = Instant::now();

    let result = run_with(ExecutionOptions::new(
        slow_schema(&in_flight),
        parse("{ a b c d e }"),
    ))
    .await;

    assert!(result.is_ok());
    assert_eq!(in_flight.peak.load(Ordering::SeqCst), 5);
    assert!(started.elapsed() < DELAY * 3);
}

#[tokio::test]
async fn resolvers_see_their_own_arguments() {
    let echo = FieldDefinition::new("echo", "String")
        .argument(InputValueDefinition::new("value", "String"))
        .resolver(Resolver::new(|ctx| {
            let value = ctx.args.get("value").cloned();
            FieldFuture::new(async move {
                tokio::task::yield_now().await;
                Ok(value.into())
            })
        }));
    let schema = Arc::new(Schema::build(ObjectType::new("Query").field(echo)).finish());

    let result = run_with(ExecutionOptions::new(
        schema,
        parse(r#"{ one: echo(value: "1") two: echo(value: "2") three: echo(value: "3") }"#),
    ))
    .await;

    assert_eq!(
        result.to_json(),
        json!({ "data": { "one": "1", "two": "2", "three": "3" } })
    );
}
