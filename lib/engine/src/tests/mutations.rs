use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use crate::execution::{ExecutionOptions, FieldFuture, Resolver, ResolverError};
use crate::schema::types::{FieldDefinition, InputValueDefinition, ObjectType, TypeRef};
use crate::schema::Schema;
use crate::tests::testkit::{parse, run, run_with};

type Log = Arc<Mutex<Vec<String>>>;

fn bank(log: &Log) -> Arc<Schema> {
    let account = ObjectType::new("Account")
        .field(FieldDefinition::new("balance", TypeRef::named_nn("Int")));

    let deposit = {
        let log = log.clone();
        FieldDefinition::new("deposit", "Account")
            .argument(InputValueDefinition::new("amount", TypeRef::named_nn("Int")))
            .argument(InputValueDefinition::new("delay", "Int").default_value(0))
            .resolver(Resolver::new(move |ctx| {
                let log = log.clone();
                let amount = ctx.args.get("amount").and_then(|v| v.as_i64()).unwrap_or(0);
                let delay = ctx.args.get("delay").and_then(|v| v.as_u64()).unwrap_or(0);
                FieldFuture::new(async move {
                    log.lock().unwrap().push(format!("start {}", amount));
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    let mut entries = log.lock().unwrap();
                    entries.push(format!("end {}", amount));
                    let balance: i64 = entries
                        .iter()
                        .filter_map(|entry| entry.strip_prefix("end "))
                        .filter_map(|amount| amount.parse::<i64>().ok())
                        .sum();
                    Ok(json!({ "balance": balance }).into())
                })
            }))
    };
    let failing = || Resolver::new(|_| FieldFuture::ready(Err(ResolverError::new("insufficient funds"))));
    let fail = FieldDefinition::new("fail", "Boolean").resolver(failing());
    let must_succeed =
        FieldDefinition::new("mustSucceed", TypeRef::named_nn("Boolean")).resolver(failing());

    let mutation = ObjectType::new("Mutation")
        .field(deposit)
        .field(fail)
        .field(must_succeed);
    let query = ObjectType::new("Query").field(FieldDefinition::new("ping", "String"));

    Arc::new(
        Schema::build(query)
            .mutation(mutation)
            .register(account)
            .finish(),
    )
}

#[tokio::test]
async fn top_level_fields_run_one_after_another() {
    let log = Log::default();
    let result = run_with(ExecutionOptions::new(
        bank(&log),
        parse(
            "mutation {
               first: deposit(amount: 10, delay: 30) { balance }
               second: deposit(amount: 5) { balance }
               third: deposit(amount: 1, delay: 10) { balance }
             }",
        ),
    ))
    .await;

    assert_eq!(
        result.to_json(),
        json!({
            "data": {
                "first": { "balance": 10 },
                "second": { "balance": 15 },
                "third": { "balance": 16 }
            }
        })
    );
    assert_eq!(
        *log.lock().unwrap(),
        vec!["start 10", "end 10", "start 5", "end 5", "start 1", "end 1"]
    );
}

#[tokio::test]
async fn a_failing_field_does_not_stop_the_next_ones() {
    let log = Log::default();
    let response = run(
        bank(&log),
        "mutation { a: deposit(amount: 1) { balance } fail b: deposit(amount: 2) { balance } }",
    )
    .await;

    assert_eq!(
        response,
        json!({
            "data": {
                "a": { "balance": 1 },
                "fail": null,
                "b": { "balance": 3 }
            },
            "errors": [{
                "message": "insufficient funds",
                "locations": [{ "line": 1, "column": 46 }],
                "path": ["fail"]
            }]
        })
    );
    assert_eq!(log.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn a_null_reaching_the_root_skips_the_remaining_fields() {
    let log = Log::default();
    let response = run(
        bank(&log),
        "mutation { a: deposit(amount: 1) { balance } mustSucceed b: deposit(amount: 2) { balance } }",
    )
    .await;

    assert_eq!(response["data"], json!(null));
    assert_eq!(response["errors"][0]["path"], json!(["mustSucceed"]));
    assert_eq!(*log.lock().unwrap(), vec!["start 1", "end 1"]);
}

#[tokio::test]
async fn mutations_need_a_mutation_root() {
    let schema = Arc::new(
        Schema::build(ObjectType::new("Query").field(FieldDefinition::new("ping", "String")))
            .finish(),
    );

    let result = run_with(ExecutionOptions::new(
        schema,
        parse("mutation { ping }"),
    ))
    .await;

    assert!(!result.executed);
    assert_eq!(
        result.errors[0].message,
        "Schema is not configured to execute mutation operation."
    );
}
