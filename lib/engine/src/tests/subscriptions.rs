use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde_json::{json, Value};

use crate::execution::{
    ExecutionOptions, FieldFuture, FieldResult, FieldValue, Resolver, ResolverError, Subscriber,
    SubscriptionFuture,
};
use crate::schema::types::{FieldDefinition, InputValueDefinition, ObjectType, TypeRef};
use crate::schema::Schema;
use crate::tests::testkit::{parse, run_with};
use crate::utils::cancellation::CancellationToken;

fn events(values: Vec<FieldResult>) -> Subscriber {
    Subscriber::new(move |_| {
        let values = values.clone();
        SubscriptionFuture::new(async move { Ok(stream::iter(values).boxed()) })
    })
}

fn ticker() -> Subscriber {
    Subscriber::new(|ctx| {
        let every = ctx
            .args
            .get("everyMs")
            .and_then(Value::as_u64)
            .unwrap_or(5);
        SubscriptionFuture::new(async move {
            let ticks = async_stream::stream! {
                let mut tick: i64 = 0;
                loop {
                    tokio::time::sleep(Duration::from_millis(every)).await;
                    tick += 1;
                    yield Ok::<_, ResolverError>(FieldValue::value(tick));
                }
            };
            Ok(ticks.boxed())
        })
    })
}

fn chat() -> Arc<Schema> {
    let message = ObjectType::new("Message")
        .field(FieldDefinition::new("text", TypeRef::named_nn("String")))
        .field(FieldDefinition::new("from", "String"));

    let subscription = ObjectType::new("Subscription")
        .field(FieldDefinition::new("messageAdded", "Message").subscriber(events(vec![
            Ok(json!({ "text": "hi", "from": "ada" }).into()),
            Err(ResolverError::new("connection lost").with_code("SOURCE_ERROR")),
            Ok(json!({ "text": null }).into()),
        ])))
        .field(
            FieldDefinition::new("doubled", "Int")
                .subscriber(events(vec![Ok(json!(1).into()), Ok(json!(21).into())]))
                .resolver(Resolver::new(|ctx| {
                    let doubled = ctx.parent_json().and_then(Value::as_i64).map(|n| n * 2);
                    FieldFuture::value(doubled.map(Value::from))
                })),
        )
        .field(
            FieldDefinition::new("tick", "Int")
                .argument(InputValueDefinition::new("everyMs", "Int"))
                .subscriber(ticker()),
        )
        .field(
            FieldDefinition::new("refused", "String").subscriber(Subscriber::new(|_| {
                SubscriptionFuture::new(async { Err(ResolverError::new("not allowed")) })
            })),
        )
        .field(FieldDefinition::new("plain", "String"));

    let query = ObjectType::new("Query").field(FieldDefinition::new("ping", "String"));

    Arc::new(
        Schema::build(query)
            .subscription(subscription)
            .register(message)
            .finish(),
    )
}

async fn subscribe(source: &str) -> crate::ExecutionResult {
    run_with(ExecutionOptions::new(chat(), parse(source))).await
}

async fn collect(source: &str) -> Vec<Value> {
    let mut result = subscribe(source).await;
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    let stream = result.stream.take().expect("subscriptions produce a stream");
    stream.map(|result| result.to_json()).collect().await
}

#[tokio::test]
async fn every_event_is_executed_against_the_selection_set() {
    let responses = collect("subscription { messageAdded { text from } }").await;

    insta::assert_json_snapshot!(responses, @r###"
    [
      {
        "data": {
          "messageAdded": {
            "text": "hi",
            "from": "ada"
          }
        }
      },
      {
        "errors": [
          {
            "message": "connection lost",
            "extensions": {
              "code": "SOURCE_ERROR"
            }
          }
        ]
      },
      {
        "data": {
          "messageAdded": null
        },
        "errors": [
          {
            "message": "Cannot return null for non-nullable field Message.text.",
            "locations": [
              {
                "line": 1,
                "column": 31
              }
            ],
            "path": [
              "messageAdded",
              "text"
            ]
          }
        ]
      }
    ]
    "###);
}

#[tokio::test]
async fn root_resolvers_map_the_event() {
    let responses = collect("subscription { value: doubled }").await;
    assert_eq!(
        responses,
        vec![
            json!({ "data": { "value": 2 } }),
            json!({ "data": { "value": 42 } })
        ]
    );
}

#[tokio::test]
async fn source_stream_errors_are_returned_once() {
    for source in ["subscription { refused }", "subscription { plain }"] {
        let result = subscribe(source).await;
        assert!(result.stream.is_none());
        assert!(result.data.is_none());
        assert_eq!(result.errors.len(), 1);
    }

    let result = subscribe("subscription { plain }").await;
    assert_eq!(
        result.to_json(),
        json!({
            "errors": [{
                "message": "Subscription field \"plain\" has no source stream.",
                "locations": [{ "line": 1, "column": 16 }],
                "path": ["plain"]
            }]
        })
    );
}

#[tokio::test]
async fn cancellation_ends_the_stream() {
    let token = CancellationToken::new();
    let mut result = run_with(
        ExecutionOptions::new(chat(), parse("subscription { tick(everyMs: 5) }"))
            .with_cancellation_token(token.clone()),
    )
    .await;
    let mut stream = result.stream.take().expect("subscriptions produce a stream");

    assert_eq!(
        stream.next().await.map(|result| result.to_json()),
        Some(json!({ "data": { "tick": 1 } }))
    );
    assert_eq!(
        stream.next().await.map(|result| result.to_json()),
        Some(json!({ "data": { "tick": 2 } }))
    );

    token.cancel();
    let rest = tokio::time::timeout(Duration::from_secs(1), stream.count()).await;
    assert_eq!(rest.ok(), Some(0));
}
