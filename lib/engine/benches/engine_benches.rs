use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use hive_graphql_engine::ast::parse_document;
use hive_graphql_engine::execution::{FieldFuture, FieldValue, Resolver};
use hive_graphql_engine::schema::types::{
    FieldDefinition, InputValueDefinition, InterfaceType, ObjectType, TypeRef,
};
use hive_graphql_engine::validation::rules::default_rules_validation_plan;
use hive_graphql_engine::validation::validate::validate;
use hive_graphql_engine::{execute, ExecutionOptions, Schema};
use serde_json::json;

const OPERATION: &str = r#"
query Shop($first: Int = 20) {
  products(first: $first) {
    ...ProductFields
    reviews { id body author { id name } }
  }
  node(id: "1") { id ... on User { name } }
}

fragment ProductFields on Product {
  upc
  name
  price
  inStock
}
"#;

fn shop_schema() -> Schema {
    let node = InterfaceType::new("Node").field(FieldDefinition::new("id", TypeRef::named_nn("ID")));
    let user = ObjectType::new("User")
        .implements("Node")
        .field(FieldDefinition::new("id", TypeRef::named_nn("ID")))
        .field(FieldDefinition::new("name", "String"));
    let review = ObjectType::new("Review")
        .field(FieldDefinition::new("id", TypeRef::named_nn("ID")))
        .field(FieldDefinition::new("body", "String"))
        .field(FieldDefinition::new("author", "User"));
    let product = ObjectType::new("Product")
        .field(FieldDefinition::new("upc", TypeRef::named_nn("String")))
        .field(FieldDefinition::new("name", "String"))
        .field(FieldDefinition::new("price", "Int"))
        .field(FieldDefinition::new("inStock", "Boolean"))
        .field(FieldDefinition::new("reviews", TypeRef::named_nn_list_nn("Review")));

    let products = FieldDefinition::new("products", TypeRef::named_nn_list_nn("Product"))
        .argument(InputValueDefinition::new("first", "Int").default_value(5))
        .resolver(Resolver::new(|ctx| {
            let first = ctx.args.get("first").and_then(|v| v.as_u64()).unwrap_or(5);
            FieldFuture::value(FieldValue::list((0..first).map(|i| {
                json!({
                    "upc": format!("upc-{}", i),
                    "name": format!("Product {}", i),
                    "price": i * 100,
                    "inStock": i % 2 == 0,
                    "reviews": [
                        { "id": format!("r{}-1", i), "body": "great", "author": { "id": "1", "name": "Ada" } },
                        { "id": format!("r{}-2", i), "body": "meh", "author": { "id": "2", "name": "Alan" } }
                    ]
                })
            })))
        }));
    let node_field = FieldDefinition::new("node", "Node")
        .argument(InputValueDefinition::new("id", TypeRef::named_nn("ID")))
        .resolver(Resolver::new(|ctx| {
            let id = ctx.args.get("id").cloned();
            FieldFuture::new(async move {
                Ok(FieldValue::value(json!({ "id": id, "name": "Ada" })).with_type("User"))
            })
        }));

    Schema::build(ObjectType::new("Query").field(products).field(node_field))
        .register(node)
        .register(user)
        .register(review)
        .register(product)
        .finish()
}

fn validation_benchmark(c: &mut Criterion) {
    let schema = shop_schema();
    let registry = schema.initialize().unwrap();
    let document = parse_document(OPERATION).unwrap();
    let plan = default_rules_validation_plan();

    c.bench_function("validate_default_rules", |b| {
        b.iter(|| {
            let errors = validate(black_box(&registry), black_box(&document), black_box(&plan));
            black_box(errors);
        })
    });
}

fn execution_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let schema = Arc::new(shop_schema());
    let document = Arc::new(parse_document(OPERATION).unwrap());

    c.bench_function("execute_query", |b| {
        b.to_async(&runtime).iter(|| async {
            let result = execute(ExecutionOptions::new(schema.clone(), document.clone()))
                .await
                .unwrap();
            black_box(result);
        })
    });
}

criterion_group!(benches, validation_benchmark, execution_benchmark);
criterion_main!(benches);
