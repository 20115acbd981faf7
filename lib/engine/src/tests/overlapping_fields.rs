use std::sync::Arc;

use crate::ast::parse_document;
use crate::schema::registry::TypeRegistry;
use crate::schema::types::{FieldDefinition, InterfaceType, ObjectType, TypeRef};
use crate::schema::Schema;
use crate::tests::testkit::{init_logger, validate_rule};
use crate::validation::rules::{OverlappingFieldsCanBeMerged, ValidationRule};
use crate::validation::validate::{validate, ValidationPlan};

fn registry() -> Arc<TypeRegistry> {
    let user = ObjectType::new("User")
        .field(FieldDefinition::new("id", TypeRef::named_nn("ID")))
        .field(FieldDefinition::new("name", "String"))
        .field(FieldDefinition::new("nickname", "String"));
    let node = InterfaceType::new("Node").field(FieldDefinition::new("id", TypeRef::named_nn("ID")));
    let cat = ObjectType::new("Cat")
        .implements("Node")
        .field(FieldDefinition::new("id", TypeRef::named_nn("ID")))
        .field(FieldDefinition::new("legs", "Int"));
    let dog = ObjectType::new("Dog")
        .implements("Node")
        .field(FieldDefinition::new("id", TypeRef::named_nn("ID")))
        .field(FieldDefinition::new("tailLength", "Int"))
        .field(FieldDefinition::new("barks", "Boolean"));

    let query = ObjectType::new("Query")
        .field(FieldDefinition::new("user", "User"))
        .field(FieldDefinition::new("node", "Node"));

    Schema::build(query)
        .register(user)
        .register(node)
        .register(cat)
        .register(dog)
        .finish()
        .initialize()
        .unwrap()
}

fn conflicts(source: &str) -> Vec<String> {
    init_logger();
    let document = parse_document(source).unwrap();
    let plan = ValidationPlan::from(vec![
        Box::new(OverlappingFieldsCanBeMerged::new()) as Box<dyn ValidationRule>
    ]);

    validate(&registry(), &document, &plan)
        .into_iter()
        .map(|error| error.message)
        .collect()
}

#[test]
fn identical_fields_merge() {
    assert!(conflicts("{ user { id name name } }").is_empty());
}

#[test]
fn alias_hiding_another_field() {
    assert_eq!(
        conflicts("{ user { name: nickname name } }"),
        vec!["Fields \"name\" conflict because \"nickname\" and \"name\" are different fields. Use different aliases on the fields to fetch both if this was intentional."]
    );
}

#[test]
fn distinct_concrete_parents_are_mutually_exclusive() {
    assert!(conflicts("{ node { ... on Cat { legs } ... on Dog { legs: tailLength } } }").is_empty());
}

#[test]
fn exclusive_parents_still_need_compatible_types() {
    assert_eq!(
        conflicts("{ node { ... on Cat { x: legs } ... on Dog { x: barks } } }"),
        vec!["Fields \"x\" conflict because they return conflicting types \"Int\" and \"Boolean\". Use different aliases on the fields to fetch both if this was intentional."]
    );
}

#[test]
fn nested_conflicts_are_reported_once_at_the_top() {
    assert_eq!(
        conflicts("{ user { name } user { name: nickname } }"),
        vec!["Fields \"user\" conflict because subfields \"name\" conflict because \"name\" and \"nickname\" are different fields. Use different aliases on the fields to fetch both if this was intentional."]
    );
}

#[test]
fn conflicts_through_fragments() {
    assert_eq!(
        conflicts("{ user { ...A ...B } } fragment A on User { x: name } fragment B on User { x: id }"),
        vec!["Fields \"x\" conflict because \"name\" and \"id\" are different fields. Use different aliases on the fields to fetch both if this was intentional."]
    );
}

#[test]
fn differing_arguments() {
    let errors = validate_rule(
        OverlappingFieldsCanBeMerged::new(),
        "{ dog { doesKnowCommand(dogCommand: SIT) doesKnowCommand(dogCommand: HEEL) } }",
    );
    assert_eq!(
        errors,
        vec!["Fields \"doesKnowCommand\" conflict because they have differing arguments. Use different aliases on the fields to fetch both if this was intentional."]
    );
}

#[test]
fn same_arguments_in_different_order() {
    let errors = validate_rule(
        OverlappingFieldsCanBeMerged::new(),
        "{ complicatedArgs { multipleOpts(opt1: 1, opt2: 2) multipleOpts(opt2: 2, opt1: 1) } }",
    );
    assert!(errors.is_empty());
}
