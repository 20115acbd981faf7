use hive_graphql_engine_config::validation::ValidationConfig;
use serde_json::json;

use crate::ast::parse_document;
use crate::coercion::variables::BAD_USER_INPUT;
use crate::response::graphql_error::ErrorKind;
use crate::tests::testkit::{first_operation, init_logger, validation_registry};
use crate::validation::rules::default_rules_validation_plan;
use crate::validation::validate::{validate, validate_request};

#[test]
fn default_plan_accepts_a_well_formed_document() {
    init_logger();
    let registry = validation_registry();
    let document = parse_document(
        "query Q($id: ID, $withPets: Boolean = false) {
           human(id: $id) { name ...Relatives pets @include(if: $withPets) { name } }
           catOrDog { ... on Dog { barks } ... on Cat { meows } }
         }
         fragment Relatives on Human { relatives { iq } }",
    )
    .unwrap();

    assert!(validate(&registry, &document, &default_rules_validation_plan()).is_empty());
}

#[test]
fn every_failing_rule_reports_with_its_code() {
    init_logger();
    let registry = validation_registry();
    let document = parse_document(
        "query Q($unused: Int) { dog { unknownField } }
         fragment Orphan on Dog { name }",
    )
    .unwrap();

    let mut codes: Vec<&str> = validate(&registry, &document, &default_rules_validation_plan())
        .into_iter()
        .map(|error| error.error_code)
        .collect();
    codes.sort_unstable();

    assert_eq!(
        codes,
        vec![
            "FIELDS_ON_CORRECT_TYPE",
            "NO_UNUSED_FRAGMENTS",
            "NO_UNUSED_VARIABLES"
        ]
    );
}

#[test]
fn request_variables_are_coerced_once_the_document_is_valid() {
    init_logger();
    let registry = validation_registry();
    let document = parse_document(
        "query Q($id: ID, $command: DogCommand = SIT) {
           human(id: $id) { name }
           dog { doesKnowCommand(dogCommand: $command) }
         }",
    )
    .unwrap();
    let variables = json!({ "id": 4 });

    let outcome = validate_request(
        &registry,
        &document,
        first_operation(&document),
        variables.as_object(),
        &default_rules_validation_plan(),
    );

    assert!(outcome.is_valid());
    assert_eq!(outcome.variables.value("id"), Some(&json!("4")));
    assert_eq!(outcome.variables.value("command"), Some(&json!("SIT")));
}

#[test]
fn invalid_variables_are_request_errors() {
    init_logger();
    let registry = validation_registry();
    let document = parse_document(
        "query Q($input: ComplexInput!) { complicatedArgs { complexArgField(complexArg: $input) } }",
    )
    .unwrap();
    let variables = json!({ "input": { "intField": 3 } });

    let outcome = validate_request(
        &registry,
        &document,
        first_operation(&document),
        variables.as_object(),
        &default_rules_validation_plan(),
    );

    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].kind, ErrorKind::Coercion);
    assert_eq!(outcome.errors[0].code(), Some(BAD_USER_INPUT));
    assert!(outcome.errors[0].message.starts_with("Variable \"$input\" got invalid value"));
}

#[test]
fn document_errors_skip_variable_coercion() {
    init_logger();
    let registry = validation_registry();
    let document = parse_document("query Q($id: ID!) { human(id: $id) { nope } }").unwrap();

    let outcome = validate_request(
        &registry,
        &document,
        first_operation(&document),
        None,
        &default_rules_validation_plan(),
    );

    let messages: Vec<&str> = outcome.errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["Cannot query field \"nope\" on type \"Human\"."]);
    assert_eq!(outcome.errors[0].code(), Some("FIELDS_ON_CORRECT_TYPE"));
    assert_eq!(
        serde_json::to_value(&outcome.errors[0].locations).unwrap(),
        json!([{ "line": 1, "column": 38 }])
    );
    assert!(!outcome.variables.contains("id"));
}

#[test]
fn configuration_disables_rules_by_code() {
    init_logger();
    let registry = validation_registry();
    let document = parse_document("{ dog { name } } fragment Orphan on Dog { name }").unwrap();
    let config = ValidationConfig {
        enabled: true,
        disabled_rules: vec!["no_unused_fragments".to_string()],
    };

    let plan = default_rules_validation_plan().configured(&config);
    assert_eq!(plan.rules.len(), 23);
    assert!(validate(&registry, &document, &plan).is_empty());

    let disabled = default_rules_validation_plan().configured(&ValidationConfig {
        enabled: false,
        disabled_rules: vec![],
    });
    assert!(disabled.is_empty());
}

#[test]
fn subscriptions_select_a_single_root_field() {
    init_logger();
    let registry = validation_registry();
    let document = parse_document(
        "subscription S { newMessage ...Extra }
         fragment Extra on Subscription { disallowedSecondRootField }",
    )
    .unwrap();

    let errors = validate(&registry, &document, &default_rules_validation_plan());
    insta::assert_debug_snapshot!(errors, @r###"
    [
        ValidationError {
            locations: [
                Pos(2:43),
            ],
            message: "Subscription \"S\" must select only one top level field.",
            error_code: "SINGLE_FIELD_SUBSCRIPTIONS",
        },
    ]
    "###);
}
