use std::sync::{Arc, Once};

use lazy_static::lazy_static;
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::ast::parse_document;
use crate::ast::query::{Definition, Document, Field, OperationDefinition, Selection};
use crate::ast::OperationDefinitionExt;
use crate::execution::{execute, ExecutionOptions};
use crate::response::execution_result::ExecutionResult;
use crate::schema::registry::TypeRegistry;
use crate::schema::types::{
    EnumType, FieldDefinition, InputObjectType, InputValueDefinition, InterfaceType, ObjectType,
    TypeRef, UnionType,
};
use crate::schema::Schema;
use crate::validation::rules::ValidationRule;
use crate::validation::validate::{validate, ValidationPlan};

fn init_test_logger_internal() {
    let tree_layer = tracing_tree::HierarchicalLayer::new(2)
        .with_bracketed_fields(true)
        .with_deferred_spans(false)
        .with_wraparound(25)
        .with_indent_lines(true)
        .with_timer(tracing_tree::time::Uptime::default())
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_targets(false);

    tracing_subscriber::registry()
        .with(tree_layer)
        .with(EnvFilter::from_default_env())
        .init();
}

lazy_static! {
    static ref TRACING_INIT: Once = Once::new();
}

pub fn init_logger() {
    TRACING_INIT.call_once(|| {
        init_test_logger_internal();
    });
}

/// Animals, humans and a type full of arguments: enough surface for every validation rule.
pub fn validation_schema() -> Schema {
    let name = || {
        FieldDefinition::new("name", "String")
            .argument(InputValueDefinition::new("surname", "Boolean"))
    };

    let node = InterfaceType::new("Node").field(FieldDefinition::new("id", TypeRef::named_nn("ID")));
    let pet = InterfaceType::new("Pet")
        .field(name())
        .field(FieldDefinition::new("nickname", "String"));

    let dog = ObjectType::new("Dog")
        .implements("Pet")
        .field(name())
        .field(FieldDefinition::new("nickname", "String"))
        .field(FieldDefinition::new("barks", "Boolean"))
        .field(FieldDefinition::new("barkVolume", "Int"))
        .field(
            FieldDefinition::new("doesKnowCommand", "Boolean")
                .argument(InputValueDefinition::new("dogCommand", "DogCommand")),
        )
        .field(
            FieldDefinition::new("isHousetrained", "Boolean").argument(
                InputValueDefinition::new("atOtherHomes", "Boolean").default_value(true),
            ),
        );

    let cat = ObjectType::new("Cat")
        .implements("Pet")
        .field(name())
        .field(FieldDefinition::new("nickname", "String"))
        .field(FieldDefinition::new("meows", "Boolean"))
        .field(FieldDefinition::new("furColor", "FurColor"));

    let human = ObjectType::new("Human")
        .implements("Node")
        .field(FieldDefinition::new("id", TypeRef::named_nn("ID")))
        .field(name())
        .field(FieldDefinition::new("iq", "Int"))
        .field(FieldDefinition::new("pets", TypeRef::named_list("Pet")))
        .field(FieldDefinition::new("relatives", TypeRef::named_list("Human")));

    let cat_or_dog = UnionType::new("CatOrDog").member("Cat").member("Dog");

    let dog_command = EnumType::new("DogCommand")
        .item("SIT")
        .item("HEEL")
        .item("DOWN");
    let fur_color = EnumType::new("FurColor")
        .item("BROWN")
        .item("BLACK")
        .item("TAN")
        .item("SPOTTED");

    let complex_input = InputObjectType::new("ComplexInput")
        .field(InputValueDefinition::new("requiredField", TypeRef::named_nn("Boolean")))
        .field(InputValueDefinition::new("intField", "Int"))
        .field(InputValueDefinition::new("stringField", "String"))
        .field(InputValueDefinition::new("booleanField", "Boolean"))
        .field(InputValueDefinition::new("stringListField", TypeRef::named_list("String")));

    let arg_field = |field: &str, argument: &str, ty: TypeRef| {
        FieldDefinition::new(field, "String").argument(InputValueDefinition::new(argument, ty))
    };
    let complicated_args = ObjectType::new("ComplicatedArgs")
        .field(arg_field("intArgField", "intArg", "Int".into()))
        .field(arg_field("nonNullIntArgField", "nonNullIntArg", TypeRef::named_nn("Int")))
        .field(arg_field("stringArgField", "stringArg", "String".into()))
        .field(arg_field("booleanArgField", "booleanArg", "Boolean".into()))
        .field(arg_field(
            "nonNullBooleanArgField",
            "nonNullBooleanArg",
            TypeRef::named_nn("Boolean"),
        ))
        .field(arg_field("enumArgField", "enumArg", "FurColor".into()))
        .field(arg_field(
            "stringListArgField",
            "stringListArg",
            TypeRef::named_list("String"),
        ))
        .field(arg_field("complexArgField", "complexArg", "ComplexInput".into()))
        .field(
            FieldDefinition::new("multipleReqs", "String")
                .argument(InputValueDefinition::new("req1", TypeRef::named_nn("Int")))
                .argument(InputValueDefinition::new("req2", TypeRef::named_nn("Int"))),
        )
        .field(
            FieldDefinition::new("multipleOpts", "String")
                .argument(InputValueDefinition::new("opt1", "Int").default_value(0))
                .argument(InputValueDefinition::new("opt2", "Int").default_value(0)),
        );

    let query = ObjectType::new("Query")
        .field(FieldDefinition::new("dog", "Dog"))
        .field(FieldDefinition::new("cat", "Cat"))
        .field(FieldDefinition::new("pet", "Pet"))
        .field(FieldDefinition::new("catOrDog", "CatOrDog"))
        .field(
            FieldDefinition::new("human", "Human")
                .argument(InputValueDefinition::new("id", "ID")),
        )
        .field(FieldDefinition::new("complicatedArgs", "ComplicatedArgs"));

    let mutation = ObjectType::new("Mutation").field(FieldDefinition::new("touch", "Boolean"));
    let subscription = ObjectType::new("Subscription")
        .field(FieldDefinition::new("newMessage", "String"))
        .field(FieldDefinition::new("disallowedSecondRootField", "Boolean"));

    Schema::build(query)
        .mutation(mutation)
        .subscription(subscription)
        .register(node)
        .register(pet)
        .register(dog)
        .register(cat)
        .register(human)
        .register(cat_or_dog)
        .register(dog_command)
        .register(fur_color)
        .register(complex_input)
        .register(complicated_args)
        .finish()
}

pub fn validation_registry() -> Arc<TypeRegistry> {
    validation_schema()
        .initialize()
        .expect("validation schema should be valid")
}

/// A tiny schema with one input object, for coercion tests.
pub fn coercion_registry() -> Arc<TypeRegistry> {
    let name_input = InputObjectType::new("NameInput")
        .field(InputValueDefinition::new("first", TypeRef::named_nn("String")))
        .field(InputValueDefinition::new("last", "String"))
        .field(InputValueDefinition::new("title", "String").default_value("Dr."))
        .field(InputValueDefinition::new("tags", TypeRef::named_list("String")));

    Schema::build(ObjectType::new("Query").field(FieldDefinition::new("a", "String")))
        .register(name_input)
        .finish()
        .initialize()
        .expect("coercion schema should be valid")
}

pub fn first_operation(document: &Document) -> &OperationDefinition {
    document
        .definitions
        .iter()
        .find_map(|definition| match definition {
            Definition::Operation(operation) => Some(operation),
            Definition::Fragment(_) => None,
        })
        .expect("document should contain an operation")
}

pub fn first_field(operation: &OperationDefinition) -> &Field {
    operation
        .selection_set()
        .items
        .iter()
        .find_map(|selection| match selection {
            Selection::Field(field) => Some(field),
            _ => None,
        })
        .expect("operation should select a field")
}

/// Messages reported by a single rule over `source`, validated against [`validation_registry`].
pub fn validate_rule(rule: impl ValidationRule + 'static, source: &str) -> Vec<String> {
    let registry = validation_registry();
    let document = parse_document(source).expect("test document should parse");
    let plan = ValidationPlan::from(vec![Box::new(rule) as Box<dyn ValidationRule>]);

    validate(&registry, &document, &plan)
        .into_iter()
        .map(|error| error.message)
        .collect()
}

pub fn parse(source: &str) -> Arc<Document> {
    Arc::new(parse_document(source).expect("test document should parse"))
}

/// Executes `source` against `schema` with default options and serializes the response.
pub async fn run(schema: Arc<Schema>, source: &str) -> Value {
    run_with(ExecutionOptions::new(schema, parse(source))).await.to_json()
}

pub async fn run_with(options: ExecutionOptions) -> ExecutionResult {
    init_logger();
    execute(options).await.expect("execution should not be aborted")
}
