use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

use crate::schema::types::{InputValueDefinition, TypeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
    VariableDefinition,
    Schema,
    Scalar,
    Object,
    FieldDefinition,
    ArgumentDefinition,
    Interface,
    Union,
    Enum,
    EnumValue,
    InputObject,
    InputFieldDefinition,
}

impl DirectiveLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectiveLocation::Query => "QUERY",
            DirectiveLocation::Mutation => "MUTATION",
            DirectiveLocation::Subscription => "SUBSCRIPTION",
            DirectiveLocation::Field => "FIELD",
            DirectiveLocation::FragmentDefinition => "FRAGMENT_DEFINITION",
            DirectiveLocation::FragmentSpread => "FRAGMENT_SPREAD",
            DirectiveLocation::InlineFragment => "INLINE_FRAGMENT",
            DirectiveLocation::VariableDefinition => "VARIABLE_DEFINITION",
            DirectiveLocation::Schema => "SCHEMA",
            DirectiveLocation::Scalar => "SCALAR",
            DirectiveLocation::Object => "OBJECT",
            DirectiveLocation::FieldDefinition => "FIELD_DEFINITION",
            DirectiveLocation::ArgumentDefinition => "ARGUMENT_DEFINITION",
            DirectiveLocation::Interface => "INTERFACE",
            DirectiveLocation::Union => "UNION",
            DirectiveLocation::Enum => "ENUM",
            DirectiveLocation::EnumValue => "ENUM_VALUE",
            DirectiveLocation::InputObject => "INPUT_OBJECT",
            DirectiveLocation::InputFieldDefinition => "INPUT_FIELD_DEFINITION",
        }
    }

    pub fn all() -> &'static [DirectiveLocation] {
        &[
            DirectiveLocation::Query,
            DirectiveLocation::Mutation,
            DirectiveLocation::Subscription,
            DirectiveLocation::Field,
            DirectiveLocation::FragmentDefinition,
            DirectiveLocation::FragmentSpread,
            DirectiveLocation::InlineFragment,
            DirectiveLocation::VariableDefinition,
            DirectiveLocation::Schema,
            DirectiveLocation::Scalar,
            DirectiveLocation::Object,
            DirectiveLocation::FieldDefinition,
            DirectiveLocation::ArgumentDefinition,
            DirectiveLocation::Interface,
            DirectiveLocation::Union,
            DirectiveLocation::Enum,
            DirectiveLocation::EnumValue,
            DirectiveLocation::InputObject,
            DirectiveLocation::InputFieldDefinition,
        ]
    }
}

impl fmt::Display for DirectiveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct DirectiveDefinition {
    pub name: String,
    pub description: Option<String>,
    pub locations: Vec<DirectiveLocation>,
    pub arguments: IndexMap<String, InputValueDefinition>,
    pub repeatable: bool,
}

impl DirectiveDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        DirectiveDefinition {
            name: name.into(),
            description: None,
            locations: Vec::new(),
            arguments: IndexMap::new(),
            repeatable: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn location(mut self, location: DirectiveLocation) -> Self {
        self.locations.push(location);
        self
    }

    pub fn argument(mut self, argument: InputValueDefinition) -> Self {
        self.arguments.insert(argument.name.clone(), argument);
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub fn is_allowed_at(&self, location: DirectiveLocation) -> bool {
        self.locations.contains(&location)
    }
}

pub const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

pub fn is_builtin_directive(name: &str) -> bool {
    matches!(name, "skip" | "include" | "deprecated" | "specifiedBy")
}

/// Directives every schema knows about.
pub fn builtin_directives() -> Vec<DirectiveDefinition> {
    vec![
        DirectiveDefinition::new("include")
            .description("Directs the executor to include this field or fragment only when the `if` argument is true.")
            .location(DirectiveLocation::Field)
            .location(DirectiveLocation::FragmentSpread)
            .location(DirectiveLocation::InlineFragment)
            .argument(
                InputValueDefinition::new("if", TypeRef::named_nn("Boolean"))
                    .description("Included when true."),
            ),
        DirectiveDefinition::new("skip")
            .description("Directs the executor to skip this field or fragment when the `if` argument is true.")
            .location(DirectiveLocation::Field)
            .location(DirectiveLocation::FragmentSpread)
            .location(DirectiveLocation::InlineFragment)
            .argument(
                InputValueDefinition::new("if", TypeRef::named_nn("Boolean"))
                    .description("Skipped when true."),
            ),
        DirectiveDefinition::new("deprecated")
            .description("Marks an element of a GraphQL schema as no longer supported.")
            .location(DirectiveLocation::FieldDefinition)
            .location(DirectiveLocation::ArgumentDefinition)
            .location(DirectiveLocation::InputFieldDefinition)
            .location(DirectiveLocation::EnumValue)
            .argument(
                InputValueDefinition::new("reason", TypeRef::named("String"))
                    .default_value(Value::String(DEFAULT_DEPRECATION_REASON.to_string())),
            ),
        DirectiveDefinition::new("specifiedBy")
            .description("Exposes a URL that specifies the behavior of this scalar.")
            .location(DirectiveLocation::Scalar)
            .argument(
                InputValueDefinition::new("url", TypeRef::named_nn("String"))
                    .description("The URL that specifies the behavior of this scalar."),
            ),
    ]
}
