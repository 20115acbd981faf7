use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ast::query::Value as AstValue;
use crate::coercion::variables::{ValueSource, Variables};
use crate::coercion::{coerce_literal, is_absent_variable, CoercionError};
use crate::execution::resolver::ResolverError;
use crate::response::graphql_error::GraphQLErrorPathSegment;
use crate::schema::registry::TypeRegistry;
use crate::schema::types::InputValueDefinition;

/// Where an argument's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentSource {
    Literal,
    NullLiteral,
    Variable,
    /// A variable that was not provided, so its definition's default applied.
    VariableDefault,
    /// The argument was omitted and its definition's default applied.
    FieldDefault,
}

#[derive(Debug, Clone)]
pub struct ArgumentValue {
    pub value: Value,
    pub source: ArgumentSource,
}

/// Coerced arguments of one field invocation, in definition order.
#[derive(Debug, Clone, Default)]
pub struct Arguments(IndexMap<String, ArgumentValue>);

impl Arguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).map(|argument| &argument.value)
    }

    pub fn source(&self, name: &str) -> Option<ArgumentSource> {
        self.0.get(name).map(|argument| argument.source)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Deserializes an argument into `T`. Absent arguments read as `None`.
    pub fn try_get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ResolverError> {
        match self.get(name) {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|error| {
                    ResolverError::new(format!("Invalid value for argument \"{}\": {}", name, error))
                }),
            None => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgumentValue)> {
        self.0.iter().map(|(name, argument)| (name.as_str(), argument))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ArgumentValue) {
        self.0.insert(name.into(), value);
    }
}

/// Coerces the arguments written on a field (or directive) against their definitions.
pub fn coerce_arguments(
    registry: &TypeRegistry,
    definitions: &IndexMap<String, InputValueDefinition>,
    arguments: &[(String, AstValue)],
    variables: &Variables,
) -> Result<Arguments, CoercionError> {
    let mut coerced = Arguments::default();

    for (name, definition) in definitions {
        let provided = arguments
            .iter()
            .find(|(argument, _)| argument == name)
            .map(|(_, literal)| literal)
            .filter(|literal| !is_absent_variable(literal, Some(variables)));

        let Some(literal) = provided else {
            if let Some(default) = &definition.default_value {
                coerced.insert(
                    name.clone(),
                    ArgumentValue {
                        value: default.clone(),
                        source: ArgumentSource::FieldDefault,
                    },
                );
            } else if definition.ty.is_non_null() {
                return Err(CoercionError {
                    message: format!(
                        "Argument \"{}\" of required type \"{}\" was not provided.",
                        name, definition.ty
                    ),
                    path: vec![GraphQLErrorPathSegment::String(name.clone())],
                });
            }
            continue;
        };

        let value = coerce_literal(registry, &definition.ty, literal, Some(variables)).map_err(
            |error| {
                let mut path = vec![GraphQLErrorPathSegment::String(name.clone())];
                path.extend(error.path);
                CoercionError {
                    message: format!("Argument \"{}\" has invalid value {}. {}", name, literal, error.message),
                    path,
                }
            },
        )?;

        let source = match literal {
            AstValue::Null => ArgumentSource::NullLiteral,
            AstValue::Variable(variable) => match variables.get(variable).map(|v| v.source) {
                Some(ValueSource::VariableDefault) => ArgumentSource::VariableDefault,
                _ => ArgumentSource::Variable,
            },
            _ => ArgumentSource::Literal,
        };

        coerced.insert(name.clone(), ArgumentValue { value, source });
    }

    Ok(coerced)
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use serde_json::json;

    use super::{coerce_arguments, ArgumentSource};
    use crate::ast::parse_document;
    use crate::coercion::variables::collect_variables;
    use crate::schema::types::{InputValueDefinition, TypeRef};
    use crate::tests::testkit::{coercion_registry, first_field, first_operation};

    fn definitions() -> IndexMap<String, InputValueDefinition> {
        [
            InputValueDefinition::new("id", TypeRef::named_nn("ID")),
            InputValueDefinition::new("limit", "Int").default_value(10),
            InputValueDefinition::new("tags", TypeRef::named_list("String")),
            InputValueDefinition::new("after", "String"),
        ]
        .into_iter()
        .map(|definition| (definition.name.clone(), definition))
        .collect()
    }

    #[test]
    fn records_where_each_value_came_from() {
        let registry = coercion_registry();
        let document =
            parse_document(r#"query($t: String = "x", $a: String) { f(id: 4, tags: $t, after: $a) }"#)
                .unwrap();
        let operation = first_operation(&document);
        let variables = collect_variables(&registry, operation, None).unwrap();

        let arguments = coerce_arguments(
            &registry,
            &definitions(),
            &first_field(operation).arguments,
            &variables,
        )
        .unwrap();

        assert_eq!(arguments.get("id"), Some(&json!("4")));
        assert_eq!(arguments.source("id"), Some(ArgumentSource::Literal));
        assert_eq!(arguments.get("limit"), Some(&json!(10)));
        assert_eq!(arguments.source("limit"), Some(ArgumentSource::FieldDefault));
        assert_eq!(arguments.get("tags"), Some(&json!(["x"])));
        assert_eq!(arguments.source("tags"), Some(ArgumentSource::VariableDefault));
        assert!(!arguments.contains("after"));
        assert_eq!(arguments.try_get::<i64>("limit").unwrap(), Some(10));
    }

    #[test]
    fn missing_required_argument_fails() {
        let registry = coercion_registry();
        let document = parse_document("{ f(limit: 1) }").unwrap();
        let operation = first_operation(&document);
        let variables = collect_variables(&registry, operation, None).unwrap();

        let error = coerce_arguments(
            &registry,
            &definitions(),
            &first_field(operation).arguments,
            &variables,
        )
        .unwrap_err();

        assert_eq!(
            error.message,
            "Argument \"id\" of required type \"ID!\" was not provided."
        );
    }
}
