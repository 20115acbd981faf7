use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::trace;

use crate::ast::query::OperationDefinition;
use crate::ast::OperationDefinitionExt;
use crate::coercion::{coerce_input_value, coerce_literal};
use crate::response::graphql_error::{ErrorKind, GraphQLError};
use crate::schema::registry::TypeRegistry;
use crate::schema::types::TypeRef;

pub const BAD_USER_INPUT: &str = "BAD_USER_INPUT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Supplied with the request.
    Explicit,
    /// Taken from the variable definition's default.
    VariableDefault,
}

#[derive(Debug, Clone)]
pub struct VariableValue {
    pub value: Value,
    pub source: ValueSource,
    /// The variable's declared type, needed to promote it into list positions.
    pub ty: TypeRef,
}

/// Coerced variable values of one operation. Variables that were neither provided nor defaulted
/// are absent, which is different from being `null`.
#[derive(Debug, Clone, Default)]
pub struct Variables(IndexMap<String, VariableValue>);

impl Variables {
    pub fn get(&self, name: &str) -> Option<&VariableValue> {
        self.0.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.0.get(name).map(|variable| &variable.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VariableValue)> {
        self.0.iter().map(|(name, variable)| (name.as_str(), variable))
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(name, variable)| (name.clone(), variable.value.clone()))
                .collect(),
        )
    }
}

/// Coerces the request's raw variables against the operation's variable definitions.
/// Every failing variable produces one error.
pub fn collect_variables(
    registry: &TypeRegistry,
    operation: &OperationDefinition,
    provided: Option<&Map<String, Value>>,
) -> Result<Variables, Vec<GraphQLError>> {
    let mut variables = IndexMap::new();
    let mut errors = Vec::new();

    for definition in operation.variable_definitions() {
        let name = definition.name.as_str();
        let ty = TypeRef::from(&definition.var_type);
        let error = |message: String| {
            GraphQLError::new(message, ErrorKind::Coercion)
                .with_code(BAD_USER_INPUT)
                .with_locations([definition.position])
        };

        if !registry.is_input_type(&ty) {
            errors.push(error(format!(
                "Variable \"${}\" expected value of type \"{}\" which cannot be used as an input type.",
                name, ty
            )));
            continue;
        }

        match provided.and_then(|provided| provided.get(name)) {
            Some(Value::Null) if ty.is_non_null() => {
                errors.push(error(format!(
                    "Variable \"${}\" of non-null type \"{}\" must not be null.",
                    name, ty
                )));
            }
            Some(value) => match coerce_input_value(registry, &ty, value) {
                Ok(value) => {
                    variables.insert(
                        name.to_string(),
                        VariableValue {
                            value,
                            source: ValueSource::Explicit,
                            ty,
                        },
                    );
                }
                Err(coercion_error) => {
                    errors.push(error(format!(
                        "Variable \"${}\" got invalid value {}; {}",
                        name, value, coercion_error
                    )));
                }
            },
            None => match &definition.default_value {
                Some(default) => match coerce_literal(registry, &ty, default, None) {
                    Ok(value) => {
                        variables.insert(
                            name.to_string(),
                            VariableValue {
                                value,
                                source: ValueSource::VariableDefault,
                                ty,
                            },
                        );
                    }
                    Err(coercion_error) => {
                        errors.push(error(format!(
                            "Variable \"${}\" has an invalid default value; {}",
                            name, coercion_error
                        )));
                    }
                },
                None if ty.is_non_null() => {
                    errors.push(error(format!(
                        "Variable \"${}\" of required type \"{}\" was not provided.",
                        name, ty
                    )));
                }
                None => {}
            },
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    trace!(count = variables.len(), "coerced variables");
    Ok(Variables(variables))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{collect_variables, ValueSource, BAD_USER_INPUT};
    use crate::ast::parse_document;
    use crate::tests::testkit::{coercion_registry, first_operation};

    #[test]
    fn explicit_defaulted_and_absent_variables() {
        let registry = coercion_registry();
        let document =
            parse_document("query($a: Int, $b: Int = 2, $c: Int, $ids: [ID]) { a }").unwrap();
        let provided = json!({ "a": 1, "ids": 5 });

        let variables =
            collect_variables(&registry, first_operation(&document), provided.as_object())
                .unwrap();

        assert_eq!(variables.value("a"), Some(&json!(1)));
        assert_eq!(variables.get("b").map(|v| v.source), Some(ValueSource::VariableDefault));
        assert!(!variables.contains("c"));
        assert_eq!(variables.value("ids"), Some(&json!(["5"])));
    }

    #[test]
    fn reports_every_invalid_variable() {
        let registry = coercion_registry();
        let document =
            parse_document("query($a: Int!, $b: String!, $c: Int) { a }").unwrap();
        let provided = json!({ "b": null, "c": "nope" });

        let errors =
            collect_variables(&registry, first_operation(&document), provided.as_object())
                .unwrap_err();

        let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Variable \"$a\" of required type \"Int!\" was not provided.",
                "Variable \"$b\" of non-null type \"String!\" must not be null.",
                "Variable \"$c\" got invalid value \"nope\"; Expected type \"Int\". Int cannot represent non-integer value: \"nope\"",
            ]
        );
        assert!(errors.iter().all(|e| e.code() == Some(BAD_USER_INPUT)));
    }

    #[test]
    fn unknown_input_object_fields_are_rejected() {
        let registry = coercion_registry();
        let document = parse_document("query($n: NameInput) { a }").unwrap();
        let provided = json!({ "n": { "first": "Ada", "extra": 1 } });

        let errors =
            collect_variables(&registry, first_operation(&document), provided.as_object())
                .unwrap_err();

        assert!(errors[0].message.contains("Unknown field \"extra\""));
    }

    #[test]
    fn input_object_defaults_fill_absent_fields() {
        let registry = coercion_registry();
        let document = parse_document("query($n: NameInput) { a }").unwrap();
        let provided = json!({ "n": { "first": "Ada" } });

        let variables =
            collect_variables(&registry, first_operation(&document), provided.as_object())
                .unwrap();

        assert_eq!(
            variables.value("n"),
            Some(&json!({ "first": "Ada", "title": "Dr." }))
        );
    }
}
