//! Coercion of literals and runtime values to the input types they are declared with.
//!
//! The same rules drive variable coercion, argument coercion during execution, and the
//! "dry-run" literal checks performed by validation (where variables are not known yet).

pub mod arguments;
pub mod value_from_ast;
pub mod variables;

use std::fmt;

use serde_json::{Map, Value};

use crate::ast::query::Value as AstValue;
use crate::coercion::variables::Variables;
use crate::response::graphql_error::GraphQLErrorPathSegment;
use crate::schema::registry::TypeRegistry;
use crate::schema::types::{NamedType, TypeRef};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub struct CoercionError {
    pub message: String,
    /// Location of the offending value inside the input, e.g. `["filter", "tags", 2]`.
    pub path: Vec<GraphQLErrorPathSegment>,
}

impl CoercionError {
    fn new(message: impl Into<String>, path: &[GraphQLErrorPathSegment]) -> Self {
        CoercionError {
            message: message.into(),
            path: path.to_vec(),
        }
    }
}

impl fmt::Display for CoercionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return f.write_str(&self.message);
        }
        let path: Vec<String> = self.path.iter().map(ToString::to_string).collect();
        write!(f, "{} (at \"{}\")", self.message, path.join("."))
    }
}

/// Coerces a runtime (JSON) value, such as a variable, to `ty`.
pub fn coerce_input_value(
    registry: &TypeRegistry,
    ty: &TypeRef,
    value: &Value,
) -> Result<Value, CoercionError> {
    let mut path = Vec::new();
    coerce_value_at(registry, ty, value, &mut path)
}

fn coerce_value_at(
    registry: &TypeRegistry,
    ty: &TypeRef,
    value: &Value,
    path: &mut Vec<GraphQLErrorPathSegment>,
) -> Result<Value, CoercionError> {
    if let TypeRef::NonNull(inner) = ty {
        if value.is_null() {
            return Err(CoercionError::new(
                format!("Expected non-nullable type \"{}\" not to be null.", ty),
                path,
            ));
        }
        return coerce_value_at(registry, inner, value, path);
    }

    if value.is_null() {
        return Ok(Value::Null);
    }

    if let TypeRef::List(item_type) = ty {
        return match value {
            Value::Array(items) => {
                let mut coerced = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    path.push(GraphQLErrorPathSegment::Index(index));
                    let item = coerce_value_at(registry, item_type, item, path);
                    path.pop();
                    coerced.push(item?);
                }
                Ok(Value::Array(coerced))
            }
            single => Ok(Value::Array(vec![coerce_value_at(
                registry, item_type, single, path,
            )?])),
        };
    }

    match named_input_type(registry, ty, path)? {
        NamedType::Scalar(scalar) => scalar.parse_value(value).map_err(|reason| {
            CoercionError::new(
                format!("Expected type \"{}\". {}", scalar.name, reason),
                path,
            )
        }),
        NamedType::Enum(enum_type) => value
            .as_str()
            .and_then(|name| enum_type.parse_name(name))
            .cloned()
            .ok_or_else(|| {
                CoercionError::new(
                    format!(
                        "Value {} does not exist in \"{}\" enum.",
                        value, enum_type.name
                    ),
                    path,
                )
            }),
        NamedType::InputObject(input) => {
            let Value::Object(fields) = value else {
                return Err(CoercionError::new(
                    format!("Expected type \"{}\" to be an object.", input.name),
                    path,
                ));
            };

            if let Some(unknown) = fields.keys().find(|name| !input.fields.contains_key(*name)) {
                return Err(CoercionError::new(
                    format!(
                        "Unknown field \"{}\" is not defined by type \"{}\".",
                        unknown, input.name
                    ),
                    path,
                ));
            }

            let mut coerced = Map::new();
            for (name, definition) in &input.fields {
                match fields.get(name) {
                    Some(field_value) => {
                        path.push(GraphQLErrorPathSegment::String(name.clone()));
                        let field_value =
                            coerce_value_at(registry, &definition.ty, field_value, path);
                        path.pop();
                        coerced.insert(name.clone(), field_value?);
                    }
                    None => absent_input_field(definition, &input.name, path, &mut coerced)?,
                }
            }
            Ok(Value::Object(coerced))
        }
        _ => unreachable_input(ty, path),
    }
}

/// Coerces a literal to `ty`.
///
/// With `variables` set to `None` this is a dry run: variable references are accepted as they
/// are and read as `null`, which is how validation checks literals before variables are known.
pub fn coerce_literal(
    registry: &TypeRegistry,
    ty: &TypeRef,
    literal: &AstValue,
    variables: Option<&Variables>,
) -> Result<Value, CoercionError> {
    let mut path = Vec::new();
    coerce_literal_at(registry, ty, literal, variables, &mut path)
}

fn coerce_literal_at(
    registry: &TypeRegistry,
    ty: &TypeRef,
    literal: &AstValue,
    variables: Option<&Variables>,
    path: &mut Vec<GraphQLErrorPathSegment>,
) -> Result<Value, CoercionError> {
    if let AstValue::Variable(name) = literal {
        let Some(variables) = variables else {
            return Ok(Value::Null);
        };
        let value = match variables.get(name) {
            Some(variable) => promote_variable(variable.value.clone(), &variable.ty, ty),
            None => Value::Null,
        };
        if value.is_null() && ty.is_non_null() {
            return Err(CoercionError::new(
                format!(
                    "Expected non-nullable type \"{}\" not to be null, but variable \"${}\" is.",
                    ty, name
                ),
                path,
            ));
        }
        return Ok(value);
    }

    if let TypeRef::NonNull(inner) = ty {
        if matches!(literal, AstValue::Null) {
            return Err(CoercionError::new(
                format!("Expected value of type \"{}\", found null.", ty),
                path,
            ));
        }
        return coerce_literal_at(registry, inner, literal, variables, path);
    }

    if matches!(literal, AstValue::Null) {
        return Ok(Value::Null);
    }

    if let TypeRef::List(item_type) = ty {
        return match literal {
            AstValue::List(items) => {
                let mut coerced = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    path.push(GraphQLErrorPathSegment::Index(index));
                    let item = coerce_literal_at(registry, item_type, item, variables, path);
                    path.pop();
                    coerced.push(item?);
                }
                Ok(Value::Array(coerced))
            }
            single => Ok(Value::Array(vec![coerce_literal_at(
                registry, item_type, single, variables, path,
            )?])),
        };
    }

    match named_input_type(registry, ty, path)? {
        NamedType::Scalar(scalar) => scalar.parse_literal(literal).map_err(|reason| {
            CoercionError::new(
                format!(
                    "Expected value of type \"{}\", found {}; {}",
                    scalar.name, literal, reason
                ),
                path,
            )
        }),
        NamedType::Enum(enum_type) => match literal {
            AstValue::Enum(name) => enum_type.parse_name(name).cloned().ok_or_else(|| {
                CoercionError::new(
                    format!(
                        "Value \"{}\" does not exist in \"{}\" enum.",
                        name, enum_type.name
                    ),
                    path,
                )
            }),
            other => Err(CoercionError::new(
                format!(
                    "Enum \"{}\" cannot represent non-enum value: {}.",
                    enum_type.name, other
                ),
                path,
            )),
        },
        NamedType::InputObject(input) => {
            let AstValue::Object(fields) = literal else {
                return Err(CoercionError::new(
                    format!(
                        "Expected value of type \"{}\", found {}.",
                        input.name, literal
                    ),
                    path,
                ));
            };

            if let Some(unknown) = fields.keys().find(|name| !input.fields.contains_key(*name)) {
                return Err(CoercionError::new(
                    format!(
                        "Unknown field \"{}\" is not defined by type \"{}\".",
                        unknown, input.name
                    ),
                    path,
                ));
            }

            let mut coerced = Map::new();
            for (name, definition) in &input.fields {
                let provided = fields
                    .get(name)
                    .filter(|field| !is_absent_variable(field, variables));
                match provided {
                    Some(field_literal) => {
                        path.push(GraphQLErrorPathSegment::String(name.clone()));
                        let field_value = coerce_literal_at(
                            registry,
                            &definition.ty,
                            field_literal,
                            variables,
                            path,
                        );
                        path.pop();
                        coerced.insert(name.clone(), field_value?);
                    }
                    None => absent_input_field(definition, &input.name, path, &mut coerced)?,
                }
            }
            Ok(Value::Object(coerced))
        }
        _ => unreachable_input(ty, path),
    }
}

/// A variable reference whose variable was not provided (and has no default) counts as absent.
/// In a dry run nothing is absent.
pub(crate) fn is_absent_variable(literal: &AstValue, variables: Option<&Variables>) -> bool {
    match (literal, variables) {
        (AstValue::Variable(name), Some(variables)) => variables.get(name).is_none(),
        _ => false,
    }
}

fn absent_input_field(
    definition: &crate::schema::types::InputValueDefinition,
    type_name: &str,
    path: &[GraphQLErrorPathSegment],
    coerced: &mut Map<String, Value>,
) -> Result<(), CoercionError> {
    if let Some(default) = &definition.default_value {
        coerced.insert(definition.name.clone(), default.clone());
    } else if definition.ty.is_non_null() {
        return Err(CoercionError::new(
            format!(
                "Field \"{}.{}\" of required type \"{}\" was not provided.",
                type_name, definition.name, definition.ty
            ),
            path,
        ));
    }
    Ok(())
}

fn named_input_type<'r>(
    registry: &'r TypeRegistry,
    ty: &TypeRef,
    path: &[GraphQLErrorPathSegment],
) -> Result<&'r NamedType, CoercionError> {
    match registry.resolve(ty) {
        Some(named) if named.is_input() => Ok(named),
        Some(named) => Err(CoercionError::new(
            format!("Type \"{}\" is not an input type.", named.name()),
            path,
        )),
        None => Err(CoercionError::new(
            format!("Unknown type \"{}\".", ty.type_name()),
            path,
        )),
    }
}

fn unreachable_input(ty: &TypeRef, path: &[GraphQLErrorPathSegment]) -> Result<Value, CoercionError> {
    Err(CoercionError::new(
        format!("Type \"{}\" is not an input type.", ty.type_name()),
        path,
    ))
}

/// Wraps an already-coerced variable value in as many lists as the location needs beyond the
/// variable's own type. Each extra list level wraps once.
pub(crate) fn promote_variable(value: Value, variable_type: &TypeRef, location: &TypeRef) -> Value {
    if value.is_null() {
        return value;
    }

    match (location.nullable(), variable_type.nullable()) {
        (TypeRef::List(location_item), TypeRef::List(variable_item)) => match value {
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| promote_variable(item, variable_item, location_item))
                    .collect(),
            ),
            other => other,
        },
        (TypeRef::List(location_item), _) => {
            Value::Array(vec![promote_variable(value, variable_type, location_item)])
        }
        _ => value,
    }
}
