use lazy_static::lazy_static;
use serde_json::{Number, Value};

use crate::ast::query::Value as AstValue;
use crate::schema::types::{NamedType, ScalarType};

lazy_static! {
    pub static ref INT: NamedType = int_scalar().into();
    pub static ref FLOAT: NamedType = float_scalar().into();
    pub static ref STRING: NamedType = string_scalar().into();
    pub static ref BOOLEAN: NamedType = boolean_scalar().into();
    pub static ref ID: NamedType = id_scalar().into();
}

pub fn builtin_scalars() -> [&'static NamedType; 5] {
    [&*STRING, &*INT, &*FLOAT, &*BOOLEAN, &*ID]
}

pub fn is_builtin_scalar(name: &str) -> bool {
    matches!(name, "String" | "Int" | "Float" | "Boolean" | "ID")
}

fn describe(value: &Value) -> String {
    value.to_string()
}

fn int_from_f64(value: f64) -> Option<i64> {
    if value.fract() == 0.0 && value >= i32::MIN as f64 && value <= i32::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

fn int_from_number(number: &Number) -> Option<i64> {
    match number.as_i64() {
        Some(int) if int >= i32::MIN as i64 && int <= i32::MAX as i64 => Some(int),
        Some(_) => None,
        None => number.as_f64().and_then(int_from_f64),
    }
}

fn int_scalar() -> ScalarType {
    ScalarType::new("Int")
        .description("The `Int` scalar type represents non-fractional signed whole numeric values. Int can represent values between -(2^31) and 2^31 - 1.")
        .with_parse_value(|value| match value {
            Value::Number(number) => int_from_number(number)
                .map(Value::from)
                .ok_or_else(|| format!("Int cannot represent non 32-bit signed integer value: {}", number)),
            other => Err(format!("Int cannot represent non-integer value: {}", describe(other))),
        })
        .with_parse_literal(|literal| match literal {
            AstValue::Int(number) => number
                .as_i64()
                .filter(|int| *int >= i32::MIN as i64 && *int <= i32::MAX as i64)
                .map(Value::from)
                .ok_or_else(|| format!("Int cannot represent non 32-bit signed integer value: {}", literal)),
            other => Err(format!("Int cannot represent non-integer value: {}", other)),
        })
        .with_serialize(|value| match value {
            Value::Number(number) => int_from_number(number)
                .map(Value::from)
                .ok_or_else(|| format!("Int cannot represent non 32-bit signed integer value: {}", number)),
            Value::Bool(flag) => Ok(Value::from(*flag as i64)),
            Value::String(text) => text
                .trim()
                .parse::<i32>()
                .map(Value::from)
                .map_err(|_| format!("Int cannot represent non-integer value: {}", describe(value))),
            other => Err(format!("Int cannot represent non-integer value: {}", describe(other))),
        })
}

fn float_value(value: f64) -> Result<Value, String> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| format!("Float cannot represent non numeric value: {}", value))
}

fn float_scalar() -> ScalarType {
    ScalarType::new("Float")
        .description("The `Float` scalar type represents signed double-precision fractional values as specified by [IEEE 754](https://en.wikipedia.org/wiki/IEEE_floating_point).")
        .with_parse_value(|value| match value {
            Value::Number(number) => number
                .as_f64()
                .ok_or_else(|| format!("Float cannot represent non numeric value: {}", number))
                .and_then(float_value),
            other => Err(format!("Float cannot represent non numeric value: {}", describe(other))),
        })
        .with_parse_literal(|literal| match literal {
            AstValue::Int(number) => number
                .as_i64()
                .ok_or_else(|| format!("Float cannot represent non numeric value: {}", literal))
                .and_then(|int| float_value(int as f64)),
            AstValue::Float(float) => float_value(*float),
            other => Err(format!("Float cannot represent non numeric value: {}", other)),
        })
        .with_serialize(|value| match value {
            Value::Number(number) => number
                .as_f64()
                .ok_or_else(|| format!("Float cannot represent non numeric value: {}", number))
                .and_then(float_value),
            Value::Bool(flag) => float_value(if *flag { 1.0 } else { 0.0 }),
            Value::String(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("Float cannot represent non numeric value: {}", describe(value)))
                .and_then(float_value),
            other => Err(format!("Float cannot represent non numeric value: {}", describe(other))),
        })
}

fn string_scalar() -> ScalarType {
    ScalarType::new("String")
        .description("The `String` scalar type represents textual data, represented as UTF-8 character sequences.")
        .with_parse_value(|value| match value {
            Value::String(_) => Ok(value.clone()),
            other => Err(format!("String cannot represent a non string value: {}", describe(other))),
        })
        .with_parse_literal(|literal| match literal {
            AstValue::String(text) => Ok(Value::String(text.clone())),
            other => Err(format!("String cannot represent a non string value: {}", other)),
        })
        .with_serialize(|value| match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(number) => Ok(Value::String(number.to_string())),
            Value::Bool(flag) => Ok(Value::String(flag.to_string())),
            other => Err(format!("String cannot represent value: {}", describe(other))),
        })
}

fn boolean_scalar() -> ScalarType {
    ScalarType::new("Boolean")
        .description("The `Boolean` scalar type represents `true` or `false`.")
        .with_parse_value(|value| match value {
            Value::Bool(_) => Ok(value.clone()),
            other => Err(format!("Boolean cannot represent a non boolean value: {}", describe(other))),
        })
        .with_parse_literal(|literal| match literal {
            AstValue::Boolean(flag) => Ok(Value::Bool(*flag)),
            other => Err(format!("Boolean cannot represent a non boolean value: {}", other)),
        })
        .with_serialize(|value| match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::Number(number) => Ok(Value::Bool(number.as_f64().is_some_and(|n| n != 0.0))),
            other => Err(format!("Boolean cannot represent a non boolean value: {}", describe(other))),
        })
}

fn id_scalar() -> ScalarType {
    ScalarType::new("ID")
        .description("The `ID` scalar type represents a unique identifier, often used to refetch an object or as key for a cache. The ID type appears in a JSON response as a String; however, it is not intended to be human-readable. When expected as an input type, any string (such as `\"4\"`) or integer (such as `4`) input value will be accepted as an ID.")
        .with_parse_value(|value| match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(number) if number.is_i64() || number.is_u64() => {
                Ok(Value::String(number.to_string()))
            }
            other => Err(format!("ID cannot represent value: {}", describe(other))),
        })
        .with_parse_literal(|literal| match literal {
            AstValue::String(text) => Ok(Value::String(text.clone())),
            AstValue::Int(number) => number
                .as_i64()
                .map(|int| Value::String(int.to_string()))
                .ok_or_else(|| format!("ID cannot represent value: {}", literal)),
            other => Err(format!(
                "ID cannot represent a non-string and non-integer value: {}",
                other
            )),
        })
        .with_serialize(|value| match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(number) if number.is_i64() || number.is_u64() => {
                Ok(Value::String(number.to_string()))
            }
            other => Err(format!("ID cannot represent value: {}", describe(other))),
        })
}
