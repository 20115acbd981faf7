use serde_json::{Map, Number, Value};

use crate::ast::query::Value as AstValue;
use crate::coercion::variables::Variables;

/// Converts a literal into JSON without any type information. Variables are substituted when
/// provided, and read as `null` otherwise.
pub fn value_from_ast(value: &AstValue, variables: Option<&Variables>) -> Result<Value, String> {
    match value {
        AstValue::Null => Ok(Value::Null),
        AstValue::Boolean(b) => Ok(Value::Bool(*b)),
        AstValue::String(s) => Ok(Value::String(s.clone())),
        AstValue::Enum(e) => Ok(Value::String(e.clone())),
        AstValue::Int(n) => {
            let n = n
                .as_i64()
                .ok_or_else(|| format!("Integer literal {} is out of range", value))?;
            Ok(Value::from(n))
        }
        AstValue::Float(n) => Number::from_f64(*n)
            .map(Value::Number)
            .ok_or_else(|| format!("Float literal {} is not a finite number", n)),
        AstValue::List(items) => items
            .iter()
            .map(|item| value_from_ast(item, variables))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        AstValue::Object(fields) => fields
            .iter()
            .map(|(name, field)| value_from_ast(field, variables).map(|value| (name.clone(), value)))
            .collect::<Result<Map<_, _>, _>>()
            .map(Value::Object),
        AstValue::Variable(name) => Ok(variables
            .and_then(|variables| variables.value(name))
            .cloned()
            .unwrap_or(Value::Null)),
    }
}
