use std::fmt;

use graphql_parser::Pos;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<GraphQLErrorLocation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<GraphQLErrorPathSegment>>,
    #[serde(default, skip_serializing_if = "GraphQLErrorExtensions::is_empty")]
    pub extensions: GraphQLErrorExtensions,
    #[serde(skip, default)]
    pub kind: ErrorKind,
}

/// What produced an error. Never serialized, used by callers and listeners to classify errors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ErrorKind {
    /// A validation rule rejected the document. Carries the rule's error code.
    Validation(&'static str),
    /// A literal or variable value could not be coerced to its declared type.
    Coercion,
    /// A resolver failed, or its value could not be completed.
    Resolver,
    /// The request was cancelled or timed out.
    Cancellation,
    /// Anything else, for example a panic inside a resolver.
    #[default]
    Unhandled,
}

impl GraphQLError {
    pub fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        GraphQLError {
            message: message.into(),
            locations: None,
            path: None,
            extensions: GraphQLErrorExtensions::default(),
            kind,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.extensions.code = Some(code.into());
        self
    }

    pub fn with_locations(mut self, locations: impl IntoIterator<Item = Pos>) -> Self {
        let locations: Vec<GraphQLErrorLocation> =
            locations.into_iter().map(GraphQLErrorLocation::from).collect();
        self.locations = if locations.is_empty() {
            None
        } else {
            Some(locations)
        };
        self
    }

    pub fn with_path(mut self, path: Vec<GraphQLErrorPathSegment>) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions.extensions.insert(key.into(), value);
        self
    }

    pub fn code(&self) -> Option<&str> {
        self.extensions.code.as_deref()
    }
}

impl From<String> for GraphQLError {
    fn from(message: String) -> Self {
        GraphQLError::new(message, ErrorKind::Unhandled)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct GraphQLErrorExtensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl GraphQLErrorExtensions {
    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.extensions.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct GraphQLErrorLocation {
    pub line: usize,
    pub column: usize,
}

impl From<Pos> for GraphQLErrorLocation {
    fn from(pos: Pos) -> Self {
        GraphQLErrorLocation {
            line: pos.line,
            column: pos.column,
        }
    }
}

/// A response key or a list index. Serialized bare, so a path reads `["users", 0, "name"]`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum GraphQLErrorPathSegment {
    String(String),
    Index(usize),
}

impl fmt::Display for GraphQLErrorPathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphQLErrorPathSegment::String(name) => f.write_str(name),
            GraphQLErrorPathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for GraphQLErrorPathSegment {
    fn from(value: &str) -> Self {
        GraphQLErrorPathSegment::String(value.to_string())
    }
}

impl From<usize> for GraphQLErrorPathSegment {
    fn from(value: usize) -> Self {
        GraphQLErrorPathSegment::Index(value)
    }
}

#[cfg(test)]
mod tests {
    use graphql_parser::Pos;
    use serde_json::json;

    use super::{ErrorKind, GraphQLError, GraphQLErrorPathSegment};

    #[test]
    fn serializes_path_segments_untagged() {
        let error = GraphQLError::new("boom", ErrorKind::Resolver)
            .with_locations([Pos { line: 2, column: 5 }])
            .with_path(vec!["users".into(), 0.into(), "name".into()])
            .with_code("INTERNAL");

        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({
                "message": "boom",
                "locations": [{ "line": 2, "column": 5 }],
                "path": ["users", 0, "name"],
                "extensions": { "code": "INTERNAL" }
            })
        );
    }

    #[test]
    fn omits_empty_extensions() {
        let error = GraphQLError::new("boom", ErrorKind::Resolver);
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({ "message": "boom" })
        );
    }

    #[test]
    fn rejects_negative_indexes() {
        let parsed = serde_json::from_value::<GraphQLError>(json!({ "message": "x", "path": [-1] }));
        assert!(parsed.is_err());
    }

    #[test]
    fn deserializes_mixed_path() {
        let error: GraphQLError =
            serde_json::from_value(json!({ "message": "x", "path": ["a", 1] })).unwrap();
        assert_eq!(
            error.path,
            Some(vec![
                GraphQLErrorPathSegment::String("a".to_string()),
                GraphQLErrorPathSegment::Index(1)
            ])
        );
    }
}
