//! Owned (`'static`) aliases over the `graphql-parser` query AST, and helpers
//! shared by validation and execution.

mod ext;

pub use ext::{FieldExt, OperationDefinitionExt, SelectionExt};

pub mod query {
    use graphql_parser::query;

    pub type Document = query::Document<'static, String>;
    pub type Definition = query::Definition<'static, String>;
    pub type OperationDefinition = query::OperationDefinition<'static, String>;
    pub type FragmentDefinition = query::FragmentDefinition<'static, String>;
    pub type VariableDefinition = query::VariableDefinition<'static, String>;
    pub type SelectionSet = query::SelectionSet<'static, String>;
    pub type Selection = query::Selection<'static, String>;
    pub type Field = query::Field<'static, String>;
    pub type FragmentSpread = query::FragmentSpread<'static, String>;
    pub type InlineFragment = query::InlineFragment<'static, String>;
    pub type TypeCondition = query::TypeCondition<'static, String>;
    pub type Directive = query::Directive<'static, String>;
    pub type Value = query::Value<'static, String>;
    pub type Type = query::Type<'static, String>;
}

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses an executable document into its owned form.
pub fn parse_document(source: &str) -> Result<query::Document, graphql_parser::query::ParseError> {
    graphql_parser::parse_query::<String>(source).map(|document| document.into_static())
}
