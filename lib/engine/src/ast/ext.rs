use graphql_parser::query::{OperationDefinition as ParserOperation, Selection as ParserSelection};
use graphql_parser::Pos;

use super::query::{Directive, Field, OperationDefinition, Selection, SelectionSet, VariableDefinition};
use super::OperationKind;

pub trait OperationDefinitionExt {
    fn kind(&self) -> OperationKind;
    fn name(&self) -> Option<&str>;
    fn position(&self) -> Pos;
    fn selection_set(&self) -> &SelectionSet;
    fn variable_definitions(&self) -> &[VariableDefinition];
    fn directives(&self) -> &[Directive];
}

impl OperationDefinitionExt for OperationDefinition {
    fn kind(&self) -> OperationKind {
        match self {
            ParserOperation::SelectionSet(_) | ParserOperation::Query(_) => OperationKind::Query,
            ParserOperation::Mutation(_) => OperationKind::Mutation,
            ParserOperation::Subscription(_) => OperationKind::Subscription,
        }
    }

    fn name(&self) -> Option<&str> {
        match self {
            ParserOperation::SelectionSet(_) => None,
            ParserOperation::Query(query) => query.name.as_deref(),
            ParserOperation::Mutation(mutation) => mutation.name.as_deref(),
            ParserOperation::Subscription(subscription) => subscription.name.as_deref(),
        }
    }

    fn position(&self) -> Pos {
        match self {
            ParserOperation::SelectionSet(selection_set) => selection_set.span.0,
            ParserOperation::Query(query) => query.position,
            ParserOperation::Mutation(mutation) => mutation.position,
            ParserOperation::Subscription(subscription) => subscription.position,
        }
    }

    fn selection_set(&self) -> &SelectionSet {
        match self {
            ParserOperation::SelectionSet(selection_set) => selection_set,
            ParserOperation::Query(query) => &query.selection_set,
            ParserOperation::Mutation(mutation) => &mutation.selection_set,
            ParserOperation::Subscription(subscription) => &subscription.selection_set,
        }
    }

    fn variable_definitions(&self) -> &[VariableDefinition] {
        match self {
            ParserOperation::SelectionSet(_) => &[],
            ParserOperation::Query(query) => &query.variable_definitions,
            ParserOperation::Mutation(mutation) => &mutation.variable_definitions,
            ParserOperation::Subscription(subscription) => &subscription.variable_definitions,
        }
    }

    fn directives(&self) -> &[Directive] {
        match self {
            ParserOperation::SelectionSet(_) => &[],
            ParserOperation::Query(query) => &query.directives,
            ParserOperation::Mutation(mutation) => &mutation.directives,
            ParserOperation::Subscription(subscription) => &subscription.directives,
        }
    }
}

pub trait FieldExt {
    /// The key under which the field appears in the response: its alias, or its name.
    fn response_name(&self) -> &str;
}

impl FieldExt for Field {
    fn response_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

pub trait SelectionExt {
    fn position(&self) -> Pos;
    fn directives(&self) -> &[Directive];
}

impl SelectionExt for Selection {
    fn position(&self) -> Pos {
        match self {
            ParserSelection::Field(field) => field.position,
            ParserSelection::FragmentSpread(spread) => spread.position,
            ParserSelection::InlineFragment(fragment) => fragment.position,
        }
    }

    fn directives(&self) -> &[Directive] {
        match self {
            ParserSelection::Field(field) => &field.directives,
            ParserSelection::FragmentSpread(spread) => &spread.directives,
            ParserSelection::InlineFragment(fragment) => &fragment.directives,
        }
    }
}
