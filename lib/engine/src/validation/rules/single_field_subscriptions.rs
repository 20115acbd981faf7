use std::collections::HashSet;

use graphql_parser::Pos;
use indexmap::IndexMap;

use super::ValidationRule;
use crate::ast::query::{OperationDefinition, Selection, SelectionSet};
use crate::ast::{FieldExt, OperationDefinitionExt, OperationKind};
use crate::validation::utils::{ValidationError, ValidationErrorContext};
use crate::validation::visitor::{NodeKinds, OperationVisitor, OperationVisitorContext};

/// Subscriptions with single root field
///
/// A GraphQL subscription is valid only if it contains a single root field,
/// and that field is not an introspection field.
///
/// See https://spec.graphql.org/draft/#sec-Single-root-field
pub struct SingleFieldSubscriptions;

impl SingleFieldSubscriptions {
    pub fn new() -> Self {
        SingleFieldSubscriptions
    }
}

impl Default for SingleFieldSubscriptions {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_root_fields<'a>(
    ctx: &OperationVisitorContext<'a>,
    selection_set: &'a SelectionSet,
    visited_fragments: &mut HashSet<&'a str>,
    fields: &mut IndexMap<&'a str, Vec<Pos>>,
) {
    for selection in &selection_set.items {
        match selection {
            Selection::Field(field) => {
                fields
                    .entry(field.response_name())
                    .or_default()
                    .push(field.position);
            }
            Selection::InlineFragment(fragment) => {
                collect_root_fields(ctx, &fragment.selection_set, visited_fragments, fields);
            }
            Selection::FragmentSpread(spread) => {
                if !visited_fragments.insert(spread.fragment_name.as_str()) {
                    continue;
                }
                if let Some(fragment) = ctx.known_fragments.get(spread.fragment_name.as_str()) {
                    collect_root_fields(ctx, &fragment.selection_set, visited_fragments, fields);
                }
            }
        }
    }
}

impl<'a> OperationVisitor<'a> for SingleFieldSubscriptions {
    fn enter_operation_definition(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        operation: &'a OperationDefinition,
    ) {
        if operation.kind() != OperationKind::Subscription {
            return;
        }

        let mut fields = IndexMap::new();
        collect_root_fields(
            ctx,
            operation.selection_set(),
            &mut HashSet::new(),
            &mut fields,
        );

        let subject = match operation.name() {
            Some(name) => format!("Subscription \"{}\"", name),
            None => "Anonymous Subscription".to_string(),
        };

        if fields.len() > 1 {
            errors.report_error(ValidationError {
                locations: fields.values().skip(1).flatten().copied().collect(),
                message: format!("{} must select only one top level field.", subject),
                error_code: "SINGLE_FIELD_SUBSCRIPTIONS",
            });
        }

        for (name, locations) in &fields {
            if name.starts_with("__") {
                errors.report_error(ValidationError {
                    locations: locations.clone(),
                    message: format!(
                        "{} must not select an introspection top level field.",
                        subject
                    ),
                    error_code: "SINGLE_FIELD_SUBSCRIPTIONS",
                });
            }
        }
    }
}

impl ValidationRule for SingleFieldSubscriptions {
    fn error_code<'a>(&self) -> &'a str {
        "SINGLE_FIELD_SUBSCRIPTIONS"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::OPERATION_DEFINITION
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(SingleFieldSubscriptions)
    }
}
