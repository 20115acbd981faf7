use std::collections::HashMap;

use graphql_parser::Pos;

use super::ValidationRule;
use crate::ast::query::OperationDefinition;
use crate::ast::OperationDefinitionExt;
use crate::validation::utils::{ValidationError, ValidationErrorContext};
use crate::validation::visitor::{NodeKinds, OperationVisitor, OperationVisitorContext};

/// Unique operation names
///
/// A GraphQL document is only valid if all defined operations have unique names.
///
/// See https://spec.graphql.org/draft/#sec-Operation-Name-Uniqueness
pub struct UniqueOperationNames;

impl UniqueOperationNames {
    pub fn new() -> Self {
        UniqueOperationNames
    }
}

impl Default for UniqueOperationNames {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct UniqueOperationNamesVisitor<'a> {
    known: HashMap<&'a str, Pos>,
}

impl<'a> OperationVisitor<'a> for UniqueOperationNamesVisitor<'a> {
    fn enter_operation_definition(
        &mut self,
        _: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        operation: &'a OperationDefinition,
    ) {
        let Some(name) = operation.name() else {
            return;
        };

        match self.known.get(name) {
            Some(first) => errors.report_error(ValidationError {
                locations: vec![*first, operation.position()],
                message: format!("There can be only one operation named \"{}\".", name),
                error_code: "UNIQUE_OPERATION_NAMES",
            }),
            None => {
                self.known.insert(name, operation.position());
            }
        }
    }
}

impl ValidationRule for UniqueOperationNames {
    fn error_code<'a>(&self) -> &'a str {
        "UNIQUE_OPERATION_NAMES"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::OPERATION_DEFINITION
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(UniqueOperationNamesVisitor::default())
    }
}
