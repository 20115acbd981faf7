use std::collections::HashMap;

use graphql_parser::Pos;

use super::ValidationRule;
use crate::ast::query::{OperationDefinition, VariableDefinition};
use crate::validation::utils::{ValidationError, ValidationErrorContext};
use crate::validation::visitor::{NodeKinds, OperationVisitor, OperationVisitorContext};

/// Unique variable names
///
/// A GraphQL operation is only valid if all its variables are uniquely named.
///
/// See https://spec.graphql.org/draft/#sec-Variable-Uniqueness
pub struct UniqueVariableNames;

impl UniqueVariableNames {
    pub fn new() -> Self {
        UniqueVariableNames
    }
}

impl Default for UniqueVariableNames {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct UniqueVariableNamesVisitor<'a> {
    known: HashMap<&'a str, Pos>,
}

impl<'a> OperationVisitor<'a> for UniqueVariableNamesVisitor<'a> {
    fn enter_operation_definition(
        &mut self,
        _: &OperationVisitorContext<'a>,
        _: &mut ValidationErrorContext,
        _: &'a OperationDefinition,
    ) {
        self.known.clear();
    }

    fn enter_variable_definition(
        &mut self,
        _: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        variable: &'a VariableDefinition,
    ) {
        match self.known.get(variable.name.as_str()) {
            Some(first) => errors.report_error(ValidationError {
                locations: vec![*first, variable.position],
                message: format!(
                    "There can be only one variable named \"${}\".",
                    variable.name
                ),
                error_code: "UNIQUE_VARIABLE_NAMES",
            }),
            None => {
                self.known.insert(&variable.name, variable.position);
            }
        }
    }
}

impl ValidationRule for UniqueVariableNames {
    fn error_code<'a>(&self) -> &'a str {
        "UNIQUE_VARIABLE_NAMES"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::OPERATION_DEFINITION | NodeKinds::VARIABLE_DEFINITION
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(UniqueVariableNamesVisitor::default())
    }
}

#[cfg(test)]
mod tests {
    use super::UniqueVariableNames;
    use crate::tests::testkit::validate_rule;

    #[test]
    fn same_names_in_different_operations() {
        let errors = validate_rule(
            UniqueVariableNames::new(),
            "query A($x: Int) { dog { name } } query B($x: Int) { dog { name } }",
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn duplicates_within_one_operation() {
        let errors = validate_rule(
            UniqueVariableNames::new(),
            "query A($x: Int, $x: Boolean, $y: Int) { dog { name } }",
        );
        assert_eq!(errors, vec!["There can be only one variable named \"$x\"."]);
    }
}
