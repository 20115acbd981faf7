use std::collections::HashSet;

use super::ValidationRule;
use crate::ast::query::{Document, FragmentDefinition, FragmentSpread, OperationDefinition, Value};
use crate::ast::OperationDefinitionExt;
use crate::validation::utils::{ScopedUsages, ValidationError, ValidationErrorContext};
use crate::validation::visitor::{NodeKinds, OperationVisitor, OperationVisitorContext};

/// No unused variables
///
/// A GraphQL operation is only valid if all variables defined by an operation
/// are used, either directly or within a spread fragment.
///
/// See https://spec.graphql.org/draft/#sec-All-Variables-Used
pub struct NoUnusedVariables;

impl NoUnusedVariables {
    pub fn new() -> Self {
        NoUnusedVariables
    }
}

impl Default for NoUnusedVariables {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct NoUnusedVariablesVisitor<'a> {
    usages: ScopedUsages<'a, &'a str>,
}

impl<'a> OperationVisitor<'a> for NoUnusedVariablesVisitor<'a> {
    fn enter_operation_definition(
        &mut self,
        _: &OperationVisitorContext<'a>,
        _: &mut ValidationErrorContext,
        operation: &'a OperationDefinition,
    ) {
        self.usages.enter_operation(operation);
    }

    fn enter_fragment_definition(
        &mut self,
        _: &OperationVisitorContext<'a>,
        _: &mut ValidationErrorContext,
        fragment: &'a FragmentDefinition,
    ) {
        self.usages.enter_fragment(&fragment.name);
    }

    fn enter_fragment_spread(
        &mut self,
        _: &OperationVisitorContext<'a>,
        _: &mut ValidationErrorContext,
        spread: &'a FragmentSpread,
    ) {
        self.usages.record_spread(&spread.fragment_name);
    }

    fn enter_value(
        &mut self,
        _: &OperationVisitorContext<'a>,
        _: &mut ValidationErrorContext,
        value: &'a Value,
    ) {
        if let Value::Variable(name) = value {
            self.usages.record(name.as_str());
        }
    }

    fn leave_document(
        &mut self,
        _: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        _: &'a Document,
    ) {
        for (operation, usages) in self.usages.operations() {
            let used: HashSet<&str> = usages.into_iter().copied().collect();

            for variable in operation.variable_definitions() {
                if used.contains(variable.name.as_str()) {
                    continue;
                }

                let message = match operation.name() {
                    Some(operation_name) => format!(
                        "Variable \"${}\" is never used in operation \"{}\".",
                        variable.name, operation_name
                    ),
                    None => format!("Variable \"${}\" is never used.", variable.name),
                };

                errors.report_error(ValidationError {
                    locations: vec![variable.position],
                    message,
                    error_code: "NO_UNUSED_VARIABLES",
                });
            }
        }
    }
}

impl ValidationRule for NoUnusedVariables {
    fn error_code<'a>(&self) -> &'a str {
        "NO_UNUSED_VARIABLES"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::DOCUMENT
            | NodeKinds::OPERATION_DEFINITION
            | NodeKinds::FRAGMENT_DEFINITION
            | NodeKinds::FRAGMENT_SPREAD
            | NodeKinds::VALUE
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(NoUnusedVariablesVisitor::default())
    }
}

#[cfg(test)]
mod tests {
    use super::NoUnusedVariables;
    use crate::tests::testkit::validate_rule;

    #[test]
    fn used_through_nested_fragments_and_directives() {
        let errors = validate_rule(
            NoUnusedVariables::new(),
            "query Q($a: Boolean, $b: Boolean) { human { ...H @include(if: $b) } }
             fragment H on Human { relatives { ...R } }
             fragment R on Human { name(surname: $a) }",
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn unused_in_one_of_two_operations() {
        let errors = validate_rule(
            NoUnusedVariables::new(),
            "query A($a: Boolean) { human { ...H } }
             query B($a: Boolean, $c: Int) { human { name } }
             fragment H on Human { name(surname: $a) }",
        );
        assert_eq!(
            errors,
            vec![
                "Variable \"$a\" is never used in operation \"B\".",
                "Variable \"$c\" is never used in operation \"B\".",
            ]
        );
    }
}
