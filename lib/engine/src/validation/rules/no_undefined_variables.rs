use std::collections::HashSet;

use graphql_parser::Pos;

use super::ValidationRule;
use crate::ast::query::{Document, FragmentDefinition, FragmentSpread, OperationDefinition, Value};
use crate::ast::OperationDefinitionExt;
use crate::validation::utils::{ScopedUsages, ValidationError, ValidationErrorContext};
use crate::validation::visitor::{NodeKinds, OperationVisitor, OperationVisitorContext};

/// No undefined variables
///
/// A GraphQL operation is only valid if all variables encountered, both directly
/// and via fragment spreads, are defined by that operation.
///
/// See https://spec.graphql.org/draft/#sec-All-Variable-Uses-Defined
pub struct NoUndefinedVariables;

impl NoUndefinedVariables {
    pub fn new() -> Self {
        NoUndefinedVariables
    }
}

impl Default for NoUndefinedVariables {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct NoUndefinedVariablesVisitor<'a> {
    usages: ScopedUsages<'a, (&'a str, Pos)>,
}

impl<'a> OperationVisitor<'a> for NoUndefinedVariablesVisitor<'a> {
    fn enter_operation_definition(
        &mut self,
        _: &OperationVisitorContext<'a>,
        _: &mut ValidationErrorContext,
        operation: &'a OperationDefinition,
    ) {
        self.usages.enter_operation(operation);
    }

    fn leave_operation_definition(
        &mut self,
        _: &OperationVisitorContext<'a>,
        _: &mut ValidationErrorContext,
        _: &'a OperationDefinition,
    ) {
        self.usages.leave_definition();
    }

    fn enter_fragment_definition(
        &mut self,
        _: &OperationVisitorContext<'a>,
        _: &mut ValidationErrorContext,
        fragment: &'a FragmentDefinition,
    ) {
        self.usages.enter_fragment(&fragment.name);
    }

    fn leave_fragment_definition(
        &mut self,
        _: &OperationVisitorContext<'a>,
        _: &mut ValidationErrorContext,
        _: &'a FragmentDefinition,
    ) {
        self.usages.leave_definition();
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
        ctx: &OperationVisitorContext<'a>,
        _: &mut ValidationErrorContext,
        value: &'a Value,
    ) {
        if let Value::Variable(name) = value {
            self.usages.record((name.as_str(), ctx.current_position()));
        }
    }

    fn leave_document(
        &mut self,
        _: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        _: &'a Document,
    ) {
        for (operation, usages) in self.usages.operations() {
            let defined: HashSet<&str> = operation
                .variable_definitions()
                .iter()
                .map(|variable| variable.name.as_str())
                .collect();

            for (name, position) in usages {
                if defined.contains(name) {
                    continue;
                }

                let message = match operation.name() {
                    Some(operation_name) => format!(
                        "Variable \"${}\" is not defined by operation \"{}\".",
                        name, operation_name
                    ),
                    None => format!("Variable \"${}\" is not defined.", name),
                };

                errors.report_error(ValidationError {
                    locations: vec![*position, operation.position()],
                    message,
                    error_code: "NO_UNDEFINED_VARIABLES",
                });
            }
        }
    }
}

impl ValidationRule for NoUndefinedVariables {
    fn error_code<'a>(&self) -> &'a str {
        "NO_UNDEFINED_VARIABLES"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::DOCUMENT
            | NodeKinds::OPERATION_DEFINITION
            | NodeKinds::FRAGMENT_DEFINITION
            | NodeKinds::FRAGMENT_SPREAD
            | NodeKinds::VALUE
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(NoUndefinedVariablesVisitor::default())
    }
}

#[cfg(test)]
mod tests {
    use super::NoUndefinedVariables;
    use crate::tests::testkit::validate_rule;

    #[test]
    fn variables_defined_by_every_operation_using_a_fragment() {
        let errors = validate_rule(
            NoUndefinedVariables::new(),
            "query A($id: ID, $s: Boolean) { human(id: $id) { ...H } }
             query B($id: ID, $s: Boolean) { human(id: $id) { ...H } }
             fragment H on Human { name(surname: $s) }",
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn variable_missing_in_one_operation() {
        let errors = validate_rule(
            NoUndefinedVariables::new(),
            "query A($s: Boolean) { human(id: $id) { ...H } }
             query B { human { ...H } }
             fragment H on Human { name(surname: $s) }",
        );
        assert_eq!(
            errors,
            vec![
                "Variable \"$id\" is not defined by operation \"A\".",
                "Variable \"$s\" is not defined by operation \"B\".",
            ]
        );
    }

    #[test]
    fn nested_in_list_and_object_literals() {
        let errors = validate_rule(
            NoUndefinedVariables::new(),
            "{ complicatedArgs { complexArgField(complexArg: { requiredField: true, stringListField: [$s] }) } }",
        );
        assert_eq!(errors, vec!["Variable \"$s\" is not defined."]);
    }
}
