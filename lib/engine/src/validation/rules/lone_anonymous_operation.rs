use super::ValidationRule;
use crate::ast::query::{Definition, Document, OperationDefinition};
use crate::ast::OperationDefinitionExt;
use crate::validation::utils::{ValidationError, ValidationErrorContext};
use crate::validation::visitor::{NodeKinds, OperationVisitor, OperationVisitorContext};

/// Lone anonymous operation
///
/// A GraphQL document is only valid if when it contains an anonymous operation
/// (the query short-hand) that it contains only that one operation definition.
///
/// See https://spec.graphql.org/draft/#sec-Lone-Anonymous-Operation
pub struct LoneAnonymousOperation;

impl LoneAnonymousOperation {
    pub fn new() -> Self {
        LoneAnonymousOperation
    }
}

impl Default for LoneAnonymousOperation {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct LoneAnonymousOperationVisitor {
    operation_count: usize,
}

impl<'a> OperationVisitor<'a> for LoneAnonymousOperationVisitor {
    fn enter_document(
        &mut self,
        _: &OperationVisitorContext<'a>,
        _: &mut ValidationErrorContext,
        document: &'a Document,
    ) {
        self.operation_count = document
            .definitions
            .iter()
            .filter(|definition| matches!(definition, Definition::Operation(_)))
            .count();
    }

    fn enter_operation_definition(
        &mut self,
        _: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        operation: &'a OperationDefinition,
    ) {
        if operation.name().is_none() && self.operation_count > 1 {
            errors.report_error(ValidationError {
                locations: vec![operation.position()],
                message: "This anonymous operation must be the only defined operation.".to_string(),
                error_code: "LONE_ANONYMOUS_OPERATION",
            });
        }
    }
}

impl ValidationRule for LoneAnonymousOperation {
    fn error_code<'a>(&self) -> &'a str {
        "LONE_ANONYMOUS_OPERATION"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::DOCUMENT | NodeKinds::OPERATION_DEFINITION
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(LoneAnonymousOperationVisitor::default())
    }
}

#[cfg(test)]
mod tests {
    use super::LoneAnonymousOperation;
    use crate::tests::testkit::validate_rule;

    #[test]
    fn one_anonymous_operation() {
        let errors = validate_rule(
            LoneAnonymousOperation::new(),
            "{ dog { name } } fragment F on Dog { name }",
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn anonymous_with_named_operation() {
        let errors = validate_rule(
            LoneAnonymousOperation::new(),
            "{ dog { name } } query Named { dog { name } }",
        );
        assert_eq!(
            errors,
            vec!["This anonymous operation must be the only defined operation."]
        );
    }
}
