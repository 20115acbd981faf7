use super::ValidationRule;
use crate::ast::query::Field;
use crate::validation::utils::{ValidationError, ValidationErrorContext};
use crate::validation::visitor::{NodeKinds, OperationVisitor, OperationVisitorContext};

/// Fields on correct type
///
/// A GraphQL document is only valid if all fields selected are defined by the
/// parent type, or are an allowed meta field such as __typename.
///
/// See https://spec.graphql.org/draft/#sec-Field-Selections
pub struct FieldsOnCorrectType;

impl FieldsOnCorrectType {
    pub fn new() -> Self {
        FieldsOnCorrectType
    }
}

impl Default for FieldsOnCorrectType {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> OperationVisitor<'a> for FieldsOnCorrectType {
    fn enter_field(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        field: &'a Field,
    ) {
        let Some(parent_type) = ctx.current_parent_type() else {
            return;
        };

        if ctx.current_field().is_none() {
            errors.report_error(ValidationError {
                locations: vec![field.position],
                message: format!(
                    "Cannot query field \"{}\" on type \"{}\".",
                    field.name,
                    parent_type.name()
                ),
                error_code: "FIELDS_ON_CORRECT_TYPE",
            });
        }
    }
}

impl ValidationRule for FieldsOnCorrectType {
    fn error_code<'a>(&self) -> &'a str {
        "FIELDS_ON_CORRECT_TYPE"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::FIELD
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(FieldsOnCorrectType)
    }
}

#[cfg(test)]
mod tests {
    use super::FieldsOnCorrectType;
    use crate::tests::testkit::validate_rule;

    #[test]
    fn known_fields_and_meta_fields() {
        let errors = validate_rule(
            FieldsOnCorrectType::new(),
            "{ __typename __schema { queryType { name } } dog { __typename name } catOrDog { __typename } }",
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn unknown_fields_are_reported_once_per_level() {
        let errors = validate_rule(
            FieldsOnCorrectType::new(),
            "{ dog { unknownField { deeper } } catOrDog { name } }",
        );
        assert_eq!(
            errors,
            vec![
                "Cannot query field \"unknownField\" on type \"Dog\".",
                "Cannot query field \"name\" on type \"CatOrDog\".",
            ]
        );
    }

    #[test]
    fn meta_root_fields_only_on_query() {
        let errors = validate_rule(FieldsOnCorrectType::new(), "{ dog { __schema { types { name } } } }");
        assert_eq!(errors, vec!["Cannot query field \"__schema\" on type \"Dog\"."]);
    }
}
