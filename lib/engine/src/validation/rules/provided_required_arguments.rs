use graphql_parser::Pos;
use indexmap::IndexMap;

use super::ValidationRule;
use crate::ast::query::{Directive, Field, Value};
use crate::schema::directives::DirectiveLocation;
use crate::schema::types::InputValueDefinition;
use crate::validation::utils::{ValidationError, ValidationErrorContext};
use crate::validation::visitor::{NodeKinds, OperationVisitor, OperationVisitorContext};

/// Provided required arguments
///
/// A field or directive is only valid if all required (non-null without a
/// default value) field arguments have been provided.
///
/// See https://spec.graphql.org/draft/#sec-Required-Arguments
pub struct ProvidedRequiredArguments;

impl ProvidedRequiredArguments {
    pub fn new() -> Self {
        ProvidedRequiredArguments
    }
}

impl Default for ProvidedRequiredArguments {
    fn default() -> Self {
        Self::new()
    }
}

fn missing_arguments<'d>(
    definitions: &'d IndexMap<String, InputValueDefinition>,
    provided: &[(String, Value)],
) -> impl Iterator<Item = &'d InputValueDefinition> + 'd {
    let provided: Vec<String> = provided.iter().map(|(name, _)| name.clone()).collect();
    definitions
        .values()
        .filter(move |definition| definition.is_required() && !provided.contains(&definition.name))
}

fn report(errors: &mut ValidationErrorContext, subject: String, argument: &InputValueDefinition, position: Pos) {
    errors.report_error(ValidationError {
        locations: vec![position],
        message: format!(
            "{} argument \"{}\" of type \"{}\" is required, but it was not provided.",
            subject, argument.name, argument.ty
        ),
        error_code: "PROVIDED_REQUIRED_ARGUMENTS",
    });
}

impl<'a> OperationVisitor<'a> for ProvidedRequiredArguments {
    fn enter_field(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        field: &'a Field,
    ) {
        let Some(definition) = ctx.current_field() else {
            return;
        };

        for argument in missing_arguments(&definition.arguments, &field.arguments) {
            report(errors, format!("Field \"{}\"", field.name), argument, field.position);
        }
    }

    fn enter_directive(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        directive: &'a Directive,
        _: DirectiveLocation,
    ) {
        let Some(definition) = ctx.current_directive() else {
            return;
        };

        for argument in missing_arguments(&definition.arguments, &directive.arguments) {
            report(
                errors,
                format!("Directive \"@{}\"", directive.name),
                argument,
                directive.position,
            );
        }
    }
}

impl ValidationRule for ProvidedRequiredArguments {
    fn error_code<'a>(&self) -> &'a str {
        "PROVIDED_REQUIRED_ARGUMENTS"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::FIELD | NodeKinds::DIRECTIVE
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(ProvidedRequiredArguments)
    }
}

#[cfg(test)]
mod tests {
    use super::ProvidedRequiredArguments;
    use crate::tests::testkit::validate_rule;

    #[test]
    fn optional_and_defaulted_arguments_may_be_omitted() {
        let errors = validate_rule(
            ProvidedRequiredArguments::new(),
            "{ dog { isHousetrained } complicatedArgs { multipleOpts multipleReqs(req1: 1, req2: 2) } }",
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn missing_field_and_directive_arguments() {
        let errors = validate_rule(
            ProvidedRequiredArguments::new(),
            "{ complicatedArgs { multipleReqs(req2: 2) } dog @include { name } }",
        );
        assert_eq!(
            errors,
            vec![
                "Field \"multipleReqs\" argument \"req1\" of type \"Int!\" is required, but it was not provided.",
                "Directive \"@include\" argument \"if\" of type \"Boolean!\" is required, but it was not provided.",
            ]
        );
    }
}
