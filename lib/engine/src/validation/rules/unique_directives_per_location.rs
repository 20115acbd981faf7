use std::collections::HashMap;

use graphql_parser::Pos;

use super::ValidationRule;
use crate::ast::query::{
    Directive, Field, FragmentDefinition, FragmentSpread, InlineFragment, OperationDefinition,
};
use crate::ast::OperationDefinitionExt;
use crate::validation::utils::{ValidationError, ValidationErrorContext};
use crate::validation::visitor::{NodeKinds, OperationVisitor, OperationVisitorContext};

/// Unique directive names per location
///
/// A GraphQL document is only valid if all non-repeatable directives at
/// a given location are uniquely named.
///
/// See https://spec.graphql.org/draft/#sec-Directives-Are-Unique-Per-Location
pub struct UniqueDirectivesPerLocation;

impl UniqueDirectivesPerLocation {
    pub fn new() -> Self {
        UniqueDirectivesPerLocation
    }
}

impl Default for UniqueDirectivesPerLocation {
    fn default() -> Self {
        Self::new()
    }
}

fn check_directives(
    ctx: &OperationVisitorContext<'_>,
    errors: &mut ValidationErrorContext,
    directives: &[Directive],
) {
    let mut seen: HashMap<&str, Pos> = HashMap::new();

    for directive in directives {
        let repeatable = ctx
            .schema
            .directive(&directive.name)
            .map_or(true, |definition| definition.repeatable);
        if repeatable {
            continue;
        }

        match seen.get(directive.name.as_str()) {
            Some(first) => errors.report_error(ValidationError {
                locations: vec![*first, directive.position],
                message: format!(
                    "The directive \"@{}\" can only be used once at this location.",
                    directive.name
                ),
                error_code: "UNIQUE_DIRECTIVES_PER_LOCATION",
            }),
            None => {
                seen.insert(&directive.name, directive.position);
            }
        }
    }
}

impl<'a> OperationVisitor<'a> for UniqueDirectivesPerLocation {
    fn enter_operation_definition(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        operation: &'a OperationDefinition,
    ) {
        check_directives(ctx, errors, operation.directives());
    }

    fn enter_fragment_definition(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        fragment: &'a FragmentDefinition,
    ) {
        check_directives(ctx, errors, &fragment.directives);
    }

    fn enter_field(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        field: &'a Field,
    ) {
        check_directives(ctx, errors, &field.directives);
    }

    fn enter_fragment_spread(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        spread: &'a FragmentSpread,
    ) {
        check_directives(ctx, errors, &spread.directives);
    }

    fn enter_inline_fragment(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        fragment: &'a InlineFragment,
    ) {
        check_directives(ctx, errors, &fragment.directives);
    }
}

impl ValidationRule for UniqueDirectivesPerLocation {
    fn error_code<'a>(&self) -> &'a str {
        "UNIQUE_DIRECTIVES_PER_LOCATION"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::OPERATION_DEFINITION
            | NodeKinds::FRAGMENT_DEFINITION
            | NodeKinds::FIELD
            | NodeKinds::FRAGMENT_SPREAD
            | NodeKinds::INLINE_FRAGMENT
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(UniqueDirectivesPerLocation)
    }
}

#[cfg(test)]
mod tests {
    use super::UniqueDirectivesPerLocation;
    use crate::tests::testkit::validate_rule;

    #[test]
    fn distinct_directives() {
        let errors = validate_rule(
            UniqueDirectivesPerLocation::new(),
            "{ dog @include(if: true) @skip(if: false) { name @skip(if: true) } }",
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn duplicated_directives() {
        let errors = validate_rule(
            UniqueDirectivesPerLocation::new(),
            "{ dog { name @skip(if: true) @skip(if: false) ... on Dog @include(if: true) @include(if: true) { barks } } }",
        );
        assert_eq!(
            errors,
            vec![
                "The directive \"@skip\" can only be used once at this location.",
                "The directive \"@include\" can only be used once at this location.",
            ]
        );
    }
}
