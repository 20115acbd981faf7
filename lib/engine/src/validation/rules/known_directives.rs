use super::ValidationRule;
use crate::ast::query::Directive;
use crate::schema::directives::DirectiveLocation;
use crate::validation::utils::{ValidationError, ValidationErrorContext};
use crate::validation::visitor::{NodeKinds, OperationVisitor, OperationVisitorContext};

/// Known directives
///
/// A GraphQL document is only valid if all `@directives` are known by the
/// schema and legally positioned.
///
/// See https://spec.graphql.org/draft/#sec-Directives-Are-Defined
pub struct KnownDirectives;

impl KnownDirectives {
    pub fn new() -> Self {
        KnownDirectives
    }
}

impl Default for KnownDirectives {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> OperationVisitor<'a> for KnownDirectives {
    fn enter_directive(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        directive: &'a Directive,
        location: DirectiveLocation,
    ) {
        match ctx.current_directive() {
            None => errors.report_error(ValidationError {
                locations: vec![directive.position],
                message: format!("Unknown directive \"@{}\".", directive.name),
                error_code: "KNOWN_DIRECTIVES",
            }),
            Some(definition) if !definition.is_allowed_at(location) => {
                errors.report_error(ValidationError {
                    locations: vec![directive.position],
                    message: format!(
                        "Directive \"@{}\" may not be used on {}.",
                        directive.name, location
                    ),
                    error_code: "KNOWN_DIRECTIVES",
                })
            }
            Some(_) => {}
        }
    }
}

impl ValidationRule for KnownDirectives {
    fn error_code<'a>(&self) -> &'a str {
        "KNOWN_DIRECTIVES"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::DIRECTIVE
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(KnownDirectives)
    }
}

#[cfg(test)]
mod tests {
    use super::KnownDirectives;
    use crate::tests::testkit::validate_rule;

    #[test]
    fn known_directives_in_legal_places() {
        let errors = validate_rule(
            KnownDirectives::new(),
            "{ dog @include(if: true) { name @skip(if: false) ...F @include(if: true) } }
             fragment F on Dog { barks }",
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn unknown_and_misplaced_directives() {
        let errors = validate_rule(
            KnownDirectives::new(),
            "query Q @include(if: true) { dog @unknown { name @deprecated } }",
        );
        assert_eq!(
            errors,
            vec![
                "Directive \"@include\" may not be used on QUERY.",
                "Unknown directive \"@unknown\".",
                "Directive \"@deprecated\" may not be used on FIELD.",
            ]
        );
    }
}
