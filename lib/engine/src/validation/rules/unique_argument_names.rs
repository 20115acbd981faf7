use std::collections::HashSet;

use super::ValidationRule;
use crate::ast::query::Value;
use crate::validation::utils::{ValidationError, ValidationErrorContext};
use crate::validation::visitor::{NodeKinds, OperationVisitor, OperationVisitorContext};

/// Unique argument names
///
/// A GraphQL field or directive is only valid if all supplied arguments are
/// uniquely named.
///
/// See https://spec.graphql.org/draft/#sec-Argument-Names
pub struct UniqueArgumentNames;

impl UniqueArgumentNames {
    pub fn new() -> Self {
        UniqueArgumentNames
    }
}

impl Default for UniqueArgumentNames {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> OperationVisitor<'a> for UniqueArgumentNames {
    fn enter_arguments(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        arguments: &'a [(String, Value)],
    ) {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();

        for (name, _) in arguments {
            if !seen.insert(name.as_str()) && reported.insert(name.as_str()) {
                errors.report_error(ValidationError {
                    locations: vec![ctx.current_position()],
                    message: format!("There can be only one argument named \"{}\".", name),
                    error_code: "UNIQUE_ARGUMENT_NAMES",
                });
            }
        }
    }
}

impl ValidationRule for UniqueArgumentNames {
    fn error_code<'a>(&self) -> &'a str {
        "UNIQUE_ARGUMENT_NAMES"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::ARGUMENT
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(UniqueArgumentNames)
    }
}

#[cfg(test)]
mod tests {
    use super::UniqueArgumentNames;
    use crate::tests::testkit::validate_rule;

    #[test]
    fn same_argument_on_different_fields() {
        let errors = validate_rule(
            UniqueArgumentNames::new(),
            "{ dog { isHousetrained(atOtherHomes: true) } human(id: 1) { name(surname: true) } }",
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn repeated_argument_is_reported_once() {
        let errors = validate_rule(
            UniqueArgumentNames::new(),
            "{ dog { isHousetrained(atOtherHomes: true, atOtherHomes: false, atOtherHomes: true) name @skip(if: true, if: false) } }",
        );
        assert_eq!(
            errors,
            vec![
                "There can be only one argument named \"atOtherHomes\".",
                "There can be only one argument named \"if\".",
            ]
        );
    }
}
