use super::ValidationRule;
use crate::ast::query::FragmentSpread;
use crate::validation::utils::{ValidationError, ValidationErrorContext};
use crate::validation::visitor::{NodeKinds, OperationVisitor, OperationVisitorContext};

/// Known fragment names
///
/// A GraphQL document is only valid if all `...Fragment` fragment spreads refer
/// to fragments defined in the same document.
///
/// See https://spec.graphql.org/draft/#sec-Fragment-spread-target-defined
pub struct KnownFragmentNames;

impl KnownFragmentNames {
    pub fn new() -> Self {
        KnownFragmentNames
    }
}

impl Default for KnownFragmentNames {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> OperationVisitor<'a> for KnownFragmentNames {
    fn enter_fragment_spread(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        spread: &'a FragmentSpread,
    ) {
        if !ctx
            .known_fragments
            .contains_key(spread.fragment_name.as_str())
        {
            errors.report_error(ValidationError {
                locations: vec![spread.position],
                message: format!("Unknown fragment \"{}\".", spread.fragment_name),
                error_code: "KNOWN_FRAGMENT_NAMES",
            });
        }
    }
}

impl ValidationRule for KnownFragmentNames {
    fn error_code<'a>(&self) -> &'a str {
        "KNOWN_FRAGMENT_NAMES"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::FRAGMENT_SPREAD
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(KnownFragmentNames)
    }
}

#[cfg(test)]
mod tests {
    use super::KnownFragmentNames;
    use crate::tests::testkit::validate_rule;

    #[test]
    fn unknown_fragments_in_operations_and_fragments() {
        let errors = validate_rule(
            KnownFragmentNames::new(),
            "{ dog { ...Known ...Unknown } } fragment Known on Dog { ...AlsoUnknown }",
        );
        assert_eq!(
            errors,
            vec![
                "Unknown fragment \"Unknown\".",
                "Unknown fragment \"AlsoUnknown\".",
            ]
        );
    }
}
