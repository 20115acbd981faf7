use std::collections::HashMap;

use graphql_parser::Pos;

use super::ValidationRule;
use crate::ast::query::FragmentDefinition;
use crate::validation::utils::{ValidationError, ValidationErrorContext};
use crate::validation::visitor::{NodeKinds, OperationVisitor, OperationVisitorContext};

/// Unique fragment names
///
/// A GraphQL document is only valid if all defined fragments have unique names.
///
/// See https://spec.graphql.org/draft/#sec-Fragment-Name-Uniqueness
pub struct UniqueFragmentNames;

impl UniqueFragmentNames {
    pub fn new() -> Self {
        UniqueFragmentNames
    }
}

impl Default for UniqueFragmentNames {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct UniqueFragmentNamesVisitor<'a> {
    known: HashMap<&'a str, Pos>,
}

impl<'a> OperationVisitor<'a> for UniqueFragmentNamesVisitor<'a> {
    fn enter_fragment_definition(
        &mut self,
        _: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        fragment: &'a FragmentDefinition,
    ) {
        match self.known.get(fragment.name.as_str()) {
            Some(first) => errors.report_error(ValidationError {
                locations: vec![*first, fragment.position],
                message: format!("There can be only one fragment named \"{}\".", fragment.name),
                error_code: "UNIQUE_FRAGMENT_NAMES",
            }),
            None => {
                self.known.insert(&fragment.name, fragment.position);
            }
        }
    }
}

impl ValidationRule for UniqueFragmentNames {
    fn error_code<'a>(&self) -> &'a str {
        "UNIQUE_FRAGMENT_NAMES"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::FRAGMENT_DEFINITION
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(UniqueFragmentNamesVisitor::default())
    }
}

#[cfg(test)]
mod tests {
    use super::UniqueFragmentNames;
    use crate::tests::testkit::validate_rule;

    #[test]
    fn duplicated_fragment() {
        let errors = validate_rule(
            UniqueFragmentNames::new(),
            "{ dog { ...F } } fragment F on Dog { name } fragment G on Dog { name } fragment F on Dog { barks }",
        );
        assert_eq!(errors, vec!["There can be only one fragment named \"F\"."]);
    }
}
