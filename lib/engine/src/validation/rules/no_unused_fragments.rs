use std::collections::HashSet;

use super::ValidationRule;
use crate::ast::query::{Definition, Document, FragmentDefinition, FragmentSpread, OperationDefinition};
use crate::validation::utils::{ScopedUsages, ValidationError, ValidationErrorContext};
use crate::validation::visitor::{NodeKinds, OperationVisitor, OperationVisitorContext};

/// No unused fragments
///
/// A GraphQL document is only valid if all fragment definitions are spread
/// within operations, or spread within other fragments spread within operations.
///
/// See https://spec.graphql.org/draft/#sec-Fragments-Must-Be-Used
pub struct NoUnusedFragments;

impl NoUnusedFragments {
    pub fn new() -> Self {
        NoUnusedFragments
    }
}

impl Default for NoUnusedFragments {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct NoUnusedFragmentsVisitor<'a> {
    usages: ScopedUsages<'a, ()>,
}

impl<'a> OperationVisitor<'a> for NoUnusedFragmentsVisitor<'a> {
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

    fn leave_document(
        &mut self,
        _: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        document: &'a Document,
    ) {
        let used: HashSet<&str> = (0..self.usages.operation_count())
            .flat_map(|index| self.usages.reachable_fragments(index))
            .collect();

        for definition in &document.definitions {
            if let Definition::Fragment(fragment) = definition {
                if !used.contains(fragment.name.as_str()) {
                    errors.report_error(ValidationError {
                        locations: vec![fragment.position],
                        message: format!("Fragment \"{}\" is never used.", fragment.name),
                        error_code: "NO_UNUSED_FRAGMENTS",
                    });
                }
            }
        }
    }
}

impl ValidationRule for NoUnusedFragments {
    fn error_code<'a>(&self) -> &'a str {
        "NO_UNUSED_FRAGMENTS"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::DOCUMENT
            | NodeKinds::OPERATION_DEFINITION
            | NodeKinds::FRAGMENT_DEFINITION
            | NodeKinds::FRAGMENT_SPREAD
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(NoUnusedFragmentsVisitor::default())
    }
}

#[cfg(test)]
mod tests {
    use super::NoUnusedFragments;
    use crate::tests::testkit::validate_rule;

    #[test]
    fn fragments_used_transitively() {
        let errors = validate_rule(
            NoUnusedFragments::new(),
            "query A { human { ...H } }
             fragment H on Human { name ...H2 }
             fragment H2 on Human { relatives { ...H } }",
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn unreachable_fragments() {
        let errors = validate_rule(
            NoUnusedFragments::new(),
            "query A { human { ...H } }
             fragment H on Human { name }
             fragment Orphan on Human { name ...Orphan2 }
             fragment Orphan2 on Human { iq }",
        );
        assert_eq!(
            errors,
            vec![
                "Fragment \"Orphan\" is never used.",
                "Fragment \"Orphan2\" is never used.",
            ]
        );
    }
}
