use super::ValidationRule;
use crate::ast::query::{FragmentSpread, InlineFragment};
use crate::schema::types::NamedType;
use crate::validation::utils::{ValidationError, ValidationErrorContext};
use crate::validation::visitor::{
    type_condition_name, NodeKinds, OperationVisitor, OperationVisitorContext,
};

/// Possible fragment spread
///
/// A fragment spread is only valid if the type condition could ever possibly
/// be true: if there is a non-empty intersection of the possible parent types,
/// and possible types which pass the type condition.
///
/// See https://spec.graphql.org/draft/#sec-Fragment-spread-is-possible
pub struct PossibleFragmentSpreads;

impl PossibleFragmentSpreads {
    pub fn new() -> Self {
        PossibleFragmentSpreads
    }
}

impl Default for PossibleFragmentSpreads {
    fn default() -> Self {
        Self::new()
    }
}

fn composite(ty: Option<&NamedType>) -> Option<&NamedType> {
    ty.filter(|ty| ty.is_composite())
}

impl<'a> OperationVisitor<'a> for PossibleFragmentSpreads {
    fn enter_inline_fragment(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        fragment: &'a InlineFragment,
    ) {
        let (Some(fragment_type), Some(parent_type)) = (
            composite(ctx.current_named_type()),
            composite(ctx.current_parent_type()),
        ) else {
            return;
        };

        if !ctx.schema.do_types_overlap(fragment_type, parent_type) {
            errors.report_error(ValidationError {
                locations: vec![fragment.position],
                message: format!(
                    "Fragment cannot be spread here as objects of type \"{}\" can never be of type \"{}\".",
                    parent_type.name(),
                    fragment_type.name()
                ),
                error_code: "POSSIBLE_FRAGMENT_SPREADS",
            });
        }
    }

    fn enter_fragment_spread(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        spread: &'a FragmentSpread,
    ) {
        let fragment_type = ctx
            .known_fragments
            .get(spread.fragment_name.as_str())
            .and_then(|fragment| ctx.schema.lookup(type_condition_name(&fragment.type_condition)));

        let (Some(fragment_type), Some(parent_type)) = (
            composite(fragment_type),
            composite(ctx.current_parent_type()),
        ) else {
            return;
        };

        if !ctx.schema.do_types_overlap(fragment_type, parent_type) {
            errors.report_error(ValidationError {
                locations: vec![spread.position],
                message: format!(
                    "Fragment \"{}\" cannot be spread here as objects of type \"{}\" can never be of type \"{}\".",
                    spread.fragment_name,
                    parent_type.name(),
                    fragment_type.name()
                ),
                error_code: "POSSIBLE_FRAGMENT_SPREADS",
            });
        }
    }
}

impl ValidationRule for PossibleFragmentSpreads {
    fn error_code<'a>(&self) -> &'a str {
        "POSSIBLE_FRAGMENT_SPREADS"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::INLINE_FRAGMENT | NodeKinds::FRAGMENT_SPREAD
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(PossibleFragmentSpreads)
    }
}

#[cfg(test)]
mod tests {
    use super::PossibleFragmentSpreads;
    use crate::tests::testkit::validate_rule;

    #[test]
    fn overlapping_types() {
        let errors = validate_rule(
            PossibleFragmentSpreads::new(),
            "{ pet { ... on Dog { barks } ...CatFields } catOrDog { ... on Pet { name } } }
             fragment CatFields on Cat { meows }",
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn disjoint_types() {
        let errors = validate_rule(
            PossibleFragmentSpreads::new(),
            "{ dog { ... on Cat { meows } ...HumanFields } }
             fragment HumanFields on Human { name }",
        );
        assert_eq!(
            errors,
            vec![
                "Fragment cannot be spread here as objects of type \"Dog\" can never be of type \"Cat\".",
                "Fragment \"HumanFields\" cannot be spread here as objects of type \"Dog\" can never be of type \"Human\".",
            ]
        );
    }
}
