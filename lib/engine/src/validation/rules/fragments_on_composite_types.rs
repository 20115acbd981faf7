use super::ValidationRule;
use crate::ast::query::{FragmentDefinition, InlineFragment, TypeCondition};
use crate::validation::utils::{ValidationError, ValidationErrorContext};
use crate::validation::visitor::{
    type_condition_name, NodeKinds, OperationVisitor, OperationVisitorContext,
};

/// Fragments on composite type
///
/// Fragments use a type condition to determine if they apply, since fragments
/// can only be spread into a composite type (object, interface, or union), the
/// type condition must also be a composite type.
///
/// See https://spec.graphql.org/draft/#sec-Fragments-On-Composite-Types
pub struct FragmentsOnCompositeTypes;

impl FragmentsOnCompositeTypes {
    pub fn new() -> Self {
        FragmentsOnCompositeTypes
    }
}

impl Default for FragmentsOnCompositeTypes {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> OperationVisitor<'a> for FragmentsOnCompositeTypes {
    fn enter_inline_fragment(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        fragment: &'a InlineFragment,
    ) {
        let Some(TypeCondition::On(name)) = &fragment.type_condition else {
            return;
        };

        if ctx.schema.lookup(name).is_some_and(|ty| !ty.is_composite()) {
            errors.report_error(ValidationError {
                locations: vec![fragment.position],
                message: format!(
                    "Fragment cannot condition on non composite type \"{}\".",
                    name
                ),
                error_code: "FRAGMENTS_ON_COMPOSITE_TYPES",
            });
        }
    }

    fn enter_fragment_definition(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        fragment: &'a FragmentDefinition,
    ) {
        let name = type_condition_name(&fragment.type_condition);

        if ctx.schema.lookup(name).is_some_and(|ty| !ty.is_composite()) {
            errors.report_error(ValidationError {
                locations: vec![fragment.position],
                message: format!(
                    "Fragment \"{}\" cannot condition on non composite type \"{}\".",
                    fragment.name, name
                ),
                error_code: "FRAGMENTS_ON_COMPOSITE_TYPES",
            });
        }
    }
}

impl ValidationRule for FragmentsOnCompositeTypes {
    fn error_code<'a>(&self) -> &'a str {
        "FRAGMENTS_ON_COMPOSITE_TYPES"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::INLINE_FRAGMENT | NodeKinds::FRAGMENT_DEFINITION
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(FragmentsOnCompositeTypes)
    }
}
