use super::ValidationRule;
use crate::ast::query::Field;
use crate::validation::utils::{ValidationError, ValidationErrorContext};
use crate::validation::visitor::{NodeKinds, OperationVisitor, OperationVisitorContext};

/// Leaf Field Selections
///
/// A GraphQL document is valid only if all leaf fields (fields without
/// sub selections) are of scalar or enum types.
///
/// See https://spec.graphql.org/draft/#sec-Leaf-Field-Selections
pub struct LeafFieldSelections;

impl LeafFieldSelections {
    pub fn new() -> Self {
        LeafFieldSelections
    }
}

impl Default for LeafFieldSelections {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> OperationVisitor<'a> for LeafFieldSelections {
    fn enter_field(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        field: &'a Field,
    ) {
        let (Some(ty), Some(named)) = (ctx.current_type(), ctx.current_named_type()) else {
            return;
        };
        let has_selections = !field.selection_set.items.is_empty();

        if named.is_leaf() && has_selections {
            errors.report_error(ValidationError {
                locations: vec![field.position],
                message: format!(
                    "Field \"{}\" must not have a selection since type \"{}\" has no subfields.",
                    field.name, ty
                ),
                error_code: "LEAF_FIELD_SELECTIONS",
            });
        } else if !named.is_leaf() && !has_selections {
            errors.report_error(ValidationError {
                locations: vec![field.position],
                message: format!(
                    "Field \"{}\" of type \"{}\" must have a selection of subfields. Did you mean \"{} {{ ... }}\"?",
                    field.name, ty, field.name
                ),
                error_code: "LEAF_FIELD_SELECTIONS",
            });
        }
    }
}

impl ValidationRule for LeafFieldSelections {
    fn error_code<'a>(&self) -> &'a str {
        "LEAF_FIELD_SELECTIONS"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::FIELD
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(LeafFieldSelections)
    }
}
