use graphql_parser::Pos;

use super::ValidationRule;
use crate::ast::query::{FragmentDefinition, InlineFragment, TypeCondition, VariableDefinition};
use crate::schema::types::TypeRef;
use crate::validation::utils::{ValidationError, ValidationErrorContext};
use crate::validation::visitor::{
    type_condition_name, NodeKinds, OperationVisitor, OperationVisitorContext,
};

/// Known type names
///
/// A GraphQL document is only valid if referenced types (specifically
/// variable definitions and fragment conditions) are defined by the type schema.
///
/// See https://spec.graphql.org/draft/#sec-Fragment-Spread-Type-Existence
pub struct KnownTypeNames;

impl KnownTypeNames {
    pub fn new() -> Self {
        KnownTypeNames
    }
}

impl Default for KnownTypeNames {
    fn default() -> Self {
        Self::new()
    }
}

fn check(
    ctx: &OperationVisitorContext<'_>,
    errors: &mut ValidationErrorContext,
    name: &str,
    position: Pos,
) {
    if ctx.schema.lookup(name).is_none() {
        errors.report_error(ValidationError {
            locations: vec![position],
            message: format!("Unknown type \"{}\".", name),
            error_code: "KNOWN_TYPE_NAMES",
        });
    }
}

impl<'a> OperationVisitor<'a> for KnownTypeNames {
    fn enter_variable_definition(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        variable: &'a VariableDefinition,
    ) {
        let ty = TypeRef::from(&variable.var_type);
        check(ctx, errors, ty.type_name(), variable.position);
    }

    fn enter_fragment_definition(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        fragment: &'a FragmentDefinition,
    ) {
        check(
            ctx,
            errors,
            type_condition_name(&fragment.type_condition),
            fragment.position,
        );
    }

    fn enter_inline_fragment(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        fragment: &'a InlineFragment,
    ) {
        if let Some(TypeCondition::On(name)) = &fragment.type_condition {
            check(ctx, errors, name, fragment.position);
        }
    }
}

impl ValidationRule for KnownTypeNames {
    fn error_code<'a>(&self) -> &'a str {
        "KNOWN_TYPE_NAMES"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::VARIABLE_DEFINITION | NodeKinds::FRAGMENT_DEFINITION | NodeKinds::INLINE_FRAGMENT
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(KnownTypeNames)
    }
}
