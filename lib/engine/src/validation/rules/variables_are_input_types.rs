use super::ValidationRule;
use crate::ast::query::VariableDefinition;
use crate::schema::types::TypeRef;
use crate::validation::utils::{ValidationError, ValidationErrorContext};
use crate::validation::visitor::{NodeKinds, OperationVisitor, OperationVisitorContext};

/// Variables are input types
///
/// A GraphQL operation is only valid if all the variables it defines are of
/// input types (scalar, enum, or input object).
///
/// See https://spec.graphql.org/draft/#sec-Variables-Are-Input-Types
pub struct VariablesAreInputTypes;

impl VariablesAreInputTypes {
    pub fn new() -> Self {
        VariablesAreInputTypes
    }
}

impl Default for VariablesAreInputTypes {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> OperationVisitor<'a> for VariablesAreInputTypes {
    fn enter_variable_definition(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        variable: &'a VariableDefinition,
    ) {
        let ty = TypeRef::from(&variable.var_type);

        if ctx.schema.resolve(&ty).is_some_and(|named| !named.is_input()) {
            errors.report_error(ValidationError {
                locations: vec![variable.position],
                message: format!(
                    "Variable \"${}\" cannot be non-input type \"{}\".",
                    variable.name, ty
                ),
                error_code: "VARIABLES_ARE_INPUT_TYPES",
            });
        }
    }
}

impl ValidationRule for VariablesAreInputTypes {
    fn error_code<'a>(&self) -> &'a str {
        "VARIABLES_ARE_INPUT_TYPES"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::VARIABLE_DEFINITION
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(VariablesAreInputTypes)
    }
}
