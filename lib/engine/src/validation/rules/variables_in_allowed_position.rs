use std::collections::HashMap;

use graphql_parser::Pos;

use super::ValidationRule;
use crate::ast::query::{Document, FragmentDefinition, FragmentSpread, OperationDefinition, Value};
use crate::ast::OperationDefinitionExt;
use crate::schema::registry::TypeRegistry;
use crate::schema::types::TypeRef;
use crate::validation::utils::{ScopedUsages, ValidationError, ValidationErrorContext};
use crate::validation::visitor::{NodeKinds, OperationVisitor, OperationVisitorContext};

/// Variables in allowed position
///
/// Variable usages must be compatible with the arguments they are passed to.
/// A variable of type `T` is also accepted where a list of `T` is expected.
///
/// See https://spec.graphql.org/draft/#sec-All-Variable-Usages-are-Allowed
pub struct VariablesInAllowedPosition;

impl VariablesInAllowedPosition {
    pub fn new() -> Self {
        VariablesInAllowedPosition
    }
}

impl Default for VariablesInAllowedPosition {
    fn default() -> Self {
        Self::new()
    }
}

struct VariableUsage<'a> {
    name: &'a str,
    /// Type expected where the variable is used.
    location_type: TypeRef,
    /// Whether the argument or input field the variable is passed to has a default.
    location_has_default: bool,
    position: Pos,
}

#[derive(Default)]
struct VariablesInAllowedPositionVisitor<'a> {
    usages: ScopedUsages<'a, VariableUsage<'a>>,
}

/// Whether `variable_type` fits `location_type`, allowing a variable to be promoted into a list.
fn is_allowed(registry: &TypeRegistry, variable_type: &TypeRef, location_type: &TypeRef) -> bool {
    if registry.is_sub_type(variable_type, location_type) {
        return true;
    }

    match location_type.list_item() {
        Some(item_type) => is_allowed(registry, variable_type, item_type),
        None => false,
    }
}

impl<'a> OperationVisitor<'a> for VariablesInAllowedPositionVisitor<'a> {
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

    fn enter_value(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        _: &mut ValidationErrorContext,
        value: &'a Value,
    ) {
        let Value::Variable(name) = value else {
            return;
        };
        let Some(location_type) = ctx.current_input_type() else {
            return;
        };

        self.usages.record(VariableUsage {
            name: name.as_str(),
            location_type: location_type.clone(),
            location_has_default: ctx
                .current_input_value()
                .is_some_and(|definition| definition.default_value.is_some()),
            position: ctx.current_position(),
        });
    }

    fn leave_document(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        _: &'a Document,
    ) {
        for (operation, usages) in self.usages.operations() {
            let definitions: HashMap<&str, (TypeRef, bool)> = operation
                .variable_definitions()
                .iter()
                .map(|variable| {
                    let has_default = variable
                        .default_value
                        .as_ref()
                        .is_some_and(|value| !matches!(value, Value::Null));
                    (
                        variable.name.as_str(),
                        (TypeRef::from(&variable.var_type), has_default),
                    )
                })
                .collect();

            for usage in usages {
                let Some((variable_type, variable_has_default)) = definitions.get(usage.name)
                else {
                    continue;
                };
                if ctx.schema.resolve(variable_type).is_none() {
                    continue;
                }

                let location_type = match &usage.location_type {
                    TypeRef::NonNull(inner)
                        if !variable_type.is_non_null()
                            && (*variable_has_default || usage.location_has_default) =>
                    {
                        inner.as_ref()
                    }
                    other => other,
                };

                if !is_allowed(ctx.schema, variable_type, location_type) {
                    errors.report_error(ValidationError {
                        locations: vec![usage.position],
                        message: format!(
                            "Variable \"${}\" of type \"{}\" used in position expecting type \"{}\".",
                            usage.name, variable_type, usage.location_type
                        ),
                        error_code: "VARIABLES_IN_ALLOWED_POSITION",
                    });
                }
            }
        }
    }
}

impl ValidationRule for VariablesInAllowedPosition {
    fn error_code<'a>(&self) -> &'a str {
        "VARIABLES_IN_ALLOWED_POSITION"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::DOCUMENT
            | NodeKinds::OPERATION_DEFINITION
            | NodeKinds::FRAGMENT_DEFINITION
            | NodeKinds::FRAGMENT_SPREAD
            | NodeKinds::VALUE
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(VariablesInAllowedPositionVisitor::default())
    }
}
