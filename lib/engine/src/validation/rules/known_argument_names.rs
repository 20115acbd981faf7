use super::ValidationRule;
use crate::ast::query::Value;
use crate::validation::utils::{ValidationError, ValidationErrorContext};
use crate::validation::visitor::{NodeKinds, OperationVisitor, OperationVisitorContext};

/// Known argument names
///
/// A GraphQL field or directive is only valid if all supplied arguments are
/// defined by that field or directive.
///
/// See https://spec.graphql.org/draft/#sec-Argument-Names
pub struct KnownArgumentNames;

impl KnownArgumentNames {
    pub fn new() -> Self {
        KnownArgumentNames
    }
}

impl Default for KnownArgumentNames {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> OperationVisitor<'a> for KnownArgumentNames {
    fn enter_argument(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        name: &'a str,
        _: &'a Value,
    ) {
        let Some(definitions) = ctx.current_argument_definitions() else {
            return;
        };
        if definitions.contains_key(name) {
            return;
        }

        let message = match (ctx.current_directive(), ctx.current_field()) {
            (Some(directive), _) => format!(
                "Unknown argument \"{}\" on directive \"@{}\".",
                name, directive.name
            ),
            (None, Some(field)) => format!(
                "Unknown argument \"{}\" on field \"{}.{}\".",
                name,
                ctx.current_parent_type()
                    .map(|parent| parent.name())
                    .unwrap_or_default(),
                field.name
            ),
            (None, None) => return,
        };

        errors.report_error(ValidationError {
            locations: vec![ctx.current_position()],
            message,
            error_code: "KNOWN_ARGUMENT_NAMES",
        });
    }
}

impl ValidationRule for KnownArgumentNames {
    fn error_code<'a>(&self) -> &'a str {
        "KNOWN_ARGUMENT_NAMES"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::ARGUMENT
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(KnownArgumentNames)
    }
}
