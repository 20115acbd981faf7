use super::ValidationRule;
use crate::ast::query::{Value, VariableDefinition};
use crate::coercion::coerce_literal;
use crate::schema::types::TypeRef;
use crate::validation::utils::{ValidationError, ValidationErrorContext};
use crate::validation::visitor::{NodeKinds, OperationVisitor, OperationVisitorContext};

/// Value literals of correct type
///
/// A GraphQL document is only valid if all value literals are of the type
/// expected at their position. Literals are checked by a dry run of literal
/// coercion, where variables are accepted as they are.
///
/// See https://spec.graphql.org/draft/#sec-Values-of-Correct-Type
pub struct ValuesOfCorrectType;

impl ValuesOfCorrectType {
    pub fn new() -> Self {
        ValuesOfCorrectType
    }
}

impl Default for ValuesOfCorrectType {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> OperationVisitor<'a> for ValuesOfCorrectType {
    fn enter_argument(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        name: &'a str,
        value: &'a Value,
    ) {
        let Some(ty) = ctx.current_input_type() else {
            return;
        };

        if let Err(error) = coerce_literal(ctx.schema, ty, value, None) {
            errors.report_error(ValidationError {
                locations: vec![ctx.current_position()],
                message: format!("Argument \"{}\" has invalid value {}. {}", name, value, error),
                error_code: "VALUES_OF_CORRECT_TYPE",
            });
        }
    }

    fn enter_variable_definition(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        variable: &'a VariableDefinition,
    ) {
        let Some(default) = &variable.default_value else {
            return;
        };
        let ty = TypeRef::from(&variable.var_type);
        if !ctx.schema.is_input_type(&ty) {
            return;
        }

        if let Err(error) = coerce_literal(ctx.schema, &ty, default, None) {
            errors.report_error(ValidationError {
                locations: vec![variable.position],
                message: format!(
                    "Variable \"${}\" has invalid default value {}. {}",
                    variable.name, default, error
                ),
                error_code: "VALUES_OF_CORRECT_TYPE",
            });
        }
    }
}

impl ValidationRule for ValuesOfCorrectType {
    fn error_code<'a>(&self) -> &'a str {
        "VALUES_OF_CORRECT_TYPE"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::ARGUMENT | NodeKinds::VARIABLE_DEFINITION
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(ValuesOfCorrectType)
    }
}

#[cfg(test)]
mod tests {
    use super::ValuesOfCorrectType;
    use crate::tests::testkit::validate_rule;

    #[test]
    fn valid_literals_and_variables() {
        let errors = validate_rule(
            ValuesOfCorrectType::new(),
            "query Q($i: Int!, $c: FurColor = BROWN) {
               complicatedArgs {
                 intArgField(intArg: 2)
                 nonNullIntArgField(nonNullIntArg: $i)
                 stringListArgField(stringListArg: \"single\")
                 enumArgField(enumArg: $c)
                 complexArgField(complexArg: { requiredField: true, stringListField: [\"a\", $s] })
               }
             }",
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn unknown_enum_value() {
        let errors = validate_rule(
            ValuesOfCorrectType::new(),
            "{ complicatedArgs { enumArgField(enumArg: PURPLE) } }",
        );
        assert_eq!(
            errors,
            vec!["Argument \"enumArg\" has invalid value PURPLE. Value \"PURPLE\" does not exist in \"FurColor\" enum."]
        );
    }

    #[test]
    fn null_for_non_null_argument() {
        let errors = validate_rule(
            ValuesOfCorrectType::new(),
            "{ complicatedArgs { nonNullIntArgField(nonNullIntArg: null) } }",
        );
        assert_eq!(
            errors,
            vec!["Argument \"nonNullIntArg\" has invalid value null. Expected value of type \"Int!\", found null."]
        );
    }

    #[test]
    fn missing_required_input_field_and_bad_default() {
        let errors = validate_rule(
            ValuesOfCorrectType::new(),
            "query Q($c: FurColor = PINK) { complicatedArgs { complexArgField(complexArg: { intField: 4 }) } }",
        );
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("Variable \"$c\" has invalid default value PINK."));
        assert!(errors[1].ends_with(
            "Field \"ComplexInput.requiredField\" of required type \"Boolean!\" was not provided."
        ));
    }
}
