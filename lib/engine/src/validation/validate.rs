use hive_graphql_engine_config::validation::ValidationConfig;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::ast::query::{Document, OperationDefinition};
use crate::coercion::variables::{collect_variables, Variables};
use crate::response::graphql_error::GraphQLError;
use crate::schema::registry::TypeRegistry;
use crate::validation::rules::ValidationRule;
use crate::validation::utils::ValidationError;
use crate::validation::visitor::{OperationVisitorContext, Traversal};

/// An ordered set of rules, run together over a single traversal.
pub struct ValidationPlan {
    pub rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidationPlan {
    pub fn new() -> Self {
        Self { rules: vec![] }
    }

    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    /// Drops the rules disabled by configuration. A disabled validator keeps no rule at all.
    pub fn configured(mut self, config: &ValidationConfig) -> Self {
        if !config.enabled {
            self.rules.clear();
            return self;
        }
        self.rules
            .retain(|rule| config.is_rule_enabled(rule.error_code()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for ValidationPlan {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<Box<dyn ValidationRule>>> for ValidationPlan {
    fn from(rules: Vec<Box<dyn ValidationRule>>) -> Self {
        Self { rules }
    }
}

#[instrument(level = "trace", skip_all, fields(rules = validation_plan.rules.len()))]
pub fn validate(
    schema: &TypeRegistry,
    document: &Document,
    validation_plan: &ValidationPlan,
) -> Vec<ValidationError> {
    if validation_plan.is_empty() {
        return vec![];
    }

    let context = OperationVisitorContext::new(document, schema);
    let visitors = validation_plan
        .rules
        .iter()
        .map(|rule| (rule.interests(), rule.visitor()))
        .collect();

    let errors = Traversal::new(context, visitors).run(document).errors;
    debug!(errors = errors.len(), "document validated");
    errors
}

/// Result of validating a request: errors, or the coerced variables of the operation.
#[derive(Debug)]
pub struct ValidationOutcome {
    pub errors: Vec<GraphQLError>,
    pub variables: Variables,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validates the document, then coerces the selected operation's variables.
/// Variables are only coerced once every rule passed.
pub fn validate_request(
    schema: &TypeRegistry,
    document: &Document,
    operation: &OperationDefinition,
    variables: Option<&Map<String, Value>>,
    validation_plan: &ValidationPlan,
) -> ValidationOutcome {
    let errors = validate(schema, document, validation_plan);
    if !errors.is_empty() {
        return ValidationOutcome {
            errors: errors.into_iter().map(GraphQLError::from).collect(),
            variables: Variables::default(),
        };
    }

    match collect_variables(schema, operation, variables) {
        Ok(variables) => ValidationOutcome {
            errors: vec![],
            variables,
        },
        Err(errors) => ValidationOutcome {
            errors,
            variables: Variables::default(),
        },
    }
}
