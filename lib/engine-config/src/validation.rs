use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Enables/disables document validation before execution.
    ///
    /// Variables are still coerced when validation is disabled.
    #[serde(default = "default_validation_enabled")]
    pub enabled: bool,

    /// A list of validation rule error codes to skip, for example `NO_UNUSED_FRAGMENTS`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled_rules: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: default_validation_enabled(),
            disabled_rules: vec![],
        }
    }
}

impl ValidationConfig {
    pub fn is_rule_enabled(&self, error_code: &str) -> bool {
        !self
            .disabled_rules
            .iter()
            .any(|disabled| disabled.eq_ignore_ascii_case(error_code))
    }
}

fn default_validation_enabled() -> bool {
    true
}
