pub mod defaults;

pub use self::defaults::default_rules_validation_plan;

pub mod fields_on_correct_type;
pub mod fragments_on_composite_types;
pub mod known_argument_names;
pub mod known_directives;
pub mod known_fragment_names;
pub mod known_type_names;
pub mod leaf_field_selections;
pub mod lone_anonymous_operation;
pub mod no_fragment_cycles;
pub mod no_undefined_variables;
pub mod no_unused_fragments;
pub mod no_unused_variables;
pub mod overlapping_fields_can_be_merged;
pub mod possible_fragment_spreads;
pub mod provided_required_arguments;
pub mod single_field_subscriptions;
pub mod unique_argument_names;
pub mod unique_directives_per_location;
pub mod unique_fragment_names;
pub mod unique_operation_names;
pub mod unique_variable_names;
pub mod values_of_correct_type;
pub mod variables_are_input_types;
pub mod variables_in_allowed_position;

pub use self::fields_on_correct_type::*;
pub use self::fragments_on_composite_types::*;
pub use self::known_argument_names::*;
pub use self::known_directives::*;
pub use self::known_fragment_names::*;
pub use self::known_type_names::*;
pub use self::leaf_field_selections::*;
pub use self::lone_anonymous_operation::*;
pub use self::no_fragment_cycles::*;
pub use self::no_undefined_variables::*;
pub use self::no_unused_fragments::*;
pub use self::no_unused_variables::*;
pub use self::overlapping_fields_can_be_merged::*;
pub use self::possible_fragment_spreads::*;
pub use self::provided_required_arguments::*;
pub use self::single_field_subscriptions::*;
pub use self::unique_argument_names::*;
pub use self::unique_directives_per_location::*;
pub use self::unique_fragment_names::*;
pub use self::unique_operation_names::*;
pub use self::unique_variable_names::*;
pub use self::values_of_correct_type::*;
pub use self::variables_are_input_types::*;
pub use self::variables_in_allowed_position::*;

use crate::validation::visitor::{NodeKinds, OperationVisitor};

/// A validation rule. Rules never run on their own: a [`ValidationPlan`] gathers the visitors
/// of all its rules and drives them through one traversal of the document.
///
/// [`ValidationPlan`]: crate::validation::validate::ValidationPlan
pub trait ValidationRule: Send + Sync {
    fn error_code<'a>(&self) -> &'a str;

    /// The node kinds this rule's visitor is called for.
    fn interests(&self) -> NodeKinds;

    /// Fresh per-validation state of the rule.
    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a>;
}
