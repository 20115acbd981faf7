use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::Value;

use crate::ast::query::{Directive, Field, Selection, SelectionSet, TypeCondition};
use crate::ast::FieldExt;
use crate::coercion::value_from_ast::value_from_ast;
use crate::execution::context::ExecutionContext;
use crate::schema::types::NamedType;

/// Groups the fields selected on `object_type_name` by response name, in document order.
///
/// Fragments are inlined when their type condition applies to the object type, and selections
/// excluded by `@skip` or `@include` are left out. Fields sharing a response name are merged, so
/// their sub-selections are executed together.
pub fn collect_fields<'a>(
    ctx: &'a ExecutionContext,
    object_type_name: &str,
    selection_sets: impl IntoIterator<Item = &'a SelectionSet>,
) -> IndexMap<&'a str, Vec<&'a Field>> {
    let mut collected = IndexMap::new();
    let mut visited_fragments = HashSet::new();

    for selection_set in selection_sets {
        collect_into(
            ctx,
            object_type_name,
            selection_set,
            &mut collected,
            &mut visited_fragments,
        );
    }

    collected
}

fn collect_into<'a>(
    ctx: &'a ExecutionContext,
    object_type_name: &str,
    selection_set: &'a SelectionSet,
    collected: &mut IndexMap<&'a str, Vec<&'a Field>>,
    visited_fragments: &mut HashSet<&'a str>,
) {
    for selection in &selection_set.items {
        match selection {
            Selection::Field(field) => {
                if should_include(ctx, &field.directives) {
                    collected
                        .entry(field.response_name())
                        .or_default()
                        .push(field);
                }
            }
            Selection::InlineFragment(fragment) => {
                if !should_include(ctx, &fragment.directives) {
                    continue;
                }
                if let Some(condition) = &fragment.type_condition {
                    if !does_condition_match(ctx, condition, object_type_name) {
                        continue;
                    }
                }
                collect_into(
                    ctx,
                    object_type_name,
                    &fragment.selection_set,
                    collected,
                    visited_fragments,
                );
            }
            Selection::FragmentSpread(spread) => {
                if !should_include(ctx, &spread.directives)
                    || !visited_fragments.insert(spread.fragment_name.as_str())
                {
                    continue;
                }
                let Some(fragment) = ctx.fragment(&spread.fragment_name) else {
                    continue;
                };
                if !does_condition_match(ctx, &fragment.type_condition, object_type_name) {
                    continue;
                }
                collect_into(
                    ctx,
                    object_type_name,
                    &fragment.selection_set,
                    collected,
                    visited_fragments,
                );
            }
        }
    }
}

/// Evaluates `@skip(if:)` and `@include(if:)` against the request variables.
pub(crate) fn should_include(ctx: &ExecutionContext, directives: &[Directive]) -> bool {
    let condition = |name: &str| {
        directives
            .iter()
            .find(|directive| directive.name == name)
            .and_then(|directive| {
                directive
                    .arguments
                    .iter()
                    .find(|(argument, _)| argument == "if")
            })
            .and_then(|(_, value)| value_from_ast(value, Some(&*ctx.variables)).ok())
    };

    if let Some(Value::Bool(true)) = condition("skip") {
        return false;
    }
    !matches!(condition("include"), Some(Value::Bool(false)))
}

fn does_condition_match(
    ctx: &ExecutionContext,
    condition: &TypeCondition,
    object_type_name: &str,
) -> bool {
    let TypeCondition::On(name) = condition;
    if name == object_type_name {
        return true;
    }

    match ctx.registry.lookup(name) {
        Some(named @ (NamedType::Interface(_) | NamedType::Union(_))) => {
            ctx.registry.is_possible_type(named, object_type_name)
        }
        _ => false,
    }
}
