use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use indexmap::IndexMap;

use super::ValidationRule;
use crate::ast::query::{Field, FragmentDefinition, Selection, SelectionSet, TypeCondition, Value};
use crate::ast::FieldExt;
use crate::schema::registry::TypeRegistry;
use crate::schema::types::{FieldDefinition, NamedType, TypeRef};
use crate::validation::utils::{ValidationError, ValidationErrorContext};
use crate::validation::visitor::{
    type_condition_name, NodeKinds, OperationVisitor, OperationVisitorContext,
};

/// Overlapping fields can be merged
///
/// A selection set is only valid if all fields (including spreading any
/// fragments) either correspond to distinct response names or can be merged
/// without ambiguity.
///
/// See https://spec.graphql.org/draft/#sec-Field-Selection-Merging
pub struct OverlappingFieldsCanBeMerged;

impl OverlappingFieldsCanBeMerged {
    pub fn new() -> Self {
        OverlappingFieldsCanBeMerged
    }
}

impl Default for OverlappingFieldsCanBeMerged {
    fn default() -> Self {
        Self::new()
    }
}

/// A field occurrence with the type it was selected on.
type FieldEntry<'a> = (Option<&'a NamedType>, &'a Field, Option<&'a FieldDefinition>);
type FieldMap<'a> = IndexMap<&'a str, Vec<FieldEntry<'a>>>;
type FieldsAndFragmentNames<'a> = (Rc<FieldMap<'a>>, Rc<Vec<&'a str>>);

#[derive(Debug, Clone)]
enum ConflictMessage {
    Reason(String),
    Nested(Vec<ConflictReason>),
}

#[derive(Debug, Clone)]
struct ConflictReason {
    response_name: String,
    message: ConflictMessage,
}

struct Conflict<'a> {
    reason: ConflictReason,
    fields1: Vec<&'a Field>,
    fields2: Vec<&'a Field>,
}

impl<'a> Conflict<'a> {
    fn new(response_name: &str, reason: String, field1: &'a Field, field2: &'a Field) -> Self {
        Conflict {
            reason: ConflictReason {
                response_name: response_name.to_string(),
                message: ConflictMessage::Reason(reason),
            },
            fields1: vec![field1],
            fields2: vec![field2],
        }
    }
}

fn reason_message(message: &ConflictMessage) -> String {
    match message {
        ConflictMessage::Reason(reason) => reason.clone(),
        ConflictMessage::Nested(reasons) => reasons
            .iter()
            .map(|reason| {
                format!(
                    "subfields \"{}\" conflict because {}",
                    reason.response_name,
                    reason_message(&reason.message)
                )
            })
            .collect::<Vec<_>>()
            .join(" and "),
    }
}

/// Unordered pairs of fragment names that were already compared, remembering whether the
/// comparison assumed mutually exclusive parents.
#[derive(Default)]
struct PairSet<'a> {
    data: HashMap<(&'a str, &'a str), bool>,
}

impl<'a> PairSet<'a> {
    fn key(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    }

    fn contains(&self, a: &'a str, b: &'a str, mutually_exclusive: bool) -> bool {
        match self.data.get(&Self::key(a, b)) {
            None => false,
            // Any earlier comparison covers the mutually exclusive case.
            Some(_) if mutually_exclusive => true,
            Some(stored) => !*stored,
        }
    }

    fn insert(&mut self, a: &'a str, b: &'a str, mutually_exclusive: bool) {
        self.data.insert(Self::key(a, b), mutually_exclusive);
    }
}

fn same_arguments(arguments1: &[(String, Value)], arguments2: &[(String, Value)]) -> bool {
    arguments1.len() == arguments2.len()
        && arguments1.iter().all(|(name, value)| {
            arguments2
                .iter()
                .find(|(other, _)| other == name)
                .is_some_and(|(_, other)| other.to_string() == value.to_string())
        })
}

/// Two types conflict when their list and non-null wrappers differ, or when either is a leaf
/// and they are not the same type.
fn do_types_conflict(registry: &TypeRegistry, type1: &TypeRef, type2: &TypeRef) -> bool {
    match (type1, type2) {
        (TypeRef::List(item1), TypeRef::List(item2)) => do_types_conflict(registry, item1, item2),
        (TypeRef::List(_), _) | (_, TypeRef::List(_)) => true,
        (TypeRef::NonNull(inner1), TypeRef::NonNull(inner2)) => {
            do_types_conflict(registry, inner1, inner2)
        }
        (TypeRef::NonNull(_), _) | (_, TypeRef::NonNull(_)) => true,
        _ => {
            let is_leaf = |ty: &TypeRef| registry.resolve(ty).is_some_and(NamedType::is_leaf);
            if is_leaf(type1) || is_leaf(type2) {
                type1.type_name() != type2.type_name()
            } else {
                false
            }
        }
    }
}

fn collect_fields_and_fragment_names<'a>(
    ctx: &OperationVisitorContext<'a>,
    parent_type: Option<&'a NamedType>,
    selection_set: &'a SelectionSet,
    fields: &mut FieldMap<'a>,
    fragment_names: &mut Vec<&'a str>,
) {
    for selection in &selection_set.items {
        match selection {
            Selection::Field(field) => {
                let schema = ctx.schema;
                let definition =
                    parent_type.and_then(|parent| schema.field_definition(parent, &field.name));
                fields
                    .entry(field.response_name())
                    .or_default()
                    .push((parent_type, field, definition));
            }
            Selection::FragmentSpread(spread) => {
                if !fragment_names.contains(&spread.fragment_name.as_str()) {
                    fragment_names.push(&spread.fragment_name);
                }
            }
            Selection::InlineFragment(fragment) => {
                let condition_type = match &fragment.type_condition {
                    Some(TypeCondition::On(name)) => ctx.schema.lookup(name),
                    None => parent_type,
                };
                collect_fields_and_fragment_names(
                    ctx,
                    condition_type,
                    &fragment.selection_set,
                    fields,
                    fragment_names,
                );
            }
        }
    }
}

#[derive(Default)]
struct OverlappingFieldsCanBeMergedVisitor<'a> {
    /// Fields and fragment names per selection set, keyed by node address. A selection set is
    /// reached again every time a fragment containing it is compared.
    cached_fields_and_fragment_names: HashMap<*const SelectionSet, FieldsAndFragmentNames<'a>>,
    compared_fragment_pairs: PairSet<'a>,
    compared_fields_and_fragments: HashSet<(*const FieldMap<'a>, &'a str, bool)>,
}

impl<'a> OverlappingFieldsCanBeMergedVisitor<'a> {
    fn fields_and_fragment_names(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        parent_type: Option<&'a NamedType>,
        selection_set: &'a SelectionSet,
    ) -> FieldsAndFragmentNames<'a> {
        let key = selection_set as *const SelectionSet;
        if let Some((fields, fragment_names)) = self.cached_fields_and_fragment_names.get(&key) {
            return (fields.clone(), fragment_names.clone());
        }

        let mut fields = FieldMap::new();
        let mut fragment_names = vec![];
        collect_fields_and_fragment_names(
            ctx,
            parent_type,
            selection_set,
            &mut fields,
            &mut fragment_names,
        );

        let entry = (Rc::new(fields), Rc::new(fragment_names));
        self.cached_fields_and_fragment_names
            .insert(key, (entry.0.clone(), entry.1.clone()));
        entry
    }

    fn referenced_fields_and_fragment_names(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        fragment: &'a FragmentDefinition,
    ) -> FieldsAndFragmentNames<'a> {
        let condition_type = ctx
            .schema
            .lookup(type_condition_name(&fragment.type_condition));
        self.fields_and_fragment_names(ctx, condition_type, &fragment.selection_set)
    }

    fn find_conflicts_within_selection_set(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        parent_type: Option<&'a NamedType>,
        selection_set: &'a SelectionSet,
    ) -> Vec<Conflict<'a>> {
        let mut conflicts = vec![];
        let (fields, fragment_names) = self.fields_and_fragment_names(ctx, parent_type, selection_set);

        self.collect_conflicts_within(ctx, &mut conflicts, &fields);

        for (index, &fragment_name) in fragment_names.iter().enumerate() {
            self.collect_conflicts_between_fields_and_fragment(
                ctx,
                &mut conflicts,
                false,
                &fields,
                fragment_name,
            );
            for &other_fragment_name in &fragment_names[index + 1..] {
                self.collect_conflicts_between_fragments(
                    ctx,
                    &mut conflicts,
                    false,
                    fragment_name,
                    other_fragment_name,
                );
            }
        }

        conflicts
    }

    fn collect_conflicts_between_fields_and_fragment(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        conflicts: &mut Vec<Conflict<'a>>,
        mutually_exclusive: bool,
        fields: &Rc<FieldMap<'a>>,
        fragment_name: &'a str,
    ) {
        if !self.compared_fields_and_fragments.insert((
            Rc::as_ptr(fields),
            fragment_name,
            mutually_exclusive,
        )) {
            return;
        }

        let Some(fragment) = ctx.known_fragments.get(fragment_name).copied() else {
            return;
        };
        let (fragment_fields, fragment_names) =
            self.referenced_fields_and_fragment_names(ctx, fragment);

        // A fragment spread within its own selection set is compared by the caller.
        if Rc::ptr_eq(fields, &fragment_fields) {
            return;
        }

        self.collect_conflicts_between(ctx, conflicts, mutually_exclusive, fields, &fragment_fields);

        for &nested_fragment_name in fragment_names.iter() {
            self.collect_conflicts_between_fields_and_fragment(
                ctx,
                conflicts,
                mutually_exclusive,
                fields,
                nested_fragment_name,
            );
        }
    }

    fn collect_conflicts_between_fragments(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        conflicts: &mut Vec<Conflict<'a>>,
        mutually_exclusive: bool,
        fragment_name1: &'a str,
        fragment_name2: &'a str,
    ) {
        if fragment_name1 == fragment_name2 {
            return;
        }
        if self
            .compared_fragment_pairs
            .contains(fragment_name1, fragment_name2, mutually_exclusive)
        {
            return;
        }
        self.compared_fragment_pairs
            .insert(fragment_name1, fragment_name2, mutually_exclusive);

        let (Some(fragment1), Some(fragment2)) = (
            ctx.known_fragments.get(fragment_name1).copied(),
            ctx.known_fragments.get(fragment_name2).copied(),
        ) else {
            return;
        };

        let (fields1, fragment_names1) = self.referenced_fields_and_fragment_names(ctx, fragment1);
        let (fields2, fragment_names2) = self.referenced_fields_and_fragment_names(ctx, fragment2);

        self.collect_conflicts_between(ctx, conflicts, mutually_exclusive, &fields1, &fields2);

        for &nested in fragment_names2.iter() {
            self.collect_conflicts_between_fragments(
                ctx,
                conflicts,
                mutually_exclusive,
                fragment_name1,
                nested,
            );
        }
        for &nested in fragment_names1.iter() {
            self.collect_conflicts_between_fragments(
                ctx,
                conflicts,
                mutually_exclusive,
                nested,
                fragment_name2,
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn find_conflicts_between_sub_selection_sets(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        mutually_exclusive: bool,
        parent_type1: Option<&'a NamedType>,
        selection_set1: &'a SelectionSet,
        parent_type2: Option<&'a NamedType>,
        selection_set2: &'a SelectionSet,
    ) -> Vec<Conflict<'a>> {
        let mut conflicts = vec![];

        let (fields1, fragment_names1) =
            self.fields_and_fragment_names(ctx, parent_type1, selection_set1);
        let (fields2, fragment_names2) =
            self.fields_and_fragment_names(ctx, parent_type2, selection_set2);

        self.collect_conflicts_between(ctx, &mut conflicts, mutually_exclusive, &fields1, &fields2);

        for &fragment_name in fragment_names2.iter() {
            self.collect_conflicts_between_fields_and_fragment(
                ctx,
                &mut conflicts,
                mutually_exclusive,
                &fields1,
                fragment_name,
            );
        }
        for &fragment_name in fragment_names1.iter() {
            self.collect_conflicts_between_fields_and_fragment(
                ctx,
                &mut conflicts,
                mutually_exclusive,
                &fields2,
                fragment_name,
            );
        }
        for &fragment_name1 in fragment_names1.iter() {
            for &fragment_name2 in fragment_names2.iter() {
                self.collect_conflicts_between_fragments(
                    ctx,
                    &mut conflicts,
                    mutually_exclusive,
                    fragment_name1,
                    fragment_name2,
                );
            }
        }

        conflicts
    }

    fn collect_conflicts_within(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        conflicts: &mut Vec<Conflict<'a>>,
        fields: &FieldMap<'a>,
    ) {
        for (response_name, entries) in fields {
            for (index, first) in entries.iter().enumerate() {
                for second in &entries[index + 1..] {
                    if let Some(conflict) =
                        self.find_conflict(ctx, false, response_name, *first, *second)
                    {
                        conflicts.push(conflict);
                    }
                }
            }
        }
    }

    fn collect_conflicts_between(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        conflicts: &mut Vec<Conflict<'a>>,
        mutually_exclusive: bool,
        fields1: &FieldMap<'a>,
        fields2: &FieldMap<'a>,
    ) {
        for (response_name, entries1) in fields1 {
            let Some(entries2) = fields2.get(response_name) else {
                continue;
            };
            for first in entries1 {
                for second in entries2 {
                    if let Some(conflict) =
                        self.find_conflict(ctx, mutually_exclusive, response_name, *first, *second)
                    {
                        conflicts.push(conflict);
                    }
                }
            }
        }
    }

    fn find_conflict(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        parent_fields_are_mutually_exclusive: bool,
        response_name: &str,
        (parent_type1, field1, definition1): FieldEntry<'a>,
        (parent_type2, field2, definition2): FieldEntry<'a>,
    ) -> Option<Conflict<'a>> {
        // Fields selected on two different object types can never apply to the same object.
        let mutually_exclusive = parent_fields_are_mutually_exclusive
            || match (parent_type1, parent_type2) {
                (Some(parent1), Some(parent2)) => {
                    parent1.name() != parent2.name()
                        && parent1.as_object().is_some()
                        && parent2.as_object().is_some()
                }
                _ => false,
            };

        if !mutually_exclusive {
            if field1.name != field2.name {
                return Some(Conflict::new(
                    response_name,
                    format!(
                        "\"{}\" and \"{}\" are different fields",
                        field1.name, field2.name
                    ),
                    field1,
                    field2,
                ));
            }

            if !same_arguments(&field1.arguments, &field2.arguments) {
                return Some(Conflict::new(
                    response_name,
                    "they have differing arguments".to_string(),
                    field1,
                    field2,
                ));
            }
        }

        let type1 = definition1.map(|definition| &definition.ty);
        let type2 = definition2.map(|definition| &definition.ty);

        if let (Some(type1), Some(type2)) = (type1, type2) {
            if do_types_conflict(ctx.schema, type1, type2) {
                return Some(Conflict::new(
                    response_name,
                    format!("they return conflicting types \"{}\" and \"{}\"", type1, type2),
                    field1,
                    field2,
                ));
            }
        }

        if field1.selection_set.items.is_empty() || field2.selection_set.items.is_empty() {
            return None;
        }

        let schema = ctx.schema;
        let conflicts = self.find_conflicts_between_sub_selection_sets(
            ctx,
            mutually_exclusive,
            type1.and_then(|ty| schema.resolve(ty)),
            &field1.selection_set,
            type2.and_then(|ty| schema.resolve(ty)),
            &field2.selection_set,
        );

        if conflicts.is_empty() {
            return None;
        }

        Some(Conflict {
            reason: ConflictReason {
                response_name: response_name.to_string(),
                message: ConflictMessage::Nested(
                    conflicts.iter().map(|conflict| conflict.reason.clone()).collect(),
                ),
            },
            fields1: std::iter::once(field1)
                .chain(conflicts.iter().flat_map(|conflict| conflict.fields1.iter().copied()))
                .collect(),
            fields2: std::iter::once(field2)
                .chain(conflicts.iter().flat_map(|conflict| conflict.fields2.iter().copied()))
                .collect(),
        })
    }
}

impl<'a> OperationVisitor<'a> for OverlappingFieldsCanBeMergedVisitor<'a> {
    fn enter_selection_set(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        selection_set: &'a SelectionSet,
    ) {
        let parent_type = ctx.current_parent_type();

        for conflict in self.find_conflicts_within_selection_set(ctx, parent_type, selection_set) {
            errors.report_error(ValidationError {
                locations: conflict
                    .fields1
                    .iter()
                    .chain(conflict.fields2.iter())
                    .map(|field| field.position)
                    .collect(),
                message: format!(
                    "Fields \"{}\" conflict because {}. Use different aliases on the fields to fetch both if this was intentional.",
                    conflict.reason.response_name,
                    reason_message(&conflict.reason.message)
                ),
                error_code: "OVERLAPPING_FIELDS_CAN_BE_MERGED",
            });
        }
    }
}

impl ValidationRule for OverlappingFieldsCanBeMerged {
    fn error_code<'a>(&self) -> &'a str {
        "OVERLAPPING_FIELDS_CAN_BE_MERGED"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::SELECTION_SET
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(OverlappingFieldsCanBeMergedVisitor::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{do_types_conflict, PairSet};
    use crate::schema::types::TypeRef;
    use crate::tests::testkit::validation_registry;

    #[test]
    fn pair_set_respects_exclusivity() {
        let mut pairs = PairSet::default();
        pairs.insert("A", "B", true);

        assert!(pairs.contains("B", "A", true));
        assert!(!pairs.contains("A", "B", false));

        pairs.insert("A", "B", false);
        assert!(pairs.contains("A", "B", false));
        assert!(pairs.contains("A", "B", true));
    }

    #[test]
    fn wrapping_must_match_in_lockstep() {
        let registry = validation_registry();

        assert!(!do_types_conflict(
            &registry,
            &TypeRef::named_nn_list_nn("String"),
            &TypeRef::named_nn_list_nn("String"),
        ));
        assert!(do_types_conflict(
            &registry,
            &TypeRef::named_list("String"),
            &TypeRef::named("String"),
        ));
        assert!(do_types_conflict(
            &registry,
            &TypeRef::named_nn("Int"),
            &TypeRef::named("Int"),
        ));
        assert!(do_types_conflict(
            &registry,
            &TypeRef::named("Int"),
            &TypeRef::named("String"),
        ));
        assert!(!do_types_conflict(
            &registry,
            &TypeRef::named("Dog"),
            &TypeRef::named("Cat"),
        ));
    }
}
