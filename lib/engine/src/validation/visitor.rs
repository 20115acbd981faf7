use std::collections::HashMap;

use bitflags::bitflags;
use graphql_parser::query::TypeCondition;
use graphql_parser::Pos;

use crate::ast::query::{
    Definition, Directive, Document, Field, FragmentDefinition, FragmentSpread, InlineFragment,
    OperationDefinition, Selection, SelectionSet, Value, VariableDefinition,
};
use crate::ast::{OperationDefinitionExt, OperationKind};
use crate::schema::directives::{DirectiveDefinition, DirectiveLocation};
use crate::schema::registry::TypeRegistry;
use crate::schema::types::{FieldDefinition, InputValueDefinition, NamedType, TypeRef};
use crate::validation::utils::ValidationErrorContext;

bitflags! {
    /// Node kinds a rule wants to be called for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NodeKinds: u16 {
        const DOCUMENT = 1 << 0;
        const OPERATION_DEFINITION = 1 << 1;
        const FRAGMENT_DEFINITION = 1 << 2;
        const VARIABLE_DEFINITION = 1 << 3;
        const SELECTION_SET = 1 << 4;
        const FIELD = 1 << 5;
        const FRAGMENT_SPREAD = 1 << 6;
        const INLINE_FRAGMENT = 1 << 7;
        const DIRECTIVE = 1 << 8;
        const ARGUMENT = 1 << 9;
        const VALUE = 1 << 10;
    }
}

const KIND_COUNT: usize = 11;

fn slot(kind: NodeKinds) -> usize {
    kind.bits().trailing_zeros() as usize
}

/// Per-node hooks of a rule. Every hook defaults to a no-op; a rule only gets called for the
/// kinds it declared in [`ValidationRule::interests`](crate::validation::rules::ValidationRule).
#[allow(unused_variables)]
pub trait OperationVisitor<'a> {
    fn enter_document(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        document: &'a Document,
    ) {
    }
    fn leave_document(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        document: &'a Document,
    ) {
    }

    fn enter_operation_definition(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        operation: &'a OperationDefinition,
    ) {
    }
    fn leave_operation_definition(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        operation: &'a OperationDefinition,
    ) {
    }

    fn enter_fragment_definition(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        fragment: &'a FragmentDefinition,
    ) {
    }
    fn leave_fragment_definition(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        fragment: &'a FragmentDefinition,
    ) {
    }

    fn enter_variable_definition(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        variable: &'a VariableDefinition,
    ) {
    }

    fn enter_selection_set(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        selection_set: &'a SelectionSet,
    ) {
    }
    fn leave_selection_set(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        selection_set: &'a SelectionSet,
    ) {
    }

    fn enter_field(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        field: &'a Field,
    ) {
    }
    fn leave_field(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        field: &'a Field,
    ) {
    }

    fn enter_fragment_spread(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        spread: &'a FragmentSpread,
    ) {
    }

    fn enter_inline_fragment(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        fragment: &'a InlineFragment,
    ) {
    }
    fn leave_inline_fragment(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        fragment: &'a InlineFragment,
    ) {
    }

    /// Called for every directive, together with where it is applied. `directives` holds all
    /// directives of the annotated node.
    fn enter_directive(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        directive: &'a Directive,
        location: DirectiveLocation,
    ) {
    }

    /// Called once per node with arguments (a field or a directive), before its arguments are
    /// visited one by one.
    fn enter_arguments(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        arguments: &'a [(String, Value)],
    ) {
    }

    fn enter_argument(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        name: &'a str,
        value: &'a Value,
    ) {
    }

    /// Called for every value node, nested list items and object fields included.
    fn enter_value(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        value: &'a Value,
    ) {
    }
}

/// Type information for the node being visited, maintained by the traversal as it enters and
/// leaves nodes.
pub struct OperationVisitorContext<'a> {
    pub schema: &'a TypeRegistry,
    pub operation: &'a Document,
    pub known_fragments: HashMap<&'a str, &'a FragmentDefinition>,

    type_stack: Vec<Option<TypeRef>>,
    parent_type_stack: Vec<Option<&'a NamedType>>,
    field_stack: Vec<Option<&'a FieldDefinition>>,
    input_type_stack: Vec<Option<TypeRef>>,
    input_value_stack: Vec<Option<&'a InputValueDefinition>>,
    position_stack: Vec<Pos>,
    directive: Option<&'a DirectiveDefinition>,
    argument_owner: Option<&'a indexmap::IndexMap<String, InputValueDefinition>>,
}

impl<'a> OperationVisitorContext<'a> {
    pub fn new(document: &'a Document, schema: &'a TypeRegistry) -> Self {
        let known_fragments = document
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                Definition::Fragment(fragment) => Some((fragment.name.as_str(), fragment)),
                Definition::Operation(_) => None,
            })
            .collect();

        OperationVisitorContext {
            schema,
            operation: document,
            known_fragments,
            type_stack: vec![],
            parent_type_stack: vec![],
            field_stack: vec![],
            input_type_stack: vec![],
            input_value_stack: vec![],
            position_stack: vec![],
            directive: None,
            argument_owner: None,
        }
    }

    /// Output type of the current node: the root type inside an operation, the type condition
    /// inside a fragment, the field type inside a field.
    pub fn current_type(&self) -> Option<&TypeRef> {
        self.type_stack.last().and_then(Option::as_ref)
    }

    pub fn current_named_type(&self) -> Option<&'a NamedType> {
        let schema = self.schema;
        self.current_type().and_then(|ty| schema.resolve(ty))
    }

    /// The composite type whose fields are being selected.
    pub fn current_parent_type(&self) -> Option<&'a NamedType> {
        self.parent_type_stack.last().copied().flatten()
    }

    pub fn current_field(&self) -> Option<&'a FieldDefinition> {
        self.field_stack.last().copied().flatten()
    }

    /// The expected type of the input value being visited.
    pub fn current_input_type(&self) -> Option<&TypeRef> {
        self.input_type_stack.last().and_then(Option::as_ref)
    }

    /// The argument or input field definition the current value was written for. `None` for
    /// list items and unknown names.
    pub fn current_input_value(&self) -> Option<&'a InputValueDefinition> {
        self.input_value_stack.last().copied().flatten()
    }

    pub fn current_directive(&self) -> Option<&'a DirectiveDefinition> {
        self.directive
    }

    /// Argument definitions of the field or directive whose arguments are being visited.
    pub fn current_argument_definitions(
        &self,
    ) -> Option<&'a indexmap::IndexMap<String, InputValueDefinition>> {
        self.argument_owner
    }

    /// Position of the closest enclosing node that carries one.
    pub fn current_position(&self) -> Pos {
        self.position_stack
            .last()
            .copied()
            .unwrap_or(Pos { line: 0, column: 0 })
    }

    fn output_type(&self, ty: TypeRef) -> Option<TypeRef> {
        self.schema.is_output_type(&ty).then_some(ty)
    }

    fn type_condition(&self, condition: &Option<TypeCondition<'static, String>>) -> Option<TypeRef> {
        match condition {
            Some(TypeCondition::On(name)) => self.output_type(TypeRef::named(name.as_str())),
            None => self.current_type().cloned(),
        }
    }
}

/// Drives all rule visitors through one depth-first walk of a document.
pub struct Traversal<'a> {
    context: OperationVisitorContext<'a>,
    visitors: Vec<Box<dyn OperationVisitor<'a> + 'a>>,
    dispatch: [Vec<usize>; KIND_COUNT],
    errors: ValidationErrorContext,
}

macro_rules! dispatch {
    ($traversal:ident, $kind:ident, $hook:ident ( $($arg:expr),* )) => {
        for &index in &$traversal.dispatch[slot(NodeKinds::$kind)] {
            $traversal.visitors[index].$hook(&$traversal.context, &mut $traversal.errors, $($arg),*);
        }
    };
}

impl<'a> Traversal<'a> {
    pub fn new(
        context: OperationVisitorContext<'a>,
        visitors: Vec<(NodeKinds, Box<dyn OperationVisitor<'a> + 'a>)>,
    ) -> Self {
        let mut dispatch: [Vec<usize>; KIND_COUNT] = Default::default();
        let mut boxed = Vec::with_capacity(visitors.len());

        for (index, (interests, visitor)) in visitors.into_iter().enumerate() {
            for kind in interests.iter() {
                dispatch[slot(kind)].push(index);
            }
            boxed.push(visitor);
        }

        Traversal {
            context,
            visitors: boxed,
            dispatch,
            errors: ValidationErrorContext::new(),
        }
    }

    pub fn run(mut self, document: &'a Document) -> ValidationErrorContext {
        dispatch!(self, DOCUMENT, enter_document(document));
        for definition in &document.definitions {
            match definition {
                Definition::Operation(operation) => self.visit_operation(operation),
                Definition::Fragment(fragment) => self.visit_fragment_definition(fragment),
            }
        }
        dispatch!(self, DOCUMENT, leave_document(document));
        self.errors
    }

    fn visit_operation(&mut self, operation: &'a OperationDefinition) {
        let root = self
            .context
            .schema
            .root_type(operation.kind())
            .map(|root| TypeRef::named(root.name.as_str()));
        self.context.type_stack.push(root);
        self.context.position_stack.push(operation.position());

        dispatch!(self, OPERATION_DEFINITION, enter_operation_definition(operation));
        for variable in operation.variable_definitions() {
            self.visit_variable_definition(variable);
        }
        let location = match operation.kind() {
            OperationKind::Query => DirectiveLocation::Query,
            OperationKind::Mutation => DirectiveLocation::Mutation,
            OperationKind::Subscription => DirectiveLocation::Subscription,
        };
        self.visit_directives(operation.directives(), location);
        self.visit_selection_set(operation.selection_set());
        dispatch!(self, OPERATION_DEFINITION, leave_operation_definition(operation));

        self.context.position_stack.pop();
        self.context.type_stack.pop();
    }

    fn visit_fragment_definition(&mut self, fragment: &'a FragmentDefinition) {
        let ty = self
            .context
            .output_type(TypeRef::named(type_condition_name(&fragment.type_condition)));
        self.context.type_stack.push(ty);
        self.context.position_stack.push(fragment.position);

        dispatch!(self, FRAGMENT_DEFINITION, enter_fragment_definition(fragment));
        self.visit_directives(&fragment.directives, DirectiveLocation::FragmentDefinition);
        self.visit_selection_set(&fragment.selection_set);
        dispatch!(self, FRAGMENT_DEFINITION, leave_fragment_definition(fragment));

        self.context.position_stack.pop();
        self.context.type_stack.pop();
    }

    fn visit_variable_definition(&mut self, variable: &'a VariableDefinition) {
        let ty = TypeRef::from(&variable.var_type);
        let input = self.context.schema.is_input_type(&ty).then_some(ty);
        self.context.input_type_stack.push(input);
        self.context.input_value_stack.push(None);
        self.context.position_stack.push(variable.position);

        dispatch!(self, VARIABLE_DEFINITION, enter_variable_definition(variable));
        if let Some(default) = &variable.default_value {
            self.visit_value(default);
        }

        self.context.position_stack.pop();
        self.context.input_value_stack.pop();
        self.context.input_type_stack.pop();
    }

    fn visit_selection_set(&mut self, selection_set: &'a SelectionSet) {
        let parent = self
            .context
            .current_named_type()
            .filter(|named| named.is_composite());
        self.context.parent_type_stack.push(parent);

        dispatch!(self, SELECTION_SET, enter_selection_set(selection_set));
        for selection in &selection_set.items {
            match selection {
                Selection::Field(field) => self.visit_field(field),
                Selection::FragmentSpread(spread) => self.visit_fragment_spread(spread),
                Selection::InlineFragment(fragment) => self.visit_inline_fragment(fragment),
            }
        }
        dispatch!(self, SELECTION_SET, leave_selection_set(selection_set));

        self.context.parent_type_stack.pop();
    }

    fn visit_field(&mut self, field: &'a Field) {
        let schema = self.context.schema;
        let definition = self
            .context
            .current_parent_type()
            .and_then(|parent| schema.field_definition(parent, &field.name));
        let ty = definition.and_then(|definition| self.context.output_type(definition.ty.clone()));
        self.context.field_stack.push(definition);
        self.context.type_stack.push(ty);
        self.context.position_stack.push(field.position);

        dispatch!(self, FIELD, enter_field(field));
        self.visit_arguments(
            &field.arguments,
            definition.map(|definition| &definition.arguments),
        );
        self.visit_directives(&field.directives, DirectiveLocation::Field);
        if !field.selection_set.items.is_empty() {
            self.visit_selection_set(&field.selection_set);
        }
        dispatch!(self, FIELD, leave_field(field));

        self.context.position_stack.pop();
        self.context.type_stack.pop();
        self.context.field_stack.pop();
    }

    fn visit_fragment_spread(&mut self, spread: &'a FragmentSpread) {
        self.context.position_stack.push(spread.position);
        dispatch!(self, FRAGMENT_SPREAD, enter_fragment_spread(spread));
        self.visit_directives(&spread.directives, DirectiveLocation::FragmentSpread);
        self.context.position_stack.pop();
    }

    fn visit_inline_fragment(&mut self, fragment: &'a InlineFragment) {
        let ty = self.context.type_condition(&fragment.type_condition);
        self.context.type_stack.push(ty);
        self.context.position_stack.push(fragment.position);

        dispatch!(self, INLINE_FRAGMENT, enter_inline_fragment(fragment));
        self.visit_directives(&fragment.directives, DirectiveLocation::InlineFragment);
        self.visit_selection_set(&fragment.selection_set);
        dispatch!(self, INLINE_FRAGMENT, leave_inline_fragment(fragment));

        self.context.position_stack.pop();
        self.context.type_stack.pop();
    }

    fn visit_directives(&mut self, directives: &'a [Directive], location: DirectiveLocation) {
        for directive in directives {
            let definition = self.context.schema.directive(&directive.name);
            let previous = std::mem::replace(&mut self.context.directive, definition);
            self.context.position_stack.push(directive.position);

            dispatch!(self, DIRECTIVE, enter_directive(directive, location));
            self.visit_arguments(
                &directive.arguments,
                definition.map(|definition| &definition.arguments),
            );

            self.context.position_stack.pop();
            self.context.directive = previous;
        }
    }

    fn visit_arguments(
        &mut self,
        arguments: &'a [(String, Value)],
        definitions: Option<&'a indexmap::IndexMap<String, InputValueDefinition>>,
    ) {
        let previous = std::mem::replace(&mut self.context.argument_owner, definitions);

        dispatch!(self, ARGUMENT, enter_arguments(arguments));
        for (name, value) in arguments {
            let definition = definitions.and_then(|definitions| definitions.get(name));
            self.context
                .input_type_stack
                .push(definition.map(|definition| definition.ty.clone()));
            self.context.input_value_stack.push(definition);

            dispatch!(self, ARGUMENT, enter_argument(name.as_str(), value));
            self.visit_value(value);

            self.context.input_value_stack.pop();
            self.context.input_type_stack.pop();
        }

        self.context.argument_owner = previous;
    }

    fn visit_value(&mut self, value: &'a Value) {
        dispatch!(self, VALUE, enter_value(value));

        match value {
            Value::List(items) => {
                let item_type = self.context.current_input_type().map(|ty| match ty.list_item() {
                    Some(item) => item.clone(),
                    None => ty.nullable().clone(),
                });
                for item in items {
                    self.context.input_type_stack.push(item_type.clone());
                    self.context.input_value_stack.push(None);
                    self.visit_value(item);
                    self.context.input_value_stack.pop();
                    self.context.input_type_stack.pop();
                }
            }
            Value::Object(fields) => {
                let schema = self.context.schema;
                let input_fields = self
                    .context
                    .current_input_type()
                    .and_then(|ty| schema.resolve(ty))
                    .and_then(NamedType::input_fields);
                for (name, field_value) in fields {
                    let definition = input_fields.and_then(|fields| fields.get(name));
                    self.context
                        .input_type_stack
                        .push(definition.map(|definition| definition.ty.clone()));
                    self.context.input_value_stack.push(definition);
                    self.visit_value(field_value);
                    self.context.input_value_stack.pop();
                    self.context.input_type_stack.pop();
                }
            }
            _ => {}
        }
    }
}

pub(crate) fn type_condition_name<'c>(condition: &'c TypeCondition<'static, String>) -> &'c str {
    match condition {
        TypeCondition::On(name) => name.as_str(),
    }
}
