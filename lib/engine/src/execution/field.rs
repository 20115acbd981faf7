use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tracing::{error, trace};

use crate::ast::query::{Field, SelectionSet};
use crate::ast::OperationDefinitionExt;
use crate::coercion::arguments::coerce_arguments;
use crate::coercion::variables::BAD_USER_INPUT;
use crate::coercion::CoercionError;
use crate::execution::collect::collect_fields;
use crate::execution::context::ExecutionContext;
use crate::execution::resolver::{
    default_resolver, FieldFuture, FieldResult, FieldValue, ResolverContext, ResolverError,
};
use crate::execution::tree::{ExecutionTree, NodeId, NodeKind, ROOT};
use crate::response::graphql_error::{ErrorKind, GraphQLError};
use crate::schema::introspection::resolve_meta_field;
use crate::schema::types::{FieldDefinition, NamedType, ObjectType, TypeRef};
use crate::utils::cancellation::CancellationError;

pub const UNHANDLED: &str = "UNHANDLED";

/// Why an execution stopped before producing a result.
pub(crate) enum ExecutionAbort {
    Cancelled(CancellationError),
    /// A resolver panicked. Carries the panic payload.
    Panicked(Box<dyn Any + Send>),
}

impl From<CancellationError> for ExecutionAbort {
    fn from(error: CancellationError) -> Self {
        ExecutionAbort::Cancelled(error)
    }
}

/// One field of one object, waiting to be resolved.
pub(crate) struct FieldTask<'a> {
    pub node: NodeId,
    pub parent_type: &'a ObjectType,
    pub definition: &'a FieldDefinition,
    /// Every field node merged under the same response name.
    pub fields: Vec<&'a Field>,
    pub parent: Arc<FieldValue>,
}

impl<'a> FieldTask<'a> {
    fn is_meta(&self) -> bool {
        matches!(self.definition.name.as_str(), "__schema" | "__type")
    }

    fn coordinate(&self) -> String {
        format!("{}.{}", self.parent_type.name, self.definition.name)
    }
}

pub(crate) enum Resolution {
    Resolved(FieldResult),
    InvalidArguments(CoercionError),
    Panicked(Box<dyn Any + Send>),
}

pub(crate) enum Started<'a> {
    Completed(FieldTask<'a>, Resolution),
    Suspended(BoxFuture<'a, (FieldTask<'a>, Resolution)>),
}

/// Resolves fields and writes their completed values into an [`ExecutionTree`].
///
/// Scheduling is left to the strategies: they [`FieldExecutor::start`] tasks, await the suspended
/// ones however they see fit, and hand every resolution back to [`FieldExecutor::finish`], which
/// returns the tasks of the next level.
pub(crate) struct FieldExecutor<'a> {
    ctx: &'a ExecutionContext,
    tree: ExecutionTree,
}

impl<'a> FieldExecutor<'a> {
    pub fn new(ctx: &'a ExecutionContext) -> Self {
        FieldExecutor {
            ctx,
            tree: ExecutionTree::new(),
        }
    }

    pub fn ctx(&self) -> &'a ExecutionContext {
        self.ctx
    }

    /// Tasks for the top-level fields of the operation, in document order.
    pub fn root_tasks(&mut self) -> Vec<FieldTask<'a>> {
        let ctx = self.ctx;
        let mut tasks = Vec::new();
        if let Some(root_type) = ctx.root_type() {
            self.expand_object(
                ROOT,
                root_type,
                [ctx.operation().selection_set()],
                ctx.root_value.clone(),
                &mut tasks,
            );
        }
        tasks
    }

    pub fn is_discarded(&self, task: &FieldTask<'a>) -> bool {
        self.tree.is_discarded(task.node)
    }

    pub fn into_data(self) -> Value {
        self.tree.into_data()
    }

    /// Builds what the resolver of `task` gets to see, coercing the field arguments.
    pub fn resolver_context(&self, task: &FieldTask<'a>) -> Result<ResolverContext<'a>, CoercionError> {
        let ctx = self.ctx;
        let parent_type: &'a ObjectType = task.parent_type;
        let arguments = task
            .fields
            .first()
            .map(|field| field.arguments.as_slice())
            .unwrap_or_default();
        let args = coerce_arguments(
            &ctx.registry,
            &task.definition.arguments,
            arguments,
            &ctx.variables,
        )?;

        Ok(ResolverContext {
            parent: task.parent.clone(),
            args,
            field: task.definition,
            field_nodes: task.fields.clone(),
            parent_type: &parent_type.name,
            path: self.tree.path(task.node).to_vec(),
            variables: &ctx.variables,
            cancellation_token: &ctx.cancellation_token,
            data: ctx.data.as_deref(),
            execution: ctx,
        })
    }

    /// Invokes the resolver of `task`. Resolvers that answer synchronously complete right away.
    pub fn start(&self, task: FieldTask<'a>) -> Started<'a> {
        let ctx = self.ctx;
        let definition: &'a FieldDefinition = task.definition;

        if task.is_meta() {
            let value = resolve_meta_field(ctx, definition, &task.fields);
            return Started::Completed(task, Resolution::Resolved(Ok(FieldValue::Value(value))));
        }

        let resolver_ctx = match self.resolver_context(&task) {
            Ok(resolver_ctx) => resolver_ctx,
            Err(error) => return Started::Completed(task, Resolution::InvalidArguments(error)),
        };

        let called = match &definition.resolver {
            Some(resolver) => panic::catch_unwind(AssertUnwindSafe(|| resolver.call(resolver_ctx))),
            // The root field of a subscription event resolves to the event itself.
            None if definition.subscriber.is_some() => {
                Ok(FieldFuture::value(task.parent.as_ref().clone()))
            }
            None => Ok(FieldFuture::value(default_resolver(
                &task.parent,
                &definition.name,
            ))),
        };

        match called {
            Err(payload) => Started::Completed(task, Resolution::Panicked(payload)),
            Ok(FieldFuture::Ready(result)) => Started::Completed(task, Resolution::Resolved(result)),
            Ok(FieldFuture::Pending(future)) => Started::Suspended(
                async move {
                    let resolution = match AssertUnwindSafe(future).catch_unwind().await {
                        Ok(result) => Resolution::Resolved(result),
                        Err(payload) => Resolution::Panicked(payload),
                    };
                    (task, resolution)
                }
                .boxed(),
            ),
        }
    }

    /// Records the outcome of a resolver and returns the fields to resolve underneath it.
    pub fn finish(
        &mut self,
        task: FieldTask<'a>,
        resolution: Resolution,
    ) -> Result<Vec<FieldTask<'a>>, ExecutionAbort> {
        let mut next = Vec::new();
        if self.tree.is_discarded(task.node) {
            return Ok(next);
        }

        match resolution {
            Resolution::Panicked(payload) if self.ctx.throw_on_unhandled => {
                return Err(ExecutionAbort::Panicked(payload));
            }
            Resolution::Panicked(payload) => {
                let error = unhandled_error(payload.as_ref());
                error!(field = %task.coordinate(), error = %error.message, "resolver panicked");
                self.field_error(&task, task.node, error);
            }
            Resolution::InvalidArguments(error) => {
                let error = GraphQLError::new(error.message, ErrorKind::Coercion)
                    .with_code(BAD_USER_INPUT);
                self.field_error(&task, task.node, error);
            }
            Resolution::Resolved(Err(error)) => {
                trace!(field = %task.coordinate(), error = %error.message, "resolver failed");
                self.field_error(&task, task.node, from_resolver_error(error));
            }
            Resolution::Resolved(Ok(value)) if task.is_meta() => {
                let value = value.as_json().cloned().unwrap_or(Value::Null);
                self.tree.set(task.node, NodeKind::Leaf(value));
            }
            Resolution::Resolved(Ok(value)) => {
                let ty: &'a TypeRef = &task.definition.ty;
                self.complete_value(&task, task.node, ty, value, &mut next);
            }
        }

        Ok(next)
    }

    /// Attaches the response path and locations of `task` to an error raised at `node`.
    pub fn locate(&self, task: &FieldTask<'a>, node: NodeId, error: GraphQLError) -> GraphQLError {
        error
            .with_path(self.tree.path(node).to_vec())
            .with_locations(task.fields.iter().map(|field| field.position))
    }

    fn field_error(&mut self, task: &FieldTask<'a>, node: NodeId, error: GraphQLError) {
        let error = self.locate(task, node, error);
        self.ctx.report_error(error);
        self.tree.propagate_null(node);
    }

    fn complete_value(
        &mut self,
        task: &FieldTask<'a>,
        node: NodeId,
        ty: &'a TypeRef,
        value: FieldValue,
        next: &mut Vec<FieldTask<'a>>,
    ) {
        if let Err(message) = self.try_complete_value(task, node, ty, value, next) {
            self.field_error(task, node, GraphQLError::new(message, ErrorKind::Resolver));
        }
    }

    fn try_complete_value(
        &mut self,
        task: &FieldTask<'a>,
        node: NodeId,
        ty: &'a TypeRef,
        value: FieldValue,
        next: &mut Vec<FieldTask<'a>>,
    ) -> Result<(), String> {
        if value.is_null() {
            if ty.is_non_null() {
                return Err(format!(
                    "Cannot return null for non-nullable field {}.",
                    task.coordinate()
                ));
            }
            self.tree.set(node, NodeKind::Null);
            return Ok(());
        }

        let ty = ty.nullable();
        if let Some(item_type) = ty.list_item() {
            let items = into_items(value).map_err(|_| {
                format!(
                    "Expected Iterable, but did not find one for field \"{}\".",
                    task.coordinate()
                )
            })?;
            let children = self.tree.add_items(node, item_type, items.len());
            for (child, item) in children.into_iter().zip(items) {
                // An earlier item may have nulled the list or one of its ancestors.
                if self.tree.is_discarded(child) {
                    break;
                }
                self.complete_value(task, child, item_type, item, next);
            }
            return Ok(());
        }

        let ctx = self.ctx;
        let named = ctx
            .registry
            .resolve(ty)
            .ok_or_else(|| format!("Unknown type \"{}\".", ty.type_name()))?;

        match named {
            NamedType::Scalar(scalar) => {
                let serialized = scalar.serialize(leaf_json(&value, &scalar.name)?)?;
                self.tree.set(node, NodeKind::Leaf(serialized));
            }
            NamedType::Enum(enum_type) => {
                let json = leaf_json(&value, &enum_type.name)?;
                let name = enum_type.serialize(json).ok_or_else(|| {
                    format!("Enum \"{}\" cannot represent value: {}", enum_type.name, json)
                })?;
                self.tree.set(node, NodeKind::Leaf(Value::String(name.to_string())));
            }
            NamedType::Object(object) => self.complete_object(task, node, object, value, next),
            NamedType::Interface(_) | NamedType::Union(_) => {
                let object = self.resolve_runtime_type(task, named, &value)?;
                self.complete_object(task, node, object, value, next);
            }
            NamedType::InputObject(input) => {
                return Err(format!(
                    "Input object \"{}\" cannot be returned by field \"{}\".",
                    input.name,
                    task.coordinate()
                ))
            }
        }

        Ok(())
    }

    fn complete_object(
        &mut self,
        task: &FieldTask<'a>,
        node: NodeId,
        object: &'a ObjectType,
        value: FieldValue,
        next: &mut Vec<FieldTask<'a>>,
    ) {
        let selection_sets = task.fields.iter().map(|&field| &field.selection_set);
        self.expand_object(node, object, selection_sets, Arc::new(value), next);
    }

    /// Turns `node` into an object of type `object` with one pending child per collected field.
    /// `__typename` is answered on the spot.
    fn expand_object(
        &mut self,
        node: NodeId,
        object: &'a ObjectType,
        selection_sets: impl IntoIterator<Item = &'a SelectionSet>,
        parent: Arc<FieldValue>,
        tasks: &mut Vec<FieldTask<'a>>,
    ) {
        let ctx = self.ctx;
        let Some(named) = ctx.registry.lookup(&object.name) else {
            return;
        };

        self.tree.make_object(node);
        for (response_name, fields) in collect_fields(ctx, &object.name, selection_sets) {
            let name = fields[0].name.as_str();
            let Some(definition) = ctx.registry.field_definition(named, name) else {
                continue;
            };

            let child = self.tree.add_field(node, response_name, definition.ty.clone());
            if name == "__typename" {
                self.tree
                    .set(child, NodeKind::Leaf(Value::String(object.name.clone())));
                continue;
            }

            tasks.push(FieldTask {
                node: child,
                parent_type: object,
                definition,
                fields,
                parent: parent.clone(),
            });
        }
    }

    /// Finds the object type of a value in an interface or union position: an explicit type tag
    /// first, then `resolve_type`, then `is_type_of` of the possible types, then a `__typename`
    /// key on JSON values.
    fn resolve_runtime_type(
        &self,
        task: &FieldTask<'a>,
        abstract_type: &'a NamedType,
        value: &FieldValue,
    ) -> Result<&'a ObjectType, String> {
        let registry = &self.ctx.registry;
        let resolve_type = match abstract_type {
            NamedType::Interface(interface) => interface.resolve_type.as_ref(),
            NamedType::Union(union) => union.resolve_type.as_ref(),
            _ => None,
        };

        let type_name = value
            .type_name()
            .map(str::to_string)
            .or_else(|| resolve_type.and_then(|resolve_type| resolve_type(value)))
            .or_else(|| {
                registry
                    .possible_types(abstract_type.name())
                    .find(|candidate| {
                        registry
                            .object(candidate)
                            .and_then(|object| object.is_type_of.as_ref())
                            .is_some_and(|is_type_of| is_type_of(value))
                    })
                    .map(str::to_string)
            })
            .or_else(|| {
                value
                    .as_json()
                    .and_then(|json| json.get("__typename"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            });

        let Some(type_name) = type_name else {
            return Err(format!(
                "Abstract type \"{name}\" must resolve to an Object type at runtime for field \"{}\". Either the \"{name}\" type should provide a \"resolveType\" function or each possible type should provide an \"isTypeOf\" function.",
                task.coordinate(),
                name = abstract_type.name(),
            ));
        };

        let ctx = self.ctx;
        match ctx.registry.object(&type_name) {
            Some(object) if ctx.registry.is_possible_type(abstract_type, &type_name) => {
                Ok(object.as_ref())
            }
            Some(_) => Err(format!(
                "Runtime Object type \"{}\" is not a possible type for \"{}\".",
                type_name,
                abstract_type.name()
            )),
            None => Err(format!(
                "Abstract type \"{}\" was resolved to a type \"{}\" that does not exist inside the schema.",
                abstract_type.name(),
                type_name
            )),
        }
    }
}

fn into_items(value: FieldValue) -> Result<Vec<FieldValue>, FieldValue> {
    match value {
        FieldValue::WithType { value, .. } => into_items(*value),
        FieldValue::List(items) => Ok(items),
        FieldValue::Value(Value::Array(items)) => {
            Ok(items.into_iter().map(FieldValue::Value).collect())
        }
        other => Err(other),
    }
}

fn leaf_json<'v>(value: &'v FieldValue, type_name: &str) -> Result<&'v Value, String> {
    value.as_json().ok_or_else(|| {
        format!(
            "Leaf type \"{}\" can only serialize JSON values, found {:?}.",
            type_name,
            value.inner()
        )
    })
}

pub(crate) fn from_resolver_error(error: ResolverError) -> GraphQLError {
    let mut graphql_error = GraphQLError::new(error.message, ErrorKind::Resolver);
    if let Some(code) = error.code {
        graphql_error = graphql_error.with_code(code);
    }
    graphql_error.extensions.extensions.extend(error.extensions);
    graphql_error
}

/// Reports a resolver panic as a GraphQL error.
pub(crate) fn unhandled_error(payload: &(dyn Any + Send)) -> GraphQLError {
    let reason = payload
        .downcast_ref::<&str>()
        .map(|reason| reason.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());

    GraphQLError::new(
        format!("Unexpected error while executing the operation: {}", reason),
        ErrorKind::Unhandled,
    )
    .with_code(UNHANDLED)
}
