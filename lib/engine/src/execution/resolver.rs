use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::FutureExt;
use serde_json::{Map, Value};

use crate::ast::query::Field;
use crate::coercion::arguments::Arguments;
use crate::coercion::variables::Variables;
use crate::execution::context::ExecutionContext;
use crate::response::graphql_error::GraphQLErrorPathSegment;
use crate::schema::types::FieldDefinition;
use crate::utils::cancellation::CancellationToken;

/// What a resolver hands back to the engine.
#[derive(Clone, Default)]
pub enum FieldValue {
    #[default]
    Null,
    /// A plain JSON value. Objects double as parent values, read by the default resolver.
    Value(Value),
    List(Vec<FieldValue>),
    /// An opaque application value, only meaningful to the resolvers of the returned type.
    Owned(Arc<dyn Any + Send + Sync>),
    /// A value tagged with its concrete object type, for interface and union positions.
    WithType {
        value: Box<FieldValue>,
        type_name: String,
    },
}

impl FieldValue {
    pub fn value(value: impl Into<Value>) -> Self {
        FieldValue::Value(value.into())
    }

    pub fn owned<T: Any + Send + Sync>(value: T) -> Self {
        FieldValue::Owned(Arc::new(value))
    }

    pub fn list(values: impl IntoIterator<Item = impl Into<FieldValue>>) -> Self {
        FieldValue::List(values.into_iter().map(Into::into).collect())
    }

    pub fn with_type(self, type_name: impl Into<String>) -> Self {
        FieldValue::WithType {
            value: Box::new(self),
            type_name: type_name.into(),
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            FieldValue::Null | FieldValue::Value(Value::Null) => true,
            FieldValue::WithType { value, .. } => value.is_null(),
            _ => false,
        }
    }

    /// The value without any type tag.
    pub fn inner(&self) -> &FieldValue {
        match self {
            FieldValue::WithType { value, .. } => value.inner(),
            other => other,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self.inner() {
            FieldValue::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self.inner() {
            FieldValue::Owned(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        match self {
            FieldValue::WithType { type_name, .. } => Some(type_name),
            _ => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Value(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("Null"),
            FieldValue::Value(value) => write!(f, "Value({})", value),
            FieldValue::List(items) => f.debug_tuple("List").field(items).finish(),
            FieldValue::Owned(_) => f.write_str("Owned(..)"),
            FieldValue::WithType { value, type_name } => f
                .debug_struct("WithType")
                .field("value", value)
                .field("type_name", type_name)
                .finish(),
        }
    }
}

/// An error raised by a resolver. Any displayable error converts into it, so resolvers can use `?`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverError {
    pub message: String,
    pub code: Option<String>,
    pub extensions: Map<String, Value>,
}

impl ResolverError {
    pub fn new(message: impl Into<String>) -> Self {
        ResolverError {
            message: message.into(),
            code: None,
            extensions: Map::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }
}

impl<T: fmt::Display + Send + Sync + 'static> From<T> for ResolverError {
    fn from(error: T) -> Self {
        ResolverError::new(error.to_string())
    }
}

pub type FieldResult = Result<FieldValue, ResolverError>;

/// The outcome of invoking a resolver: either already available, or still running.
pub enum FieldFuture<'a> {
    Ready(FieldResult),
    Pending(BoxFuture<'a, FieldResult>),
}

impl<'a> FieldFuture<'a> {
    pub fn new<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = FieldResult> + Send + 'a,
    {
        FieldFuture::Pending(future.boxed())
    }

    pub fn ready(result: FieldResult) -> Self {
        FieldFuture::Ready(result)
    }

    pub fn value(value: impl Into<FieldValue>) -> Self {
        FieldFuture::Ready(Ok(value.into()))
    }
}

type ResolverFn = dyn for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync;

#[derive(Clone)]
pub struct Resolver(Arc<ResolverFn>);

impl Resolver {
    pub fn new<F>(resolver: F) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
    {
        Resolver(Arc::new(resolver))
    }

    /// A resolver that always returns the same value.
    pub fn constant(value: impl Into<Value>) -> Self {
        let value = value.into();
        Resolver::new(move |_| FieldFuture::value(value.clone()))
    }

    pub(crate) fn call<'a>(&self, ctx: ResolverContext<'a>) -> FieldFuture<'a> {
        (self.0)(ctx)
    }
}

pub type SourceStream = BoxStream<'static, FieldResult>;

/// Produces the source event stream of a subscription field.
pub struct SubscriptionFuture<'a>(BoxFuture<'a, Result<SourceStream, ResolverError>>);

impl<'a> SubscriptionFuture<'a> {
    pub fn new<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = Result<SourceStream, ResolverError>> + Send + 'a,
    {
        SubscriptionFuture(future.boxed())
    }

    pub(crate) fn into_inner(self) -> BoxFuture<'a, Result<SourceStream, ResolverError>> {
        self.0
    }
}

type SubscriberFn = dyn for<'a> Fn(ResolverContext<'a>) -> SubscriptionFuture<'a> + Send + Sync;

#[derive(Clone)]
pub struct Subscriber(Arc<SubscriberFn>);

impl Subscriber {
    pub fn new<F>(subscriber: F) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> SubscriptionFuture<'a> + Send + Sync + 'static,
    {
        Subscriber(Arc::new(subscriber))
    }

    pub(crate) fn call<'a>(&self, ctx: ResolverContext<'a>) -> SubscriptionFuture<'a> {
        (self.0)(ctx)
    }
}

/// Everything a resolver can see. Owned parts belong to this invocation alone.
pub struct ResolverContext<'a> {
    pub(crate) parent: Arc<FieldValue>,
    pub args: Arguments,
    pub field: &'a FieldDefinition,
    pub field_nodes: Vec<&'a Field>,
    pub parent_type: &'a str,
    pub path: Vec<GraphQLErrorPathSegment>,
    pub variables: &'a Variables,
    pub cancellation_token: &'a CancellationToken,
    pub(crate) data: Option<&'a (dyn Any + Send + Sync)>,
    pub(crate) execution: &'a ExecutionContext,
}

impl<'a> ResolverContext<'a> {
    pub fn parent(&self) -> &FieldValue {
        self.parent.inner()
    }

    /// The parent value, when it is plain JSON.
    pub fn parent_json(&self) -> Option<&Value> {
        self.parent.as_json()
    }

    pub fn parent_as<T: Any>(&self) -> Option<&T> {
        self.parent.downcast_ref::<T>()
    }

    /// The request-scoped application context, if one was supplied and has type `T`.
    pub fn data<T: Any>(&self) -> Option<&T> {
        self.data.and_then(|data| data.downcast_ref::<T>())
    }

    /// Adds `key` to the `extensions` of the response. For subscriptions, to the response of the
    /// current event.
    pub fn set_extension(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.execution.set_extension(key, value);
    }
}

/// Reads the same-named key off a JSON object parent.
pub(crate) fn default_resolver(parent: &FieldValue, field_name: &str) -> FieldValue {
    match parent.as_json() {
        Some(Value::Object(object)) => object
            .get(field_name)
            .cloned()
            .map_or(FieldValue::Null, FieldValue::Value),
        _ => FieldValue::Null,
    }
}
