//! Execution of validated operations against a [`crate::schema::Schema`].
//!
//! [`executor::execute`] is the entry point: it selects the operation, validates the request,
//! coerces variables and hands the operation to the [`strategy`] matching its kind.

pub mod collect;
pub mod context;
pub mod executor;
pub(crate) mod field;
pub mod listener;
pub mod resolver;
pub mod strategy;
pub(crate) mod tree;

pub use context::ExecutionContext;
pub use executor::{execute, EngineError, ExecutionOptions};
pub use listener::ExecutionListener;
pub use resolver::{
    FieldFuture, FieldResult, FieldValue, Resolver, ResolverContext, ResolverError, SourceStream,
    Subscriber, SubscriptionFuture,
};
