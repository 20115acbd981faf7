//! A GraphQL validation and execution engine.
//!
//! Schemas are assembled in code ([`schema::Schema`]), documents are parsed with
//! [`ast::parse_document`], and [`execute`] validates and runs one request at a time.

pub mod ast;
pub mod coercion;
pub mod execution;
pub mod logging;
pub mod response;
pub mod schema;
pub mod utils;
pub mod validation;

#[cfg(test)]
mod tests;

pub use execution::{execute, EngineError, ExecutionOptions};
pub use response::execution_result::{ExecutionMetrics, ExecutionResult, ResponseStream};
pub use response::graphql_error::GraphQLError;
pub use schema::{Schema, SchemaError};
pub use utils::cancellation::{CancellationError, CancellationToken};
