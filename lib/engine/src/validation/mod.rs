//! Static validation of executable documents.
//!
//! All rules of a [`validate::ValidationPlan`] run together in a single traversal of the
//! document; see [`visitor`].

pub mod rules;
pub mod utils;
pub mod validate;
pub mod visitor;
