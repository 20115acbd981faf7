mod concurrency;
mod mutations;
mod orchestrator;
mod overlapping_fields;
mod subscriptions;
pub mod testkit;
mod validation;
