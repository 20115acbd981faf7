//! How the fields of an operation are scheduled.
//!
//! Queries resolve breadth-first with bounded parallelism, mutations run their top-level fields
//! one after another, and subscriptions map every source event to a fresh query-style execution.

pub mod parallel;
pub mod serial;
pub mod subscription;

use crate::ast::OperationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    Parallel,
    Serial,
    Streaming,
}

impl ExecutionStrategy {
    pub fn for_operation(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Query => ExecutionStrategy::Parallel,
            OperationKind::Mutation => ExecutionStrategy::Serial,
            OperationKind::Subscription => ExecutionStrategy::Streaming,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ExecutionStrategy;
    use crate::ast::OperationKind;

    #[test]
    fn strategy_follows_the_operation_kind() {
        assert_eq!(
            ExecutionStrategy::for_operation(OperationKind::Query),
            ExecutionStrategy::Parallel
        );
        assert_eq!(
            ExecutionStrategy::for_operation(OperationKind::Mutation),
            ExecutionStrategy::Serial
        );
        assert_eq!(
            ExecutionStrategy::for_operation(OperationKind::Subscription),
            ExecutionStrategy::Streaming
        );
    }
}
