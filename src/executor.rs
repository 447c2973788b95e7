//! Executor layer for formula evaluation.
//!
//! This module implements the Volcano-style iterator model for executing
//! logical plans. Each executor produces records one at a time via the
//! `next()` method. Operators that need their whole input before emitting
//! anything (aggregation, the right side of a join, set membership) buffer it
//! during `init()`.

use crate::access::{Record, Relation};
use anyhow::Result;

pub mod aggregate;
pub mod filter;
pub mod nested_loop_join;
pub mod projection;
pub mod seq_scan;
pub mod set_operation;

// Re-export executors
pub use aggregate::{AggregateExecutor, AggregateFunction, AggregateSpec};
pub use filter::FilterExecutor;
pub use nested_loop_join::NestedLoopJoinExecutor;
pub use projection::{FieldSpec, ProjectionExecutor};
pub use seq_scan::SeqScanExecutor;
pub use set_operation::{SetOperationExecutor, SetOperator};

/// Trait for all formula executors
pub trait Executor: Send {
    /// Initialize the executor. This must be called before `next()`.
    fn init(&mut self) -> Result<()>;

    /// Get the next record from the executor.
    /// Returns None when there are no more records.
    fn next(&mut self) -> Result<Option<Record>>;
}

/// Initialize an executor and drain it into a relation
pub fn collect<E: Executor + ?Sized>(executor: &mut E) -> Result<Relation> {
    executor.init()?;
    let mut relation = Relation::new();
    while let Some(record) = executor.next()? {
        relation.push(record);
    }
    Ok(relation)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::bail;

    /// Executor over a fixed list of records
    pub(crate) struct MockExecutor {
        records: Vec<Record>,
        current: usize,
        initialized: bool,
    }

    impl MockExecutor {
        pub(crate) fn new(records: Vec<Record>) -> Self {
            Self {
                records,
                current: 0,
                initialized: false,
            }
        }

        pub(crate) fn boxed(records: Vec<Record>) -> Box<dyn Executor> {
            Box::new(Self::new(records))
        }
    }

    impl Executor for MockExecutor {
        fn init(&mut self) -> Result<()> {
            self.current = 0;
            self.initialized = true;
            Ok(())
        }

        fn next(&mut self) -> Result<Option<Record>> {
            if !self.initialized {
                bail!("Not initialized");
            }
            let record = self.records.get(self.current).cloned();
            if record.is_some() {
                self.current += 1;
            }
            Ok(record)
        }
    }

    #[test]
    fn test_collect_drains_executor() -> Result<()> {
        let records = vec![
            Record::from_iter([("a", 1)]),
            Record::from_iter([("a", 2)]),
        ];
        let mut mock = MockExecutor::new(records.clone());
        assert_eq!(collect(&mut mock)?, records);
        Ok(())
    }

    #[test]
    fn test_next_before_init_fails() {
        let mut mock = MockExecutor::new(vec![]);
        assert!(mock.next().is_err());
    }
}
