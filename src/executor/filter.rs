//! Filter executor implementation.
//!
//! This executor backs SELECT: it passes through the records of its child for
//! which the condition is truthy. The condition text is compiled once in
//! `init()`. A condition that does not compile matches no record, and a row
//! whose evaluation fails is excluded; neither aborts the formula.

use crate::access::Record;
use crate::executor::Executor;
use crate::expression::Condition;
use anyhow::{bail, Result};
use log::{debug, trace};

/// Executor that filters records based on a condition
pub struct FilterExecutor<'a> {
    /// Child executor that produces records
    child: Box<dyn Executor + 'a>,
    /// Raw condition text; `None` keeps every record
    condition_text: Option<String>,
    /// Compiled condition, set by `init()`
    condition: Option<Condition>,
    /// The condition failed to compile, so nothing matches
    rejects_all: bool,
    initialized: bool,
}

impl<'a> FilterExecutor<'a> {
    /// Create a new filter executor
    ///
    /// # Arguments
    /// * `child` - The child executor that produces records
    /// * `condition` - Condition text evaluated against each record
    pub fn new(child: Box<dyn Executor + 'a>, condition: Option<String>) -> Self {
        Self {
            child,
            condition_text: condition,
            condition: None,
            rejects_all: false,
            initialized: false,
        }
    }
}

impl Executor for FilterExecutor<'_> {
    fn init(&mut self) -> Result<()> {
        self.child.init()?;
        self.condition = None;
        self.rejects_all = false;

        if let Some(text) = &self.condition_text {
            match Condition::compile(text) {
                Ok(condition) => {
                    trace!(
                        "SELECT condition '{}' references {:?}",
                        text,
                        condition
                            .expression()
                            .referenced_columns()
                            .iter()
                            .map(|col| col.display_name())
                            .collect::<Vec<_>>()
                    );
                    self.condition = Some(condition);
                }
                Err(e) => {
                    debug!("SELECT condition '{}' does not compile: {}", text, e);
                    self.rejects_all = true;
                }
            }
        }

        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Record>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }
        if self.rejects_all {
            return Ok(None);
        }

        // Keep pulling from the child until a record matches
        while let Some(record) = self.child.next()? {
            let Some(condition) = &self.condition else {
                return Ok(Some(record));
            };
            match condition.matches(&record) {
                Ok(true) => return Ok(Some(record)),
                Ok(false) => {}
                Err(e) => {
                    debug!(
                        "SELECT condition '{}' failed on a record, excluding it: {}",
                        condition.text(),
                        e
                    );
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Value;
    use crate::executor::collect;
    use crate::executor::tests::MockExecutor;

    fn employees() -> Vec<Record> {
        vec![
            Record::from_iter([
                ("id", Value::Int(1)),
                ("dept", Value::from("A")),
                ("salary", Value::Int(100)),
            ]),
            Record::from_iter([
                ("id", Value::Int(2)),
                ("dept", Value::from("B")),
                ("salary", Value::Int(50)),
            ]),
            Record::from_iter([("id", Value::Int(3)), ("dept", Value::from("A"))]),
        ]
    }

    fn run(condition: Option<&str>) -> Result<Vec<Record>> {
        let mut filter = FilterExecutor::new(
            MockExecutor::boxed(employees()),
            condition.map(str::to_string),
        );
        collect(&mut filter)
    }

    fn ids(records: &[Record]) -> Vec<Value> {
        records
            .iter()
            .map(|r| r.get("id").cloned().unwrap_or(Value::Null))
            .collect()
    }

    #[test]
    fn test_filter_basic() -> Result<()> {
        let result = run(Some("salary > 75"))?;
        assert_eq!(ids(&result), vec![Value::Int(1)]);
        assert_eq!(result[0], employees()[0]);
        Ok(())
    }

    #[test]
    fn test_filter_without_condition_keeps_all() -> Result<()> {
        assert_eq!(run(None)?, employees());
        Ok(())
    }

    #[test]
    fn test_filter_row_errors_exclude_row() -> Result<()> {
        // Record 3 has no salary, so evaluation fails for it only
        let result = run(Some("salary < 1000"))?;
        assert_eq!(ids(&result), vec![Value::Int(1), Value::Int(2)]);
        Ok(())
    }

    #[test]
    fn test_filter_uncompilable_condition_matches_nothing() -> Result<()> {
        assert!(run(Some("salary >"))?.is_empty());
        assert!(run(Some("salary > 1 +"))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_filter_string_equality() -> Result<()> {
        let result = run(Some("dept == 'A'"))?;
        assert_eq!(ids(&result), vec![Value::Int(1), Value::Int(3)]);
        Ok(())
    }

    #[test]
    fn test_filter_keeps_join_sides() -> Result<()> {
        let left = Record::from_iter([("id", Value::Int(1))]);
        let right = Record::from_iter([("emp_id", Value::Int(1))]);
        let joined = Record::from_iter([("id", Value::Int(1)), ("emp_id", Value::Int(1))])
            .with_sides(left, right);

        let mut filter = FilterExecutor::new(
            MockExecutor::boxed(vec![joined.clone()]),
            Some("L.id == R.emp_id".to_string()),
        );
        let result = collect(&mut filter)?;
        assert_eq!(result, vec![joined]);
        assert!(result[0].sides().is_some());
        Ok(())
    }
}
