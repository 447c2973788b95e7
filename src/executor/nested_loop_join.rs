//! Nested Loop Join executor implementation.
//!
//! This executor performs an inner join between two child executors using the
//! nested loop algorithm. The right child is buffered during `init()`; for each
//! record from the left child, every buffered right record is tried and a
//! merged record is emitted when the join condition holds. Without a
//! condition the result is the cross product.

use crate::access::{Record, RIGHT_QUALIFIER};
use crate::executor::Executor;
use crate::expression::{Condition, JoinNamespace};
use anyhow::{bail, Result};
use log::{debug, trace};

/// Executor that performs a nested loop join
pub struct NestedLoopJoinExecutor<'a> {
    /// Left child executor
    left_child: Box<dyn Executor + 'a>,
    /// Right child executor
    right_child: Box<dyn Executor + 'a>,
    /// Raw join condition text
    condition_text: Option<String>,
    /// Compiled join condition
    condition: Option<Condition>,
    /// The condition failed to compile, so no pair matches
    rejects_all: bool,
    /// Buffered right records
    right_records: Vec<Record>,
    /// Current left record (if any)
    current_left: Option<Record>,
    /// Position of the next right record to try against `current_left`
    right_position: usize,
    /// Whether the executor has been initialized
    initialized: bool,
}

impl<'a> NestedLoopJoinExecutor<'a> {
    /// Create a new nested loop join executor
    ///
    /// # Arguments
    /// * `left_child` - The left child executor
    /// * `right_child` - The right child executor
    /// * `condition` - Join condition text, `None` for a cross product
    pub fn new(
        left_child: Box<dyn Executor + 'a>,
        right_child: Box<dyn Executor + 'a>,
        condition: Option<String>,
    ) -> Self {
        Self {
            left_child,
            right_child,
            condition_text: condition,
            condition: None,
            rejects_all: false,
            right_records: Vec::new(),
            current_left: None,
            right_position: 0,
            initialized: false,
        }
    }

    /// Merge a matching pair into one record.
    ///
    /// Left fields come first. A right field whose name is already present is
    /// stored as `R.<name>` instead of overwriting. The merged record keeps
    /// both source records as its join sides.
    pub fn merge(left: &Record, right: &Record) -> Record {
        let mut merged: Record = left
            .fields()
            .map(|(name, value)| (name, value.clone()))
            .collect();
        for (name, value) in right.fields() {
            if merged.contains(name) {
                merged.insert(format!("{}.{}", RIGHT_QUALIFIER, name), value.clone());
            } else {
                merged.insert(name, value.clone());
            }
        }
        merged.with_sides(left.clone(), right.clone())
    }

    fn pair_matches(&self, left: &Record, right: &Record) -> bool {
        let Some(condition) = &self.condition else {
            return true;
        };
        match condition.matches(&JoinNamespace::new(left, right)) {
            Ok(matched) => matched,
            Err(e) => {
                debug!(
                    "JOIN condition '{}' failed on a pair, excluding it: {}",
                    condition.text(),
                    e
                );
                false
            }
        }
    }
}

impl Executor for NestedLoopJoinExecutor<'_> {
    fn init(&mut self) -> Result<()> {
        self.left_child.init()?;
        self.right_child.init()?;

        self.right_records.clear();
        while let Some(record) = self.right_child.next()? {
            self.right_records.push(record);
        }

        self.condition = None;
        self.rejects_all = false;
        if let Some(text) = &self.condition_text {
            match Condition::compile(text) {
                Ok(condition) => {
                    trace!(
                        "JOIN condition '{}' references {:?}",
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
                    debug!("JOIN condition '{}' does not compile: {}", text, e);
                    self.rejects_all = true;
                }
            }
        }

        self.current_left = None;
        self.right_position = 0;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Record>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }
        if self.rejects_all || self.right_records.is_empty() {
            return Ok(None);
        }

        loop {
            // If we don't have a current left record, get the next one
            let left = match self.current_left.take() {
                Some(left) => left,
                None => match self.left_child.next()? {
                    Some(left) => {
                        self.right_position = 0;
                        left
                    }
                    None => return Ok(None),
                },
            };

            while self.right_position < self.right_records.len() {
                let idx = self.right_position;
                self.right_position += 1;
                let right = &self.right_records[idx];
                if self.pair_matches(&left, right) {
                    let merged = Self::merge(&left, right);
                    self.current_left = Some(left);
                    return Ok(Some(merged));
                }
            }
            // Right side exhausted for this left record; move on
        }
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
            Record::from_iter([("id", Value::Int(1)), ("name", Value::from("Ann"))]),
            Record::from_iter([("id", Value::Int(2)), ("name", Value::from("Bob"))]),
        ]
    }

    fn assignments() -> Vec<Record> {
        vec![
            Record::from_iter([("emp_id", Value::Int(1)), ("project", Value::from("X"))]),
            Record::from_iter([("emp_id", Value::Int(1)), ("project", Value::from("Y"))]),
            Record::from_iter([("emp_id", Value::Int(3)), ("project", Value::from("Z"))]),
        ]
    }

    fn join(left: Vec<Record>, right: Vec<Record>, condition: Option<&str>) -> Result<Vec<Record>> {
        let mut executor = NestedLoopJoinExecutor::new(
            MockExecutor::boxed(left),
            MockExecutor::boxed(right),
            condition.map(str::to_string),
        );
        collect(&mut executor)
    }

    #[test]
    fn test_join_with_condition() -> Result<()> {
        let result = join(employees(), assignments(), Some("L.id == R.emp_id"))?;
        assert_eq!(result.len(), 2);
        assert_eq!(
            result[0].fields().collect::<Vec<_>>(),
            vec![
                ("id", &Value::Int(1)),
                ("name", &Value::from("Ann")),
                ("emp_id", &Value::Int(1)),
                ("project", &Value::from("X")),
            ]
        );
        assert_eq!(result[1].get("project"), Some(&Value::from("Y")));

        let sides = result[0].sides().expect("joined record has sides");
        assert_eq!(sides.left, employees()[0]);
        assert_eq!(sides.right, assignments()[0]);
        Ok(())
    }

    #[test]
    fn test_join_cross_product() -> Result<()> {
        let result = join(employees(), assignments(), None)?;
        assert_eq!(result.len(), 6);
        // Left-major order
        assert_eq!(result[0].get("name"), Some(&Value::from("Ann")));
        assert_eq!(result[2].get("name"), Some(&Value::from("Ann")));
        assert_eq!(result[3].get("name"), Some(&Value::from("Bob")));
        Ok(())
    }

    #[test]
    fn test_join_unqualified_names() -> Result<()> {
        let result = join(employees(), assignments(), Some("id == emp_id"))?;
        assert_eq!(result.len(), 2);
        Ok(())
    }

    #[test]
    fn test_join_field_collision() -> Result<()> {
        let left = vec![Record::from_iter([("id", Value::Int(1)), ("v", Value::from("l"))])];
        let right = vec![Record::from_iter([("id", Value::Int(7)), ("v", Value::from("r"))])];
        let result = join(left, right, None)?;
        assert_eq!(
            result[0].fields().collect::<Vec<_>>(),
            vec![
                ("id", &Value::Int(1)),
                ("v", &Value::from("l")),
                ("R.id", &Value::Int(7)),
                ("R.v", &Value::from("r")),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_join_empty_side() -> Result<()> {
        assert!(join(employees(), vec![], None)?.is_empty());
        assert!(join(vec![], assignments(), None)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_join_bad_condition() -> Result<()> {
        assert!(join(employees(), assignments(), Some("L.id =="))?.is_empty());
        // Comparing incompatible types fails per pair and excludes it
        assert!(join(employees(), assignments(), Some("L.name > R.emp_id"))?.is_empty());
        Ok(())
    }
}
