//! Set operation executor: UNION, INTERSECT and DIFFERENCE.
//!
//! Records are compared by their canonical key, so two records with the same
//! fields and values are equal regardless of field order.

use crate::access::Record;
use crate::executor::Executor;
use anyhow::{bail, Result};
use std::collections::HashSet;
use std::fmt;

/// Supported set operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    /// Records of either input, first occurrence kept, duplicates removed
    Union,
    /// Records of the left input that also occur in the right one
    Intersect,
    /// Records of the left input that do not occur in the right one
    Difference,
}

impl SetOperator {
    pub fn name(&self) -> &'static str {
        match self {
            SetOperator::Union => "UNION",
            SetOperator::Intersect => "INTERSECT",
            SetOperator::Difference => "DIFFERENCE",
        }
    }
}

impl fmt::Display for SetOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Executor for the binary set operators
pub struct SetOperationExecutor<'a> {
    op: SetOperator,
    left_child: Box<dyn Executor + 'a>,
    right_child: Box<dyn Executor + 'a>,
    /// UNION: keys already emitted. INTERSECT/DIFFERENCE: keys of the right input.
    keys: HashSet<String>,
    /// UNION only: the left input is exhausted and records come from the right
    left_done: bool,
    initialized: bool,
}

impl<'a> SetOperationExecutor<'a> {
    pub fn new(
        op: SetOperator,
        left_child: Box<dyn Executor + 'a>,
        right_child: Box<dyn Executor + 'a>,
    ) -> Self {
        Self {
            op,
            left_child,
            right_child,
            keys: HashSet::new(),
            left_done: false,
            initialized: false,
        }
    }

    fn next_union(&mut self) -> Result<Option<Record>> {
        loop {
            let record = if self.left_done {
                self.right_child.next()?
            } else {
                match self.left_child.next()? {
                    Some(record) => Some(record),
                    None => {
                        self.left_done = true;
                        continue;
                    }
                }
            };

            let Some(record) = record else {
                return Ok(None);
            };
            if self.keys.insert(record.canonical_key()) {
                return Ok(Some(record));
            }
        }
    }

    fn next_filtered(&mut self, keep_members: bool) -> Result<Option<Record>> {
        while let Some(record) = self.left_child.next()? {
            if self.keys.contains(&record.canonical_key()) == keep_members {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}

impl Executor for SetOperationExecutor<'_> {
    fn init(&mut self) -> Result<()> {
        self.left_child.init()?;
        self.right_child.init()?;
        self.keys.clear();
        self.left_done = false;

        if self.op != SetOperator::Union {
            while let Some(record) = self.right_child.next()? {
                self.keys.insert(record.canonical_key());
            }
        }

        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Record>> {
        if !self.initialized {
            bail!("Executor not initialized. Call init() first.");
        }
        match self.op {
            SetOperator::Union => self.next_union(),
            SetOperator::Intersect => self.next_filtered(true),
            SetOperator::Difference => self.next_filtered(false),
        }
    }
}
