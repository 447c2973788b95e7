//! Sequential scan executor implementation.

use crate::access::{Record, Relation};
use crate::catalog::Catalog;
use crate::error::EngineError;
use crate::executor::Executor;
use anyhow::{bail, Result};
use log::trace;

/// Executor that emits a copy of every record of a base relation
pub struct SeqScanExecutor<'a> {
    relation_name: String,
    catalog: &'a Catalog,
    relation: Option<&'a Relation>,
    position: usize,
}

impl<'a> SeqScanExecutor<'a> {
    /// Create a new sequential scan executor
    pub fn new(relation_name: impl Into<String>, catalog: &'a Catalog) -> Self {
        Self {
            relation_name: relation_name.into(),
            catalog,
            relation: None,
            position: 0,
        }
    }
}

impl Executor for SeqScanExecutor<'_> {
    fn init(&mut self) -> Result<()> {
        let relation = self
            .catalog
            .get(&self.relation_name)
            .ok_or_else(|| EngineError::UnknownRelation(self.relation_name.clone()))?;
        trace!(
            "Scanning relation '{}' ({} record(s))",
            self.relation_name,
            relation.len()
        );
        self.relation = Some(relation);
        self.position = 0;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Record>> {
        let Some(relation) = self.relation else {
            bail!("Executor not initialized. Call init() first.");
        };

        let record = relation.get(self.position).cloned();
        if record.is_some() {
            self.position += 1;
        }
        Ok(record)
    }
}
