//! Evaluation façade.
//!
//! An [`Engine`] owns a catalog and an [`EngineConfig`]. Evaluating a formula
//! plans it against the catalog, builds an executor tree from the plan and
//! drains that tree into a relation. The catalog is never modified, so one
//! engine can evaluate any number of formulas, from any number of threads.

use crate::access::Relation;
use crate::catalog::Catalog;
use crate::error::EngineResult;
use crate::executor::{
    collect, AggregateExecutor, Executor, FilterExecutor, NestedLoopJoinExecutor,
    ProjectionExecutor, SeqScanExecutor, SetOperationExecutor,
};
use crate::planner::{LogicalPlan, Planner};
use anyhow::{Context, Result};
use log::debug;

/// Default maximum operator nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Engine settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum operator nesting depth of a formula
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Formula evaluator over an immutable catalog
#[derive(Debug, Clone)]
pub struct Engine {
    catalog: Catalog,
    config: EngineConfig,
}

impl Engine {
    /// Create an engine with the default configuration
    pub fn new(catalog: Catalog) -> Self {
        Self::with_config(catalog, EngineConfig::default())
    }

    pub fn with_config(catalog: Catalog, config: EngineConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parse and resolve a formula into a logical plan
    pub fn plan(&self, formula: &str) -> EngineResult<LogicalPlan> {
        Planner::new(&self.catalog, self.config.max_depth).plan(formula)
    }

    /// Evaluate a formula to a relation.
    ///
    /// Fatal formula errors are [`crate::error::EngineError`]s carried inside
    /// the returned `anyhow::Error`.
    pub fn evaluate(&self, formula: &str) -> Result<Relation> {
        let plan = self.plan(formula)?;
        debug!("Planned formula with nesting depth {}", plan.depth());
        self.execute(&plan)
    }

    /// Run an already planned formula
    pub fn execute(&self, plan: &LogicalPlan) -> Result<Relation> {
        let mut executor = self.create_executor(plan);
        let relation = collect(executor.as_mut()).context("Failed to evaluate formula")?;
        debug!("Formula produced {} record(s)", relation.len());
        Ok(relation)
    }

    /// Creates an executor tree from a logical plan.
    fn create_executor<'a>(&'a self, plan: &LogicalPlan) -> Box<dyn Executor + 'a> {
        match plan {
            LogicalPlan::Scan { relation } => {
                Box::new(SeqScanExecutor::new(relation.clone(), &self.catalog))
            }
            LogicalPlan::Select { input, condition } => Box::new(FilterExecutor::new(
                self.create_executor(input),
                condition.clone(),
            )),
            LogicalPlan::Project { input, fields } => Box::new(ProjectionExecutor::new(
                self.create_executor(input),
                fields.clone(),
            )),
            LogicalPlan::Join {
                left,
                right,
                condition,
            } => Box::new(NestedLoopJoinExecutor::new(
                self.create_executor(left),
                self.create_executor(right),
                condition.clone(),
            )),
            LogicalPlan::SetOperation { op, left, right } => Box::new(SetOperationExecutor::new(
                *op,
                self.create_executor(left),
                self.create_executor(right),
            )),
            LogicalPlan::Aggregate {
                input,
                group_by,
                aggregate,
            } => Box::new(AggregateExecutor::new(
                self.create_executor(input),
                group_by.clone(),
                aggregate.clone(),
            )),
        }
    }
}
