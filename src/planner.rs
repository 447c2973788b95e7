//! Formula planner.
//!
//! The planner turns formula text into a [`LogicalPlan`]. It performs operand
//! resolution: each argument of an operator is classified as a nested
//! operator application (planned recursively), the name of a base relation,
//! or a literal. Arguments in relation positions must resolve to a relation.
//!
//! Nesting is bounded by a configurable maximum depth, so deeply nested input
//! fails with [`EngineError::DepthExceeded`] instead of exhausting the stack.

pub mod logical;

use crate::catalog::Catalog;
use crate::error::{EngineError, EngineResult};
use crate::executor::{AggregateSpec, FieldSpec, SetOperator};
use crate::formula::{
    looks_like_call, parse_formula, parse_literal, unquote, Formula, Literal, Operator,
};
use log::trace;

pub use logical::LogicalPlan;

/// A resolved operator argument
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A relation: a base relation scan or a nested operator application
    Relation(LogicalPlan),
    /// Anything else
    Literal(Literal),
}

/// Planner that converts formula text to logical plans
pub struct Planner<'a> {
    catalog: &'a Catalog,
    max_depth: usize,
}

impl<'a> Planner<'a> {
    /// Create a new planner over the given catalog
    pub fn new(catalog: &'a Catalog, max_depth: usize) -> Self {
        Self { catalog, max_depth }
    }

    /// Plan a complete formula.
    ///
    /// A bare formula must name a base relation.
    pub fn plan(&self, formula: &str) -> EngineResult<LogicalPlan> {
        self.plan_formula(formula, 1)
    }

    fn plan_formula(&self, text: &str, depth: usize) -> EngineResult<LogicalPlan> {
        match parse_formula(text)? {
            Formula::Reference(name) => {
                if self.catalog.contains(&name) {
                    Ok(LogicalPlan::Scan { relation: name })
                } else {
                    Err(EngineError::UnknownRelation(name))
                }
            }
            Formula::Call { name, args } => {
                if depth > self.max_depth {
                    return Err(EngineError::DepthExceeded {
                        depth,
                        max: self.max_depth,
                    });
                }
                let op: Operator = name.parse()?;
                trace!(
                    "Planning {} with {} argument(s) at depth {}",
                    op,
                    args.len(),
                    depth
                );
                self.plan_call(op, &args, depth)
            }
        }
    }

    fn plan_call(
        &self,
        op: Operator,
        args: &[String],
        depth: usize,
    ) -> EngineResult<LogicalPlan> {
        match op {
            Operator::Select => {
                Self::check_arity(op, args, 1, 2)?;
                Ok(LogicalPlan::Select {
                    input: Box::new(self.relation_operand(op, args, 0, depth)?),
                    condition: Self::condition_argument(args.get(1)),
                })
            }
            Operator::Project => {
                Self::check_arity(op, args, 2, 2)?;
                let input = self.relation_operand(op, args, 0, depth)?;
                let fields = self
                    .list_operand(op, &args[1], depth)?
                    .iter()
                    .map(|spec| FieldSpec::parse(spec))
                    .collect();
                Ok(LogicalPlan::Project {
                    input: Box::new(input),
                    fields,
                })
            }
            Operator::Join => {
                Self::check_arity(op, args, 2, 3)?;
                Ok(LogicalPlan::Join {
                    left: Box::new(self.relation_operand(op, args, 0, depth)?),
                    right: Box::new(self.relation_operand(op, args, 1, depth)?),
                    condition: Self::condition_argument(args.get(2)),
                })
            }
            Operator::Union | Operator::Intersect | Operator::Difference => {
                Self::check_arity(op, args, 2, 2)?;
                let set_op = match op {
                    Operator::Union => SetOperator::Union,
                    Operator::Intersect => SetOperator::Intersect,
                    _ => SetOperator::Difference,
                };
                Ok(LogicalPlan::SetOperation {
                    op: set_op,
                    left: Box::new(self.relation_operand(op, args, 0, depth)?),
                    right: Box::new(self.relation_operand(op, args, 1, depth)?),
                })
            }
            Operator::Aggregate => {
                Self::check_arity(op, args, 3, 3)?;
                let input = self.relation_operand(op, args, 0, depth)?;
                let group_by = self.list_operand(op, &args[1], depth)?;
                let aggregate = AggregateSpec::parse(unquote(&args[2]))?;
                Ok(LogicalPlan::Aggregate {
                    input: Box::new(input),
                    group_by,
                    aggregate,
                })
            }
        }
    }

    /// Resolve a raw argument.
    ///
    /// Text shaped like `NAME(...)` whose name is a known operator is planned
    /// recursively; a catalog name becomes a scan; everything else is a
    /// literal.
    pub fn resolve(&self, raw: &str, depth: usize) -> EngineResult<Operand> {
        let raw = raw.trim();
        if looks_like_call(raw) {
            let is_operator = raw
                .find('(')
                .and_then(|open| Operator::from_name(&raw[..open]))
                .is_some();
            if is_operator {
                return Ok(Operand::Relation(self.plan_formula(raw, depth + 1)?));
            }
        }
        if self.catalog.contains(raw) {
            return Ok(Operand::Relation(LogicalPlan::Scan {
                relation: raw.to_string(),
            }));
        }
        Ok(Operand::Literal(parse_literal(raw)))
    }

    fn relation_operand(
        &self,
        op: Operator,
        args: &[String],
        idx: usize,
        depth: usize,
    ) -> EngineResult<LogicalPlan> {
        let raw = args.get(idx).ok_or_else(|| {
            EngineError::MalformedFormula(format!(
                "{} expects a relation as argument {}",
                op,
                idx + 1
            ))
        })?;
        match self.resolve(raw, depth)? {
            Operand::Relation(plan) => Ok(plan),
            Operand::Literal(_) => Err(EngineError::UnknownRelation(raw.trim().to_string())),
        }
    }

    fn list_operand(&self, op: Operator, raw: &str, depth: usize) -> EngineResult<Vec<String>> {
        match self.resolve(raw, depth)? {
            Operand::Literal(literal) => Ok(literal.into_items()),
            // A bare name that happens to match a relation still means a field
            Operand::Relation(LogicalPlan::Scan { relation }) => Ok(vec![relation]),
            Operand::Relation(_) => Err(EngineError::MalformedFormula(format!(
                "{} expects a field list, found '{}'",
                op,
                raw.trim()
            ))),
        }
    }

    fn condition_argument(raw: Option<&String>) -> Option<String> {
        raw.map(|text| unquote(text).trim().to_string())
            .filter(|text| !text.is_empty())
    }

    fn check_arity(op: Operator, args: &[String], min: usize, max: usize) -> EngineResult<()> {
        if args.len() < min {
            return Err(EngineError::MalformedFormula(format!(
                "{} expects at least {} argument(s), found {}",
                op,
                min,
                args.len()
            )));
        }
        if args.len() > max {
            return Err(EngineError::MalformedFormula(format!(
                "{} expects at most {} argument(s), found {}",
                op,
                max,
                args.len()
            )));
        }
        Ok(())
    }
}
