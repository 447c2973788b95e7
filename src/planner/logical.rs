//! Logical plan representation.
//!
//! A logical plan is the resolved form of a formula: every relation operand is
//! either a base relation scan or a nested plan, and every literal argument
//! has been parsed into its typed form.

use crate::executor::{AggregateSpec, FieldSpec, SetOperator};

/// Logical plan node for formula trees
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
    /// Read a base relation from the catalog
    Scan { relation: String },

    /// SELECT: keep records matching a condition
    Select {
        input: Box<LogicalPlan>,
        condition: Option<String>,
    },

    /// PROJECT: keep and optionally rename fields
    Project {
        input: Box<LogicalPlan>,
        fields: Vec<FieldSpec>,
    },

    /// JOIN: nested loop join, cross product without a condition
    Join {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
        condition: Option<String>,
    },

    /// UNION, INTERSECT or DIFFERENCE
    SetOperation {
        op: SetOperator,
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
    },

    /// AGGREGATE: group and apply one aggregate function
    Aggregate {
        input: Box<LogicalPlan>,
        group_by: Vec<String>,
        aggregate: AggregateSpec,
    },
}

impl LogicalPlan {
    /// Get a human-readable explanation of this plan
    pub fn explain(&self) -> String {
        let mut out = String::new();
        self.explain_into(0, &mut out);
        out
    }

    fn explain_into(&self, indent_level: usize, out: &mut String) {
        let indent = "  ".repeat(indent_level);
        if !out.is_empty() {
            out.push('\n');
        }

        match self {
            LogicalPlan::Scan { relation } => {
                out.push_str(&format!("{}Scan: {}", indent, relation));
            }
            LogicalPlan::Select { input, condition } => {
                out.push_str(&format!(
                    "{}Select: {}",
                    indent,
                    condition.as_deref().unwrap_or("<all>")
                ));
                input.explain_into(indent_level + 1, out);
            }
            LogicalPlan::Project { input, fields } => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|f| match &f.alias {
                        Some(alias) => format!("{} AS {}", f.source, alias),
                        None => f.source.clone(),
                    })
                    .collect();
                out.push_str(&format!("{}Project: [{}]", indent, fields.join(", ")));
                input.explain_into(indent_level + 1, out);
            }
            LogicalPlan::Join {
                left,
                right,
                condition,
            } => {
                out.push_str(&format!(
                    "{}Join: {}",
                    indent,
                    condition.as_deref().unwrap_or("<cross product>")
                ));
                left.explain_into(indent_level + 1, out);
                right.explain_into(indent_level + 1, out);
            }
            LogicalPlan::SetOperation { op, left, right } => {
                out.push_str(&format!("{}{}", indent, op));
                left.explain_into(indent_level + 1, out);
                right.explain_into(indent_level + 1, out);
            }
            LogicalPlan::Aggregate {
                input,
                group_by,
                aggregate,
            } => {
                out.push_str(&format!(
                    "{}Aggregate: {} by [{}]",
                    indent,
                    aggregate.output_name,
                    group_by.join(", ")
                ));
                input.explain_into(indent_level + 1, out);
            }
        }
    }

    /// Operator nesting depth; a bare scan has depth 0
    pub fn depth(&self) -> usize {
        match self {
            LogicalPlan::Scan { .. } => 0,
            LogicalPlan::Select { input, .. }
            | LogicalPlan::Project { input, .. }
            | LogicalPlan::Aggregate { input, .. } => input.depth() + 1,
            LogicalPlan::Join { left, right, .. }
            | LogicalPlan::SetOperation { left, right, .. } => left.depth().max(right.depth()) + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(name: &str) -> Box<LogicalPlan> {
        Box::new(LogicalPlan::Scan {
            relation: name.to_string(),
        })
    }

    #[test]
    fn test_explain() {
        let plan = LogicalPlan::Project {
            input: Box::new(LogicalPlan::Join {
                left: scan("Employees"),
                right: scan("Assignments"),
                condition: Some("L.id == R.emp_id".to_string()),
            }),
            fields: vec![FieldSpec::new("name"), FieldSpec::with_alias("project", "p")],
        };

        assert_eq!(
            plan.explain(),
            "Project: [name, project AS p]\n  Join: L.id == R.emp_id\n    Scan: Employees\n    Scan: Assignments"
        );
    }

    #[test]
    fn test_depth() {
        assert_eq!(scan("A").depth(), 0);
        let plan = LogicalPlan::SetOperation {
            op: SetOperator::Union,
            left: Box::new(LogicalPlan::Select {
                input: scan("A"),
                condition: None,
            }),
            right: scan("B"),
        };
        assert_eq!(plan.depth(), 2);
    }
}
