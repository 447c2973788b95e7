//! Expression AST definitions.

use crate::access::Value;
use crate::expression::operator::{BinaryOperator, UnaryOperator};

/// Field reference in an expression, optionally qualified (`L.name`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub qualifier: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            qualifier: None,
            name: name.into(),
        }
    }

    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }

    /// The reference as written, e.g. `R.dept`
    pub fn display_name(&self) -> String {
        match &self.qualifier {
            Some(q) => format!("{}.{}", q, self.name),
            None => self.name.clone(),
        }
    }
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal constant value
    Literal(Value),

    /// Field reference
    ColumnRef(ColumnRef),

    /// List display, e.g. `['A', 'B']`
    List(Vec<Expression>),

    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Membership test against a list (or substring test against a string)
    In {
        expr: Box<Expression>,
        collection: Box<Expression>,
        negated: bool,
    },
}

impl Expression {
    /// Create a literal expression
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    /// Create an unqualified field reference
    pub fn column(name: impl Into<String>) -> Self {
        Expression::ColumnRef(ColumnRef::new(name))
    }

    /// Create a qualified field reference
    pub fn qualified_column(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Expression::ColumnRef(ColumnRef::qualified(qualifier, name))
    }

    /// Create a binary operation expression
    pub fn binary_op(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create a unary operation expression
    pub fn unary_op(op: UnaryOperator, operand: Expression) -> Self {
        Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    /// Create an IN / NOT IN expression
    pub fn in_list(expr: Expression, collection: Expression, negated: bool) -> Self {
        Expression::In {
            expr: Box::new(expr),
            collection: Box::new(collection),
            negated,
        }
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::And, left, right)
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Or, left, right)
    }

    pub fn not_expr(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::Not, operand)
    }

    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Eq, left, right)
    }

    pub fn gt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Gt, left, right)
    }

    pub fn lt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Lt, left, right)
    }

    pub fn add_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Add, left, right)
    }

    pub fn is_null(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::IsNull, operand)
    }

    pub fn is_not_null(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::IsNotNull, operand)
    }

    /// Collect every field reference in the expression
    pub fn referenced_columns(&self) -> Vec<&ColumnRef> {
        let mut refs = Vec::new();
        self.collect_columns(&mut refs);
        refs
    }

    fn collect_columns<'a>(&'a self, refs: &mut Vec<&'a ColumnRef>) {
        match self {
            Expression::Literal(_) => {}
            Expression::ColumnRef(col) => refs.push(col),
            Expression::List(items) => items.iter().for_each(|e| e.collect_columns(refs)),
            Expression::BinaryOp { left, right, .. } => {
                left.collect_columns(refs);
                right.collect_columns(refs);
            }
            Expression::UnaryOp { operand, .. } => operand.collect_columns(refs),
            Expression::In {
                expr, collection, ..
            } => {
                expr.collect_columns(refs);
                collection.collect_columns(refs);
            }
        }
    }
}
