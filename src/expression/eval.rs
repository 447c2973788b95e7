//! Expression evaluation implementation.

use crate::access::{Record, Value, LEFT_QUALIFIER, RIGHT_QUALIFIER};
use crate::expression::parser::parse_condition;
use crate::expression::{
    BinaryOperator, ColumnRef, Expression, ExpressionError, ExpressionResult, UnaryOperator,
};
use std::cmp::Ordering;

/// Names visible to a condition while it is evaluated against one row
pub trait Namespace {
    /// Look up an unqualified name
    fn lookup(&self, name: &str) -> Option<&Value>;

    /// Look up `qualifier.name`
    fn lookup_qualified(&self, qualifier: &str, name: &str) -> Option<&Value>;
}

/// A single record exposes its own fields. Qualified names resolve through
/// the record's join sides, or a field literally named `qualifier.name`.
impl Namespace for Record {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }

    fn lookup_qualified(&self, qualifier: &str, name: &str) -> Option<&Value> {
        self.side(qualifier)
            .and_then(|side| side.get(name))
            .or_else(|| self.get(&format!("{}.{}", qualifier, name)))
    }
}

/// Namespace for a candidate JOIN pair.
///
/// Unqualified names see both records, with the right record winning on
/// collisions; `L.x` and `R.x` address one side explicitly.
pub struct JoinNamespace<'a> {
    pub left: &'a Record,
    pub right: &'a Record,
}

impl<'a> JoinNamespace<'a> {
    pub fn new(left: &'a Record, right: &'a Record) -> Self {
        Self { left, right }
    }
}

impl Namespace for JoinNamespace<'_> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.right.get(name).or_else(|| self.left.get(name))
    }

    fn lookup_qualified(&self, qualifier: &str, name: &str) -> Option<&Value> {
        match qualifier {
            LEFT_QUALIFIER => self.left.get(name),
            RIGHT_QUALIFIER => self.right.get(name),
            _ => None,
        }
    }
}

/// Evaluator for expressions
pub struct ExpressionEvaluator<'a> {
    namespace: &'a dyn Namespace,
}

impl<'a> ExpressionEvaluator<'a> {
    /// Create a new evaluator over a row namespace
    pub fn new(namespace: &'a dyn Namespace) -> Self {
        Self { namespace }
    }

    /// Evaluate an expression and return the result
    pub fn evaluate(&self, expr: &Expression) -> ExpressionResult<Value> {
        match expr {
            Expression::Literal(value) => Ok(value.clone()),

            Expression::ColumnRef(col) => self.evaluate_column_ref(col),

            Expression::List(items) => Ok(Value::List(
                items
                    .iter()
                    .map(|item| self.evaluate(item))
                    .collect::<ExpressionResult<Vec<_>>>()?,
            )),

            // AND/OR short-circuit on the truthiness of the left operand
            Expression::BinaryOp {
                op: BinaryOperator::And,
                left,
                right,
            } => {
                if !self.evaluate(left)?.is_truthy() {
                    return Ok(Value::Boolean(false));
                }
                Ok(Value::Boolean(self.evaluate(right)?.is_truthy()))
            }

            Expression::BinaryOp {
                op: BinaryOperator::Or,
                left,
                right,
            } => {
                if self.evaluate(left)?.is_truthy() {
                    return Ok(Value::Boolean(true));
                }
                Ok(Value::Boolean(self.evaluate(right)?.is_truthy()))
            }

            Expression::BinaryOp { op, left, right } => {
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;
                self.evaluate_binary_op(*op, left_val, right_val)
            }

            Expression::UnaryOp { op, operand } => {
                let operand_val = self.evaluate(operand)?;
                self.evaluate_unary_op(*op, operand_val)
            }

            Expression::In {
                expr,
                collection,
                negated,
            } => {
                let needle = self.evaluate(expr)?;
                let haystack = self.evaluate(collection)?;
                let found = self.contains(&haystack, &needle)?;
                Ok(Value::Boolean(found != *negated))
            }
        }
    }

    /// Evaluate a field reference
    fn evaluate_column_ref(&self, col: &ColumnRef) -> ExpressionResult<Value> {
        let value = match &col.qualifier {
            Some(qualifier) => self.namespace.lookup_qualified(qualifier, &col.name),
            None => self.namespace.lookup(&col.name),
        };
        value.cloned().ok_or_else(|| ExpressionError::UnknownName {
            name: col.display_name(),
        })
    }

    /// Evaluate a non short-circuiting binary operation
    fn evaluate_binary_op(
        &self,
        op: BinaryOperator,
        left: Value,
        right: Value,
    ) -> ExpressionResult<Value> {
        match op {
            BinaryOperator::Add => match (&left, &right) {
                (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
                (Value::List(a), Value::List(b)) => {
                    Ok(Value::List(a.iter().chain(b.iter()).cloned().collect()))
                }
                _ => self.arithmetic(op, &left, &right, i64::checked_add, |a, b| a + b),
            },

            BinaryOperator::Sub => self.arithmetic(op, &left, &right, i64::checked_sub, |a, b| a - b),

            BinaryOperator::Mul => self.arithmetic(op, &left, &right, i64::checked_mul, |a, b| a * b),

            // Division always produces a float
            BinaryOperator::Div => {
                let (a, b) = self.numeric_operands(op, &left, &right)?;
                if b == 0.0 {
                    return Err(ExpressionError::DivisionByZero);
                }
                Ok(Value::Float(a / b))
            }

            // Modulo takes the sign of the divisor
            BinaryOperator::Mod => match (&left, &right) {
                (Value::Int(_), Value::Int(0)) => Err(ExpressionError::DivisionByZero),
                (Value::Int(a), Value::Int(b)) => a
                    .checked_rem(*b)
                    .map(|r| if r != 0 && (r < 0) != (*b < 0) { r + b } else { r })
                    .map(Value::Int)
                    .ok_or_else(|| ExpressionError::ArithmeticOverflow {
                        operator: op.as_str().to_string(),
                    }),
                _ => {
                    let (a, b) = self.numeric_operands(op, &left, &right)?;
                    if b == 0.0 {
                        return Err(ExpressionError::DivisionByZero);
                    }
                    Ok(Value::Float(a - b * (a / b).floor()))
                }
            },

            // Comparison operators
            BinaryOperator::Eq => Ok(Value::Boolean(left.loosely_equals(&right))),
            BinaryOperator::Ne => Ok(Value::Boolean(!left.loosely_equals(&right))),
            BinaryOperator::Lt => self.compare_values(op, &left, &right, |cmp| cmp.is_lt()),
            BinaryOperator::Le => self.compare_values(op, &left, &right, |cmp| cmp.is_le()),
            BinaryOperator::Gt => self.compare_values(op, &left, &right, |cmp| cmp.is_gt()),
            BinaryOperator::Ge => self.compare_values(op, &left, &right, |cmp| cmp.is_ge()),

            // Logical operators
            BinaryOperator::And => Ok(Value::Boolean(left.is_truthy() && right.is_truthy())),
            BinaryOperator::Or => Ok(Value::Boolean(left.is_truthy() || right.is_truthy())),
        }
    }

    /// Evaluate a unary operation
    fn evaluate_unary_op(&self, op: UnaryOperator, operand: Value) -> ExpressionResult<Value> {
        match op {
            UnaryOperator::Not => Ok(Value::Boolean(!operand.is_truthy())),

            UnaryOperator::IsNull => Ok(Value::Boolean(operand.is_null())),

            UnaryOperator::IsNotNull => Ok(Value::Boolean(!operand.is_null())),

            UnaryOperator::Plus => match operand {
                Value::Int(_) | Value::Float(_) => Ok(operand),
                _ => Err(ExpressionError::InvalidOperandTypes {
                    operator: op.as_str().to_string(),
                    left_type: operand.data_type(),
                    right_type: None,
                }),
            },

            UnaryOperator::Minus => match operand {
                Value::Int(n) => n.checked_neg().map(Value::Int).ok_or_else(|| {
                    ExpressionError::ArithmeticOverflow {
                        operator: op.as_str().to_string(),
                    }
                }),
                Value::Float(f) => Ok(Value::Float(-f)),
                _ => Err(ExpressionError::InvalidOperandTypes {
                    operator: op.as_str().to_string(),
                    left_type: operand.data_type(),
                    right_type: None,
                }),
            },
        }
    }

    /// Integer arithmetic when both sides are integers, float otherwise
    fn arithmetic(
        &self,
        op: BinaryOperator,
        left: &Value,
        right: &Value,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
    ) -> ExpressionResult<Value> {
        if let (Value::Int(a), Value::Int(b)) = (left, right) {
            return int_op(*a, *b)
                .map(Value::Int)
                .ok_or_else(|| ExpressionError::ArithmeticOverflow {
                    operator: op.as_str().to_string(),
                });
        }
        let (a, b) = self.numeric_operands(op, left, right)?;
        Ok(Value::Float(float_op(a, b)))
    }

    fn numeric_operands(
        &self,
        op: BinaryOperator,
        left: &Value,
        right: &Value,
    ) -> ExpressionResult<(f64, f64)> {
        match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(ExpressionError::InvalidOperandTypes {
                operator: op.as_str().to_string(),
                left_type: left.data_type(),
                right_type: right.data_type(),
            }),
        }
    }

    /// Compare two values and apply a comparison function
    fn compare_values<F>(
        &self,
        op: BinaryOperator,
        left: &Value,
        right: &Value,
        cmp_fn: F,
    ) -> ExpressionResult<Value>
    where
        F: FnOnce(Ordering) -> bool,
    {
        match left.partial_compare(right) {
            Some(ordering) => Ok(Value::Boolean(cmp_fn(ordering))),
            None => Err(ExpressionError::InvalidOperandTypes {
                operator: op.as_str().to_string(),
                left_type: left.data_type(),
                right_type: right.data_type(),
            }),
        }
    }

    /// Membership: element of a list, or substring of a string
    fn contains(&self, haystack: &Value, needle: &Value) -> ExpressionResult<bool> {
        match (haystack, needle) {
            (Value::List(items), _) => Ok(items.iter().any(|item| item.loosely_equals(needle))),
            (Value::String(s), Value::String(sub)) => Ok(s.contains(sub.as_str())),
            _ => Err(ExpressionError::InvalidOperandTypes {
                operator: "IN".to_string(),
                left_type: needle.data_type(),
                right_type: haystack.data_type(),
            }),
        }
    }
}

/// Helper function to evaluate an expression against a namespace
pub fn evaluate_expression(expr: &Expression, namespace: &dyn Namespace) -> ExpressionResult<Value> {
    ExpressionEvaluator::new(namespace).evaluate(expr)
}

/// A condition compiled once and applied to many rows
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    text: String,
    expr: Expression,
}

impl Condition {
    /// Compile condition text into a reusable predicate
    pub fn compile(text: &str) -> ExpressionResult<Self> {
        let expr = parse_condition(text)?;
        Ok(Self {
            text: text.to_string(),
            expr,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn expression(&self) -> &Expression {
        &self.expr
    }

    /// Evaluate the condition against one row; truthiness decides the match
    pub fn matches(&self, namespace: &dyn Namespace) -> ExpressionResult<bool> {
        Ok(evaluate_expression(&self.expr, namespace)?.is_truthy())
    }
}
