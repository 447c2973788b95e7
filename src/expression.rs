//! Condition evaluation for SELECT and JOIN.
//!
//! This module provides:
//! - A lexer and recursive-descent parser for condition text
//! - Expression AST representation
//! - Evaluation against a per-row namespace of field values
//!
//! Conditions are compiled once per operator invocation into a [`Condition`]
//! and then applied to each row. The language is deliberately small: field
//! references (optionally qualified as `L.x` / `R.x`), literals, arithmetic,
//! comparisons, membership tests and boolean connectives. Nothing in it can
//! reach outside the row it is evaluated against.

pub mod error;
pub mod eval;
pub mod expr;
pub mod lexer;
pub mod operator;
pub mod parser;
pub mod token;

pub use error::{ExpressionError, ExpressionResult};
pub use eval::{evaluate_expression, Condition, ExpressionEvaluator, JoinNamespace, Namespace};
pub use expr::{ColumnRef, Expression};
pub use operator::{BinaryOperator, UnaryOperator};
pub use parser::parse_condition;
