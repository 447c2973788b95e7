//! Error types for condition compilation and evaluation.

use crate::access::DataType;
use thiserror::Error;

/// Errors that can occur while compiling or evaluating a condition
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Character the lexer does not understand
    #[error("Unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },

    /// String literal without its closing quote
    #[error("Unterminated string starting at position {position}")]
    UnterminatedString { position: usize },

    /// Parser found a different token than the grammar allows
    #[error("Expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    /// Parentheses, brackets or prefix operators nested past the limit
    #[error("Condition nested deeper than {max} levels")]
    NestingTooDeep { max: usize },

    /// Name not present in the row namespace
    #[error("Unknown name: {name}")]
    UnknownName { name: String },

    /// Invalid operand types for operator
    #[error("Invalid operand types for operator {operator}: left={left_type:?}, right={right_type:?}")]
    InvalidOperandTypes {
        operator: String,
        left_type: Option<DataType>,
        right_type: Option<DataType>,
    },

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Integer arithmetic overflowed
    #[error("Integer overflow in operator {operator}")]
    ArithmeticOverflow { operator: String },
}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;
