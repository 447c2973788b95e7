//! Errors that abort the evaluation of a formula.

use thiserror::Error;

/// Fatal errors raised while parsing or planning a formula.
///
/// Row-level condition failures and non-numeric aggregate inputs are not
/// represented here: they are absorbed by the operators that encounter them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Malformed formula: {0}")]
    MalformedFormula(String),

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Unknown relation or malformed formula: {0}")]
    UnknownRelation(String),

    #[error("Formula nesting depth {depth} exceeds the maximum of {max}")]
    DepthExceeded { depth: usize, max: usize },
}

/// Result type for formula parsing and planning.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            EngineError::MalformedFormula("Missing arguments for SELECT()".to_string())
                .to_string(),
            "Malformed formula: Missing arguments for SELECT()"
        );
        assert_eq!(
            EngineError::UnknownOperator("FOO".to_string()).to_string(),
            "Unknown operator: FOO"
        );
        assert_eq!(
            EngineError::UnknownRelation("Nope".to_string()).to_string(),
            "Unknown relation or malformed formula: Nope"
        );
        assert_eq!(
            EngineError::DepthExceeded { depth: 9, max: 8 }.to_string(),
            "Formula nesting depth 9 exceeds the maximum of 8"
        );
    }
}
