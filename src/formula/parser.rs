//! Formula classification: bare references versus operator applications.

use crate::error::{EngineError, EngineResult};
use crate::formula::splitter::split_top_level_commas;
use std::fmt;
use std::str::FromStr;

/// The relational-algebra operators a formula may apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Select,
    Project,
    Join,
    Union,
    Intersect,
    Difference,
    Aggregate,
}

impl Operator {
    pub const ALL: [Operator; 7] = [
        Operator::Select,
        Operator::Project,
        Operator::Join,
        Operator::Union,
        Operator::Intersect,
        Operator::Difference,
        Operator::Aggregate,
    ];

    /// Convert an operator name (any case) to an operator if it matches
    pub fn from_name(name: &str) -> Option<Operator> {
        let name = name.trim();
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(name))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Select => "SELECT",
            Operator::Project => "PROJECT",
            Operator::Join => "JOIN",
            Operator::Union => "UNION",
            Operator::Intersect => "INTERSECT",
            Operator::Difference => "DIFFERENCE",
            Operator::Aggregate => "AGGREGATE",
        }
    }
}

impl FromStr for Operator {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        Operator::from_name(s).ok_or_else(|| EngineError::UnknownOperator(s.trim().to_uppercase()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified formula
#[derive(Debug, Clone, PartialEq)]
pub enum Formula {
    /// A bare token: a relation name or a literal
    Reference(String),
    /// `NAME(arg1, arg2, ...)` with the raw, unparsed argument strings
    Call { name: String, args: Vec<String> },
}

/// Check whether a string looks like an operator application: it contains an
/// opening parenthesis and ends with a closing one.
pub fn looks_like_call(text: &str) -> bool {
    let text = text.trim();
    text.contains('(') && text.ends_with(')')
}

/// Classify a formula string.
///
/// The operator name is the uppercased text before the first `(`, and the
/// arguments are the top-level comma separated pieces between that `(` and
/// the final `)`.
pub fn parse_formula(text: &str) -> EngineResult<Formula> {
    let text = text.trim();

    let open = match text.find('(') {
        Some(idx) => idx,
        None => return Ok(Formula::Reference(text.to_string())),
    };

    if !text.ends_with(')') {
        return Err(EngineError::MalformedFormula(format!(
            "missing closing parenthesis in '{}'",
            text
        )));
    }
    check_balanced(text)?;

    let name = text[..open].trim().to_uppercase();
    if name.is_empty() {
        return Err(EngineError::MalformedFormula(format!(
            "missing operator name in '{}'",
            text
        )));
    }

    let inner = text[open + 1..text.len() - 1].trim();
    if inner.is_empty() {
        return Err(EngineError::MalformedFormula(format!(
            "Missing arguments for {}()",
            name
        )));
    }

    Ok(Formula::Call {
        name,
        args: split_top_level_commas(inner),
    })
}

/// Verify that parentheses outside quoted strings are balanced
fn check_balanced(text: &str) -> EngineResult<()> {
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;

    for ch in text.chars() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    break;
                }
            }
            _ => {}
        }
    }

    if depth != 0 || quote.is_some() {
        return Err(EngineError::MalformedFormula(format!(
            "unbalanced parentheses or quotes in '{}'",
            text
        )));
    }
    Ok(())
}
