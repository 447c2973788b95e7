//! Formula text handling.
//!
//! A formula is either a bare relation name or `OPERATOR(arg, ...)` where each
//! argument is itself a formula, a literal, or a field/condition expression.
//! This module only deals with text: splitting argument lists, classifying
//! formulas and parsing literals. Turning arguments into relations is the
//! planner's job.

pub mod operand;
pub mod parser;
pub mod splitter;

pub use operand::{parse_literal, unquote, Literal};
pub use parser::{looks_like_call, parse_formula, Formula, Operator};
pub use splitter::split_top_level_commas;
