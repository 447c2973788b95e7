//! Literal operands: lists, quoted strings and raw tokens.

use crate::formula::splitter::split_top_level_commas;

/// A literal argument, as opposed to a relation-valued one
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `[a, 'b', "c"]` with the element quotes stripped
    List(Vec<String>),
    /// A quoted string (quotes removed) or a raw token
    Text(String),
}

impl Literal {
    /// View the literal as a list of items; a single text becomes a
    /// one-element list and an empty text an empty one.
    pub fn into_items(self) -> Vec<String> {
        match self {
            Literal::List(items) => items,
            Literal::Text(text) if text.is_empty() => Vec::new(),
            Literal::Text(text) => vec![text],
        }
    }
}

/// Parse a raw argument as a literal
pub fn parse_literal(raw: &str) -> Literal {
    let raw = raw.trim();
    if raw.starts_with('[') && raw.ends_with(']') && raw.len() >= 2 {
        let items = split_top_level_commas(&raw[1..raw.len() - 1])
            .into_iter()
            .map(|item| strip_quote_chars(&item).to_string())
            .collect();
        return Literal::List(items);
    }
    Literal::Text(unquote(raw).to_string())
}

/// Remove the surrounding quotes when the whole text is one quoted string.
///
/// A string ends at the next occurrence of its opening quote, so
/// `'a' == x or y == 'b'` is left untouched.
pub fn unquote(text: &str) -> &str {
    let text = text.trim();
    let Some(quote) = text.chars().next().filter(|c| *c == '"' || *c == '\'') else {
        return text;
    };
    let body = &text[1..];
    match body.find(quote) {
        Some(close) if close + 1 == body.len() => &body[..close],
        _ => text,
    }
}

/// Trim whitespace and any leading/trailing quote characters from a list item
fn strip_quote_chars(item: &str) -> &str {
    item.trim().trim_matches(|c| c == '\'' || c == '"')
}
