// Condition tokens for lexical analysis

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Identifier(String),
    Number(String),
    String(String),

    // Keywords
    And,
    Or,
    Not,
    In,
    Is,
    True,
    False,
    Null,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,

    // Special
    Eof,
}

impl Token {
    /// Convert a word to a keyword token if it matches.
    ///
    /// `None` is accepted as a spelling of NULL.
    pub fn keyword_from_str(s: &str) -> Option<Token> {
        match s.to_uppercase().as_str() {
            "AND" => Some(Token::And),
            "OR" => Some(Token::Or),
            "NOT" => Some(Token::Not),
            "IN" => Some(Token::In),
            "IS" => Some(Token::Is),
            "TRUE" => Some(Token::True),
            "FALSE" => Some(Token::False),
            "NULL" | "NONE" => Some(Token::Null),
            _ => None,
        }
    }

    /// Check if the token compares two operands
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Token::Equal
                | Token::NotEqual
                | Token::Less
                | Token::Greater
                | Token::LessEqual
                | Token::GreaterEqual
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_from_str() {
        assert_eq!(Token::keyword_from_str("and"), Some(Token::And));
        assert_eq!(Token::keyword_from_str("True"), Some(Token::True));
        assert_eq!(Token::keyword_from_str("None"), Some(Token::Null));
        assert_eq!(Token::keyword_from_str("salary"), None);
    }

    #[test]
    fn test_comparison_detection() {
        assert!(Token::LessEqual.is_comparison());
        assert!(!Token::Plus.is_comparison());
        assert!(!Token::In.is_comparison());
    }
}
