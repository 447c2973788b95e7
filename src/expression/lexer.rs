// Condition lexer - tokenizes predicate text

use super::error::{ExpressionError, ExpressionResult};
use super::token::Token;

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek at the next character without advancing
    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// Consume the current character and return `token`
    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    /// Consume the current character, and the next one if it equals `next`
    fn one_or_two(&mut self, next: char, two: Token, one: Token) -> Token {
        self.advance();
        if self.current_char() == Some(next) {
            self.advance();
            two
        } else {
            one
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> ExpressionResult<Token> {
        self.skip_whitespace();

        let ch = match self.current_char() {
            Some(ch) => ch,
            None => return Ok(Token::Eof),
        };

        let token = match ch {
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '*' => self.single(Token::Star),
            '/' => self.single(Token::Slash),
            '%' => self.single(Token::Percent),
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            '[' => self.single(Token::LeftBracket),
            ']' => self.single(Token::RightBracket),
            ',' => self.single(Token::Comma),
            '.' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => self.single(Token::Dot),
            // `=` and `==` are both equality
            '=' => self.one_or_two('=', Token::Equal, Token::Equal),
            '<' => {
                self.advance();
                match self.current_char() {
                    Some('=') => self.single(Token::LessEqual),
                    Some('>') => self.single(Token::NotEqual),
                    _ => Token::Less,
                }
            }
            '>' => self.one_or_two('=', Token::GreaterEqual, Token::Greater),
            '!' => self.one_or_two('=', Token::NotEqual, Token::Not),
            '&' if self.peek() == Some('&') => {
                self.advance();
                self.single(Token::And)
            }
            '|' if self.peek() == Some('|') => {
                self.advance();
                self.single(Token::Or)
            }
            '\'' | '"' => self.read_string(ch)?,
            c if c.is_alphabetic() || c == '_' => self.read_identifier(),
            c if c.is_ascii_digit() || c == '.' => self.read_number(),
            c => {
                return Err(ExpressionError::UnexpectedCharacter {
                    character: c,
                    position: self.position,
                })
            }
        };

        Ok(token)
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let mut identifier = String::new();

        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::keyword_from_str(&identifier).unwrap_or(Token::Identifier(identifier))
    }

    /// Read a string literal delimited by `quote`
    fn read_string(&mut self, quote: char) -> ExpressionResult<Token> {
        let start = self.position;
        self.advance(); // Skip opening quote
        let mut string = String::new();

        while let Some(ch) = self.current_char() {
            self.advance();
            if ch == quote {
                return Ok(Token::String(string));
            }
            string.push(ch);
        }

        Err(ExpressionError::UnterminatedString { position: start })
    }

    /// Read a number (integer or float)
    fn read_number(&mut self) -> Token {
        let mut number = String::new();
        let mut has_dot = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.' && !has_dot && self.peek().is_some_and(|c| c.is_ascii_digit()) {
                has_dot = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::Number(number)
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> ExpressionResult<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            if token == Token::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }

        Ok(tokens)
    }
}
