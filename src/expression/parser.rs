// Condition parser - converts tokens to an expression tree

use super::error::{ExpressionError, ExpressionResult};
use super::expr::Expression;
use super::lexer::Lexer;
use super::operator::{BinaryOperator, UnaryOperator};
use super::token::Token;
use crate::access::Value;

/// Maximum nesting of parentheses, brackets and prefix operators
pub const MAX_NESTING_DEPTH: usize = 64;

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    pub fn new(input: &str) -> ExpressionResult<Self> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Parser {
            tokens,
            position: 0,
            depth: 0,
        })
    }

    /// Parse the whole input as a single expression
    pub fn parse(&mut self) -> ExpressionResult<Expression> {
        let expr = self.parse_expression()?;
        self.expect_token(Token::Eof)?;
        Ok(expr)
    }

    /// Parse expression
    fn parse_expression(&mut self) -> ExpressionResult<Expression> {
        self.parse_or()
    }

    /// Parse OR expression
    fn parse_or(&mut self) -> ExpressionResult<Expression> {
        let mut left = self.parse_and()?;

        while self.match_token(&Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Expression::binary_op(BinaryOperator::Or, left, right);
        }

        Ok(left)
    }

    /// Parse AND expression
    fn parse_and(&mut self) -> ExpressionResult<Expression> {
        let mut left = self.parse_not()?;

        while self.match_token(&Token::And) {
            self.advance();
            let right = self.parse_not()?;
            left = Expression::binary_op(BinaryOperator::And, left, right);
        }

        Ok(left)
    }

    /// Parse NOT expression
    fn parse_not(&mut self) -> ExpressionResult<Expression> {
        if self.match_token(&Token::Not) {
            self.advance();
            let operand = self.nested(Self::parse_not)?;
            Ok(Expression::not_expr(operand))
        } else {
            self.parse_comparison()
        }
    }

    /// Parse comparison expression.
    ///
    /// Chained comparisons such as `1 < x <= 5` mean `1 < x and x <= 5`.
    fn parse_comparison(&mut self) -> ExpressionResult<Expression> {
        let mut left = self.parse_additive()?;
        let mut result: Option<Expression> = None;

        loop {
            let comparison = match self.current_token() {
                Token::Is => {
                    self.advance();
                    let negated = self.consume(&Token::Not);
                    self.expect_token(Token::Null)?;
                    let op = if negated {
                        UnaryOperator::IsNotNull
                    } else {
                        UnaryOperator::IsNull
                    };
                    // IS [NOT] NULL ends the chain
                    let test = Expression::unary_op(op, left);
                    return Ok(Self::chain(result, test));
                }
                Token::In => {
                    self.advance();
                    let collection = self.parse_additive()?;
                    (Expression::in_list(left.clone(), collection.clone(), false), collection)
                }
                Token::Not if self.peek_token() == Token::In => {
                    self.advance();
                    self.advance();
                    let collection = self.parse_additive()?;
                    (Expression::in_list(left.clone(), collection.clone(), true), collection)
                }
                token if token.is_comparison() => {
                    self.advance();
                    let op = match token {
                        Token::Equal => BinaryOperator::Eq,
                        Token::NotEqual => BinaryOperator::Ne,
                        Token::Less => BinaryOperator::Lt,
                        Token::LessEqual => BinaryOperator::Le,
                        Token::Greater => BinaryOperator::Gt,
                        _ => BinaryOperator::Ge,
                    };
                    let right = self.parse_additive()?;
                    (
                        Expression::binary_op(op, left.clone(), right.clone()),
                        right,
                    )
                }
                _ => break,
            };

            let (test, next_left) = comparison;
            result = Some(Self::chain(result, test));
            left = next_left;
        }

        Ok(result.unwrap_or(left))
    }

    fn chain(previous: Option<Expression>, test: Expression) -> Expression {
        match previous {
            Some(prev) => Expression::and(prev, test),
            None => test,
        }
    }

    /// Parse addition and subtraction
    fn parse_additive(&mut self) -> ExpressionResult<Expression> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expression::binary_op(op, left, right);
        }

        Ok(left)
    }

    /// Parse multiplication, division and modulo
    fn parse_multiplicative(&mut self) -> ExpressionResult<Expression> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Mul,
                Token::Slash => BinaryOperator::Div,
                Token::Percent => BinaryOperator::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expression::binary_op(op, left, right);
        }

        Ok(left)
    }

    /// Parse unary plus/minus
    fn parse_unary(&mut self) -> ExpressionResult<Expression> {
        match self.current_token() {
            Token::Minus => {
                self.advance();
                let operand = self.nested(Self::parse_unary)?;
                Ok(Expression::unary_op(UnaryOperator::Minus, operand))
            }
            Token::Plus => {
                self.advance();
                let operand = self.nested(Self::parse_unary)?;
                Ok(Expression::unary_op(UnaryOperator::Plus, operand))
            }
            _ => self.parse_primary(),
        }
    }

    /// Parse primary expression
    fn parse_primary(&mut self) -> ExpressionResult<Expression> {
        match self.current_token() {
            Token::Number(n) => {
                self.advance();
                // Try to parse as integer first, then float
                if let Ok(i) = n.parse::<i64>() {
                    Ok(Expression::literal(i))
                } else if let Ok(f) = n.parse::<f64>() {
                    Ok(Expression::literal(f))
                } else {
                    Err(ExpressionError::UnexpectedToken {
                        expected: "number".to_string(),
                        found: n,
                    })
                }
            }
            Token::String(s) => {
                self.advance();
                Ok(Expression::literal(s))
            }
            Token::True => {
                self.advance();
                Ok(Expression::literal(true))
            }
            Token::False => {
                self.advance();
                Ok(Expression::literal(false))
            }
            Token::Null => {
                self.advance();
                Ok(Expression::Literal(Value::Null))
            }
            Token::Identifier(name) => {
                self.advance();

                // Check for qualified field (L.field)
                if self.match_token(&Token::Dot) {
                    self.advance();
                    let field = self.expect_identifier()?;
                    Ok(Expression::qualified_column(name, field))
                } else {
                    Ok(Expression::column(name))
                }
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.nested(Self::parse_expression)?;
                if self.consume(&Token::Comma) {
                    // Parenthesized tuple, treated like a list
                    let mut items = vec![expr];
                    items.extend(self.parse_expression_list(&Token::RightParen)?);
                    self.expect_token(Token::RightParen)?;
                    return Ok(Expression::List(items));
                }
                self.expect_token(Token::RightParen)?;
                Ok(expr)
            }
            Token::LeftBracket => {
                self.advance();
                let items = self.nested(|p| p.parse_expression_list(&Token::RightBracket))?;
                self.expect_token(Token::RightBracket)?;
                Ok(Expression::List(items))
            }
            token => Err(ExpressionError::UnexpectedToken {
                expected: "expression".to_string(),
                found: Self::describe(&token),
            }),
        }
    }

    /// Parse a possibly empty, comma separated list ending before `end`.
    /// A trailing comma is allowed.
    fn parse_expression_list(&mut self, end: &Token) -> ExpressionResult<Vec<Expression>> {
        let mut expressions = vec![];

        while !self.match_token(end) {
            expressions.push(self.parse_expression()?);
            if !self.consume(&Token::Comma) {
                break;
            }
        }

        Ok(expressions)
    }

    // Helper methods

    /// Run `parse` one nesting level deeper
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> ExpressionResult<T>,
    ) -> ExpressionResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ExpressionError::NestingTooDeep {
                max: MAX_NESTING_DEPTH,
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Get current token
    fn current_token(&self) -> Token {
        self.tokens
            .get(self.position)
            .cloned()
            .unwrap_or(Token::Eof)
    }

    /// Get the token after the current one
    fn peek_token(&self) -> Token {
        self.tokens
            .get(self.position + 1)
            .cloned()
            .unwrap_or(Token::Eof)
    }

    /// Advance to next token
    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    /// Check if current token matches
    fn match_token(&self, token: &Token) -> bool {
        self.current_token() == *token
    }

    /// Advance past the current token if it matches
    fn consume(&mut self, token: &Token) -> bool {
        if self.match_token(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect a specific token
    fn expect_token(&mut self, token: Token) -> ExpressionResult<()> {
        if self.current_token() == token {
            self.advance();
            Ok(())
        } else {
            Err(ExpressionError::UnexpectedToken {
                expected: Self::describe(&token),
                found: Self::describe(&self.current_token()),
            })
        }
    }

    /// Expect an identifier
    fn expect_identifier(&mut self) -> ExpressionResult<String> {
        match self.current_token() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            token => Err(ExpressionError::UnexpectedToken {
                expected: "identifier".to_string(),
                found: Self::describe(&token),
            }),
        }
    }

    fn describe(token: &Token) -> String {
        match token {
            Token::Eof => "end of input".to_string(),
            other => format!("{:?}", other),
        }
    }
}

/// Parse condition text into an expression tree
pub fn parse_condition(input: &str) -> ExpressionResult<Expression> {
    Parser::new(input)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_comparison() -> ExpressionResult<()> {
        assert_eq!(
            parse_condition("salary > 75")?,
            Expression::gt(Expression::column("salary"), Expression::literal(75))
        );
        Ok(())
    }

    #[test]
    fn test_precedence() -> ExpressionResult<()> {
        // a or b and c  =>  a or (b and c)
        assert_eq!(
            parse_condition("a or b and c")?,
            Expression::or(
                Expression::column("a"),
                Expression::and(Expression::column("b"), Expression::column("c"))
            )
        );

        // not binds looser than comparison
        assert_eq!(
            parse_condition("not x == 1")?,
            Expression::not_expr(Expression::eq(
                Expression::column("x"),
                Expression::literal(1)
            ))
        );

        // arithmetic binds tighter than comparison
        assert_eq!(
            parse_condition("x + 1 > 2")?,
            Expression::gt(
                Expression::add_expr(Expression::column("x"), Expression::literal(1)),
                Expression::literal(2)
            )
        );
        Ok(())
    }

    #[test]
    fn test_qualified_fields() -> ExpressionResult<()> {
        assert_eq!(
            parse_condition("L.id == R.emp_id")?,
            Expression::eq(
                Expression::qualified_column("L", "id"),
                Expression::qualified_column("R", "emp_id")
            )
        );
        Ok(())
    }

    #[test]
    fn test_chained_comparison() -> ExpressionResult<()> {
        assert_eq!(
            parse_condition("1 < x < 5")?,
            Expression::and(
                Expression::lt(Expression::literal(1), Expression::column("x")),
                Expression::lt(Expression::column("x"), Expression::literal(5))
            )
        );
        Ok(())
    }

    #[test]
    fn test_membership_and_null_checks() -> ExpressionResult<()> {
        assert_eq!(
            parse_condition("dept in ['A', 'B']")?,
            Expression::in_list(
                Expression::column("dept"),
                Expression::List(vec![Expression::literal("A"), Expression::literal("B")]),
                false
            )
        );
        assert_eq!(
            parse_condition("dept not in ('A',)")?,
            Expression::in_list(
                Expression::column("dept"),
                Expression::List(vec![Expression::literal("A")]),
                true
            )
        );
        assert_eq!(
            parse_condition("manager is None")?,
            Expression::is_null(Expression::column("manager"))
        );
        assert_eq!(
            parse_condition("manager IS NOT NULL")?,
            Expression::is_not_null(Expression::column("manager"))
        );
        Ok(())
    }

    #[test]
    fn test_literals() -> ExpressionResult<()> {
        assert_eq!(parse_condition("2.5")?, Expression::literal(2.5));
        assert_eq!(parse_condition("'x'")?, Expression::literal("x"));
        assert_eq!(parse_condition("True")?, Expression::literal(true));
        assert_eq!(parse_condition("null")?, Expression::Literal(Value::Null));
        assert_eq!(parse_condition("[]")?, Expression::List(vec![]));
        Ok(())
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(
            parse_condition("salary >"),
            Err(ExpressionError::UnexpectedToken {
                expected: "expression".to_string(),
                found: "end of input".to_string(),
            })
        );
        assert!(parse_condition("(a == 1").is_err());
        assert!(parse_condition("a == 1 b").is_err());
        assert!(parse_condition("L.").is_err());
        assert!(parse_condition("").is_err());
    }

    #[test]
    fn test_nesting_limit() -> ExpressionResult<()> {
        let within = format!(
            "{}salary > 0{}",
            "(".repeat(MAX_NESTING_DEPTH),
            ")".repeat(MAX_NESTING_DEPTH)
        );
        assert_eq!(
            parse_condition(&within)?,
            Expression::gt(Expression::column("salary"), Expression::literal(0))
        );

        let nested = format!("{}salary > 0{}", "(".repeat(10_000), ")".repeat(10_000));
        let too_deep = Err(ExpressionError::NestingTooDeep {
            max: MAX_NESTING_DEPTH,
        });
        assert_eq!(parse_condition(&nested), too_deep);
        assert_eq!(parse_condition(&"[".repeat(10_000)), too_deep);
        assert_eq!(parse_condition(&format!("{}x", "not ".repeat(10_000))), too_deep);
        assert_eq!(parse_condition(&format!("{}1", "-".repeat(10_000))), too_deep);
        Ok(())
    }
}
