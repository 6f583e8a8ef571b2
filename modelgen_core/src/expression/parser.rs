use thiserror::Error;

use crate::expression::token::Token;
use crate::expression::{BinaryOperator, BuiltinFunction, Expr};
/*
Expression Grammar:
expression -> additive
additive -> multiplicative (("+" | "-") multiplicative)* ;
multiplicative -> unary (("*" | "/") unary)* ;
unary -> "-" unary | power ;
power -> primary ("^" unary)? ;
primary -> NUMBER | IDENTIFIER | IDENTIFIER "(" arguments ")" | "(" expression ")" ;
arguments -> expression ("," expression)* ;

e.g. k_cat_r1 * e1 * (s1[c] / (s1[c] + K_m_r1_s1 * Avogadro * volume_c))
 */

/// Expression Parser
pub struct ExpressionParser {
    /// Vector of tokens from the expression string
    tokens: Vec<Token>,
    /// Current token being processed
    current: usize,
}

impl ExpressionParser {
    /// Create a new ExpressionParser
    pub fn new(tokens: Vec<Token>) -> ExpressionParser {
        ExpressionParser { tokens, current: 0 }
    }

    // region Parsing Functions

    /// Parse the token vector into an expression AST
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.additive()?;
        if !self.is_at_end() {
            // If entire expression has not been parsed, an error has occurred
            return Err(ParseError::EarlyTermination);
        }
        Ok(expr)
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.multiplicative()?;

        while self.match_token(&[Token::Plus, Token::Minus]) {
            let op = match self.previous() {
                Token::Plus => BinaryOperator::Add,
                _ => BinaryOperator::Subtract,
            };
            let right = self.multiplicative()?;
            expr = Expr::binary(op, expr, right);
        }
        Ok(expr)
    }

    fn multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.unary()?;

        while self.match_token(&[Token::Star, Token::Slash]) {
            let op = match self.previous() {
                Token::Star => BinaryOperator::Multiply,
                _ => BinaryOperator::Divide,
            };
            let right = self.unary()?;
            expr = Expr::binary(op, expr, right);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.match_token(&[Token::Minus]) {
            let operand = self.unary()?;
            return Ok(Expr::Negate(Box::new(operand)));
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr, ParseError> {
        let base = self.primary()?;
        if self.match_token(&[Token::Caret]) {
            let exponent = self.unary()?;
            return Ok(Expr::binary(BinaryOperator::Power, base, exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        if let Token::Number(value) = self.peek() {
            self.advance();
            return Ok(Expr::Number(value));
        }

        if let Some(identifier) = self.match_identifier() {
            if self.match_token(&[Token::LeftParen]) {
                let function = BuiltinFunction::from_name(&identifier)
                    .ok_or(ParseError::UnknownFunction(identifier.clone()))?;
                let args = self.arguments()?;
                self.consume(Token::RightParen, "Expect ')' after function arguments.")?;
                function.check_arity(args.len())?;
                return Ok(Expr::Call { function, args });
            }
            return Ok(Expr::Symbol(identifier));
        }

        if self.match_token(&[Token::LeftParen]) {
            let expr = self.additive()?;
            self.consume(Token::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::Group(Box::new(expr)));
        }

        Err(ParseError::ExpectedExpression)
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = vec![self.additive()?];
        while self.match_token(&[Token::Comma]) {
            args.push(self.additive()?);
        }
        Ok(args)
    }

    // endregion Parsing Functions

    // region parsing helper functions

    /// Check whether the token at the current position matches one of the provided `tokens`,
    /// if it does advance [`self.current`] and return true, otherwise return false
    fn match_token(&mut self, tokens: &[Token]) -> bool {
        for t in tokens {
            if self.check(t) {
                self.advance();
                return true;
            }
        }
        false
    }

    /// Similar to [`match_token`], but for matching an identifier token. If the current
    /// token is an identifier return `Some(identifier)`, otherwise return None
    fn match_identifier(&mut self) -> Option<String> {
        if self.is_at_end() {
            return None;
        }
        if let Token::Identifier(id) = self.peek() {
            self.advance();
            return Some(id);
        }
        None
    }

    /// Check whether the current token matches the provided `token`
    fn check(&self, token: &Token) -> bool {
        if self.is_at_end() {
            return false;
        }
        &self.peek() == token
    }

    /// Advance `self.current` one position unless at the end of the token Vec, then return
    /// the previous token.
    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek() == Token::Eof
    }

    /// Get a copy of the current token
    fn peek(&self) -> Token {
        self.tokens.get(self.current).cloned().unwrap_or(Token::Eof)
    }

    /// Get a copy of the previous token
    fn previous(&self) -> Token {
        self.tokens[self.current - 1].clone()
    }

    /// Check whether the current token matches an input token, if it matches advance to the
    /// next token, and if it doesn't return an error. Used mainly for matching parenthesis.
    fn consume(&mut self, token: Token, msg: &str) -> Result<Token, ParseError> {
        if self.check(&token) {
            return Ok(self.advance());
        }

        Err(ParseError::MissingToken(msg.to_string()))
    }

    // endregion parsing helper functions
}

/// Enum representing possible parse errors
#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParseError {
    /// Missing expected token (e.g. a right parenthesis)
    #[error("Missing expected token: {0}")]
    MissingToken(String),
    /// No expression found when one was expected
    #[error("No expression found, check that the expression string is not empty")]
    ExpectedExpression,
    /// Expression was not completed when parsing terminated
    #[error("Parsing terminated early, check for a missing operator between two terms")]
    EarlyTermination,
    /// Call of a function other than `log`, `exp`, `min` or `max`
    #[error("Unsupported function `{0}`")]
    UnknownFunction(String),
    #[error("Function `{function}` takes {expected} argument(s), found {found}")]
    WrongArgumentCount {
        function: &'static str,
        expected: &'static str,
        found: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::lexer::Lexer;

    fn parse(input: &str) -> Result<Expr, ParseError> {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.lex().unwrap();
        ExpressionParser::new(tokens).parse()
    }

    #[test]
    fn single_symbol_parse() {
        assert_eq!(parse("atp[c]").unwrap(), Expr::symbol("atp[c]"));
    }

    #[test]
    fn precedence() {
        let expr = parse("a + b * c").unwrap();
        assert_eq!(
            expr,
            Expr::symbol("a") + Expr::symbol("b") * Expr::symbol("c")
        );
        let expr = parse("a - b - c").unwrap();
        assert_eq!(
            expr,
            (Expr::symbol("a") - Expr::symbol("b")) - Expr::symbol("c")
        );
    }

    #[test]
    fn power_is_right_associative() {
        let expr = parse("a ^ b ^ c").unwrap();
        assert_eq!(
            expr,
            Expr::binary(
                BinaryOperator::Power,
                Expr::symbol("a"),
                Expr::binary(BinaryOperator::Power, Expr::symbol("b"), Expr::symbol("c"))
            )
        );
    }

    #[test]
    fn unary_minus_binds_looser_than_power() {
        let expr = parse("-a ^ 2").unwrap();
        assert_eq!(
            expr,
            -Expr::binary(BinaryOperator::Power, Expr::symbol("a"), Expr::number(2.))
        );
    }

    #[test]
    fn function_calls() {
        let expr = parse("max(min(site[n], 1), 0)").unwrap();
        assert_eq!(
            expr,
            Expr::max(vec![
                Expr::min(vec![Expr::symbol("site[n]"), Expr::number(1.)]),
                Expr::number(0.)
            ])
        );
        assert_eq!(
            parse("exp(log(x))").unwrap(),
            Expr::exp(Expr::log(Expr::symbol("x")))
        );
    }

    #[test]
    fn parenthesis_become_groups() {
        assert_eq!(
            parse("(a)").unwrap(),
            Expr::group(Expr::symbol("a"))
        );
    }

    #[test]
    fn errors() {
        assert_eq!(parse(""), Err(ParseError::ExpectedExpression));
        assert_eq!(parse("a b"), Err(ParseError::EarlyTermination));
        assert!(matches!(parse("(a + b"), Err(ParseError::MissingToken(_))));
        assert_eq!(
            parse("sqrt(a)"),
            Err(ParseError::UnknownFunction("sqrt".to_string()))
        );
        assert!(matches!(
            parse("min(a)"),
            Err(ParseError::WrongArgumentCount { found: 1, .. })
        ));
        assert!(matches!(
            parse("log(a, b)"),
            Err(ParseError::WrongArgumentCount { found: 2, .. })
        ));
        assert_eq!(parse("a * "), Err(ParseError::ExpectedExpression));
    }
}
