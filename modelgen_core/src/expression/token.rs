//! Module providing the Token enum for lexing expressions

/// Represents Tokens in a rate law or function expression
#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Comma,
    LeftParen,
    RightParen,
    Eof,
}
