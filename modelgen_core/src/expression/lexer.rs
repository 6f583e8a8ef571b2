//! Lex an expression string into a series of tokens for later parsing

use std::collections::VecDeque;

use thiserror::Error;

use crate::expression::token::Token;

pub struct Lexer {
    source: Vec<char>,
    tokens: VecDeque<Token>,
    start: usize,
    current: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            tokens: VecDeque::new(),
            start: 0,
            current: 0,
        }
    }

    pub fn lex(&mut self) -> Result<Vec<Token>, LexerError> {
        Ok(self.scan_tokens()?.iter().cloned().collect())
    }

    pub fn scan_tokens(&mut self) -> Result<&VecDeque<Token>, LexerError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens.push_back(Token::Eof);
        Ok(&self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), LexerError> {
        let c: char = self.advance();
        match c {
            // Single Character Tokens
            '(' => self.add_token(Token::LeftParen),
            ')' => self.add_token(Token::RightParen),
            '+' => self.add_token(Token::Plus),
            '-' => self.add_token(Token::Minus),
            '*' => self.add_token(Token::Star),
            '/' => self.add_token(Token::Slash),
            '^' => self.add_token(Token::Caret),
            ',' => self.add_token(Token::Comma),
            // Literals and identifiers
            '0'..='9' | '.' => self.read_number()?,
            'a'..='z' | 'A'..='Z' | '_' => self.read_identifier()?,
            // Whitespace
            ' ' | '\r' | '\n' | '\t' => {}
            other => {
                return Err(LexerError::InvalidCharacter {
                    character: other,
                    position: self.start,
                })
            }
        };
        Ok(())
    }

    fn advance(&mut self) -> char {
        let char_at_current = self.source[self.current];
        self.current += 1;
        char_at_current
    }

    fn read_number(&mut self) -> Result<(), LexerError> {
        while Lexer::is_digit(self.peek()) || self.peek() == '.' {
            self.advance();
        }
        // Exponent, e.g. 1e-09
        if matches!(self.peek(), 'e' | 'E')
            && (Lexer::is_digit(self.peek_next())
                || (matches!(self.peek_next(), '+' | '-')
                    && Lexer::is_digit(self.peek_at(self.current + 2))))
        {
            self.advance();
            if matches!(self.peek(), '+' | '-') {
                self.advance();
            }
            while Lexer::is_digit(self.peek()) {
                self.advance();
            }
        }
        let text: String = self.source[self.start..self.current].iter().collect();
        let value = text
            .parse::<f64>()
            .map_err(|_| LexerError::MalformedNumber(text.clone()))?;
        self.add_token(Token::Number(value));
        Ok(())
    }

    /// Identifiers may carry a compartment suffix, as in `atp[c]`
    fn read_identifier(&mut self) -> Result<(), LexerError> {
        while Lexer::is_alphanumeric(self.peek()) {
            self.advance();
        }
        if self.peek() == '[' {
            self.advance();
            let compartment_start = self.current;
            while Lexer::is_alphanumeric(self.peek()) {
                self.advance();
            }
            if self.current == compartment_start || self.peek() != ']' {
                return Err(LexerError::UnterminatedCompartment(self.start));
            }
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        self.add_token(Token::Identifier(text));
        Ok(())
    }

    fn is_digit(c: char) -> bool {
        c.is_ascii_digit()
    }

    fn is_alpha(c: char) -> bool {
        matches!(c, 'a'..='z' | 'A'..='Z' | '_')
    }

    fn is_alphanumeric(c: char) -> bool {
        Lexer::is_alpha(c) || Lexer::is_digit(c)
    }

    fn peek(&self) -> char {
        self.peek_at(self.current)
    }

    fn peek_next(&self) -> char {
        self.peek_at(self.current + 1)
    }

    fn peek_at(&self, position: usize) -> char {
        if position >= self.source.len() {
            return '\0';
        }
        self.source[position]
    }

    fn add_token(&mut self, token: Token) {
        self.tokens.push_back(token);
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexerError {
    #[error("Invalid character `{character}` at position {position}")]
    InvalidCharacter { character: char, position: usize },
    #[error("Unable to read number `{0}`")]
    MalformedNumber(String),
    #[error("Compartment suffix of identifier starting at position {0} is not terminated")]
    UnterminatedCompartment(usize),
}
