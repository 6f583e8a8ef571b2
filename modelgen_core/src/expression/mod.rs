//! Symbolic expressions used by rate laws and functions
//!
//! Expressions are either parsed from infix strings with [`Expression::parse`], or built
//! programmatically from [`Expr`] values and then passed through [`Expression::resolve`].
//! Either way every free symbol has to resolve to exactly one entity category of a
//! [`Namespace`]; nothing is created implicitly.
use std::fmt::{Display, Formatter};
use std::ops::{Add, Div, Mul, Neg, Sub};

use indexmap::IndexSet;
use thiserror::Error;

use crate::expression::lexer::LexerError;
use crate::expression::parser::ParseError;

pub mod eval;
mod lexer;
pub mod namespace;
pub mod parser;
mod token;

pub use eval::{EvaluationError, SymbolSource};
pub use namespace::{Expression, Namespace, SymbolCategory};

// region Expression AST
/// Representation of an arithmetic expression as an AST
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(f64),
    /// Reference to a named entity, resolved against a [`Namespace`]
    Symbol(String),
    /// Explicitly parenthesized sub-expression
    Group(Box<Expr>),
    /// Unary minus
    Negate(Box<Expr>),
    /// Binary operation (see [`BinaryOperator`])
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Call of one of the supported functions (see [`BuiltinFunction`])
    Call {
        function: BuiltinFunction,
        args: Vec<Expr>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl BinaryOperator {
    fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Add | BinaryOperator::Subtract => 1,
            BinaryOperator::Multiply | BinaryOperator::Divide => 2,
            BinaryOperator::Power => 4,
        }
    }
}

/// Functions which may be called inside an expression
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinFunction {
    /// Natural logarithm
    Log,
    Exp,
    Min,
    Max,
}

impl BuiltinFunction {
    pub fn from_name(name: &str) -> Option<BuiltinFunction> {
        match name {
            "log" => Some(BuiltinFunction::Log),
            "exp" => Some(BuiltinFunction::Exp),
            "min" => Some(BuiltinFunction::Min),
            "max" => Some(BuiltinFunction::Max),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinFunction::Log => "log",
            BuiltinFunction::Exp => "exp",
            BuiltinFunction::Min => "min",
            BuiltinFunction::Max => "max",
        }
    }

    pub(crate) fn check_arity(&self, found: usize) -> Result<(), ParseError> {
        let (valid, expected) = match self {
            BuiltinFunction::Log | BuiltinFunction::Exp => (found == 1, "exactly 1"),
            BuiltinFunction::Min | BuiltinFunction::Max => (found >= 2, "at least 2"),
        };
        if valid {
            Ok(())
        } else {
            Err(ParseError::WrongArgumentCount {
                function: self.name(),
                expected,
                found,
            })
        }
    }
}

impl Expr {
    pub fn number(value: f64) -> Expr {
        Expr::Number(value)
    }

    pub fn symbol(id: &str) -> Expr {
        Expr::Symbol(id.to_string())
    }

    pub fn group(inner: Expr) -> Expr {
        Expr::Group(Box::new(inner))
    }

    pub fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn log(arg: Expr) -> Expr {
        Expr::Call {
            function: BuiltinFunction::Log,
            args: vec![arg],
        }
    }

    pub fn exp(arg: Expr) -> Expr {
        Expr::Call {
            function: BuiltinFunction::Exp,
            args: vec![arg],
        }
    }

    pub fn min(args: Vec<Expr>) -> Expr {
        Expr::Call {
            function: BuiltinFunction::Min,
            args,
        }
    }

    pub fn max(args: Vec<Expr>) -> Expr {
        Expr::Call {
            function: BuiltinFunction::Max,
            args,
        }
    }

    /// Left to right product of `factors`, `1` when there are none
    pub fn product<I: IntoIterator<Item = Expr>>(factors: I) -> Expr {
        factors
            .into_iter()
            .reduce(|acc, factor| acc * factor)
            .unwrap_or(Expr::Number(1.))
    }

    /// Left to right sum of `terms`, `0` when there are none
    pub fn sum<I: IntoIterator<Item = Expr>>(terms: I) -> Expr {
        terms
            .into_iter()
            .reduce(|acc, term| acc + term)
            .unwrap_or(Expr::Number(0.))
    }

    /// Distinct symbols in the order they first appear
    pub fn symbols(&self) -> IndexSet<&str> {
        let mut symbols = IndexSet::new();
        self.collect_symbols(&mut symbols);
        symbols
    }

    fn collect_symbols<'a>(&'a self, symbols: &mut IndexSet<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Symbol(id) => {
                symbols.insert(id.as_str());
            }
            Expr::Group(inner) | Expr::Negate(inner) => inner.collect_symbols(symbols),
            Expr::Binary { left, right, .. } => {
                left.collect_symbols(symbols);
                right.collect_symbols(symbols);
            }
            Expr::Call { args, .. } => args.iter().for_each(|a| a.collect_symbols(symbols)),
        }
    }

    /// Check that every builtin call has a valid number of arguments
    pub(crate) fn check_calls(&self) -> Result<(), ParseError> {
        match self {
            Expr::Number(_) | Expr::Symbol(_) => Ok(()),
            Expr::Group(inner) | Expr::Negate(inner) => inner.check_calls(),
            Expr::Binary { left, right, .. } => {
                left.check_calls()?;
                right.check_calls()
            }
            Expr::Call { function, args } => {
                function.check_arity(args.len())?;
                args.iter().try_for_each(Expr::check_calls)
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Number(v) if *v < 0. => 3,
            Expr::Negate(_) => 3,
            Expr::Binary { op, .. } => op.precedence(),
            _ => 5,
        }
    }

    fn fmt_operand(&self, f: &mut Formatter<'_>, parenthesize: bool) -> std::fmt::Result {
        if parenthesize {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Number(value) => write!(f, "{}", value),
            Expr::Symbol(id) => write!(f, "{}", id),
            Expr::Group(inner) => write!(f, "({})", inner),
            Expr::Negate(operand) => {
                write!(f, "-")?;
                operand.fmt_operand(f, operand.precedence() < 3)
            }
            Expr::Binary { op, left, right } => {
                let precedence = op.precedence();
                let (left_parens, right_parens) = match op {
                    // the exponent is parsed as a unary expression
                    BinaryOperator::Power => (left.precedence() <= precedence, right.precedence() < 3),
                    _ => (left.precedence() < precedence, right.precedence() <= precedence),
                };
                left.fmt_operand(f, left_parens)?;
                write!(f, " {} ", op.symbol())?;
                right.fmt_operand(f, right_parens)
            }
            Expr::Call { function, args } => {
                let rendered: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", function.name(), rendered.join(", "))
            }
        }
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOperator::Add, self, rhs)
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOperator::Subtract, self, rhs)
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOperator::Multiply, self, rhs)
    }
}

impl Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOperator::Divide, self, rhs)
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Negate(Box::new(self))
    }
}
// endregion Expression AST

/// Parse an expression string into an unresolved [`Expr`]
pub fn parse_expr(input: &str) -> Result<Expr, ExpressionError> {
    let mut lexer = lexer::Lexer::new(input);
    let tokens = lexer.lex()?;
    let mut parser = parser::ExpressionParser::new(tokens);
    Ok(parser.parse()?)
}

/// Errors from building an [`Expression`]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExpressionError {
    /// Lexing Error
    #[error("Error occurred during lexing (conversion of expression string to tokens): {0}")]
    Lexing(#[from] LexerError),
    /// Parsing Error
    #[error("Error occurred during parsing (conversion of tokens to expression tree): {0}")]
    Parsing(#[from] ParseError),
    /// Symbol missing from the namespace
    #[error("Symbol `{0}` does not resolve to any species, parameter, observable, function or compartment")]
    SymbolResolution(String),
    /// Symbol present in more than one category of the namespace
    #[error("Symbol `{symbol}` is ambiguous, it names a {first} and a {second}")]
    AmbiguousSymbol {
        symbol: String,
        first: SymbolCategory,
        second: SymbolCategory,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_minimal_parentheses() {
        let expr = Expr::symbol("a") * (Expr::symbol("b") + Expr::symbol("c"));
        assert_eq!(expr.to_string(), "a * (b + c)");
        let expr = Expr::symbol("a") - (Expr::symbol("b") - Expr::symbol("c"));
        assert_eq!(expr.to_string(), "a - (b - c)");
        let expr = (Expr::symbol("a") - Expr::symbol("b")) - Expr::symbol("c");
        assert_eq!(expr.to_string(), "a - b - c");
        let expr = -(Expr::symbol("a") * Expr::symbol("b"));
        assert_eq!(expr.to_string(), "-(a * b)");
    }

    #[test]
    fn display_saturation_term() {
        let species = Expr::symbol("s1[c]");
        let term = Expr::group(
            species.clone()
                / (species
                    + Expr::product([
                        Expr::symbol("K_m_r1_s1"),
                        Expr::symbol("Avogadro"),
                        Expr::symbol("volume_c"),
                    ])),
        );
        let expr = Expr::product([Expr::symbol("k_cat_r1"), Expr::symbol("e1"), term]);
        assert_eq!(
            expr.to_string(),
            "k_cat_r1 * e1 * (s1[c] / (s1[c] + K_m_r1_s1 * Avogadro * volume_c))"
        );
    }

    #[test]
    fn display_round_trips_through_parser() {
        let inputs = [
            "k_cat_r1 * e1 * (s1[c] / (s1[c] + K_m_r1_s1 * Avogadro * volume_c))",
            "1 / (1 + sites / (total * (1 / (1 + occ))) * exp(log(a / b)))",
            "p * k * ns * max(min(site[n], 1), 0)",
            "-a ^ 2 + b ^ -c",
            "a / (b * c) - (d - e)",
        ];
        for input in inputs {
            let expr = parse_expr(input).unwrap();
            let rendered = expr.to_string();
            assert_eq!(rendered, input);
            assert_eq!(parse_expr(&rendered).unwrap().to_string(), rendered);
        }
    }

    #[test]
    fn symbols_in_order() {
        let expr = parse_expr("b * a + b * c").unwrap();
        let symbols: Vec<&str> = expr.symbols().into_iter().collect();
        assert_eq!(symbols, vec!["b", "a", "c"]);
    }

    #[test]
    fn product_and_sum_of_nothing() {
        assert_eq!(Expr::product(Vec::new()), Expr::number(1.));
        assert_eq!(Expr::sum(Vec::new()), Expr::number(0.));
    }
}
