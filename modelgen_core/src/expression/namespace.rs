//! Closed world resolution of expression symbols
use std::fmt::{Display, Formatter};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::expression::{parse_expr, Expr, ExpressionError};

/// Category of model entity a symbol may refer to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolCategory {
    Species,
    Parameter,
    Observable,
    Function,
    Compartment,
}

impl Display for SymbolCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SymbolCategory::Species => "species",
            SymbolCategory::Parameter => "parameter",
            SymbolCategory::Observable => "observable",
            SymbolCategory::Function => "function",
            SymbolCategory::Compartment => "compartment",
        };
        write!(f, "{}", name)
    }
}

/// Ids of the entities an expression is allowed to reference, grouped by category
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Namespace {
    symbols: IndexMap<SymbolCategory, IndexSet<String>>,
}

impl Namespace {
    pub fn new() -> Self {
        Namespace::default()
    }

    pub fn insert(&mut self, category: SymbolCategory, id: &str) {
        self.symbols
            .entry(category)
            .or_default()
            .insert(id.to_string());
    }

    /// Builder style [`Namespace::insert`]
    pub fn with(mut self, category: SymbolCategory, id: &str) -> Self {
        self.insert(category, id);
        self
    }

    pub fn extend(&mut self, other: &Namespace) {
        for (category, ids) in &other.symbols {
            for id in ids {
                self.insert(*category, id);
            }
        }
    }

    pub fn contains(&self, category: SymbolCategory, id: &str) -> bool {
        self.symbols
            .get(&category)
            .is_some_and(|ids| ids.contains(id))
    }

    /// Every category containing `id`
    pub fn categories_of(&self, id: &str) -> Vec<SymbolCategory> {
        self.symbols
            .iter()
            .filter(|(_, ids)| ids.contains(id))
            .map(|(category, _)| *category)
            .collect()
    }
}

/// An expression whose symbols have all been resolved against a [`Namespace`]
///
/// Resolved expressions are immutable; templates build a new one rather than editing.
#[derive(Clone, Debug, PartialEq)]
pub struct Expression {
    expr: Expr,
    symbols: IndexMap<String, SymbolCategory>,
}

impl Expression {
    /// Parse `text` and resolve its symbols against `namespace`
    ///
    /// # Examples
    /// ```rust
    /// use modelgen_core::expression::{Expression, Namespace, SymbolCategory};
    /// let namespace = Namespace::new()
    ///     .with(SymbolCategory::Parameter, "k_deg")
    ///     .with(SymbolCategory::Species, "rna1[c]");
    /// let expression = Expression::parse("k_deg * rna1[c]", &namespace).unwrap();
    /// assert_eq!(expression.category_of("rna1[c]"), Some(SymbolCategory::Species));
    /// assert!(Expression::parse("k_deg * rna2[c]", &namespace).is_err());
    /// ```
    pub fn parse(text: &str, namespace: &Namespace) -> Result<Self, ExpressionError> {
        Expression::resolve(parse_expr(text)?, namespace)
    }

    /// Resolve the symbols of a programmatically built expression against `namespace`
    pub fn resolve(expr: Expr, namespace: &Namespace) -> Result<Self, ExpressionError> {
        expr.check_calls()?;
        let mut symbols = IndexMap::new();
        for symbol in expr.symbols() {
            let categories = namespace.categories_of(symbol);
            match categories.as_slice() {
                [] => return Err(ExpressionError::SymbolResolution(symbol.to_string())),
                [category] => {
                    symbols.insert(symbol.to_string(), *category);
                }
                [first, second, ..] => {
                    return Err(ExpressionError::AmbiguousSymbol {
                        symbol: symbol.to_string(),
                        first: *first,
                        second: *second,
                    })
                }
            }
        }
        Ok(Expression { expr, symbols })
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn category_of(&self, symbol: &str) -> Option<SymbolCategory> {
        self.symbols.get(symbol).copied()
    }

    /// Symbols with their categories, in order of first appearance
    pub fn symbols(&self) -> impl Iterator<Item = (&str, SymbolCategory)> {
        self.symbols.iter().map(|(s, c)| (s.as_str(), *c))
    }

    /// Ids of the referenced entities of one category
    pub fn references(&self, category: SymbolCategory) -> impl Iterator<Item = &str> {
        self.symbols
            .iter()
            .filter(move |(_, c)| **c == category)
            .map(|(s, _)| s.as_str())
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.expr)
    }
}
