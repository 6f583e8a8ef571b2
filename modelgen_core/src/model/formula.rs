//! Empirical formulas, used to check the elemental balance of reactions
use std::fmt::{Display, Formatter};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Element counts of a species, e.g. `C10H12N5O13P3`
///
/// Elements with a count of zero are never stored, so an empty formula means
/// "no net atoms", which is what a balanced reaction sums to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Formula {
    elements: IndexMap<String, i64>,
}

impl Formula {
    pub fn new() -> Self {
        Formula::default()
    }

    /// Count of `element` in the formula
    pub fn count(&self, element: &str) -> i64 {
        self.elements.get(element).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Add `count` atoms of `element`
    pub fn add_element(&mut self, element: &str, count: i64) {
        let entry = self.elements.entry(element.to_string()).or_insert(0);
        *entry += count;
        if *entry == 0 {
            self.elements.shift_remove(element);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.elements.iter().map(|(e, c)| (e.as_str(), *c))
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut formula = Formula::new();
        let chars: Vec<char> = s.trim().chars().collect();
        let mut current = 0;
        while current < chars.len() {
            if !chars[current].is_ascii_uppercase() {
                return Err(FormulaError::InvalidFormula(s.to_string()));
            }
            let start = current;
            current += 1;
            while current < chars.len() && chars[current].is_ascii_lowercase() {
                current += 1;
            }
            let element: String = chars[start..current].iter().collect();
            let digits_start = current;
            while current < chars.len() && chars[current].is_ascii_digit() {
                current += 1;
            }
            let count = if digits_start == current {
                1
            } else {
                chars[digits_start..current]
                    .iter()
                    .collect::<String>()
                    .parse::<i64>()
                    .map_err(|_| FormulaError::InvalidFormula(s.to_string()))?
            };
            formula.add_element(&element, count);
        }
        Ok(formula)
    }
}

impl Display for Formula {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (element, count) in &self.elements {
            if *count == 1 {
                write!(f, "{}", element)?;
            } else {
                write!(f, "{}{}", element, count)?;
            }
        }
        Ok(())
    }
}

impl TryFrom<String> for Formula {
    type Error = FormulaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Formula> for String {
    fn from(formula: Formula) -> Self {
        formula.to_string()
    }
}

impl AddAssign<&Formula> for Formula {
    fn add_assign(&mut self, rhs: &Formula) {
        for (element, count) in rhs.iter() {
            self.add_element(element, count);
        }
    }
}

impl Add<&Formula> for Formula {
    type Output = Formula;

    fn add(mut self, rhs: &Formula) -> Formula {
        self += rhs;
        self
    }
}

impl Sub<&Formula> for Formula {
    type Output = Formula;

    fn sub(mut self, rhs: &Formula) -> Formula {
        for (element, count) in rhs.iter() {
            self.add_element(element, -count);
        }
        self
    }
}

impl Mul<i64> for &Formula {
    type Output = Formula;

    fn mul(self, rhs: i64) -> Formula {
        let mut scaled = Formula::new();
        for (element, count) in self.iter() {
            scaled.add_element(element, count * rhs);
        }
        scaled
    }
}

impl Neg for &Formula {
    type Output = Formula;

    fn neg(self) -> Formula {
        self * -1
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    #[error("Unable to parse empirical formula `{0}`")]
    InvalidFormula(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_formula() {
        let atp: Formula = "C10H12N5O13P3".parse().unwrap();
        assert_eq!(atp.count("C"), 10);
        assert_eq!(atp.count("P"), 3);
        assert_eq!(atp.count("Fe"), 0);
        let water: Formula = "H2O".parse().unwrap();
        assert_eq!(water.count("O"), 1);
        assert_eq!(water.to_string(), "H2O");
        assert!("h2o".parse::<Formula>().is_err());
    }

    #[test]
    fn hydrolysis_balances() {
        let atp: Formula = "C10H12N5O13P3".parse().unwrap();
        let water: Formula = "H2O".parse().unwrap();
        let adp: Formula = "C10H12N5O10P2".parse().unwrap();
        let pi: Formula = "HO4P".parse().unwrap();
        let proton: Formula = "H".parse().unwrap();
        let net = (adp + &pi + &proton) - &atp - &water;
        assert!(net.is_empty());
    }

    #[test]
    fn scale() {
        let water: Formula = "H2O".parse().unwrap();
        let three = &water * 3;
        assert_eq!(three.count("H"), 6);
        assert!((three + &(&water * -3)).is_empty());
    }
}
