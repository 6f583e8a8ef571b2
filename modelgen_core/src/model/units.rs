//! Units of model quantities
//!
//! A [`Unit`] is a product of integer powers of five base dimensions: seconds, molecules,
//! moles, litres and grams. Units are written as `*` separated terms such as
//! `s^-1 * molecule^-2`, with `M` accepted as shorthand for `mol * l^-1`.
use std::fmt::{Display, Formatter};
use std::ops::{Div, Mul};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unit of a model quantity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Unit {
    second: i32,
    molecule: i32,
    mole: i32,
    liter: i32,
    gram: i32,
}

impl Unit {
    pub const fn dimensionless() -> Self {
        Unit {
            second: 0,
            molecule: 0,
            mole: 0,
            liter: 0,
            gram: 0,
        }
    }

    pub const fn second() -> Self {
        Unit {
            second: 1,
            ..Unit::dimensionless()
        }
    }

    pub const fn per_second() -> Self {
        Unit {
            second: -1,
            ..Unit::dimensionless()
        }
    }

    pub const fn molecule() -> Self {
        Unit {
            molecule: 1,
            ..Unit::dimensionless()
        }
    }

    pub const fn mole() -> Self {
        Unit {
            mole: 1,
            ..Unit::dimensionless()
        }
    }

    pub const fn liter() -> Self {
        Unit {
            liter: 1,
            ..Unit::dimensionless()
        }
    }

    pub const fn gram() -> Self {
        Unit {
            gram: 1,
            ..Unit::dimensionless()
        }
    }

    /// Molar concentration, `mol * l^-1`
    pub const fn molar() -> Self {
        Unit {
            mole: 1,
            liter: -1,
            ..Unit::dimensionless()
        }
    }

    /// Mass density, `g * l^-1`
    pub const fn density() -> Self {
        Unit {
            gram: 1,
            liter: -1,
            ..Unit::dimensionless()
        }
    }

    /// Units of the Avogadro constant, `molecule * mol^-1`
    pub const fn per_mole() -> Self {
        Unit {
            molecule: 1,
            mole: -1,
            ..Unit::dimensionless()
        }
    }

    /// Raise the unit to an integer power
    pub fn powi(self, exponent: i32) -> Self {
        Unit {
            second: self.second * exponent,
            molecule: self.molecule * exponent,
            mole: self.mole * exponent,
            liter: self.liter * exponent,
            gram: self.gram * exponent,
        }
    }

    pub fn is_dimensionless(&self) -> bool {
        *self == Unit::dimensionless()
    }

    fn terms(&self) -> [(&'static str, i32); 5] {
        [
            ("s", self.second),
            ("molecule", self.molecule),
            ("mol", self.mole),
            ("l", self.liter),
            ("g", self.gram),
        ]
    }
}

impl Mul for Unit {
    type Output = Unit;

    fn mul(self, rhs: Unit) -> Unit {
        Unit {
            second: self.second + rhs.second,
            molecule: self.molecule + rhs.molecule,
            mole: self.mole + rhs.mole,
            liter: self.liter + rhs.liter,
            gram: self.gram + rhs.gram,
        }
    }
}

impl Div for Unit {
    type Output = Unit;

    fn div(self, rhs: Unit) -> Unit {
        self * rhs.powi(-1)
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "dimensionless");
        }
        if *self == Unit::molar() {
            return write!(f, "M");
        }
        let rendered: Vec<String> = self
            .terms()
            .iter()
            .filter(|(_, exponent)| *exponent != 0)
            .map(|(symbol, exponent)| match exponent {
                1 => symbol.to_string(),
                e => format!("{}^{}", symbol, e),
            })
            .collect();
        write!(f, "{}", rendered.join(" * "))
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut unit = Unit::dimensionless();
        for term in s
            .split(|c: char| c == '*' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let (symbol, exponent) = match term.split_once('^') {
                Some((symbol, exponent)) => (
                    symbol,
                    exponent
                        .parse::<i32>()
                        .map_err(|_| UnitError::InvalidExponent(term.to_string()))?,
                ),
                None => (term, 1),
            };
            let base = match symbol {
                "dimensionless" => Unit::dimensionless(),
                "s" | "second" => Unit::second(),
                "molecule" | "molecules" => Unit::molecule(),
                "mol" => Unit::mole(),
                "l" | "L" | "liter" => Unit::liter(),
                "g" => Unit::gram(),
                "M" => Unit::molar(),
                other => return Err(UnitError::UnknownUnit(other.to_string())),
            };
            unit = unit * base.powi(exponent);
        }
        Ok(unit)
    }
}

impl TryFrom<String> for Unit {
    type Error = UnitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.to_string()
    }
}

/// Errors from parsing unit strings
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitError {
    #[error("Unknown unit `{0}`")]
    UnknownUnit(String),
    #[error("Invalid exponent in unit term `{0}`")]
    InvalidExponent(String),
}
