//! Numeric evaluation and unit inference of resolved expressions
use thiserror::Error;

use crate::expression::{BinaryOperator, BuiltinFunction, Expr, Expression, SymbolCategory};
use crate::model::units::Unit;

/// Supplies values and units for the entities an expression references
pub trait SymbolSource {
    fn value(&self, category: SymbolCategory, id: &str) -> Result<f64, EvaluationError>;

    fn units(&self, category: SymbolCategory, id: &str) -> Result<Unit, EvaluationError>;
}

impl Expression {
    /// Evaluate the expression with values supplied by `source`
    pub fn evaluate<S: SymbolSource + ?Sized>(&self, source: &S) -> Result<f64, EvaluationError> {
        self.evaluate_expr(self.expr(), source)
    }

    /// Infer the units of the expression
    ///
    /// Numeric literals carry no units and take on those of their context, so an expression
    /// made only of literals has `None` units.
    pub fn units<S: SymbolSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<Option<Unit>, EvaluationError> {
        self.units_of(self.expr(), source)
    }

    fn symbol_category(&self, id: &str) -> Result<SymbolCategory, EvaluationError> {
        self.category_of(id)
            .ok_or_else(|| EvaluationError::UnresolvedSymbol(id.to_string()))
    }

    fn evaluate_expr<S: SymbolSource + ?Sized>(
        &self,
        expr: &Expr,
        source: &S,
    ) -> Result<f64, EvaluationError> {
        Ok(match expr {
            Expr::Number(value) => *value,
            Expr::Symbol(id) => source.value(self.symbol_category(id)?, id)?,
            Expr::Group(inner) => self.evaluate_expr(inner, source)?,
            Expr::Negate(operand) => -self.evaluate_expr(operand, source)?,
            Expr::Binary { op, left, right } => {
                let left = self.evaluate_expr(left, source)?;
                let right = self.evaluate_expr(right, source)?;
                match op {
                    BinaryOperator::Add => left + right,
                    BinaryOperator::Subtract => left - right,
                    BinaryOperator::Multiply => left * right,
                    BinaryOperator::Divide => left / right,
                    BinaryOperator::Power => left.powf(right),
                }
            }
            Expr::Call { function, args } => {
                let values = args
                    .iter()
                    .map(|a| self.evaluate_expr(a, source))
                    .collect::<Result<Vec<f64>, EvaluationError>>()?;
                match function {
                    BuiltinFunction::Log => values[0].ln(),
                    BuiltinFunction::Exp => values[0].exp(),
                    BuiltinFunction::Min => values.into_iter().fold(f64::INFINITY, f64::min),
                    BuiltinFunction::Max => values.into_iter().fold(f64::NEG_INFINITY, f64::max),
                }
            }
        })
    }

    fn units_of<S: SymbolSource + ?Sized>(
        &self,
        expr: &Expr,
        source: &S,
    ) -> Result<Option<Unit>, EvaluationError> {
        Ok(match expr {
            Expr::Number(_) => None,
            Expr::Symbol(id) => Some(source.units(self.symbol_category(id)?, id)?),
            Expr::Group(inner) | Expr::Negate(inner) => self.units_of(inner, source)?,
            Expr::Binary { op, left, right } => {
                let left_units = self.units_of(left, source)?;
                let right_units = self.units_of(right, source)?;
                match op {
                    BinaryOperator::Add | BinaryOperator::Subtract => {
                        same_units(op_name(op), left_units, right_units)?
                    }
                    BinaryOperator::Multiply => match (left_units, right_units) {
                        (Some(l), Some(r)) => Some(l * r),
                        (l, r) => l.or(r),
                    },
                    BinaryOperator::Divide => match (left_units, right_units) {
                        (Some(l), Some(r)) => Some(l / r),
                        (None, Some(r)) => Some(Unit::dimensionless() / r),
                        (l, None) => l,
                    },
                    BinaryOperator::Power => power_units(left_units, right, right_units)?,
                }
            }
            Expr::Call { function, args } => {
                let arg_units = args
                    .iter()
                    .map(|a| self.units_of(a, source))
                    .collect::<Result<Vec<Option<Unit>>, EvaluationError>>()?;
                match function {
                    BuiltinFunction::Log | BuiltinFunction::Exp => match arg_units[0] {
                        None => None,
                        Some(u) if u.is_dimensionless() => Some(u),
                        Some(u) => {
                            return Err(EvaluationError::DimensionedArgument {
                                function: function.name(),
                                units: u,
                            })
                        }
                    },
                    BuiltinFunction::Min | BuiltinFunction::Max => {
                        let mut units = None;
                        for u in arg_units {
                            units = same_units(function.name(), units, u)?;
                        }
                        units
                    }
                }
            }
        })
    }
}

fn op_name(op: &BinaryOperator) -> &'static str {
    match op {
        BinaryOperator::Add => "+",
        BinaryOperator::Subtract => "-",
        BinaryOperator::Multiply => "*",
        BinaryOperator::Divide => "/",
        BinaryOperator::Power => "^",
    }
}

fn same_units(
    operation: &'static str,
    left: Option<Unit>,
    right: Option<Unit>,
) -> Result<Option<Unit>, EvaluationError> {
    match (left, right) {
        (Some(l), Some(r)) if l != r => Err(EvaluationError::UnitMismatch {
            operation,
            left: l,
            right: r,
        }),
        (l, r) => Ok(l.or(r)),
    }
}

/// Literal integer exponent of a power, looking through groups and negation
fn integer_exponent(expr: &Expr) -> Option<i32> {
    match expr {
        Expr::Number(v) if v.fract() == 0. => Some(*v as i32),
        Expr::Group(inner) => integer_exponent(inner),
        Expr::Negate(inner) => integer_exponent(inner).map(|e| -e),
        _ => None,
    }
}

fn power_units(
    base: Option<Unit>,
    exponent: &Expr,
    exponent_units: Option<Unit>,
) -> Result<Option<Unit>, EvaluationError> {
    if let Some(u) = exponent_units {
        if !u.is_dimensionless() {
            return Err(EvaluationError::DimensionedArgument {
                function: "^",
                units: u,
            });
        }
    }
    match base {
        None => Ok(None),
        Some(u) if u.is_dimensionless() => Ok(Some(u)),
        Some(u) => match integer_exponent(exponent) {
            Some(e) => Ok(Some(u.powi(e))),
            None => Err(EvaluationError::NonIntegerExponent(u)),
        },
    }
}

/// Errors from evaluating an expression or inferring its units
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Operands of `{operation}` have different units: `{left}` and `{right}`")]
    UnitMismatch {
        operation: &'static str,
        left: Unit,
        right: Unit,
    },
    #[error("Argument of `{function}` must be dimensionless, found `{units}`")]
    DimensionedArgument {
        function: &'static str,
        units: Unit,
    },
    #[error("A quantity with units `{0}` can only be raised to a literal integer power")]
    NonIntegerExponent(Unit),
    #[error("The {category} `{id}` has no value")]
    MissingValue { category: SymbolCategory, id: String },
    #[error("The {category} `{id}` does not exist")]
    UnknownEntity { category: SymbolCategory, id: String },
    #[error("Symbol `{0}` was not resolved")]
    UnresolvedSymbol(String),
    #[error("The function `{0}` is defined in terms of itself")]
    RecursiveFunction(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Namespace;
    use indexmap::IndexMap;

    struct Table {
        values: IndexMap<&'static str, (f64, Unit)>,
    }

    impl SymbolSource for Table {
        fn value(&self, category: SymbolCategory, id: &str) -> Result<f64, EvaluationError> {
            self.values
                .get(id)
                .map(|(v, _)| *v)
                .ok_or(EvaluationError::UnknownEntity {
                    category,
                    id: id.to_string(),
                })
        }

        fn units(&self, category: SymbolCategory, id: &str) -> Result<Unit, EvaluationError> {
            self.values
                .get(id)
                .map(|(_, u)| *u)
                .ok_or(EvaluationError::UnknownEntity {
                    category,
                    id: id.to_string(),
                })
        }
    }

    fn table() -> (Table, Namespace) {
        let mut values = IndexMap::new();
        values.insert("s[c]", (100., Unit::molecule()));
        values.insert("K_m", (1e-6, Unit::molar()));
        values.insert("Avogadro", (6.02214076e23, Unit::per_mole()));
        values.insert("volume_c", (1e-15, Unit::liter()));
        values.insert("k_cat", (2., Unit::per_second()));
        values.insert("k", (2., Unit::per_second()));
        let namespace = Namespace::new()
            .with(SymbolCategory::Species, "s[c]")
            .with(SymbolCategory::Parameter, "K_m")
            .with(SymbolCategory::Parameter, "Avogadro")
            .with(SymbolCategory::Function, "volume_c")
            .with(SymbolCategory::Parameter, "k_cat")
            .with(SymbolCategory::Parameter, "k");
        (Table { values }, namespace)
    }

    #[test]
    fn evaluate_saturation() {
        let (table, namespace) = table();
        let expression = Expression::parse(
            "k_cat * (s[c] / (s[c] + K_m * Avogadro * volume_c))",
            &namespace,
        )
        .unwrap();
        let km_molecules = 1e-6 * 6.02214076e23 * 1e-15;
        let expected = 2. * 100. / (100. + km_molecules);
        approx::assert_relative_eq!(expression.evaluate(&table).unwrap(), expected);
        assert_eq!(
            expression.units(&table).unwrap(),
            Some(Unit::per_second())
        );
    }

    #[test]
    fn evaluate_functions() {
        let (table, namespace) = table();
        let expression = Expression::parse(
            "max(min(s[c], 1), 0) + exp(log(2)) - 2 ^ 3",
            &namespace,
        )
        .unwrap();
        approx::assert_relative_eq!(expression.evaluate(&table).unwrap(), 1. + 2. - 8.);
    }

    #[test]
    fn literals_adopt_context_units() {
        let (table, namespace) = table();
        let expression = Expression::parse("1 + s[c] / (K_m * Avogadro * volume_c)", &namespace).unwrap();
        assert_eq!(
            expression.units(&table).unwrap(),
            Some(Unit::dimensionless())
        );
        let expression = Expression::parse("max(min(s[c], 1), 0)", &namespace).unwrap();
        assert_eq!(expression.units(&table).unwrap(), Some(Unit::molecule()));
    }

    #[test]
    fn unit_mismatch_is_an_error() {
        let (table, namespace) = table();
        let expression = Expression::parse("s[c] + K_m", &namespace).unwrap();
        assert!(matches!(
            expression.units(&table),
            Err(EvaluationError::UnitMismatch { operation: "+", .. })
        ));
        let expression = Expression::parse("exp(s[c])", &namespace).unwrap();
        assert!(matches!(
            expression.units(&table),
            Err(EvaluationError::DimensionedArgument { .. })
        ));
        let expression = Expression::parse("s[c] ^ 0.5", &namespace).unwrap();
        assert!(matches!(
            expression.units(&table),
            Err(EvaluationError::NonIntegerExponent(_))
        ));
    }

    #[test]
    fn integer_powers_scale_units() {
        let (table, namespace) = table();
        let expression = Expression::parse("k * s[c] ^ -2", &namespace).unwrap();
        assert_eq!(
            expression.units(&table).unwrap(),
            Some(Unit::per_second() * Unit::molecule().powi(-2))
        );
    }
}
