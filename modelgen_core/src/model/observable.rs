//! This module provides structs for representing observables and functions
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::expression::Expression;
use crate::model::registry::Entity;
use crate::model::units::Unit;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservableTerm {
    pub species: String,
    pub coefficient: f64,
}

/// Named linear combination of species, counted in molecules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observable {
    pub id: String,
    pub name: Option<String>,
    pub terms: Vec<ObservableTerm>,
}

impl Observable {
    pub fn new(id: &str, terms: Vec<ObservableTerm>) -> Self {
        Observable {
            id: id.to_string(),
            name: None,
            terms,
        }
    }

    /// Observable summing `species` with unit coefficients
    pub fn sum_of<'a, I: IntoIterator<Item = &'a str>>(id: &str, species: I) -> Self {
        let terms = species
            .into_iter()
            .map(|s| ObservableTerm {
                species: s.to_string(),
                coefficient: 1.,
            })
            .collect();
        Observable::new(id, terms)
    }

    pub fn species(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.species.as_str())
    }
}

impl Display for Observable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self
            .terms
            .iter()
            .map(|t| {
                if t.coefficient == 1. {
                    t.species.clone()
                } else {
                    format!("{} * {}", t.coefficient, t.species)
                }
            })
            .collect();
        write!(f, "{}", rendered.join(" + "))
    }
}

impl Entity for Observable {
    const KIND: &'static str = "observable";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Named expression derived from other entities
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub id: String,
    pub name: Option<String>,
    pub expression: Expression,
    /// Declared units, checked against the expression when the function is created
    pub units: Unit,
    pub comments: String,
    pub references: Vec<String>,
}

impl Function {
    pub fn new(id: &str, expression: Expression, units: Unit) -> Self {
        Function {
            id: id.to_string(),
            name: None,
            expression,
            units,
            comments: String::new(),
            references: Vec::new(),
        }
    }
}

impl Entity for Function {
    const KIND: &'static str = "function";

    fn id(&self) -> &str {
        &self.id
    }
}
