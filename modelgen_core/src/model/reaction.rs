//! This module provides structs for representing submodels, reactions and rate laws
use derive_builder::Builder;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::expression::Expression;
use crate::model::registry::Entity;
use crate::model::units::Unit;

/// Group of reactions describing one cellular process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submodel {
    pub id: String,
    pub name: Option<String>,
}

impl Submodel {
    pub fn new(id: &str) -> Self {
        Submodel {
            id: id.to_string(),
            name: None,
        }
    }
}

impl Entity for Submodel {
    const KIND: &'static str = "submodel";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Species participating in a reaction, negative coefficients are consumed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesCoefficient {
    pub species: String,
    pub coefficient: i64,
}

impl SpeciesCoefficient {
    pub fn new(species: &str, coefficient: i64) -> Self {
        SpeciesCoefficient {
            species: species.to_string(),
            coefficient,
        }
    }
}

/// Represents a reaction in a submodel
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    /// Used to identify the reaction
    pub id: String,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Id of the submodel the reaction belongs to
    pub submodel: String,
    /// Participants in order; catalysts appear once consumed and once produced
    #[builder(default = "Vec::new()")]
    pub participants: Vec<SpeciesCoefficient>,
    #[builder(default = "false")]
    pub reversible: bool,
    #[builder(default = "String::new()")]
    pub comments: String,
}

impl Reaction {
    /// Distinct species with a negative coefficient, in participant order
    pub fn reactants(&self) -> Vec<&str> {
        let mut reactants: Vec<&str> = Vec::new();
        for participant in self.participants.iter().filter(|p| p.coefficient < 0) {
            if !reactants.contains(&participant.species.as_str()) {
                reactants.push(&participant.species);
            }
        }
        reactants
    }

    /// Distinct species with a positive coefficient, in participant order
    pub fn products(&self) -> Vec<&str> {
        let mut products: Vec<&str> = Vec::new();
        for participant in self.participants.iter().filter(|p| p.coefficient > 0) {
            if !products.contains(&participant.species.as_str()) {
                products.push(&participant.species);
            }
        }
        products
    }

    /// Net coefficient of every species, catalysts sum to zero and are dropped
    pub fn net_coefficients(&self) -> IndexMap<&str, i64> {
        let mut net: IndexMap<&str, i64> = IndexMap::new();
        for participant in &self.participants {
            *net.entry(participant.species.as_str()).or_insert(0) += participant.coefficient;
        }
        net.retain(|_, c| *c != 0);
        net
    }

    /// Coefficient of `species` as a reactant (as a positive number), 0 if it isn't one
    pub fn consumed(&self, species: &str) -> i64 {
        self.participants
            .iter()
            .filter(|p| p.species == species && p.coefficient < 0)
            .map(|p| -p.coefficient)
            .sum()
    }
}

impl Entity for Reaction {
    const KIND: &'static str = "reaction";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLawDirection {
    Forward,
    Backward,
}

impl RateLawDirection {
    fn suffix(&self) -> &'static str {
        match self {
            RateLawDirection::Forward => "forward",
            RateLawDirection::Backward => "backward",
        }
    }
}

/// Kinetic law of one direction of a reaction
#[derive(Debug, Clone, PartialEq)]
pub struct RateLaw {
    /// Id of the form `<reaction>-<direction>`
    pub id: String,
    pub reaction: String,
    pub direction: RateLawDirection,
    pub expression: Expression,
    pub units: Unit,
    pub comments: String,
}

impl RateLaw {
    pub fn new(reaction: &str, direction: RateLawDirection, expression: Expression) -> Self {
        RateLaw {
            id: RateLaw::gen_id(reaction, direction),
            reaction: reaction.to_string(),
            direction,
            expression,
            units: Unit::per_second(),
            comments: String::new(),
        }
    }

    pub fn gen_id(reaction: &str, direction: RateLawDirection) -> String {
        format!("{}-{}", reaction, direction.suffix())
    }
}

impl Entity for RateLaw {
    const KIND: &'static str = "rate law";

    fn id(&self) -> &str {
        &self.id
    }
}
