//! This module provides structs for representing species types, species and their initial
//! concentrations
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::model::formula::Formula;
use crate::model::registry::Entity;
use crate::model::units::Unit;

/// Kind of molecule a species type represents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeciesTypeKind {
    Metabolite,
    Dna,
    Rna,
    Protein,
    Complex,
    /// Modelling construct without a molecular counterpart, e.g. a polymerase binding site
    PseudoSpecies,
}

/// Represents a type of molecule, independent of the compartment it is in
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesType {
    pub id: String,
    #[builder(default = "None")]
    pub name: Option<String>,
    pub kind: SpeciesTypeKind,
    /// Sequence of polymers
    #[builder(default = "None")]
    pub structure: Option<String>,
    #[builder(default = "None")]
    pub empirical_formula: Option<Formula>,
    #[builder(default = "0")]
    pub charge: i32,
    #[builder(default = "String::new()")]
    pub comments: String,
}

impl Entity for SpeciesType {
    const KIND: &'static str = "species type";

    fn id(&self) -> &str {
        &self.id
    }
}

/// A species type located in a compartment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    /// Id of the form `<species type>[<compartment>]`
    pub id: String,
    pub species_type: String,
    pub compartment: String,
}

impl Species {
    pub fn new(species_type: &str, compartment: &str) -> Self {
        Species {
            id: Species::gen_id(species_type, compartment),
            species_type: species_type.to_string(),
            compartment: compartment.to_string(),
        }
    }

    /// Generate the id of the species of `species_type` in `compartment`
    ///
    /// # Examples
    /// ```rust
    /// use modelgen_core::model::species::Species;
    /// assert_eq!(Species::gen_id("atp", "c"), "atp[c]");
    /// ```
    pub fn gen_id(species_type: &str, compartment: &str) -> String {
        format!("{}[{}]", species_type, compartment)
    }
}

impl Entity for Species {
    const KIND: &'static str = "species";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Distribution of the initial copy number of a species
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionInitConcentration {
    pub id: String,
    pub species: String,
    /// Mean initial copy number
    pub mean: f64,
    #[builder(default = "0.")]
    pub std: f64,
    #[builder(default = "Unit::molecule()")]
    pub units: Unit,
    #[builder(default = "String::new()")]
    pub comments: String,
    /// Ids of supporting references
    #[builder(default = "Vec::new()")]
    pub references: Vec<String>,
}

impl DistributionInitConcentration {
    pub fn gen_id(species: &str) -> String {
        format!("dist-init-conc-{}", species)
    }

    /// Initial concentration record for `species` with the given mean
    pub fn new(species: &str, mean: f64) -> Self {
        DistributionInitConcentration {
            id: DistributionInitConcentration::gen_id(species),
            species: species.to_string(),
            mean,
            std: 0.,
            units: Unit::molecule(),
            comments: String::new(),
            references: Vec::new(),
        }
    }
}

impl Entity for DistributionInitConcentration {
    const KIND: &'static str = "initial concentration";

    fn id(&self) -> &str {
        &self.id
    }
}
