//! This module provides structs for representing parameters and literature references
use std::fmt::{Display, Formatter};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::model::registry::Entity;
use crate::model::units::Unit;

/// Kinetic role of a parameter, parameters sharing a role are imputed together
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterRole {
    /// Turnover number
    #[serde(rename = "k_cat")]
    CatalyticConstant,
    /// Michaelis constant
    #[serde(rename = "K_m")]
    MichaelisConstant,
    /// Dissociation constant
    #[serde(rename = "K_d")]
    DissociationConstant,
    /// Mass action rate constant
    #[serde(rename = "k")]
    RateConstant,
}

impl Display for ParameterRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ParameterRole::CatalyticConstant => "k_cat",
            ParameterRole::MichaelisConstant => "K_m",
            ParameterRole::DissociationConstant => "K_d",
            ParameterRole::RateConstant => "k",
        };
        write!(f, "{}", name)
    }
}

/// Represents a model parameter
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: String,
    #[builder(default = "None")]
    pub name: Option<String>,
    #[builder(default = "None")]
    pub role: Option<ParameterRole>,
    /// `None` until determined by data or calibration
    #[builder(default = "None")]
    pub value: Option<f64>,
    #[builder(default = "None")]
    pub std: Option<f64>,
    #[builder(default = "Unit::dimensionless()")]
    pub units: Unit,
    #[builder(default = "String::new()")]
    pub comments: String,
    /// Ids of supporting references
    #[builder(default = "Vec::new()")]
    pub references: Vec<String>,
    /// Whether the value was imputed rather than determined from data
    #[builder(default = "false")]
    pub imputed: bool,
}

impl Parameter {
    /// Parameter without a value
    pub fn new(id: &str, role: Option<ParameterRole>, units: Unit) -> Self {
        Parameter {
            id: id.to_string(),
            name: None,
            role,
            value: None,
            std: None,
            units,
            comments: String::new(),
            references: Vec::new(),
            imputed: false,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Record `reference` once
    pub fn add_reference(&mut self, reference: &str) {
        if !self.references.iter().any(|r| r == reference) {
            self.references.push(reference.to_string());
        }
    }
}

impl Entity for Parameter {
    const KIND: &'static str = "parameter";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Literature reference supporting a parameter value or concentration
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    pub title: String,
    #[builder(default = "None")]
    pub author: Option<String>,
    #[builder(default = "None")]
    pub year: Option<u32>,
    #[builder(default = "None")]
    pub publication: Option<String>,
    #[builder(default = "None")]
    pub volume: Option<String>,
    #[builder(default = "None")]
    pub pages: Option<String>,
}

impl Entity for Reference {
    const KIND: &'static str = "reference";

    fn id(&self) -> &str {
        &self.id
    }
}
