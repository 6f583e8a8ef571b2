//! Module providing JSON IO for knowledge bases and generated models
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::expression::{Expression, ExpressionError, SymbolCategory};
use crate::kb::KnowledgeBase;
use crate::model::compartment::Compartment;
use crate::model::observable::{Function, Observable};
use crate::model::parameter::{Parameter, Reference};
use crate::model::reaction::{RateLaw, RateLawDirection, Reaction, Submodel};
use crate::model::registry::RegistryError;
use crate::model::species::{DistributionInitConcentration, Species, SpeciesType};
use crate::model::units::Unit;
use crate::model::Model;

// region JSON Model
/// Represents a JSON serialized model, used for reading and writing models in json format
#[derive(Serialize, Deserialize)]
struct JsonModel {
    id: Option<String>,
    version: Option<String>,
    #[serde(default)]
    compartments: Vec<Compartment>,
    #[serde(default)]
    species_types: Vec<SpeciesType>,
    #[serde(default)]
    species: Vec<Species>,
    #[serde(default)]
    distribution_init_concentrations: Vec<DistributionInitConcentration>,
    #[serde(default)]
    submodels: Vec<Submodel>,
    #[serde(default)]
    reactions: Vec<Reaction>,
    #[serde(default)]
    parameters: Vec<Parameter>,
    #[serde(default)]
    observables: Vec<Observable>,
    #[serde(default)]
    functions: Vec<JsonFunction>,
    #[serde(default)]
    rate_laws: Vec<JsonRateLaw>,
    #[serde(default)]
    references: Vec<Reference>,
}

/// Function with its expression stored as text
#[derive(Serialize, Deserialize)]
struct JsonFunction {
    id: String,
    name: Option<String>,
    expression: String,
    units: Unit,
    #[serde(default)]
    comments: String,
    #[serde(default)]
    references: Vec<String>,
}

/// Rate law with its expression stored as text
#[derive(Serialize, Deserialize)]
struct JsonRateLaw {
    id: String,
    reaction: String,
    direction: RateLawDirection,
    expression: String,
    units: Unit,
    #[serde(default)]
    comments: String,
}
// endregion JSON Model

// region Conversions
impl From<&Function> for JsonFunction {
    fn from(f: &Function) -> Self {
        Self {
            id: f.id.clone(),
            name: f.name.clone(),
            expression: f.expression.to_string(),
            units: f.units,
            comments: f.comments.clone(),
            references: f.references.clone(),
        }
    }
}

impl From<&RateLaw> for JsonRateLaw {
    fn from(r: &RateLaw) -> Self {
        Self {
            id: r.id.clone(),
            reaction: r.reaction.clone(),
            direction: r.direction,
            expression: r.expression.to_string(),
            units: r.units,
            comments: r.comments.clone(),
        }
    }
}

impl KnowledgeBase {
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<KnowledgeBase, JsonError> {
        let kb_str = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => return Err(JsonError::UnableToRead(format!("{:?}", err))),
        };
        match serde_json::from_str::<KnowledgeBase>(&kb_str) {
            Ok(kb) => Ok(kb),
            Err(err) => Err(JsonError::UnableToParse(format!("{:?}", err))),
        }
    }
}

impl Model {
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Model, JsonError> {
        let model_str = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => return Err(JsonError::UnableToRead(format!("{:?}", err))),
        };
        let json_model = match serde_json::from_str::<JsonModel>(&model_str) {
            Ok(model) => model,
            Err(err) => return Err(JsonError::UnableToParse(format!("{:?}", err))),
        };
        Model::from_json(json_model)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), JsonError> {
        let json_model = self.to_json();
        let model_string = serde_json::to_string_pretty(&json_model)?;
        fs::write(path, model_string)?;
        Ok(())
    }

    fn from_json(json_model: JsonModel) -> Result<Self, JsonError> {
        let mut model = Model::new(json_model.id, json_model.version);
        for compartment in json_model.compartments {
            model.compartments.create(compartment)?;
        }
        for species_type in json_model.species_types {
            model.species_types.create(species_type)?;
        }
        for species in json_model.species {
            model.species.create(species)?;
        }
        for distribution in json_model.distribution_init_concentrations {
            model.distribution_init_concentrations.create(distribution)?;
        }
        for submodel in json_model.submodels {
            model.submodels.create(submodel)?;
        }
        for reaction in json_model.reactions {
            model.reactions.create(reaction)?;
        }
        for parameter in json_model.parameters {
            model.parameters.create(parameter)?;
        }
        for observable in json_model.observables {
            model.observables.create(observable)?;
        }
        for reference in json_model.references {
            model.references.create(reference)?;
        }

        /* Functions may refer to each other in any order, so every function id is made
        available before any expression is resolved
        */
        let mut namespace = model.namespace();
        for function in &json_model.functions {
            namespace.insert(SymbolCategory::Function, &function.id);
        }
        for f in json_model.functions {
            model.functions.create(Function {
                expression: Expression::parse(&f.expression, &namespace)?,
                id: f.id,
                name: f.name,
                units: f.units,
                comments: f.comments,
                references: f.references,
            })?;
        }
        for r in json_model.rate_laws {
            model.rate_laws.create(RateLaw {
                expression: Expression::parse(&r.expression, &namespace)?,
                id: r.id,
                reaction: r.reaction,
                direction: r.direction,
                units: r.units,
                comments: r.comments,
            })?;
        }
        Ok(model)
    }

    fn to_json(&self) -> JsonModel {
        JsonModel {
            id: self.id.clone(),
            version: self.version.clone(),
            compartments: self.compartments.iter().cloned().collect(),
            species_types: self.species_types.iter().cloned().collect(),
            species: self.species.iter().cloned().collect(),
            distribution_init_concentrations: self
                .distribution_init_concentrations
                .iter()
                .cloned()
                .collect(),
            submodels: self.submodels.iter().cloned().collect(),
            reactions: self.reactions.iter().cloned().collect(),
            parameters: self.parameters.iter().cloned().collect(),
            observables: self.observables.iter().cloned().collect(),
            functions: self.functions.iter().map(JsonFunction::from).collect(),
            rate_laws: self.rate_laws.iter().map(JsonRateLaw::from).collect(),
            references: self.references.iter().cloned().collect(),
        }
    }
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to parse json due to {0}")]
    UnableToParse(String),
    #[error("Unable to resolve a stored expression")]
    UnableToResolve(#[from] ExpressionError),
    #[error("Duplicate entity in stored model")]
    DuplicateEntity(#[from] RegistryError),
    #[error("Serde json parse error")]
    SerdeJsonParseError(#[from] serde_json::Error),
    #[error("Unable to write to file")]
    UnableToWrite(#[from] std::io::Error),
}

// endregion Conversions
