//! This module provides a struct for representing compartments
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::model::registry::Entity;

/// Represents a compartment of the cell
///
/// The volume of a compartment is not stored as a constant. It is computed by the function
/// [`Compartment::volume_function`] from the compartment's mass (the value of the
/// compartment symbol in expressions) and its density parameter.
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compartment {
    /// Used to identify the compartment, e.g. `c`
    pub id: String,
    /// Human-readable compartment name, e.g. `cytosol`
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Mean initial volume (l)
    pub init_volume: f64,
    /// Standard deviation of the initial volume (l)
    #[builder(default = "0.")]
    pub init_volume_std: f64,
    /// Id of the density parameter (g l^-1)
    pub init_density: String,
    /// Id of the function computing the volume
    pub volume_function: String,
}

impl Compartment {
    pub fn density_id(compartment: &str) -> String {
        format!("density_{}", compartment)
    }

    pub fn volume_function_id(compartment: &str) -> String {
        format!("volume_{}", compartment)
    }

    /// Name if one is set, otherwise the id
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

impl Entity for Compartment {
    const KIND: &'static str = "compartment";

    fn id(&self) -> &str {
        &self.id
    }
}
