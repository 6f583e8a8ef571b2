//! Output model: registries of the entities making up a parameterized reaction network
pub mod compartment;
pub mod formula;
pub mod model;
pub mod observable;
pub mod parameter;
pub mod reaction;
pub mod registry;
pub mod species;
pub mod units;

pub use model::{Model, ModelError, ModelValues};
