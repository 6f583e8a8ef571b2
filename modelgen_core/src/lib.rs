//! Core rust implementation of modelgen, a crate for generating and calibrating mechanistic
//! models of gene expression from a cell knowledge base.

pub mod calibration;
pub mod configuration;
pub mod expression;
pub mod generator;
pub mod io;
pub mod kb;
pub mod model;
pub mod rate_laws;
pub mod stoichiometry;
mod utils;
