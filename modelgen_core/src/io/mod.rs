//! Module for reading knowledge bases and reading and writing Models
pub mod json;

pub use json::JsonError;
