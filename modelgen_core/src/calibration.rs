//! Calibrate kinetic parameters so that steady state fluxes match observed turnover
//!
//! A [`Calibrator`] is used in two passes. First every reaction's free parameter is solved
//! from a target rate, recording the parameters it could not determine. Then
//! [`Calibrator::impute`] sets each undetermined parameter to the median of the determined
//! parameters with the same role.
use std::f64::consts::LN_2;

use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};
use thiserror::Error;

use crate::configuration;
use crate::expression::EvaluationError;
use crate::model::parameter::ParameterRole;
use crate::model::registry::RegistryError;
use crate::model::{Model, ModelError};
use crate::utils::stats;

/// Comment recorded on parameters set by [`Calibrator::impute`]
pub const IMPUTED_COMMENT: &str =
    "Set to the median value because it could not be determined from data";

/// Average rate at which a species must be synthesized to make up for dilution by growth and
/// for degradation
///
/// # Examples
/// ```rust
/// use modelgen_core::calibration::average_synthesis_rate;
/// let rate = average_synthesis_rate(0.5, 300., 36000.);
/// assert!((rate - 0.001164872).abs() < 1e-9);
/// ```
pub fn average_synthesis_rate(mean: f64, half_life: f64, doubling_time: f64) -> f64 {
    LN_2 * (1. / doubling_time + 1. / half_life) * mean
}

/// Average rate at which a species is degraded
pub fn average_degradation_rate(mean: f64, half_life: f64) -> f64 {
    LN_2 / half_life * mean
}

/// Michaelis constant (M) assumed to be `beta` times the concentration of `count` molecules in
/// `volume` litres
pub fn michaelis_constant(beta: f64, count: f64, volume: f64) -> f64 {
    beta * count / configuration::current().avogadro / volume
}

/// Solves parameters from target rates and imputes those that can't be solved
#[derive(Debug, Default)]
pub struct Calibrator {
    determined: IndexSet<String>,
    undetermined: IndexSet<String>,
}

impl Calibrator {
    pub fn new() -> Self {
        Calibrator::default()
    }

    /// Solve `parameter` so that the forward rate law of `reaction` equals `target`
    ///
    /// The rate law is linear in the parameter, so it is set to 1, the rate law evaluated at
    /// the mean initial copy numbers (or `overrides`), and the target divided by the result.
    /// A missing, zero or non-finite target or evaluation leaves the parameter undetermined,
    /// as does another parameter of the rate law without a value. Returns the solved value.
    pub fn solve(
        &mut self,
        model: &mut Model,
        reaction: &str,
        parameter: &str,
        target: Option<f64>,
        overrides: Option<&IndexMap<String, f64>>,
    ) -> Result<Option<f64>, CalibrationError> {
        let Some(target) = target.filter(|t| t.is_finite() && *t > 0.) else {
            debug!("No target rate for `{}`, `{}` is undetermined", reaction, parameter);
            self.mark_undetermined(model, parameter)?;
            return Ok(None);
        };
        model.set_parameter_value(parameter, 1.)?;
        let unit_rate = match model.evaluate_rate_law(reaction, overrides) {
            Ok(rate) => rate,
            Err(ModelError::Evaluation(EvaluationError::MissingValue { id, .. })) => {
                debug!(
                    "Rate law of `{}` needs `{}`, `{}` is undetermined",
                    reaction, id, parameter
                );
                self.mark_undetermined(model, parameter)?;
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        let value = target / unit_rate;
        if !value.is_finite() || value <= 0. {
            debug!(
                "Rate law of `{}` evaluates to {}, `{}` is undetermined",
                reaction, unit_rate, parameter
            );
            self.mark_undetermined(model, parameter)?;
            return Ok(None);
        }
        self.set_determined(model, parameter, value)?;
        Ok(Some(value))
    }

    /// Set a parameter whose value is known directly
    pub fn set_determined(
        &mut self,
        model: &mut Model,
        parameter: &str,
        value: f64,
    ) -> Result<(), CalibrationError> {
        let record = model.parameters.require_mut(parameter)?;
        record.value = Some(value);
        if record.imputed {
            record.imputed = false;
            record.comments.clear();
        }
        self.undetermined.shift_remove(parameter);
        self.determined.insert(parameter.to_string());
        Ok(())
    }

    /// Record that `parameter` could not be determined from data
    pub fn mark_undetermined(
        &mut self,
        model: &mut Model,
        parameter: &str,
    ) -> Result<(), CalibrationError> {
        model.parameters.require_mut(parameter)?.value = None;
        self.determined.shift_remove(parameter);
        self.undetermined.insert(parameter.to_string());
        Ok(())
    }

    /// Parameters that are still undetermined
    pub fn undetermined(&self) -> impl Iterator<Item = &str> {
        self.undetermined.iter().map(String::as_str)
    }

    /// Set every undetermined parameter to the median of the determined values of the same
    /// role, returning the number of parameters imputed
    ///
    /// Parameters of a role without any determined value stay undetermined.
    pub fn impute(self, model: &mut Model) -> Result<usize, CalibrationError> {
        let mut values: IndexMap<Option<ParameterRole>, Vec<f64>> = IndexMap::new();
        for id in &self.determined {
            let parameter = model.parameters.require(id)?;
            if let Some(value) = parameter.value {
                values.entry(parameter.role).or_default().push(value);
            }
        }
        let mut imputed = 0;
        for id in &self.undetermined {
            let parameter = model.parameters.require_mut(id)?;
            let median = values
                .get(&parameter.role)
                .and_then(|determined| stats::median(determined));
            match median {
                Some(median) => {
                    parameter.value = Some(median);
                    parameter.comments = IMPUTED_COMMENT.to_string();
                    parameter.imputed = true;
                    imputed += 1;
                }
                None => warn!(
                    "No determined {} values to impute `{}` from",
                    parameter
                        .role
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "parameter".to_string()),
                    id
                ),
            }
        }
        Ok(imputed)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalibrationError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
