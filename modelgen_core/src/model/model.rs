//! This module provides the Model struct for representing an entire reaction network
use indexmap::IndexMap;
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use thiserror::Error;

use crate::configuration;
use crate::expression::{
    EvaluationError, Expression, ExpressionError, Namespace, SymbolCategory, SymbolSource,
};
use crate::model::compartment::Compartment;
use crate::model::formula::Formula;
use crate::model::observable::{Function, Observable};
use crate::model::parameter::{Parameter, Reference};
use crate::model::reaction::{RateLaw, RateLawDirection, Reaction, Submodel};
use crate::model::registry::{Handle, Registry, RegistryError};
use crate::model::species::{DistributionInitConcentration, Species, SpeciesType};
use crate::model::units::Unit;

/// Id of the Avogadro constant parameter
pub const AVOGADRO: &str = "Avogadro";

/// Represents a parameterized reaction network
#[derive(Clone, Debug, Default)]
pub struct Model {
    /// Id associated with the Model
    pub id: Option<String>,
    /// A version identifier for the Model, stored as a string
    pub version: Option<String>,
    pub compartments: Registry<Compartment>,
    pub species_types: Registry<SpeciesType>,
    pub species: Registry<Species>,
    pub distribution_init_concentrations: Registry<DistributionInitConcentration>,
    pub submodels: Registry<Submodel>,
    pub reactions: Registry<Reaction>,
    pub rate_laws: Registry<RateLaw>,
    pub parameters: Registry<Parameter>,
    pub observables: Registry<Observable>,
    pub functions: Registry<Function>,
    pub references: Registry<Reference>,
}

impl Model {
    pub fn new_empty() -> Self {
        Model::default()
    }

    pub fn new(id: Option<String>, version: Option<String>) -> Self {
        Model {
            id,
            version,
            ..Model::default()
        }
    }

    // region Entity Creation

    /// Get or create the Avogadro constant parameter, returning its id
    pub fn intern_avogadro(&mut self) -> &'static str {
        self.parameters.intern(AVOGADRO, || {
            Parameter::new(AVOGADRO, None, Unit::per_mole())
                .with_value(configuration::current().avogadro)
        });
        AVOGADRO
    }

    /// Get or create the submodel with `id`
    pub fn intern_submodel(&mut self, id: &str) -> Handle<Submodel> {
        self.submodels.intern_handle(id, || Submodel::new(id)).0
    }

    /// Add a function after checking that it only references functions which already exist
    /// and that its expression has the declared units
    pub fn create_function(&mut self, function: Function) -> Result<Handle<Function>, ModelError> {
        for reference in function.expression.references(SymbolCategory::Function) {
            if reference == function.id {
                return Err(EvaluationError::RecursiveFunction(function.id.clone()).into());
            }
            self.functions.require(reference)?;
        }
        if let Some(inferred) = function.expression.units(&self.values())? {
            if inferred != function.units {
                return Err(ModelError::UnitsDiffer {
                    id: function.id.clone(),
                    declared: function.units,
                    inferred,
                });
            }
        }
        Ok(self.functions.create(function)?)
    }

    /// Get the function with `id`, creating it with `constructor` if it doesn't exist yet
    pub fn intern_function<F>(&mut self, id: &str, constructor: F) -> Result<&Function, ModelError>
    where
        F: FnOnce(&mut Model) -> Result<Function, ModelError>,
    {
        if !self.functions.contains(id) {
            let function = constructor(self)?;
            self.create_function(function)?;
        }
        Ok(self.functions.require(id)?)
    }

    /// Attach a rate law to its reaction, checking that the units of its expression agree
    ///
    /// The rate law keeps its declared units. Templates scale their rate constants
    /// differently, so the inferred units only need to be consistent, not equal to the
    /// declared ones.
    pub fn add_rate_law(&mut self, rate_law: RateLaw) -> Result<Handle<RateLaw>, ModelError> {
        self.reactions.require(&rate_law.reaction)?;
        rate_law.expression.units(&self.values())?;
        Ok(self.rate_laws.create(rate_law)?)
    }

    /// Mean initial copy number of `species`
    pub fn species_mean(&self, species: &str) -> Option<f64> {
        self.distribution_init_concentrations
            .get(&DistributionInitConcentration::gen_id(species))
            .map(|d| d.mean)
    }

    /// Set the mean initial copy number of `species`, creating the record if needed
    pub fn set_species_mean(&mut self, species: &str, mean: f64) -> Result<(), ModelError> {
        self.species.require(species)?;
        let id = DistributionInitConcentration::gen_id(species);
        let record = self
            .distribution_init_concentrations
            .intern(&id, || DistributionInitConcentration::new(species, mean));
        record.mean = mean;
        Ok(())
    }

    /// Set the value of a parameter
    pub fn set_parameter_value(&mut self, parameter: &str, value: f64) -> Result<(), ModelError> {
        self.parameters.require_mut(parameter)?.value = Some(value);
        Ok(())
    }

    pub fn parameter_value(&self, parameter: &str) -> Result<f64, ModelError> {
        self.parameters
            .require(parameter)?
            .value
            .ok_or_else(|| {
                EvaluationError::MissingValue {
                    category: SymbolCategory::Parameter,
                    id: parameter.to_string(),
                }
                .into()
            })
    }

    // endregion Entity Creation

    // region Evaluation

    /// Namespace containing every entity of the model
    pub fn namespace(&self) -> Namespace {
        let mut namespace = Namespace::new();
        for id in self.species.ids() {
            namespace.insert(SymbolCategory::Species, id);
        }
        for id in self.parameters.ids() {
            namespace.insert(SymbolCategory::Parameter, id);
        }
        for id in self.observables.ids() {
            namespace.insert(SymbolCategory::Observable, id);
        }
        for id in self.functions.ids() {
            namespace.insert(SymbolCategory::Function, id);
        }
        for id in self.compartments.ids() {
            namespace.insert(SymbolCategory::Compartment, id);
        }
        namespace
    }

    /// Values of the model entities at their mean initial concentrations
    pub fn values(&self) -> ModelValues<'_> {
        ModelValues {
            model: self,
            overrides: None,
        }
    }

    /// Values of the model entities, with species copy numbers taken from `overrides` where
    /// present
    pub fn values_with<'a>(&'a self, overrides: &'a IndexMap<String, f64>) -> ModelValues<'a> {
        ModelValues {
            model: self,
            overrides: Some(overrides),
        }
    }

    /// Check the units of `expression` and evaluate it
    pub fn evaluate(
        &self,
        expression: &Expression,
        overrides: Option<&IndexMap<String, f64>>,
    ) -> Result<f64, EvaluationError> {
        let values = ModelValues {
            model: self,
            overrides,
        };
        expression.units(&values)?;
        expression.evaluate(&values)
    }

    /// Evaluate the forward rate law of `reaction`
    pub fn evaluate_rate_law(
        &self,
        reaction: &str,
        overrides: Option<&IndexMap<String, f64>>,
    ) -> Result<f64, ModelError> {
        let rate_law = self
            .rate_laws
            .require(&RateLaw::gen_id(reaction, RateLawDirection::Forward))?;
        Ok(self.evaluate(&rate_law.expression, overrides)?)
    }

    // endregion Evaluation

    // region Network Structure

    /// Sparse matrix of net stoichiometric coefficients, species in rows and reactions in
    /// columns, both in registry order
    pub fn stoichiometric_matrix(&self) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(self.species.len(), self.reactions.len());
        for (column, reaction) in self.reactions.iter().enumerate() {
            for (species, coefficient) in reaction.net_coefficients() {
                if let Some(row) = self.species.handle(species) {
                    coo.push(row.index(), column, coefficient as f64);
                }
            }
        }
        CsrMatrix::from(&coo)
    }

    /// Net rate of change of every species given one flux per reaction
    pub fn species_net_rates(&self, fluxes: &DVector<f64>) -> Result<DVector<f64>, ModelError> {
        if fluxes.len() != self.reactions.len() {
            return Err(ModelError::FluxDimension {
                expected: self.reactions.len(),
                found: fluxes.len(),
            });
        }
        let matrix = self.stoichiometric_matrix();
        let mut rates = DVector::zeros(self.species.len());
        for (row, column, coefficient) in matrix.triplet_iter() {
            rates[row] += coefficient * fluxes[column];
        }
        Ok(rates)
    }

    /// Net atoms of a reaction, an empty formula when it is balanced
    ///
    /// Returns `None` when a participant has no empirical formula.
    pub fn element_imbalance(&self, reaction: &str) -> Result<Option<Formula>, ModelError> {
        let reaction = self.reactions.require(reaction)?;
        let mut net = Formula::new();
        for (species, coefficient) in reaction.net_coefficients() {
            let species = self.species.require(species)?;
            let species_type = self.species_types.require(&species.species_type)?;
            match &species_type.empirical_formula {
                Some(formula) => net += &(formula * coefficient),
                None => return Ok(None),
            }
        }
        Ok(Some(net))
    }

    // endregion Network Structure
}

/// Supplies the values of model entities to expressions
pub struct ModelValues<'a> {
    model: &'a Model,
    overrides: Option<&'a IndexMap<String, f64>>,
}

impl ModelValues<'_> {
    fn species_value(&self, id: &str) -> Result<f64, EvaluationError> {
        if let Some(value) = self.overrides.and_then(|o| o.get(id)) {
            return Ok(*value);
        }
        if !self.model.species.contains(id) {
            return Err(EvaluationError::UnknownEntity {
                category: SymbolCategory::Species,
                id: id.to_string(),
            });
        }
        Ok(self.model.species_mean(id).unwrap_or(0.))
    }
}

impl SymbolSource for ModelValues<'_> {
    fn value(&self, category: SymbolCategory, id: &str) -> Result<f64, EvaluationError> {
        let unknown = || EvaluationError::UnknownEntity {
            category,
            id: id.to_string(),
        };
        let missing = || EvaluationError::MissingValue {
            category,
            id: id.to_string(),
        };
        match category {
            SymbolCategory::Species => self.species_value(id),
            SymbolCategory::Parameter => self
                .model
                .parameters
                .get(id)
                .ok_or_else(unknown)?
                .value
                .ok_or_else(missing),
            SymbolCategory::Observable => {
                let observable = self.model.observables.get(id).ok_or_else(unknown)?;
                let mut total = 0.;
                for term in &observable.terms {
                    total += term.coefficient * self.species_value(&term.species)?;
                }
                Ok(total)
            }
            SymbolCategory::Function => {
                let function = self.model.functions.get(id).ok_or_else(unknown)?;
                function.expression.evaluate(self)
            }
            SymbolCategory::Compartment => {
                let compartment = self.model.compartments.get(id).ok_or_else(unknown)?;
                let density = self.value(SymbolCategory::Parameter, &compartment.init_density)?;
                Ok(compartment.init_volume * density)
            }
        }
    }

    fn units(&self, category: SymbolCategory, id: &str) -> Result<Unit, EvaluationError> {
        let unknown = || EvaluationError::UnknownEntity {
            category,
            id: id.to_string(),
        };
        match category {
            SymbolCategory::Species | SymbolCategory::Observable => {
                let exists = match category {
                    SymbolCategory::Species => self.model.species.contains(id),
                    _ => self.model.observables.contains(id),
                };
                if exists {
                    Ok(Unit::molecule())
                } else {
                    Err(unknown())
                }
            }
            SymbolCategory::Parameter => Ok(self.model.parameters.get(id).ok_or_else(unknown)?.units),
            SymbolCategory::Function => Ok(self.model.functions.get(id).ok_or_else(unknown)?.units),
            SymbolCategory::Compartment => {
                self.model.compartments.get(id).ok_or_else(unknown)?;
                Ok(Unit::gram())
            }
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Expression(#[from] ExpressionError),
    #[error("Function `{id}` is declared in `{declared}` but its expression is in `{inferred}`")]
    UnitsDiffer {
        id: String,
        declared: Unit,
        inferred: Unit,
    },
    #[error("Expected {expected} reaction fluxes, found {found}")]
    FluxDimension { expected: usize, found: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Expr;
    use crate::model::compartment::CompartmentBuilder;
    use crate::model::formula::Formula;
    use crate::model::reaction::{ReactionBuilder, SpeciesCoefficient};
    use crate::model::species::{SpeciesTypeBuilder, SpeciesTypeKind};
    use approx::assert_relative_eq;

    fn setup_model() -> Model {
        let mut model = Model::new(Some("test".to_string()), None);
        model.parameters.intern("density_c", || {
            Parameter::new("density_c", None, Unit::density()).with_value(1100.)
        });
        model
            .compartments
            .create(
                CompartmentBuilder::default()
                    .id("c".to_string())
                    .init_volume(1e-15)
                    .init_density("density_c".to_string())
                    .volume_function("volume_c".to_string())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        for (id, formula) in [("a", "C2H4O"), ("b", "C2H4O"), ("ab", "C4H8O2")] {
            model
                .species_types
                .create(
                    SpeciesTypeBuilder::default()
                        .id(id.to_string())
                        .kind(SpeciesTypeKind::Metabolite)
                        .empirical_formula(Some(formula.parse::<Formula>().unwrap()))
                        .build()
                        .unwrap(),
                )
                .unwrap();
            model.species.create(Species::new(id, "c")).unwrap();
        }
        model.set_species_mean("a[c]", 100.).unwrap();
        model.set_species_mean("b[c]", 50.).unwrap();
        model.submodels.intern("test", || Submodel::new("test"));
        model
            .reactions
            .create(
                ReactionBuilder::default()
                    .id("bind".to_string())
                    .submodel("test".to_string())
                    .participants(vec![
                        SpeciesCoefficient::new("a[c]", -1),
                        SpeciesCoefficient::new("b[c]", -1),
                        SpeciesCoefficient::new("ab[c]", 1),
                    ])
                    .build()
                    .unwrap(),
            )
            .unwrap();
        model
            .reactions
            .create(
                ReactionBuilder::default()
                    .id("split".to_string())
                    .submodel("test".to_string())
                    .participants(vec![
                        SpeciesCoefficient::new("ab[c]", -1),
                        SpeciesCoefficient::new("a[c]", 2),
                    ])
                    .build()
                    .unwrap(),
            )
            .unwrap();
        model
    }

    #[test]
    fn volume_function_evaluates_to_initial_volume() {
        let mut model = setup_model();
        let namespace = Namespace::new()
            .with(SymbolCategory::Compartment, "c")
            .with(SymbolCategory::Parameter, "density_c");
        let expression =
            Expression::resolve(Expr::symbol("c") / Expr::symbol("density_c"), &namespace)
                .unwrap();
        model
            .create_function(Function::new("volume_c", expression, Unit::liter()))
            .unwrap();
        let namespace = namespace.with(SymbolCategory::Function, "volume_c");
        let volume = Expression::parse("volume_c", &namespace).unwrap();
        assert_relative_eq!(model.evaluate(&volume, None).unwrap(), 1e-15);
    }

    #[test]
    fn function_units_are_checked() {
        let mut model = setup_model();
        let namespace = Namespace::new().with(SymbolCategory::Compartment, "c");
        let expression = Expression::parse("c", &namespace).unwrap();
        let err = model
            .create_function(Function::new("volume_c", expression, Unit::liter()))
            .unwrap_err();
        assert!(matches!(err, ModelError::UnitsDiffer { .. }));
    }

    #[test]
    fn functions_may_only_reference_existing_functions() {
        let mut model = setup_model();
        let namespace = Namespace::new().with(SymbolCategory::Function, "f");
        let expression = Expression::parse("f + 1", &namespace).unwrap();
        let err = model
            .create_function(Function::new("f", expression.clone(), Unit::dimensionless()))
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::Evaluation(EvaluationError::RecursiveFunction("f".to_string()))
        );
        let err = model
            .create_function(Function::new("g", expression, Unit::dimensionless()))
            .unwrap_err();
        assert!(matches!(err, ModelError::Registry(RegistryError::Missing { .. })));
    }

    #[test]
    fn rate_laws_keep_declared_units() {
        let mut model = setup_model();
        model.parameters.intern("k_bind", || {
            Parameter::new("k_bind", None, Unit::per_second() / Unit::molecule()).with_value(1.)
        });
        let expression = Expression::parse("k_bind * a[c] * b[c]", &model.namespace()).unwrap();
        model
            .add_rate_law(RateLaw::new("bind", RateLawDirection::Forward, expression))
            .unwrap();
        assert_eq!(
            model.rate_laws.require("bind-forward").unwrap().units,
            Unit::per_second()
        );

        let expression = Expression::parse("a[c] + k_bind", &model.namespace()).unwrap();
        let err = model
            .add_rate_law(RateLaw::new("split", RateLawDirection::Forward, expression))
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::Evaluation(EvaluationError::UnitMismatch { .. })
        ));
        assert!(!model.rate_laws.contains("split-forward"));
    }

    #[test]
    fn species_overrides() {
        let model = setup_model();
        let namespace = model.namespace();
        let expression = Expression::parse("a[c] + b[c]", &namespace).unwrap();
        assert_relative_eq!(model.evaluate(&expression, None).unwrap(), 150.);
        let mut overrides = IndexMap::new();
        overrides.insert("b[c]".to_string(), 10.);
        assert_relative_eq!(model.evaluate(&expression, Some(&overrides)).unwrap(), 110.);
    }

    #[test]
    fn missing_parameter_value() {
        let mut model = setup_model();
        model
            .parameters
            .intern("k", || Parameter::new("k", None, Unit::per_second()));
        let expression = Expression::parse("k * a[c]", &model.namespace()).unwrap();
        assert!(matches!(
            model.evaluate(&expression, None),
            Err(EvaluationError::MissingValue { .. })
        ));
    }

    #[test]
    fn stoichiometric_matrix() {
        let model = setup_model();
        let matrix = model.stoichiometric_matrix();
        assert_eq!(matrix.nrows(), 3);
        assert_eq!(matrix.ncols(), 2);
        let fluxes = DVector::from_vec(vec![2., 1.]);
        let rates = model.species_net_rates(&fluxes).unwrap();
        // a: -2 + 2, b: -2, ab: 2 - 1
        assert_eq!(rates, DVector::from_vec(vec![0., -2., 1.]));
        assert!(model.species_net_rates(&DVector::zeros(3)).is_err());
    }

    #[test]
    fn element_balance() {
        let model = setup_model();
        assert!(model.element_imbalance("bind").unwrap().unwrap().is_empty());
        // ab -> 2 a is balanced as well since a and b share a formula
        assert!(model.element_imbalance("split").unwrap().unwrap().is_empty());
    }
}
