//! Generate mechanistic submodels from a knowledge base
//!
//! Each submodel generator runs in four phases. Options are cleaned and validated first,
//! then reactions are generated, then rate laws, and finally the parameters of those rate
//! laws are calibrated. The state produced while generating reactions is passed to the
//! later phases, so they can only run after it.
//!
//! A [`ModelGenerator`] runs a sequence of components on one model, validating the options
//! of every component before generating anything.
use indexmap::IndexMap;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calibration::CalibrationError;
use crate::expression::{EvaluationError, ExpressionError};
use crate::kb::{KbError, KnowledgeBase};
use crate::model::registry::RegistryError;
use crate::model::{Model, ModelError};
use crate::rate_laws::RateLawError;
use crate::stoichiometry::StoichiometryError;

pub(crate) mod common;
pub mod complexation;
pub mod degradation;
pub mod options;
pub mod transcription;
pub mod translation;

pub use complexation::ComplexationSubmodelGenerator;
pub use degradation::DegradationSubmodelGenerator;
pub use options::{ConfigurationError, OptionValue, Options};
pub use transcription::TranscriptionSubmodelGenerator;
pub use translation::TranslationSubmodelGenerator;

/// Generator of one submodel
pub trait SubmodelGenerator {
    /// Name of the component, also the id of the submodel it generates
    const NAME: &'static str;
    /// Cleaned options with defaults filled in
    type Options;
    /// Entities created while generating reactions, needed by the later phases
    type State;

    fn submodel_id(&self) -> &str {
        Self::NAME
    }

    fn clean_and_validate_options(
        &self,
        options: &Options,
    ) -> Result<Self::Options, ConfigurationError>;

    fn gen_reactions(
        &self,
        kb: &KnowledgeBase,
        model: &mut Model,
        options: &Self::Options,
    ) -> Result<Self::State, GenerationError>;

    fn gen_rate_laws(
        &self,
        kb: &KnowledgeBase,
        model: &mut Model,
        options: &Self::Options,
        state: &mut Self::State,
    ) -> Result<(), GenerationError>;

    fn calibrate_submodel(
        &self,
        kb: &KnowledgeBase,
        model: &mut Model,
        options: &Self::Options,
        state: &Self::State,
    ) -> Result<(), GenerationError>;
}

/// Component of a model, run by a [`ModelGenerator`]
pub trait ModelComponentGenerator {
    fn name(&self) -> &str;

    /// Check `options` without touching any model
    fn validate(&self, options: &Options) -> Result<(), ConfigurationError>;

    /// Add the component to `model`
    fn run(
        &self,
        kb: &KnowledgeBase,
        model: &mut Model,
        options: &Options,
    ) -> Result<(), GenerationError>;
}

impl<G: SubmodelGenerator> ModelComponentGenerator for G {
    fn name(&self) -> &str {
        G::NAME
    }

    fn validate(&self, options: &Options) -> Result<(), ConfigurationError> {
        self.clean_and_validate_options(options).map(|_| ())
    }

    fn run(
        &self,
        kb: &KnowledgeBase,
        model: &mut Model,
        options: &Options,
    ) -> Result<(), GenerationError> {
        let options = self.clean_and_validate_options(options)?;
        model.intern_submodel(self.submodel_id());
        info!("Generating reactions of the {} submodel", G::NAME);
        let mut state = self.gen_reactions(kb, model, &options)?;
        info!("Generating rate laws of the {} submodel", G::NAME);
        self.gen_rate_laws(kb, model, &options, &mut state)?;
        info!("Calibrating the {} submodel", G::NAME);
        self.calibrate_submodel(kb, model, &options, &state)
    }
}

/// Options of a whole model generation run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelOptions {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// Options of each component, keyed by component name
    #[serde(default)]
    pub component: IndexMap<String, Options>,
}

/// Generates a model by running its components in order
pub struct ModelGenerator<'a> {
    kb: &'a KnowledgeBase,
    components: Vec<Box<dyn ModelComponentGenerator>>,
    options: ModelOptions,
}

impl<'a> ModelGenerator<'a> {
    pub fn new(
        kb: &'a KnowledgeBase,
        components: Vec<Box<dyn ModelComponentGenerator>>,
        options: ModelOptions,
    ) -> Self {
        ModelGenerator {
            kb,
            components,
            options,
        }
    }

    /// Generator running the transcription, translation, degradation and complexation
    /// submodels, in that order
    pub fn with_default_components(kb: &'a KnowledgeBase, options: ModelOptions) -> Self {
        ModelGenerator::new(
            kb,
            vec![
                Box::new(TranscriptionSubmodelGenerator),
                Box::new(TranslationSubmodelGenerator),
                Box::new(DegradationSubmodelGenerator),
                Box::new(ComplexationSubmodelGenerator),
            ],
            options,
        )
    }

    fn component_options(&self, name: &str) -> Options {
        self.options
            .component
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Generate the model
    ///
    /// The options of every component are validated before any component runs; the first
    /// error aborts the run.
    pub fn run(&self) -> Result<Model, GenerationError> {
        for component in &self.components {
            component.validate(&self.component_options(component.name()))?;
        }
        let mut model = Model::new(self.options.id.clone(), self.options.version.clone());
        for component in &self.components {
            info!("Running component {}", component.name());
            component.run(self.kb, &mut model, &self.component_options(component.name()))?;
        }
        info!(
            "Generated {} reactions over {} species",
            model.reactions.len(),
            model.species.len()
        );
        Ok(model)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Expression(#[from] ExpressionError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Stoichiometry(#[from] StoichiometryError),
    #[error(transparent)]
    Kb(#[from] KbError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    RateLaw(#[from] RateLawError),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::IMPUTED_COMMENT;
    use crate::kb::fixtures;
    use crate::model::parameter::ParameterRole;
    use crate::model::units::Unit;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn gene_expression_options() -> ModelOptions {
        serde_json::from_str(
            r#"{
            "id": "gene_expression",
            "version": "0.1.0",
            "component": {
                "transcription": {"rna_pol_pair": {"trans1": "rnapol", "trans2": "rnapol"}},
                "translation": {
                    "initiation_factors_observable": "initiation_factors",
                    "elongation_factors_observable": "elongation_factors",
                    "release_factors_observable": "release_factors"
                },
                "degradation": {
                    "protein_degradation_machinery": "degrade_protein",
                    "rna_degradation_machinery": "degrade_rna"
                }
            }
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn generate_gene_expression_model() {
        init_logging();
        let kb = fixtures::gene_expression_kb();
        let model = ModelGenerator::with_default_components(&kb, gene_expression_options())
            .run()
            .unwrap();
        assert_eq!(model.id.as_deref(), Some("gene_expression"));
        assert_eq!(
            model.submodels.ids().collect::<Vec<&str>>(),
            vec!["transcription", "translation", "degradation", "complexation"]
        );
        for reaction in [
            "non_specific_binding_rnapol_c",
            "transcription_initiation_trans1",
            "transcription_elongation_trans2",
            "translation_prot1",
            "translation_prot2",
            "protein_degradation_prot1",
            "rna_degradation_trans2",
        ] {
            assert!(model.reactions.contains(reaction), "missing {}", reaction);
        }
        // every rate law can be evaluated once calibrated
        for reaction in model.reactions.iter() {
            let rate = model.evaluate_rate_law(&reaction.id, None).unwrap();
            assert!(rate.is_finite() && rate >= 0., "{} has rate {}", reaction.id, rate);
        }
        for parameter in model.parameters.iter() {
            if parameter.role == Some(ParameterRole::CatalyticConstant) {
                assert!(parameter.value.is_some(), "{} is undetermined", parameter.id);
            }
        }
    }

    #[test]
    fn rate_laws_are_per_second() {
        let kb = fixtures::gene_expression_kb();
        let model = ModelGenerator::with_default_components(&kb, gene_expression_options())
            .run()
            .unwrap();
        assert_eq!(model.rate_laws.len(), model.reactions.len());
        for rate_law in model.rate_laws.iter() {
            assert_eq!(rate_law.units, Unit::per_second(), "{}", rate_law.id);
        }
    }

    #[test]
    fn calibration_is_deterministic() {
        let kb = fixtures::gene_expression_kb();
        let first = ModelGenerator::with_default_components(&kb, gene_expression_options())
            .run()
            .unwrap();
        let second = ModelGenerator::with_default_components(&kb, gene_expression_options())
            .run()
            .unwrap();
        let values = |model: &Model| {
            model
                .parameters
                .iter()
                .map(|p| (p.id.clone(), p.value))
                .collect::<Vec<(String, Option<f64>)>>()
        };
        assert_eq!(values(&first), values(&second));
        // prot2 has no half-life, so its translation rate is imputed
        let k_cat = first.parameters.require("k_cat_translation_prot2").unwrap();
        assert!(k_cat.imputed);
        assert_eq!(k_cat.comments, IMPUTED_COMMENT);
    }

    #[test]
    fn options_are_validated_before_generation() {
        let kb = fixtures::gene_expression_kb();
        let mut options = gene_expression_options();
        options.component.insert(
            "complexation".to_string(),
            [("zero_coefficient_subunits".to_string(), OptionValue::from("twice"))]
                .into_iter()
                .collect(),
        );
        let err = ModelGenerator::with_default_components(&kb, options)
            .run()
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Configuration(ConfigurationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn missing_required_option() {
        let kb = fixtures::gene_expression_kb();
        let generator = ModelGenerator::new(
            &kb,
            vec![Box::new(TranscriptionSubmodelGenerator)],
            ModelOptions::default(),
        );
        assert_eq!(
            generator.run().unwrap_err(),
            GenerationError::Configuration(ConfigurationError::MissingOption {
                component: "transcription",
                option: "rna_pol_pair".to_string(),
            })
        );
    }
}
