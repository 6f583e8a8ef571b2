//! Translation submodel
//!
//! One lumped reaction per protein consumes the charged tRNAs read from its coding sequence
//! and hydrolyzes GTP, catalyzed by the ribosome and the translation factors.
use log::{debug, warn};

use crate::calibration::{average_synthesis_rate, Calibrator};
use crate::generator::common::{calibrate_michaelis_constants, KbContext};
use crate::generator::options::{OptionReader, Options};
use crate::generator::{ConfigurationError, GenerationError, SubmodelGenerator};
use crate::kb::{KbError, KnowledgeBase};
use crate::model::reaction::{RateLaw, RateLawDirection};
use crate::model::Model;
use crate::rate_laws::{k_cat_id, michaelis_menten_like, Modifier};
use crate::stoichiometry::{translation, CodonTable, TranslationMachinery};

#[derive(Clone, Debug, PartialEq)]
pub struct TranslationOptions {
    pub beta: f64,
    pub ribosome_observable: String,
    pub initiation_factors_observable: Option<String>,
    pub elongation_factors_observable: Option<String>,
    pub release_factors_observable: Option<String>,
}

impl TranslationOptions {
    /// Knowledge base observables of the machinery, the ribosome first
    fn machinery_observables(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.ribosome_observable.as_str()).chain(
            [
                &self.initiation_factors_observable,
                &self.elongation_factors_observable,
                &self.release_factors_observable,
            ]
            .into_iter()
            .flatten()
            .map(String::as_str),
        )
    }
}

#[derive(Clone, Debug)]
struct ProteinTranslation {
    protein: String,
    species: String,
    reaction: String,
}

#[derive(Clone, Debug, Default)]
pub struct TranslationState {
    translations: Vec<ProteinTranslation>,
}

/// Generates the translation submodel
#[derive(Clone, Copy, Debug, Default)]
pub struct TranslationSubmodelGenerator;

pub fn translation_id(protein: &str) -> String {
    format!("translation_{}", protein)
}

/// Species types of a knowledge base observable with their integer coefficients
fn observable_participants(
    ctx: &KbContext,
    observable: Option<&str>,
) -> Result<Vec<(String, i64)>, KbError> {
    let Some(observable) = observable else {
        return Ok(Vec::new());
    };
    Ok(ctx
        .cell()
        .observable(observable)?
        .copy_numbers()?
        .into_iter()
        .map(|(species_type, copies)| (species_type.to_string(), copies))
        .collect())
}

impl SubmodelGenerator for TranslationSubmodelGenerator {
    const NAME: &'static str = "translation";
    type Options = TranslationOptions;
    type State = TranslationState;

    fn clean_and_validate_options(
        &self,
        options: &Options,
    ) -> Result<TranslationOptions, ConfigurationError> {
        let reader = OptionReader::new(Self::NAME, options);
        let cleaned = TranslationOptions {
            beta: reader.number("beta", 1.)?,
            ribosome_observable: reader.text("ribosome_observable", "ribosome")?,
            initiation_factors_observable: reader.optional_text("initiation_factors_observable")?,
            elongation_factors_observable: reader.optional_text("elongation_factors_observable")?,
            release_factors_observable: reader.optional_text("release_factors_observable")?,
        };
        reader.check("beta", cleaned.beta > 0., "must be positive")?;
        Ok(cleaned)
    }

    fn gen_reactions(
        &self,
        kb: &KnowledgeBase,
        model: &mut Model,
        options: &TranslationOptions,
    ) -> Result<TranslationState, GenerationError> {
        let ctx = KbContext::new(kb);
        let cell = ctx.cell();
        let codon_table = CodonTable::from_cell(cell);
        let machinery = TranslationMachinery {
            ribosome: observable_participants(&ctx, Some(options.ribosome_observable.as_str()))?,
            initiation_factors: observable_participants(
                &ctx,
                options.initiation_factors_observable.as_deref(),
            )?,
            elongation_factors: observable_participants(
                &ctx,
                options.elongation_factors_observable.as_deref(),
            )?,
            release_factors: observable_participants(
                &ctx,
                options.release_factors_observable.as_deref(),
            )?,
        };

        let mut state = TranslationState::default();
        for protein in cell.proteins() {
            let compartment = match cell.primary_compartment(&protein.id) {
                Ok(compartment) => compartment,
                Err(KbError::NotLocalized(_)) => {
                    warn!("Protein `{}` isn't localized, it won't be translated", protein.id);
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            let stoichiometry = translation(
                &protein.id,
                &cell.coding_sequence(&protein.id)?,
                &codon_table,
                &machinery,
                &ctx.config.metabolites,
            )?;
            let reaction = translation_id(&protein.id);
            ctx.add_reaction(
                model,
                Self::NAME,
                &reaction,
                format!("Translation of {}", protein.id),
                &stoichiometry,
                compartment,
                "",
            )?;
            state.translations.push(ProteinTranslation {
                protein: protein.id.clone(),
                species: ctx.ensure_species(model, &protein.id, compartment)?,
                reaction,
            });
        }
        debug!("Generated {} translation reactions", state.translations.len());
        Ok(state)
    }

    fn gen_rate_laws(
        &self,
        kb: &KnowledgeBase,
        model: &mut Model,
        options: &TranslationOptions,
        state: &mut TranslationState,
    ) -> Result<(), GenerationError> {
        let ctx = KbContext::new(kb);
        let mut modifiers = Vec::new();
        for observable in options.machinery_observables() {
            ctx.ensure_observable(model, observable)?;
            modifiers.push(Modifier::Observable(observable.to_string()));
        }
        let h2o = ctx.config.metabolites.h2o.as_str();
        for translation in &state.translations {
            let expression =
                michaelis_menten_like(model, &translation.reaction, &modifiers, &[], &[h2o])?;
            model.add_rate_law(RateLaw::new(
                &translation.reaction,
                RateLawDirection::Forward,
                expression,
            ))?;
        }
        Ok(())
    }

    fn calibrate_submodel(
        &self,
        kb: &KnowledgeBase,
        model: &mut Model,
        options: &TranslationOptions,
        state: &TranslationState,
    ) -> Result<(), GenerationError> {
        let ctx = KbContext::new(kb);
        let doubling_time = ctx.mean_doubling_time(model)?;
        let mut calibrator = Calibrator::new();
        for translation in &state.translations {
            let mean = model.species_mean(&translation.species).unwrap_or(0.);
            let target = ctx
                .cell()
                .half_life(&translation.protein)?
                .map(|half_life| average_synthesis_rate(mean, half_life, doubling_time));
            calibrate_michaelis_constants(model, &translation.reaction, options.beta)?;
            calibrator.solve(
                model,
                &translation.reaction,
                &k_cat_id(&translation.reaction),
                target,
                None,
            )?;
        }
        let imputed = calibrator.impute(model)?;
        debug!("Imputed {} translation parameters", imputed);
        Ok(())
    }
}
