//! Degradation submodel
//!
//! Proteins are hydrolyzed into amino acids at the cost of one ATP, and RNAs into nucleoside
//! monophosphates. Each kind is catalyzed by the machinery in an optional knowledge base
//! observable.
use indexmap::IndexMap;
use log::{debug, warn};

use crate::calibration::{average_degradation_rate, Calibrator};
use crate::generator::common::{calibrate_michaelis_constants, KbContext};
use crate::generator::options::{OptionReader, Options};
use crate::generator::{ConfigurationError, GenerationError, SubmodelGenerator};
use crate::kb::{KbError, KbSpeciesType, KnowledgeBase};
use crate::model::reaction::{RateLaw, RateLawDirection};
use crate::model::Model;
use crate::rate_laws::{k_cat_id, michaelis_menten_like, Modifier};
use crate::stoichiometry::{protein_degradation, rna_degradation, Stoichiometry};

#[derive(Clone, Debug, PartialEq)]
pub struct DegradationOptions {
    pub beta: f64,
    pub include_proteins: bool,
    pub include_rnas: bool,
    /// Observable of the proteases
    pub protein_degradation_machinery: Option<String>,
    /// Observable of the ribonucleases
    pub rna_degradation_machinery: Option<String>,
    /// Amino acid species types replacing the configured ones
    pub amino_acid_id_conversion: Option<IndexMap<char, String>>,
}

#[derive(Clone, Debug)]
struct DegradationReaction {
    degraded: String,
    species: String,
    reaction: String,
    machinery: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct DegradationState {
    reactions: Vec<DegradationReaction>,
}

/// Generates the degradation submodel
#[derive(Clone, Copy, Debug, Default)]
pub struct DegradationSubmodelGenerator;

pub fn protein_degradation_id(protein: &str) -> String {
    format!("protein_degradation_{}", protein)
}

pub fn rna_degradation_id(rna: &str) -> String {
    format!("rna_degradation_{}", rna)
}

impl DegradationSubmodelGenerator {
    /// Add the degradation reaction of `degraded`, catalyzed by the species of `machinery`
    ///
    /// Returns `None` when `degraded` isn't located in any compartment.
    fn gen_reaction(
        &self,
        ctx: &KbContext,
        model: &mut Model,
        degraded: &KbSpeciesType,
        reaction: String,
        mut stoichiometry: Stoichiometry,
        machinery: Option<&str>,
    ) -> Result<Option<DegradationReaction>, GenerationError> {
        let cell = ctx.cell();
        let compartment = match cell.primary_compartment(&degraded.id) {
            Ok(compartment) => compartment,
            Err(KbError::NotLocalized(_)) => {
                warn!("`{}` isn't localized, it won't be degraded", degraded.id);
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        if let Some(machinery) = machinery {
            for (species_type, copies) in cell.observable(machinery)?.copy_numbers()? {
                stoichiometry.add_catalyst(species_type, copies);
            }
        }
        ctx.add_reaction(
            model,
            Self::NAME,
            &reaction,
            format!("Degradation of {}", degraded.id),
            &stoichiometry,
            compartment,
            "",
        )?;
        Ok(Some(DegradationReaction {
            degraded: degraded.id.clone(),
            species: ctx.ensure_species(model, &degraded.id, compartment)?,
            reaction,
            machinery: machinery.map(str::to_string),
        }))
    }
}

impl SubmodelGenerator for DegradationSubmodelGenerator {
    const NAME: &'static str = "degradation";
    type Options = DegradationOptions;
    type State = DegradationState;

    fn clean_and_validate_options(
        &self,
        options: &Options,
    ) -> Result<DegradationOptions, ConfigurationError> {
        let reader = OptionReader::new(Self::NAME, options);
        let cleaned = DegradationOptions {
            beta: reader.number("beta", 1.)?,
            include_proteins: reader.bool("include_proteins", true)?,
            include_rnas: reader.bool("include_rnas", true)?,
            protein_degradation_machinery: reader.optional_text("protein_degradation_machinery")?,
            rna_degradation_machinery: reader.optional_text("rna_degradation_machinery")?,
            amino_acid_id_conversion: reader.amino_acid_map("amino_acid_id_conversion")?,
        };
        reader.check("beta", cleaned.beta > 0., "must be positive")?;
        Ok(cleaned)
    }

    fn gen_reactions(
        &self,
        kb: &KnowledgeBase,
        model: &mut Model,
        options: &DegradationOptions,
    ) -> Result<DegradationState, GenerationError> {
        let ctx = KbContext::new(kb).with_amino_acids(options.amino_acid_id_conversion.as_ref());
        let cell = ctx.cell();
        let metabolites = &ctx.config.metabolites;
        let mut state = DegradationState::default();

        if options.include_proteins {
            for protein in cell.proteins() {
                let stoichiometry = protein_degradation(
                    &protein.id,
                    &cell.protein_sequence(&protein.id)?,
                    metabolites,
                    &ctx.amino_acids,
                )?;
                let reaction = self.gen_reaction(
                    &ctx,
                    model,
                    protein,
                    protein_degradation_id(&protein.id),
                    stoichiometry,
                    options.protein_degradation_machinery.as_deref(),
                )?;
                state.reactions.extend(reaction);
            }
        }
        if options.include_rnas {
            for rna in cell.transcripts() {
                let stoichiometry =
                    rna_degradation(&rna.id, &cell.transcript_sequence(&rna.id)?, metabolites)?;
                let reaction = self.gen_reaction(
                    &ctx,
                    model,
                    rna,
                    rna_degradation_id(&rna.id),
                    stoichiometry,
                    options.rna_degradation_machinery.as_deref(),
                )?;
                state.reactions.extend(reaction);
            }
        }
        debug!("Generated {} degradation reactions", state.reactions.len());
        Ok(state)
    }

    fn gen_rate_laws(
        &self,
        kb: &KnowledgeBase,
        model: &mut Model,
        _options: &DegradationOptions,
        state: &mut DegradationState,
    ) -> Result<(), GenerationError> {
        let ctx = KbContext::new(kb);
        let h2o = ctx.config.metabolites.h2o.as_str();
        for degradation in &state.reactions {
            let mut modifiers = Vec::new();
            if let Some(machinery) = &degradation.machinery {
                ctx.ensure_observable(model, machinery)?;
                modifiers.push(Modifier::Observable(machinery.clone()));
            }
            let expression =
                michaelis_menten_like(model, &degradation.reaction, &modifiers, &[], &[h2o])?;
            model.add_rate_law(RateLaw::new(
                &degradation.reaction,
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
        options: &DegradationOptions,
        state: &DegradationState,
    ) -> Result<(), GenerationError> {
        let cell = &kb.cell;
        let mut calibrator = Calibrator::new();
        for degradation in &state.reactions {
            let mean = model.species_mean(&degradation.species).unwrap_or(0.);
            let target = cell
                .half_life(&degradation.degraded)?
                .map(|half_life| average_degradation_rate(mean, half_life));
            calibrate_michaelis_constants(model, &degradation.reaction, options.beta)?;
            calibrator.solve(
                model,
                &degradation.reaction,
                &k_cat_id(&degradation.reaction),
                target,
                None,
            )?;
        }
        let imputed = calibrator.impute(model)?;
        debug!("Imputed {} degradation parameters", imputed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::IMPUTED_COMMENT;
    use crate::generator::{ModelComponentGenerator, OptionValue};
    use crate::kb::fixtures;
    use approx::assert_relative_eq;
    use std::f64::consts::LN_2;

    fn options() -> Options {
        [
            ("protein_degradation_machinery", "degrade_protein"),
            ("rna_degradation_machinery", "degrade_rna"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), OptionValue::from(value)))
        .collect()
    }

    fn generate(options: &Options) -> Model {
        let kb = fixtures::gene_expression_kb();
        let mut model = Model::new_empty();
        DegradationSubmodelGenerator
            .run(&kb, &mut model, options)
            .unwrap();
        model
    }

    #[test]
    fn protein_degradation_participants() {
        let model = generate(&options());
        let reaction = model.reactions.require("protein_degradation_prot1").unwrap();
        let net = reaction.net_coefficients();
        assert_eq!(net.get("prot1[c]"), Some(&-1));
        // two peptide bonds plus ATP hydrolysis
        assert_eq!(net.get("h2o[c]"), Some(&-3));
        assert_eq!(net.get("atp[c]"), Some(&-1));
        assert_eq!(net.get("adp[c]"), Some(&1));
        for amino_acid in ["met[c]", "ala[c]", "cys[c]"] {
            assert_eq!(net.get(amino_acid), Some(&1));
        }
        assert_eq!(reaction.consumed("protease[c]"), 1);
        assert_eq!(reaction.name.as_deref(), Some("Degradation of prot1"));
    }

    #[test]
    fn degradation_is_balanced() {
        let model = generate(&options());
        for reaction in [
            "protein_degradation_prot1",
            "protein_degradation_prot2",
            "rna_degradation_trans1",
        ] {
            let imbalance = model.element_imbalance(reaction).unwrap().unwrap();
            assert!(imbalance.is_empty(), "{} is unbalanced: {:?}", reaction, imbalance);
        }
    }

    #[test]
    fn rna_degradation_participants() {
        let model = generate(&options());
        let reaction = model.reactions.require("rna_degradation_trans1").unwrap();
        let net = reaction.net_coefficients();
        let nmps: i64 = ["amp[c]", "cmp[c]", "gmp[c]", "ump[c]"]
            .iter()
            .map(|nmp| net.get(nmp).copied().unwrap_or(0))
            .sum();
        assert_eq!(nmps, 30);
        assert_eq!(net.get("h2o[c]"), Some(&-29));
        assert_eq!(net.get("h[c]"), Some(&29));
    }

    #[test]
    fn calibrated_degradation() {
        let model = generate(&options());
        assert_eq!(
            model
                .rate_laws
                .require("rna_degradation_trans1-forward")
                .unwrap()
                .expression
                .to_string(),
            "k_cat_rna_degradation_trans1 * degrade_rna * (trans1[c] / (trans1[c] + \
            K_m_rna_degradation_trans1_trans1 * Avogadro * volume_c))"
        );
        let k_cat = model.parameter_value("k_cat_rna_degradation_trans1").unwrap();
        assert_relative_eq!(k_cat, LN_2 / 300. * 10. / 20. * 2., max_relative = 1e-9);
        assert_relative_eq!(
            model.evaluate_rate_law("protein_degradation_prot1", None).unwrap(),
            LN_2 / 36000. * 500.,
            max_relative = 1e-9
        );
        let imputed = model.parameters.require("k_cat_protein_degradation_prot2").unwrap();
        assert!(imputed.imputed);
        assert_eq!(imputed.comments, IMPUTED_COMMENT);
    }

    #[test]
    fn excluded_kinds() {
        let mut options = options();
        options.insert("include_rnas".to_string(), OptionValue::from(false));
        let model = generate(&options);
        assert!(model.reactions.contains("protein_degradation_prot2"));
        assert!(!model.reactions.contains("rna_degradation_trans1"));
        assert!(!model.observables.contains("degrade_rna"));
    }

    #[test]
    fn amino_acid_conversion() {
        let mut kb = fixtures::complexation_kb();
        fixtures::add_metabolites(&mut kb, &["atp", "adp", "pi", "h"]);
        let conversion: OptionValue = fixtures::amino_acid_ids()
            .into_iter()
            .map(|(code, id)| (code.to_string(), OptionValue::Text(id)))
            .collect();
        let options: Options = [
            ("amino_acid_id_conversion".to_string(), conversion),
            ("include_rnas".to_string(), OptionValue::from(false)),
        ]
        .into_iter()
        .collect();
        let generator = DegradationSubmodelGenerator;
        let cleaned = generator.clean_and_validate_options(&options).unwrap();
        let mut model = Model::new_empty();
        model.intern_submodel(DegradationSubmodelGenerator::NAME);
        generator.gen_reactions(&kb, &mut model, &cleaned).unwrap();
        // prot1 is AC, prot3 is DD
        let net = model
            .reactions
            .require("protein_degradation_prot1")
            .unwrap()
            .net_coefficients();
        assert_eq!(net.get("Ala[n]"), Some(&1));
        assert_eq!(net.get("Cys[n]"), Some(&1));
        assert_eq!(net.get("h2o[n]"), Some(&-2));
        let net = model
            .reactions
            .require("protein_degradation_prot3")
            .unwrap()
            .net_coefficients();
        assert_eq!(net.get("Asp[n]"), Some(&2));
    }
}
