//! Complexation submodel
//!
//! Complexes assemble from their subunits in every compartment that holds all of them. A
//! complex is turned over by dissociating while one of its protein subunits is degraded, one
//! reaction per subunit.
use indexmap::IndexMap;
use log::debug;

use crate::calibration::Calibrator;
use crate::expression::{Expr, Expression};
use crate::generator::common::{calibrate_michaelis_constants, Citation, KbContext};
use crate::generator::options::{OptionReader, Options};
use crate::generator::{ConfigurationError, GenerationError, SubmodelGenerator};
use crate::kb::{KbSpeciesKind, KnowledgeBase, ZeroCoefficientPolicy};
use crate::model::parameter::ParameterRole;
use crate::model::reaction::{RateLaw, RateLawDirection};
use crate::model::units::Unit;
use crate::model::Model;
use crate::rate_laws::{intern_parameter, k_cat_id, michaelis_menten_like};
use crate::stoichiometry::{association, common_compartments, dissociation};

const ASSOCIATION_COMMENT: &str = "The rate constant for bimolecular protein-protein association \
    was used so that the simulated rate of complex assembly will be within the higher range";

const REF_ASSOCIATION: Citation = Citation {
    id: "ref_protein_association",
    title: "Kinetics of protein-protein association explained by Brownian dynamics computer \
        simulation",
    author: "Scott H Northrup, Harold P Erickson",
    year: 1992,
    publication: "Proceedings of the National Academy of Sciences of the United States of America",
    volume: "89",
    pages: "3338-3342",
};

#[derive(Clone, Debug, PartialEq)]
pub struct ComplexationOptions {
    pub beta: f64,
    pub amino_acid_id_conversion: Option<IndexMap<char, String>>,
    pub zero_coefficient_subunits: ZeroCoefficientPolicy,
}

#[derive(Clone, Debug)]
struct Dissociation {
    subunit: String,
    reaction: String,
    /// Copies of the subunit in the complex
    copies: i64,
}

#[derive(Clone, Debug)]
struct ComplexReactions {
    complex_species: String,
    association: String,
    dissociations: Vec<Dissociation>,
}

#[derive(Clone, Debug, Default)]
pub struct ComplexationState {
    complexes: Vec<ComplexReactions>,
}

/// Generates the complexation submodel
#[derive(Clone, Copy, Debug, Default)]
pub struct ComplexationSubmodelGenerator;

pub fn association_id(complex: &str, compartment: &str) -> String {
    format!("complex_association_{}_{}", complex, compartment)
}

pub fn dissociation_id(complex: &str, compartment: &str, subunit: &str) -> String {
    format!("{}_{}_dissociation_{}_degradation", complex, compartment, subunit)
}

fn parse_policy(reader: &OptionReader) -> Result<ZeroCoefficientPolicy, ConfigurationError> {
    let policy = reader.text("zero_coefficient_subunits", "single_copy")?;
    match policy.as_str() {
        "single_copy" => Ok(ZeroCoefficientPolicy::SingleCopy),
        "catalytic" => Ok(ZeroCoefficientPolicy::Catalytic),
        _ => Err(ConfigurationError::InvalidValue {
            component: ComplexationSubmodelGenerator::NAME,
            option: "zero_coefficient_subunits".to_string(),
            requirement: format!("must be `single_copy` or `catalytic`, found `{}`", policy),
        }),
    }
}

impl SubmodelGenerator for ComplexationSubmodelGenerator {
    const NAME: &'static str = "complexation";
    type Options = ComplexationOptions;
    type State = ComplexationState;

    fn clean_and_validate_options(
        &self,
        options: &Options,
    ) -> Result<ComplexationOptions, ConfigurationError> {
        let reader = OptionReader::new(Self::NAME, options);
        let cleaned = ComplexationOptions {
            beta: reader.number("beta", 1.)?,
            amino_acid_id_conversion: reader.amino_acid_map("amino_acid_id_conversion")?,
            zero_coefficient_subunits: parse_policy(&reader)?,
        };
        reader.check("beta", cleaned.beta > 0., "must be positive")?;
        Ok(cleaned)
    }

    fn gen_reactions(
        &self,
        kb: &KnowledgeBase,
        model: &mut Model,
        options: &ComplexationOptions,
    ) -> Result<ComplexationState, GenerationError> {
        let policy = options.zero_coefficient_subunits;
        let ctx = KbContext::new(kb)
            .with_amino_acids(options.amino_acid_id_conversion.as_ref())
            .with_zero_coefficients(policy);
        let cell = ctx.cell();
        let mut state = ComplexationState::default();

        for complex in cell.complexes() {
            let subunits = cell.subunits(&complex.id)?;
            let assembly = association(&complex.id, subunits, policy);
            for compartment in common_compartments(cell, &complex.id, subunits, policy)? {
                let compartment_name = ctx.compartment_name(compartment)?;
                let assembly_reaction = association_id(&complex.id, compartment);
                ctx.add_reaction(
                    model,
                    Self::NAME,
                    &assembly_reaction,
                    format!("Complexation of {} in {}", complex.id, compartment_name),
                    &assembly,
                    compartment,
                    "",
                )?;

                let mut dissociations = Vec::new();
                for subunit in subunits {
                    let Some(copies) = policy.copies(subunit.coefficient) else {
                        continue;
                    };
                    let subunit_type = cell.species_type(&subunit.species_type)?;
                    if !matches!(subunit_type.kind, KbSpeciesKind::Protein { .. }) {
                        debug!(
                            "Subunit `{}` of `{}` isn't a protein, it isn't degraded",
                            subunit.species_type, complex.id
                        );
                        continue;
                    }
                    let stoichiometry = dissociation(
                        &assembly,
                        &subunit.species_type,
                        &cell.protein_sequence(&subunit.species_type)?,
                        &ctx.config.metabolites,
                        &ctx.amino_acids,
                    )?;
                    let reaction = dissociation_id(&complex.id, compartment, &subunit.species_type);
                    ctx.add_reaction(
                        model,
                        Self::NAME,
                        &reaction,
                        format!(
                            "Dissociation of {} and degradation of {} in {}",
                            complex.id, subunit.species_type, compartment_name
                        ),
                        &stoichiometry,
                        compartment,
                        "",
                    )?;
                    dissociations.push(Dissociation {
                        subunit: subunit.species_type.clone(),
                        reaction,
                        copies,
                    });
                }

                state.complexes.push(ComplexReactions {
                    complex_species: ctx.ensure_species(model, &complex.id, compartment)?,
                    association: assembly_reaction,
                    dissociations,
                });
            }
        }
        debug!("Generated reactions of {} complexes", state.complexes.len());
        Ok(state)
    }

    fn gen_rate_laws(
        &self,
        _kb: &KnowledgeBase,
        model: &mut Model,
        _options: &ComplexationOptions,
        state: &mut ComplexationState,
    ) -> Result<(), GenerationError> {
        for complex in &state.complexes {
            let expression = michaelis_menten_like(model, &complex.association, &[], &[], &[])?;
            model.add_rate_law(RateLaw::new(
                &complex.association,
                RateLawDirection::Forward,
                expression,
            ))?;

            for dissociation in &complex.dissociations {
                let k_cat = k_cat_id(&dissociation.reaction);
                intern_parameter(
                    model,
                    &k_cat,
                    Some(ParameterRole::CatalyticConstant),
                    Unit::per_second(),
                );
                let expression = Expression::resolve(
                    Expr::symbol(&k_cat) * Expr::symbol(&complex.complex_species),
                    &model.namespace(),
                )?;
                model.add_rate_law(RateLaw::new(
                    &dissociation.reaction,
                    RateLawDirection::Forward,
                    expression,
                ))?;
            }
        }
        Ok(())
    }

    fn calibrate_submodel(
        &self,
        kb: &KnowledgeBase,
        model: &mut Model,
        options: &ComplexationOptions,
        state: &ComplexationState,
    ) -> Result<(), GenerationError> {
        let ctx = KbContext::new(kb);
        let mut calibrator = Calibrator::new();
        for complex in &state.complexes {
            calibrate_michaelis_constants(model, &complex.association, options.beta)?;
            // literature value, not a source for imputation
            let reference = REF_ASSOCIATION.intern(model);
            let parameter = model.parameters.require_mut(&k_cat_id(&complex.association))?;
            parameter.value = Some(ctx.config.association_rate_constant);
            parameter.comments = ASSOCIATION_COMMENT.to_string();
            parameter.add_reference(reference);

            for dissociation in &complex.dissociations {
                let k_cat = k_cat_id(&dissociation.reaction);
                match ctx.cell().half_life(&dissociation.subunit)? {
                    Some(half_life) if half_life > 0. => calibrator.set_determined(
                        model,
                        &k_cat,
                        dissociation.copies as f64 / half_life,
                    )?,
                    _ => calibrator.mark_undetermined(model, &k_cat)?,
                }
            }
        }
        let imputed = calibrator.impute(model)?;
        debug!("Imputed {} complexation parameters", imputed);
        Ok(())
    }
}
