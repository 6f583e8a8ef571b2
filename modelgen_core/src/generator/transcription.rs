//! Transcription submodel
//!
//! RNA polymerase partitions into three pools: free, bound to non-specific DNA, and bound to
//! a gene. Free polymerase binds non-specific sites, is recruited from there to a promoter
//! with a probability set by the transcription factors regulating the gene, and is released
//! again once it has elongated the transcript.
use indexmap::IndexMap;
use log::{debug, warn};

use crate::calibration::{average_synthesis_rate, michaelis_constant, Calibrator};
use crate::expression::{Expr, Expression};
use crate::generator::common::{calibrate_michaelis_constants, Citation, KbContext};
use crate::generator::options::{OptionReader, Options};
use crate::generator::{ConfigurationError, GenerationError, SubmodelGenerator};
use crate::kb::{KnowledgeBase, RegulatoryDirection};
use crate::model::observable::{Function, Observable};
use crate::model::parameter::{Parameter, ParameterRole};
use crate::model::reaction::{RateLaw, RateLawDirection};
use crate::model::species::{DistributionInitConcentration, Species};
use crate::model::units::Unit;
use crate::model::Model;
use crate::rate_laws::{
    activator_effect_id, dissociation_constant_id, intern_parameter, k_cat_id,
    michaelis_menten_like, regulatory_factor, Modifier, Regulation,
};
use crate::stoichiometry::{transcription_elongation, Stoichiometry};

/// Species type of the non-specific polymerase binding sites of a compartment
pub const NON_SPECIFIC_SITE: &str = "polr_non_specific_binding_site";
/// Dissociation constant of polymerase from a promoter
pub const K_D_SPECIFIC: &str = "K_d_specific_polr";
/// Dissociation constant of polymerase from non-specific DNA
pub const K_D_NON_SPECIFIC: &str = "K_d_non_specific_polr";

const INITIATION_COMMENT: &str = "Set to irreversible to model only the net flux";
const ELONGATION_COMMENT: &str = "Lumped reaction of elongation and termination";

const REF_POLR_WIDTH: Citation = Citation {
    id: "ref_polr_width",
    title: "Structure and mechanism of the RNA Polymerase II transcription machinery",
    author: "Steven Hahn",
    year: 2004,
    publication: "Nature Structural & Molecular Biology",
    volume: "11",
    pages: "394-403",
};

const REF_POLR_DISTRIBUTION: Citation = Citation {
    id: "ref_polr_distribution",
    title: "In vivo dynamics of RNA polymerase II transcription",
    author: "Xavier Darzacq, Yaron Shav-Tal, Valeria de Turris, Yehuda Brody, \
        Shailesh M Shenoy, Robert D Phair, Robert H Singer",
    year: 2007,
    publication: "Nature Structural & Molecular Biology",
    volume: "14",
    pages: "796-806",
};

const REF_BINDING_MODEL: Citation = Citation {
    id: "ref_transcription_binding_model",
    title: "Transcriptional regulation by the numbers: models",
    author: "Lacramioara Bintu, Nicolas E Buchler, Hernan G Garcia, Ulrich Gerland, \
        Terence Hwa, Jane Kondev, Rob Phillips",
    year: 2005,
    publication: "Current Opinion in Genetics and Development",
    volume: "15",
    pages: "116-124",
};

const REF_POLR_K_D: Citation = Citation {
    id: "ref_polr_dissociation_constants",
    title: "Macromolecular crowding as a regulator of gene transcription",
    author: "Hiroaki Matsuda, Gregory Garbes Putzel, Vadim Backman, Igal Szleifer",
    year: 2014,
    publication: "Biophysical Journal",
    volume: "106",
    pages: "1801-1810",
};

#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptionOptions {
    /// Polymerase transcribing each transcript
    pub rna_pol_pair: IndexMap<String, String>,
    pub beta: f64,
    pub beta_activator: f64,
    pub beta_repressor: f64,
    /// Fold change in initiation caused by a fully bound activator
    pub activator_effect: f64,
    /// Length of DNA covered by one bound polymerase (bp)
    pub polr_occupancy_width: f64,
    /// Polymerases which hydrolyze ATP to initiate
    pub atp_dependent_polymerases: Vec<String>,
}

/// Pools of one polymerase in one compartment
#[derive(Clone, Debug)]
struct PolymerasePools {
    polymerase: String,
    compartment: String,
    /// Species ids of the free and non-specifically bound pools
    free: String,
    non_specific_bound: String,
    binding_reaction: String,
    /// Total copy number of the polymerase listed in the knowledge base
    total: f64,
}

#[derive(Clone, Debug)]
struct TranscriptReactions {
    rna: String,
    rna_species: String,
    gene: String,
    /// Index of the polymerase pools transcribing the RNA
    pools: usize,
    binding_site: String,
    gene_bound: String,
    /// Number of polymerases that fit on the gene at once
    queue_length: f64,
    initiation: String,
    elongation: String,
}

#[derive(Clone, Debug, Default)]
pub struct TranscriptionState {
    polymerases: Vec<PolymerasePools>,
    transcripts: Vec<TranscriptReactions>,
}

impl TranscriptionState {
    fn transcripts_of(&self, pools: usize) -> impl Iterator<Item = (usize, &TranscriptReactions)> {
        self.transcripts
            .iter()
            .enumerate()
            .filter(move |(_, t)| t.pools == pools)
    }
}

/// Generates the transcription submodel
#[derive(Clone, Copy, Debug, Default)]
pub struct TranscriptionSubmodelGenerator;

pub fn initiation_id(rna: &str) -> String {
    format!("transcription_initiation_{}", rna)
}

pub fn elongation_id(rna: &str) -> String {
    format!("transcription_elongation_{}", rna)
}

/// Id of the probability that a polymerase is bound to the promoter of `rna`
pub fn p_bound_id(rna: &str) -> String {
    format!("p_bound_{}", rna)
}

/// Id of the observable totalling every pool of a polymerase
pub fn total_polymerase_id(polymerase: &str, compartment: &str) -> String {
    format!("total_{}_{}", polymerase, compartment)
}

pub fn max_non_specific_sites_id(compartment: &str) -> String {
    format!("max_non_specific_sites_{}", compartment)
}

pub fn non_specific_binding_constant_id(polymerase: &str, compartment: &str) -> String {
    format!("k_non_specific_binding_{}_{}", polymerase, compartment)
}

pub fn specific_binding_constant_id(polymerase: &str, compartment: &str) -> String {
    format!("k_specific_binding_{}_{}", polymerase, compartment)
}

fn non_specific_bound_type(polymerase: &str) -> String {
    format!("{}_bound_non_specific_site", polymerase)
}

fn binding_site_type(rna: &str) -> String {
    format!("{}_binding_site", rna)
}

fn gene_bound_type(polymerase: &str, rna: &str) -> String {
    format!("{}_bound_{}", polymerase, rna)
}

/// Fraction as a percentage, rounded to two decimals
fn percent(fraction: f64) -> f64 {
    (fraction * 10000.).round() / 100.
}

impl TranscriptionSubmodelGenerator {
    /// Create the pools of `polymerase` in `compartment` and the reaction binding it to
    /// non-specific sites
    fn gen_binding_reaction(
        &self,
        ctx: &KbContext,
        model: &mut Model,
        options: &TranscriptionOptions,
        polymerase: &str,
        compartment: &str,
    ) -> Result<PolymerasePools, GenerationError> {
        let width = options.polr_occupancy_width;
        let free = ctx.ensure_species(model, polymerase, compartment)?;
        let total = model.species_mean(&free).unwrap_or(0.);

        let genome_length = ctx.cell().genome_length(compartment)? as f64;
        let max_sites = (genome_length / width).floor();
        let width_ref = REF_POLR_WIDTH.intern(model);
        let site = ctx.ensure_pseudo_species(
            model,
            NON_SPECIFIC_SITE,
            "non-specific binding site of RNA polymerases",
            compartment,
            max_sites,
            &format!(
                "Set to genome length divided by {} bp to allow queueing of RNA polymerase \
                during transcription",
                width
            ),
        )?;
        add_distribution_reference(model, &site, width_ref)?;
        let sites_id = max_non_specific_sites_id(compartment);
        model
            .parameters
            .intern(&sites_id, || Parameter::new(&sites_id, None, Unit::molecule()))
            .value = Some(max_sites);

        let fraction = ctx.config.non_specific_bound_polymerase_fraction;
        let bound_type = non_specific_bound_type(polymerase);
        let distribution_ref = REF_POLR_DISTRIBUTION.intern(model);
        let non_specific_bound = ctx.ensure_pseudo_species(
            model,
            &bound_type,
            &format!("{} bound to non-specific sites", polymerase),
            compartment,
            (fraction * total).floor(),
            &format!(
                "Approximately {} percent of RNA polymerase is bound to non-specific site",
                percent(fraction)
            ),
        )?;
        add_distribution_reference(model, &non_specific_bound, distribution_ref)?;

        let binding_reaction = format!("non_specific_binding_{}_{}", polymerase, compartment);
        let mut stoichiometry = Stoichiometry::new();
        stoichiometry
            .add(polymerase, -1)
            .add(NON_SPECIFIC_SITE, -1)
            .add(&bound_type, 1);
        ctx.add_reaction(
            model,
            Self::NAME,
            &binding_reaction,
            format!(
                "Non-specific binding of {} in {}",
                polymerase,
                ctx.compartment_name(compartment)?
            ),
            &stoichiometry,
            compartment,
            "",
        )?;

        Ok(PolymerasePools {
            polymerase: polymerase.to_string(),
            compartment: compartment.to_string(),
            free,
            non_specific_bound,
            binding_reaction,
            total,
        })
    }
}

fn add_distribution_reference(
    model: &mut Model,
    species: &str,
    reference: &str,
) -> Result<(), GenerationError> {
    let distribution = model
        .distribution_init_concentrations
        .require_mut(&DistributionInitConcentration::gen_id(species))?;
    if !distribution.references.iter().any(|r| r == reference) {
        distribution.references.push(reference.to_string());
    }
    Ok(())
}

impl SubmodelGenerator for TranscriptionSubmodelGenerator {
    const NAME: &'static str = "transcription";
    type Options = TranscriptionOptions;
    type State = TranscriptionState;

    fn clean_and_validate_options(
        &self,
        options: &Options,
    ) -> Result<TranscriptionOptions, ConfigurationError> {
        let reader = OptionReader::new(Self::NAME, options);
        let cleaned = TranscriptionOptions {
            rna_pol_pair: reader.text_map("rna_pol_pair")?,
            beta: reader.number("beta", 1.)?,
            beta_activator: reader.number("beta_activator", 1.)?,
            beta_repressor: reader.number("beta_repressor", 1.)?,
            activator_effect: reader.number("activator_effect", 1.2)?,
            polr_occupancy_width: reader.number("polr_occupancy_width", 80.)?,
            atp_dependent_polymerases: reader.text_list("atp_dependent_polymerases")?,
        };
        for (key, value) in [
            ("beta", cleaned.beta),
            ("beta_activator", cleaned.beta_activator),
            ("beta_repressor", cleaned.beta_repressor),
            ("polr_occupancy_width", cleaned.polr_occupancy_width),
        ] {
            reader.check(key, value > 0., "must be positive")?;
        }
        reader.check(
            "activator_effect",
            cleaned.activator_effect >= 1.,
            "must be at least 1",
        )?;
        Ok(cleaned)
    }

    fn gen_reactions(
        &self,
        kb: &KnowledgeBase,
        model: &mut Model,
        options: &TranscriptionOptions,
    ) -> Result<TranscriptionState, GenerationError> {
        let ctx = KbContext::new(kb);
        let cell = ctx.cell();
        let metabolites = ctx.config.metabolites.clone();
        let width = options.polr_occupancy_width;
        let mut state = TranscriptionState::default();

        for transcript in cell.transcripts() {
            let rna = transcript.id.as_str();
            let polymerase = options.rna_pol_pair.get(rna).ok_or_else(|| {
                ConfigurationError::InvalidValue {
                    component: Self::NAME,
                    option: "rna_pol_pair".to_string(),
                    requirement: format!("no RNA polymerase is paired with `{}`", rna),
                }
            })?;
            let gene = cell.transcript_gene(rna)?;
            let compartment = cell.primary_compartment(&gene.polymer)?;
            let pools = match state
                .polymerases
                .iter()
                .position(|p| &p.polymerase == polymerase && p.compartment == compartment)
            {
                Some(index) => index,
                None => {
                    let pools =
                        self.gen_binding_reaction(&ctx, model, options, polymerase, compartment)?;
                    state.polymerases.push(pools);
                    state.polymerases.len() - 1
                }
            };
            let gene_name = gene.name.as_deref().unwrap_or(&gene.id);

            let queue_length = (gene.locus().len() as f64 / width).floor() + 1.;
            let site_type = binding_site_type(rna);
            let binding_site = ctx.ensure_pseudo_species(
                model,
                &site_type,
                &format!("binding site of {}", gene_name),
                compartment,
                queue_length,
                &format!(
                    "Set to gene length divided by {} bp to allow queueing of RNA polymerase \
                    during transcription",
                    width
                ),
            )?;
            let bound_type = gene_bound_type(polymerase, rna);
            let gene_bound = ctx.ensure_pseudo_species(
                model,
                &bound_type,
                &format!("{} bound to {}", polymerase, gene_name),
                compartment,
                0.,
                "",
            )?;

            let initiation = initiation_id(rna);
            let mut stoichiometry = Stoichiometry::new();
            stoichiometry
                .add(&non_specific_bound_type(polymerase), -1)
                .add(&site_type, -1)
                .add(&bound_type, 1)
                .add(NON_SPECIFIC_SITE, 1);
            if options.atp_dependent_polymerases.contains(polymerase) {
                stoichiometry
                    .add(&metabolites.atp, -2)
                    .add(&metabolites.h2o, -2)
                    .add(&metabolites.adp, 2)
                    .add(&metabolites.pi, 2)
                    .add(&metabolites.h, 2);
            }
            ctx.add_reaction(
                model,
                Self::NAME,
                &initiation,
                format!("Transcription initiation of {}", rna),
                &stoichiometry,
                compartment,
                INITIATION_COMMENT,
            )?;

            let elongation = elongation_id(rna);
            let sequence = cell.transcript_sequence(rna)?;
            let mut stoichiometry = transcription_elongation(rna, &sequence, &metabolites)?;
            stoichiometry
                .add(&bound_type, -1)
                .add(polymerase, 1)
                .add(&site_type, 1);
            ctx.add_reaction(
                model,
                Self::NAME,
                &elongation,
                format!("Transcription elongation of {}", rna),
                &stoichiometry,
                compartment,
                ELONGATION_COMMENT,
            )?;

            state.transcripts.push(TranscriptReactions {
                rna: rna.to_string(),
                rna_species: Species::gen_id(rna, compartment),
                gene: gene.id.clone(),
                pools,
                binding_site,
                gene_bound,
                queue_length,
                initiation,
                elongation,
            });
        }
        debug!(
            "Generated transcription of {} RNAs by {} polymerase pools",
            state.transcripts.len(),
            state.polymerases.len()
        );
        Ok(state)
    }

    fn gen_rate_laws(
        &self,
        kb: &KnowledgeBase,
        model: &mut Model,
        _options: &TranscriptionOptions,
        state: &mut TranscriptionState,
    ) -> Result<(), GenerationError> {
        let ctx = KbContext::new(kb);
        let cell = ctx.cell();
        let h2o = ctx.config.metabolites.h2o.clone();

        let k_d_ref = REF_POLR_K_D.intern(model);
        for (id, value) in [
            (K_D_SPECIFIC, ctx.config.k_d_specific_polr),
            (K_D_NON_SPECIFIC, ctx.config.k_d_non_specific_polr),
        ] {
            let parameter = model.parameters.intern(id, || {
                Parameter::new(id, Some(ParameterRole::DissociationConstant), Unit::molar())
            });
            parameter.value = Some(value);
            parameter.comments = "Value taken from the estimation used in the reference".to_string();
            parameter.add_reference(k_d_ref);
        }
        let model_ref = REF_BINDING_MODEL.intern(model);

        for (index, pools) in state.polymerases.iter().enumerate() {
            let k_binding = non_specific_binding_constant_id(&pools.polymerase, &pools.compartment);
            intern_parameter(
                model,
                &k_binding,
                Some(ParameterRole::RateConstant),
                Unit::per_second(),
            );
            let expression = Expression::resolve(
                Expr::symbol(&k_binding) * Expr::symbol(&pools.free),
                &model.namespace(),
            )?;
            model.add_rate_law(RateLaw::new(
                &pools.binding_reaction,
                RateLawDirection::Forward,
                expression,
            ))?;

            let total = total_polymerase_id(&pools.polymerase, &pools.compartment);
            let mut species = vec![pools.free.as_str(), pools.non_specific_bound.as_str()];
            species.extend(state.transcripts_of(index).map(|(_, t)| t.gene_bound.as_str()));
            model
                .observables
                .intern(&total, || Observable::sum_of(&total, species));
            intern_parameter(
                model,
                &specific_binding_constant_id(&pools.polymerase, &pools.compartment),
                Some(ParameterRole::RateConstant),
                Unit::per_second() / Unit::molecule(),
            );
        }

        let one = || Expr::number(1.);
        for transcript in &state.transcripts {
            let pools = &state.polymerases[transcript.pools];
            let mut occupied = Expr::symbol(&total_polymerase_id(
                &pools.polymerase,
                &pools.compartment,
            ));
            for regulation in cell.transcription_factors(&transcript.gene)? {
                let factor = ctx.ensure_species(
                    model,
                    &regulation.transcription_factor,
                    &pools.compartment,
                )?;
                let direction = match regulation.direction {
                    RegulatoryDirection::Activation => Regulation::Activation,
                    RegulatoryDirection::Repression => Regulation::Repression,
                };
                occupied =
                    occupied * regulatory_factor(model, &transcript.initiation, &factor, direction)?;
            }

            let p_bound = p_bound_id(&transcript.rna);
            let affinity = Expr::exp(Expr::log(
                Expr::symbol(K_D_SPECIFIC) / Expr::symbol(K_D_NON_SPECIFIC),
            ));
            let expr = one()
                / Expr::group(
                    one() + Expr::symbol(&max_non_specific_sites_id(&pools.compartment))
                        / Expr::group(occupied)
                        * affinity,
                );
            model.intern_function(&p_bound, |model| {
                let expression = Expression::resolve(expr, &model.namespace())?;
                let mut function = Function::new(&p_bound, expression, Unit::dimensionless());
                function.name = Some(format!(
                    "probability of RNA polymerase binding to {}",
                    transcript.gene
                ));
                function.references.push(model_ref.to_string());
                Ok(function)
            })?;

            let expression = Expression::resolve(
                Expr::product([
                    Expr::symbol(&p_bound),
                    Expr::symbol(&specific_binding_constant_id(
                        &pools.polymerase,
                        &pools.compartment,
                    )),
                    Expr::symbol(&pools.non_specific_bound),
                    Expr::max(vec![
                        Expr::min(vec![Expr::symbol(&transcript.binding_site), one()]),
                        Expr::number(0.),
                    ]),
                ]),
                &model.namespace(),
            )?;
            model.add_rate_law(RateLaw::new(
                &transcript.initiation,
                RateLawDirection::Forward,
                expression,
            ))?;

            let expression = michaelis_menten_like(
                model,
                &transcript.elongation,
                &[Modifier::Species(transcript.gene_bound.clone())],
                &[],
                &[h2o.as_str()],
            )?;
            model.add_rate_law(RateLaw::new(
                &transcript.elongation,
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
        options: &TranscriptionOptions,
        state: &TranscriptionState,
    ) -> Result<(), GenerationError> {
        let ctx = KbContext::new(kb);
        let cell = ctx.cell();
        let doubling_time = ctx.mean_doubling_time(model)?;

        let mut rates = Vec::with_capacity(state.transcripts.len());
        for transcript in &state.transcripts {
            let mean = model.species_mean(&transcript.rna_species).unwrap_or(0.);
            rates.push(
                cell.half_life(&transcript.rna)?
                    .map(|half_life| average_synthesis_rate(mean, half_life, doubling_time)),
            );
        }

        // transcription factor affinities, assumed proportional to their concentration
        for transcript in &state.transcripts {
            let compartment = &state.polymerases[transcript.pools].compartment;
            let (compartment_name, volume) = {
                let record = model.compartments.require(compartment)?;
                (record.display_name().to_string(), record.init_volume)
            };
            for regulation in cell.transcription_factors(&transcript.gene)? {
                let factor = &regulation.transcription_factor;
                let count = model
                    .species_mean(&Species::gen_id(factor, compartment))
                    .unwrap_or(0.);
                let (regulation, beta) = match regulation.direction {
                    RegulatoryDirection::Activation => {
                        (Regulation::Activation, options.beta_activator)
                    }
                    RegulatoryDirection::Repression => {
                        (Regulation::Repression, options.beta_repressor)
                    }
                };
                let id = dissociation_constant_id(&transcript.initiation, factor, regulation);
                let parameter = model.parameters.require_mut(&id)?;
                parameter.value = Some(michaelis_constant(beta, count, volume));
                parameter.comments = format!(
                    "The value was assumed to be {} times the concentration of {} in {}",
                    beta, factor, compartment_name
                );
                if regulation == Regulation::Activation {
                    let effect = activator_effect_id(&transcript.initiation, factor);
                    model.set_parameter_value(&effect, options.activator_effect)?;
                }
            }
        }

        // binding probabilities with the polymerase spread evenly over its pools
        let mut p_bounds = Vec::with_capacity(state.transcripts.len());
        for transcript in &state.transcripts {
            let pools = &state.polymerases[transcript.pools];
            let observable = model
                .observables
                .require(&total_polymerase_id(&pools.polymerase, &pools.compartment))?;
            let share = pools.total / observable.terms.len() as f64;
            let overrides: IndexMap<String, f64> = observable
                .species()
                .map(|species| (species.to_string(), share))
                .collect();
            let function = model.functions.require(&p_bound_id(&transcript.rna))?;
            p_bounds.push(model.evaluate(&function.expression, Some(&overrides))?);
        }

        let mut calibrator = Calibrator::new();
        for (index, pools) in state.polymerases.iter().enumerate() {
            let rate_total: f64 = state
                .transcripts_of(index)
                .filter_map(|(i, _)| rates[i])
                .sum();
            let p_bound_total: f64 = state.transcripts_of(index).map(|(i, _)| p_bounds[i]).sum();

            let fraction = ctx.config.free_polymerase_fraction;
            let free = (fraction * pools.total).floor();
            model.set_species_mean(&pools.free, free)?;
            model
                .distribution_init_concentrations
                .require_mut(&DistributionInitConcentration::gen_id(&pools.free))?
                .comments = format!(
                "The free pool is estimated to be {} percent of the total concentration",
                percent(fraction)
            );
            let non_specific_bound = model.species_mean(&pools.non_specific_bound).unwrap_or(0.);
            let gene_bound_total = pools.total - free - non_specific_bound;

            for (id, value) in [
                (
                    non_specific_binding_constant_id(&pools.polymerase, &pools.compartment),
                    rate_total / free,
                ),
                (
                    specific_binding_constant_id(&pools.polymerase, &pools.compartment),
                    rate_total / (non_specific_bound * p_bound_total),
                ),
            ] {
                if value.is_finite() {
                    model.set_parameter_value(&id, value)?;
                } else {
                    warn!("`{}` of {} can't be determined", id, pools.polymerase);
                }
            }

            for (i, transcript) in state.transcripts_of(index) {
                let share = (p_bounds[i] / p_bound_total * gene_bound_total).round();
                let gene_bound = if share.is_finite() {
                    transcript.queue_length.min(share.max(0.))
                } else {
                    0.
                };
                model.set_species_mean(&transcript.gene_bound, gene_bound)?;
                calibrate_michaelis_constants(model, &transcript.elongation, options.beta)?;
                let target = if gene_bound > 0. { rates[i] } else { None };
                calibrator.solve(
                    model,
                    &transcript.elongation,
                    &k_cat_id(&transcript.elongation),
                    target,
                    None,
                )?;
            }
        }
        let imputed = calibrator.impute(model)?;
        debug!("Imputed {} transcription parameters", imputed);
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

    fn options(atp_dependent: bool) -> Options {
        let mut options: Options = [(
            "rna_pol_pair".to_string(),
            [("trans1", "rnapol"), ("trans2", "rnapol")]
                .into_iter()
                .collect::<OptionValue>(),
        )]
        .into_iter()
        .collect();
        if atp_dependent {
            options.insert(
                "atp_dependent_polymerases".to_string(),
                OptionValue::from(vec!["rnapol"]),
            );
        }
        options
    }

    fn generate(atp_dependent: bool) -> Model {
        let kb = fixtures::gene_expression_kb();
        let mut model = Model::new_empty();
        TranscriptionSubmodelGenerator
            .run(&kb, &mut model, &options(atp_dependent))
            .unwrap();
        model
    }

    #[test]
    fn validate_options() {
        let generator = TranscriptionSubmodelGenerator;
        let cleaned = generator.clean_and_validate_options(&options(false)).unwrap();
        assert_eq!(cleaned.activator_effect, 1.2);
        assert_eq!(cleaned.polr_occupancy_width, 80.);
        assert_eq!(cleaned.rna_pol_pair.get("trans2").map(String::as_str), Some("rnapol"));

        let mut invalid = options(false);
        invalid.insert("activator_effect".to_string(), OptionValue::Number(0.5));
        assert!(matches!(
            generator.clean_and_validate_options(&invalid),
            Err(ConfigurationError::InvalidValue { .. })
        ));
        let mut invalid = options(false);
        invalid.insert("polr_occupancy_width".to_string(), OptionValue::Number(0.));
        assert!(generator.clean_and_validate_options(&invalid).is_err());
    }

    #[test]
    fn transcripts_need_a_polymerase() {
        let kb = fixtures::gene_expression_kb();
        let mut options = options(false);
        options.insert(
            "rna_pol_pair".to_string(),
            [("trans1", "rnapol")].into_iter().collect::<OptionValue>(),
        );
        let err = TranscriptionSubmodelGenerator
            .run(&kb, &mut Model::new_empty(), &options)
            .unwrap_err();
        assert!(matches!(err, GenerationError::Configuration(_)));
    }

    #[test]
    fn polymerase_pools() {
        let model = generate(false);
        // 160 bp genome with an 80 bp footprint
        assert_eq!(model.species_mean("polr_non_specific_binding_site[c]"), Some(2.));
        assert_eq!(model.parameter_value("max_non_specific_sites_c").unwrap(), 2.);
        assert_eq!(model.species_mean("rnapol_bound_non_specific_site[c]"), Some(24.));
        assert_eq!(model.species_mean("rnapol[c]"), Some(75.));
        assert_eq!(model.species_mean("trans1_binding_site[c]"), Some(1.));
        assert_eq!(
            model
                .distribution_init_concentrations
                .require("dist-init-conc-rnapol_bound_non_specific_site[c]")
                .unwrap()
                .comments,
            "Approximately 24.75 percent of RNA polymerase is bound to non-specific site"
        );
        let total = model.observables.require("total_rnapol_c").unwrap();
        assert_eq!(
            total.species().collect::<Vec<&str>>(),
            vec![
                "rnapol[c]",
                "rnapol_bound_non_specific_site[c]",
                "rnapol_bound_trans1[c]",
                "rnapol_bound_trans2[c]"
            ]
        );
    }

    #[test]
    fn reaction_participants() {
        let model = generate(false);
        let binding = model.reactions.require("non_specific_binding_rnapol_c").unwrap();
        assert_eq!(
            binding.net_coefficients().into_iter().collect::<Vec<(&str, i64)>>(),
            vec![
                ("rnapol[c]", -1),
                ("polr_non_specific_binding_site[c]", -1),
                ("rnapol_bound_non_specific_site[c]", 1)
            ]
        );
        let initiation = model.reactions.require("transcription_initiation_trans1").unwrap();
        assert_eq!(initiation.comments, INITIATION_COMMENT);
        assert_eq!(initiation.consumed("rnapol_bound_non_specific_site[c]"), 1);
        assert_eq!(initiation.consumed("trans1_binding_site[c]"), 1);
        assert_eq!(initiation.consumed("atp[c]"), 0);

        let elongation = model.reactions.require("transcription_elongation_trans1").unwrap();
        let net = elongation.net_coefficients();
        let ntp: i64 = ["atp[c]", "ctp[c]", "gtp[c]", "utp[c]"]
            .iter()
            .map(|s| net.get(s).copied().unwrap_or(0))
            .sum();
        assert_eq!(ntp, -30);
        assert_eq!(net.get("ppi[c]"), Some(&30));
        assert_eq!(net.get("h2o[c]"), Some(&-29));
        assert_eq!(net.get("h[c]"), Some(&29));
        assert_eq!(net.get("rnapol[c]"), Some(&1));
        assert_eq!(net.get("trans1[c]"), Some(&1));
        assert_eq!(net.get("rnapol_bound_trans1[c]"), Some(&-1));
    }

    #[test]
    fn atp_dependent_initiation() {
        let model = generate(true);
        let initiation = model.reactions.require("transcription_initiation_trans2").unwrap();
        let net = initiation.net_coefficients();
        assert_eq!(net.get("atp[c]"), Some(&-2));
        assert_eq!(net.get("h2o[c]"), Some(&-2));
        assert_eq!(net.get("adp[c]"), Some(&2));
        assert_eq!(net.get("pi[c]"), Some(&2));
        assert_eq!(net.get("h[c]"), Some(&2));
    }

    #[test]
    fn binding_probability() {
        let model = generate(false);
        let p_bound = model.functions.require("p_bound_trans1").unwrap();
        let text = p_bound.expression.to_string();
        assert!(text.starts_with("1 / (1 + max_non_specific_sites_c / (total_rnapol_c * "));
        assert!(text.contains("occupancy_transcription_initiation_trans1_tf_act"));
        assert!(text.ends_with("* exp(log(K_d_specific_polr / K_d_non_specific_polr)))"));
        assert_eq!(
            model
                .rate_laws
                .require("transcription_initiation_trans1-forward")
                .unwrap()
                .expression
                .to_string(),
            "p_bound_trans1 * k_specific_binding_rnapol_c * rnapol_bound_non_specific_site[c] \
            * max(min(trans1_binding_site[c], 1), 0)"
        );
        assert_eq!(
            model
                .rate_laws
                .require("non_specific_binding_rnapol_c-forward")
                .unwrap()
                .expression
                .to_string(),
            "k_non_specific_binding_rnapol_c * rnapol[c]"
        );
        let value = model.evaluate(&p_bound.expression, None).unwrap();
        assert!(value > 0.99 && value <= 1.);
    }

    #[test]
    fn regulation_constants() {
        let model = generate(false);
        let avogadro = crate::configuration::current().avogadro;
        let ka = model
            .parameters
            .require("Ka_transcription_initiation_trans1_tf_act")
            .unwrap();
        assert_eq!(ka.value, Some(1. * 5. / avogadro / 1e-15));
        assert_eq!(
            ka.comments,
            "The value was assumed to be 1 times the concentration of tf_act in cytosol"
        );
        assert_eq!(
            model
                .parameter_value("f_transcription_initiation_trans1_tf_act")
                .unwrap(),
            1.2
        );
        assert_eq!(
            model
                .parameter_value("Kr_transcription_initiation_trans2_tf_rep")
                .unwrap(),
            1. * 3. / avogadro / 1e-15
        );
    }

    #[test]
    fn calibrated_rates() {
        let model = generate(false);
        let rate1 = LN_2 * (1. / 28800. + 1. / 300.) * 10.;
        let rate2 = LN_2 * (1. / 28800. + 1. / 600.) * 5.;
        assert_relative_eq!(
            model.parameter_value("k_non_specific_binding_rnapol_c").unwrap(),
            (rate1 + rate2) / 75.,
            max_relative = 1e-12
        );
        // one polymerase is gene bound, it goes to the activated gene
        assert_eq!(model.species_mean("rnapol_bound_trans1[c]"), Some(1.));
        assert_eq!(model.species_mean("rnapol_bound_trans2[c]"), Some(0.));

        // each of the four NTPs is half saturated
        let k_cat = model.parameters.require("k_cat_transcription_elongation_trans1").unwrap();
        assert_relative_eq!(k_cat.value.unwrap(), rate1 * 16., max_relative = 1e-9);
        assert!(!k_cat.imputed);
        assert_relative_eq!(
            model.evaluate_rate_law("transcription_elongation_trans1", None).unwrap(),
            rate1,
            max_relative = 1e-9
        );
        let imputed = model.parameters.require("k_cat_transcription_elongation_trans2").unwrap();
        assert!(imputed.imputed);
        assert_eq!(imputed.comments, IMPUTED_COMMENT);
        assert_eq!(imputed.value, k_cat.value);
    }

    #[test]
    fn overlapping_transcripts_of_one_gene() {
        let mut kb = fixtures::complexation_kb();
        fixtures::add_metabolites(&mut kb, &["rnapol", "atp", "ctp", "gtp", "utp", "ppi", "h"]);
        let options: Options = [(
            "rna_pol_pair".to_string(),
            [("trans1", "rnapol"), ("trans2", "rnapol"), ("trans3", "rnapol")]
                .into_iter()
                .collect::<OptionValue>(),
        )]
        .into_iter()
        .collect();
        let generator = TranscriptionSubmodelGenerator;
        let options = generator.clean_and_validate_options(&options).unwrap();
        let mut model = Model::new_empty();
        model.intern_submodel(TranscriptionSubmodelGenerator::NAME);
        generator.gen_reactions(&kb, &mut model, &options).unwrap();

        for rna in ["trans1", "trans2", "trans3"] {
            let elongation = model.reactions.require(&elongation_id(rna)).unwrap();
            let consumed: i64 = ["atp[n]", "ctp[n]", "gtp[n]", "utp[n]"]
                .iter()
                .map(|ntp| elongation.consumed(ntp))
                .sum();
            assert_eq!(consumed, 6, "{}", rna);
            assert_eq!(elongation.net_coefficients().get(format!("{}[n]", rna).as_str()), Some(&1));
        }
        // a 12 bp genome holds no full polymerase footprint
        assert_eq!(model.species_mean("polr_non_specific_binding_site[n]"), Some(0.));
    }
}
