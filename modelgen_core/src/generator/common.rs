//! Helpers shared by the submodel generators for copying knowledge base entities into the model
use indexmap::IndexMap;

use crate::calibration::michaelis_constant;
use crate::configuration::{self, Configuration};
use crate::expression::{Expr, Expression};
use crate::generator::GenerationError;
use crate::kb::{Cell, KbSpeciesKind, KnowledgeBase, Monomers, ZeroCoefficientPolicy};
use crate::model::compartment::Compartment;
use crate::model::observable::{Function, Observable, ObservableTerm};
use crate::model::parameter::{Parameter, Reference};
use crate::model::reaction::Reaction;
use crate::model::species::{
    DistributionInitConcentration, Species, SpeciesType, SpeciesTypeKind,
};
use crate::model::units::Unit;
use crate::model::Model;
use crate::rate_laws::k_m_id;
use crate::stoichiometry::Stoichiometry;

/// Id of the mean doubling time parameter and cell property
pub const MEAN_DOUBLING_TIME: &str = "mean_doubling_time";

/// Read access to the knowledge base together with the settings a generator runs with
pub(crate) struct KbContext<'a> {
    pub kb: &'a KnowledgeBase,
    pub config: Configuration,
    pub amino_acids: IndexMap<char, String>,
    pub zero_coefficients: ZeroCoefficientPolicy,
}

impl<'a> KbContext<'a> {
    pub fn new(kb: &'a KnowledgeBase) -> Self {
        let config = configuration::current();
        let amino_acids = config.amino_acids.clone();
        KbContext {
            kb,
            config,
            amino_acids,
            zero_coefficients: ZeroCoefficientPolicy::default(),
        }
    }

    /// Use `amino_acids` instead of the configured amino acid ids, if given
    pub fn with_amino_acids(mut self, amino_acids: Option<&IndexMap<char, String>>) -> Self {
        if let Some(amino_acids) = amino_acids {
            self.amino_acids = amino_acids.clone();
        }
        self
    }

    pub fn with_zero_coefficients(mut self, policy: ZeroCoefficientPolicy) -> Self {
        self.zero_coefficients = policy;
        self
    }

    pub fn cell(&self) -> &'a Cell {
        &self.kb.cell
    }

    pub fn monomers(&self) -> Monomers<'_> {
        Monomers {
            metabolites: &self.config.metabolites,
            amino_acids: &self.amino_acids,
            zero_coefficients: self.zero_coefficients,
        }
    }

    // region Entities
    /// Get or create a compartment along with its density parameter and volume function
    pub fn ensure_compartment(&self, model: &mut Model, id: &str) -> Result<(), GenerationError> {
        if model.compartments.contains(id) {
            return Ok(());
        }
        let source = self.cell().compartment(id)?;
        let density_id = Compartment::density_id(id);
        let density = source.density.unwrap_or(self.config.default_density);
        model.parameters.intern(&density_id, || {
            Parameter::new(&density_id, None, Unit::density()).with_value(density)
        });
        let volume_id = Compartment::volume_function_id(id);
        model.compartments.create(Compartment {
            id: id.to_string(),
            name: source.name.clone(),
            init_volume: source.volume,
            init_volume_std: 0.,
            init_density: density_id.clone(),
            volume_function: volume_id.clone(),
        })?;
        model.intern_function(&volume_id, |model| {
            let expression = Expression::resolve(
                Expr::symbol(id) / Expr::symbol(&density_id),
                &model.namespace(),
            )?;
            Ok(Function::new(&volume_id, expression, Unit::liter()))
        })?;
        Ok(())
    }

    /// Get or create a species type described by the knowledge base
    pub fn ensure_species_type(&self, model: &mut Model, id: &str) -> Result<(), GenerationError> {
        if model.species_types.contains(id) {
            return Ok(());
        }
        let cell = self.cell();
        let source = cell.species_type(id)?;
        let (kind, structure) = match &source.kind {
            KbSpeciesKind::Metabolite => (SpeciesTypeKind::Metabolite, None),
            KbSpeciesKind::Dna { sequence, .. } => (SpeciesTypeKind::Dna, Some(sequence.clone())),
            KbSpeciesKind::Transcript { .. } => {
                (SpeciesTypeKind::Rna, Some(cell.transcript_sequence(id)?))
            }
            KbSpeciesKind::AminoacylTrna { .. } => (SpeciesTypeKind::Rna, None),
            KbSpeciesKind::Protein { .. } => {
                (SpeciesTypeKind::Protein, Some(cell.protein_sequence(id)?))
            }
            KbSpeciesKind::Complex { .. } => (SpeciesTypeKind::Complex, None),
        };
        let empirical_formula = cell.empirical_formula(id, &self.monomers())?;
        model.species_types.create(SpeciesType {
            id: id.to_string(),
            name: source.name.clone(),
            kind,
            structure,
            empirical_formula,
            charge: source.charge,
            comments: String::new(),
        })?;
        Ok(())
    }

    /// Get or create the species of `species_type` in `compartment`, returning its id
    ///
    /// A new species takes its initial concentration from the knowledge base, or 0 when the
    /// knowledge base has none. Existing species are left untouched.
    pub fn ensure_species(
        &self,
        model: &mut Model,
        species_type: &str,
        compartment: &str,
    ) -> Result<String, GenerationError> {
        let id = Species::gen_id(species_type, compartment);
        if model.species.contains(&id) {
            return Ok(id);
        }
        self.ensure_compartment(model, compartment)?;
        self.ensure_species_type(model, species_type)?;
        model.species.create(Species::new(species_type, compartment))?;
        let source = self.cell().species(species_type, compartment);
        let mut distribution = DistributionInitConcentration::new(
            &id,
            source.and_then(|s| s.concentration).unwrap_or(0.),
        );
        distribution.std = source.and_then(|s| s.std).unwrap_or(0.);
        model
            .distribution_init_concentrations
            .intern(&distribution.id.clone(), || distribution);
        Ok(id)
    }

    /// Get or create a modelling construct that has no counterpart in the knowledge base
    pub fn ensure_pseudo_species(
        &self,
        model: &mut Model,
        species_type: &str,
        name: &str,
        compartment: &str,
        mean: f64,
        comments: &str,
    ) -> Result<String, GenerationError> {
        self.ensure_compartment(model, compartment)?;
        model.species_types.intern(species_type, || SpeciesType {
            id: species_type.to_string(),
            name: Some(name.to_string()),
            kind: SpeciesTypeKind::PseudoSpecies,
            structure: None,
            empirical_formula: None,
            charge: 0,
            comments: String::new(),
        });
        let id = Species::gen_id(species_type, compartment);
        let (_, created) = model
            .species
            .intern_handle(&id, || Species::new(species_type, compartment));
        if created {
            let mut distribution = DistributionInitConcentration::new(&id, mean);
            distribution.comments = comments.to_string();
            model
                .distribution_init_concentrations
                .intern(&distribution.id.clone(), || distribution);
        }
        Ok(id)
    }

    /// Get or create an observable defined in the knowledge base, with all of its species
    pub fn ensure_observable(&self, model: &mut Model, id: &str) -> Result<(), GenerationError> {
        if model.observables.contains(id) {
            return Ok(());
        }
        let source = self.cell().observable(id)?;
        let mut terms = Vec::with_capacity(source.species.len());
        for term in &source.species {
            let species = self.ensure_species(model, &term.species_type, &term.compartment)?;
            terms.push(ObservableTerm {
                species,
                coefficient: term.coefficient,
            });
        }
        let mut observable = Observable::new(id, terms);
        observable.name = source.name.clone();
        model.observables.create(observable)?;
        Ok(())
    }

    /// Get or create the mean doubling time parameter, returning its value
    pub fn mean_doubling_time(&self, model: &mut Model) -> Result<f64, GenerationError> {
        let value = self.cell().property(MEAN_DOUBLING_TIME)?;
        model
            .parameters
            .intern(MEAN_DOUBLING_TIME, || {
                Parameter::new(MEAN_DOUBLING_TIME, None, Unit::second())
            })
            .value = Some(value);
        Ok(value)
    }
    // endregion Entities

    /// Create a reaction in `submodel` with every participant of `stoichiometry` located in
    /// `compartment`
    ///
    /// Participants that are not in the model yet are created from the knowledge base.
    pub fn add_reaction(
        &self,
        model: &mut Model,
        submodel: &str,
        id: &str,
        name: String,
        stoichiometry: &Stoichiometry,
        compartment: &str,
        comments: &str,
    ) -> Result<(), GenerationError> {
        for (species_type, _) in stoichiometry.net().chain(stoichiometry.catalysts()) {
            self.ensure_species(model, species_type, compartment)?;
        }
        model.reactions.create(Reaction {
            id: id.to_string(),
            name: Some(name),
            submodel: submodel.to_string(),
            participants: stoichiometry.participants(compartment),
            reversible: false,
            comments: comments.to_string(),
        })?;
        Ok(())
    }

    /// Display name of a compartment of the knowledge base
    pub fn compartment_name(&self, id: &str) -> Result<&'a str, GenerationError> {
        let compartment = self.cell().compartment(id)?;
        Ok(compartment.name.as_deref().unwrap_or(&compartment.id))
    }
}

/// Set every Michaelis constant of `reaction` to `beta` times the concentration of its
/// substrate
pub(crate) fn calibrate_michaelis_constants(
    model: &mut Model,
    reaction: &str,
    beta: f64,
) -> Result<(), GenerationError> {
    let reactants: Vec<String> = model
        .reactions
        .require(reaction)?
        .reactants()
        .into_iter()
        .map(str::to_string)
        .collect();
    for species_id in reactants {
        let species = model.species.require(&species_id)?;
        let k_m = k_m_id(reaction, &species.species_type);
        if !model.parameters.contains(&k_m) {
            continue;
        }
        let compartment = model.compartments.require(&species.compartment)?;
        let description = format!(
            "The value was assumed to be {} times the concentration of {} in {}",
            beta,
            species.species_type,
            compartment.display_name()
        );
        let count = model.species_mean(&species_id).unwrap_or(0.);
        let value = michaelis_constant(beta, count, compartment.init_volume);
        let parameter = model.parameters.require_mut(&k_m)?;
        parameter.value = Some(value);
        parameter.comments = description;
    }
    Ok(())
}

/// Literature reference cited by generated parameters
pub(crate) struct Citation {
    pub id: &'static str,
    pub title: &'static str,
    pub author: &'static str,
    pub year: u32,
    pub publication: &'static str,
    pub volume: &'static str,
    pub pages: &'static str,
}

impl Citation {
    /// Get or create the reference, returning its id
    pub fn intern(&self, model: &mut Model) -> &'static str {
        model.references.intern(self.id, || Reference {
            id: self.id.to_string(),
            title: self.title.to_string(),
            author: Some(self.author.to_string()),
            year: Some(self.year),
            publication: Some(self.publication.to_string()),
            volume: Some(self.volume.to_string()),
            pages: Some(self.pages.to_string()),
        });
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::fixtures;
    use approx::assert_relative_eq;

    #[test]
    fn species_are_copied_once() {
        let kb = fixtures::complexation_kb();
        let ctx = KbContext::new(&kb).with_amino_acids(Some(&fixtures::amino_acid_ids()));
        let mut model = Model::new_empty();
        let id = ctx.ensure_species(&mut model, "prot1", "n").unwrap();
        assert_eq!(id, "prot1[n]");
        assert_eq!(model.species_mean("prot1[n]"), Some(10.));
        let species_type = model.species_types.require("prot1").unwrap();
        assert_eq!(species_type.kind, SpeciesTypeKind::Protein);
        assert_eq!(species_type.structure.as_deref(), Some("AC"));

        model.set_species_mean("prot1[n]", 3.).unwrap();
        ctx.ensure_species(&mut model, "prot1", "n").unwrap();
        assert_eq!(model.species_mean("prot1[n]"), Some(3.));
        assert_eq!(model.species.len(), 1);
    }

    #[test]
    fn compartment_volume_function() {
        let kb = fixtures::complexation_kb();
        let ctx = KbContext::new(&kb);
        let mut model = Model::new_empty();
        ctx.ensure_compartment(&mut model, "m").unwrap();
        assert_eq!(
            model.parameters.require("density_m").unwrap().value,
            Some(ctx.config.default_density)
        );
        let volume = model.functions.require("volume_m").unwrap();
        assert_eq!(volume.expression.to_string(), "m / density_m");
        let volume = model.evaluate(&volume.expression, None).unwrap();
        assert_relative_eq!(volume, 2.5e-14, max_relative = 1e-12);
    }

    #[test]
    fn species_without_concentration_start_empty() {
        let kb = fixtures::complexation_kb();
        let ctx = KbContext::new(&kb).with_amino_acids(Some(&fixtures::amino_acid_ids()));
        let mut model = Model::new_empty();
        ctx.ensure_species(&mut model, "complex1", "m").unwrap();
        assert_eq!(model.species_mean("complex1[m]"), Some(0.));
        assert!(ctx.ensure_species(&mut model, "prot9", "n").is_err());
    }

    #[test]
    fn michaelis_constants_follow_concentrations() {
        let kb = fixtures::complexation_kb();
        let ctx = KbContext::new(&kb).with_amino_acids(Some(&fixtures::amino_acid_ids()));
        let mut model = Model::new_empty();
        model.intern_submodel("test");
        let mut stoichiometry = Stoichiometry::new();
        stoichiometry.add("prot1", -1).add("complex1", 1);
        ctx.add_reaction(&mut model, "test", "r", "r".to_string(), &stoichiometry, "n", "")
            .unwrap();
        crate::rate_laws::michaelis_menten_like(&mut model, "r", &[], &[], &[]).unwrap();
        calibrate_michaelis_constants(&mut model, "r", 2.).unwrap();
        let k_m = model.parameters.require("K_m_r_prot1").unwrap();
        assert_eq!(k_m.value, Some(2. * 10. / ctx.config.avogadro / 5e-14));
        assert_eq!(
            k_m.comments,
            "The value was assumed to be 2 times the concentration of prot1 in nucleus"
        );
    }
}
