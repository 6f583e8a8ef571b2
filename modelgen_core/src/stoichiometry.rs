//! Derive reaction participants from sequences and complex compositions
//!
//! Stoichiometries are expressed over species type ids; the generators place every
//! participant in the compartment the reaction takes place in.
use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

use crate::configuration::MetaboliteIds;
use crate::kb::sequence;
use crate::kb::{Cell, KbError, KbSpeciesKind, Subunit, ZeroCoefficientPolicy};
use crate::model::reaction::SpeciesCoefficient;
use crate::model::species::Species;

/// Net coefficients of a reaction plus the catalysts which take part without being consumed
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stoichiometry {
    net: IndexMap<String, i64>,
    catalysts: IndexMap<String, i64>,
}

impl Stoichiometry {
    pub fn new() -> Self {
        Stoichiometry::default()
    }

    /// Add `coefficient` to the net coefficient of `species_type`
    pub fn add(&mut self, species_type: &str, coefficient: i64) -> &mut Self {
        *self.net.entry(species_type.to_string()).or_insert(0) += coefficient;
        self
    }

    /// Add a catalyst, listed `coefficient` times on both sides of the reaction
    pub fn add_catalyst(&mut self, species_type: &str, coefficient: i64) -> &mut Self {
        *self.catalysts.entry(species_type.to_string()).or_insert(0) += coefficient;
        self
    }

    pub fn coefficient(&self, species_type: &str) -> i64 {
        self.net.get(species_type).copied().unwrap_or(0)
    }

    pub fn catalyst(&self, species_type: &str) -> i64 {
        self.catalysts.get(species_type).copied().unwrap_or(0)
    }

    /// Nonzero net coefficients in insertion order
    pub fn net(&self) -> impl Iterator<Item = (&str, i64)> {
        self.net
            .iter()
            .filter(|(_, c)| **c != 0)
            .map(|(s, c)| (s.as_str(), *c))
    }

    pub fn catalysts(&self) -> impl Iterator<Item = (&str, i64)> {
        self.catalysts
            .iter()
            .filter(|(_, c)| **c != 0)
            .map(|(s, c)| (s.as_str(), *c))
    }

    /// Species types consumed, catalysts included
    pub fn reactants(&self) -> Vec<&str> {
        let mut reactants: IndexSet<&str> =
            self.net().filter(|(_, c)| *c < 0).map(|(s, _)| s).collect();
        reactants.extend(self.catalysts().map(|(s, _)| s));
        reactants.into_iter().collect()
    }

    /// The reverse reaction, catalysts unchanged
    pub fn inverse(&self) -> Stoichiometry {
        Stoichiometry {
            net: self.net.iter().map(|(s, c)| (s.clone(), -c)).collect(),
            catalysts: self.catalysts.clone(),
        }
    }

    /// Combine the participants of `other` into this stoichiometry
    pub fn merge(&mut self, other: &Stoichiometry) -> &mut Self {
        for (species_type, coefficient) in &other.net {
            self.add(species_type, *coefficient);
        }
        for (species_type, coefficient) in &other.catalysts {
            self.add_catalyst(species_type, *coefficient);
        }
        self
    }

    /// Participants located in `compartment`
    ///
    /// Reactants come first, then products; every catalyst appears once on each side.
    pub fn participants(&self, compartment: &str) -> Vec<SpeciesCoefficient> {
        let species = |st: &str| Species::gen_id(st, compartment);
        let mut participants = Vec::new();
        for (st, c) in self.net().filter(|(_, c)| *c < 0) {
            participants.push(SpeciesCoefficient::new(&species(st), c));
        }
        for (st, c) in self.catalysts() {
            participants.push(SpeciesCoefficient::new(&species(st), -c));
        }
        for (st, c) in self.net().filter(|(_, c)| *c > 0) {
            participants.push(SpeciesCoefficient::new(&species(st), c));
        }
        for (st, c) in self.catalysts() {
            participants.push(SpeciesCoefficient::new(&species(st), c));
        }
        participants
    }
}

// region Polymerization
/// Incorporate the nucleotides of `rna_sequence` into one molecule of `rna`
///
/// Each NTP is consumed according to base composition, releasing one pyrophosphate per
/// nucleotide. Forming the L - 1 phosphodiester bonds consumes water and releases protons.
///
/// # Examples
/// ```rust
/// use modelgen_core::configuration::MetaboliteIds;
/// use modelgen_core::stoichiometry::transcription_elongation;
///
/// let ids = MetaboliteIds::default();
/// let stoichiometry = transcription_elongation("rna", "AUGGC", &ids).unwrap();
/// assert_eq!(stoichiometry.coefficient("gtp"), -2);
/// assert_eq!(stoichiometry.coefficient("ppi"), 5);
/// assert_eq!(stoichiometry.coefficient("h2o"), -4);
/// assert_eq!(stoichiometry.coefficient("rna"), 1);
/// ```
pub fn transcription_elongation(
    rna: &str,
    rna_sequence: &str,
    metabolites: &MetaboliteIds,
) -> Result<Stoichiometry, StoichiometryError> {
    let length = polymer_length(rna, rna_sequence)?;
    let mut stoichiometry = Stoichiometry::new();
    for (base, count) in sequence::nucleotide_composition(rna_sequence)? {
        let ntp = metabolites
            .ntp(base)
            .ok_or(StoichiometryError::UnknownMonomer(base))?;
        stoichiometry.add(ntp, -count);
    }
    stoichiometry
        .add(&metabolites.h2o, -(length - 1))
        .add(rna, 1)
        .add(&metabolites.ppi, length)
        .add(&metabolites.h, length - 1);
    Ok(stoichiometry)
}

/// Translate `coding_sequence` into one molecule of `protein`
///
/// Every in-frame codon before the first stop codon consumes one charged tRNA. Elongation
/// hydrolyzes n + 2 GTP, and releasing the peptide from the last tRNA consumes one more water.
pub fn translation(
    protein: &str,
    coding_sequence: &str,
    codon_table: &CodonTable,
    machinery: &TranslationMachinery,
    metabolites: &MetaboliteIds,
) -> Result<Stoichiometry, StoichiometryError> {
    let codons: Vec<&str> = sequence::codons(coding_sequence).collect();
    if codons.is_empty() {
        return Err(StoichiometryError::EmptySequence(protein.to_string()));
    }
    let length = codons.len() as i64;
    let mut stoichiometry = Stoichiometry::new();
    for codon in &codons {
        let trna = codon_table
            .get(codon)
            .ok_or_else(|| KbError::MissingTrna(codon.to_string()))?;
        stoichiometry.add(&trna.charged, -1).add(&trna.uncharged, 1);
    }
    stoichiometry
        .add(&metabolites.gtp, -(length + 2))
        .add(&metabolites.h2o, -(length + 2))
        .add(&metabolites.gdp, length + 2)
        .add(&metabolites.pi, length + 2)
        .add(&metabolites.h, length + 2)
        .add(&metabolites.h2o, -1)
        .add(protein, 1);
    for (factor, coefficient) in &machinery.initiation_factors {
        stoichiometry.add_catalyst(factor, *coefficient);
    }
    for (factor, coefficient) in &machinery.elongation_factors {
        stoichiometry.add_catalyst(factor, coefficient * length);
    }
    for (factor, coefficient) in &machinery.release_factors {
        stoichiometry.add_catalyst(factor, *coefficient);
    }
    for (subunit, coefficient) in &machinery.ribosome {
        stoichiometry.add_catalyst(subunit, *coefficient);
    }
    Ok(stoichiometry)
}

/// Charged and uncharged tRNA decoding a codon
#[derive(Clone, Debug, PartialEq)]
pub struct TrnaPair {
    pub charged: String,
    pub uncharged: String,
}

/// Map of DNA codons to the tRNAs that decode them
#[derive(Clone, Debug, Default)]
pub struct CodonTable {
    codons: IndexMap<String, TrnaPair>,
}

impl CodonTable {
    /// Build the table from the aminoacyl-tRNAs of the cell, the first listed tRNA wins when
    /// several decode the same codon
    pub fn from_cell(cell: &Cell) -> Self {
        let mut codons = IndexMap::new();
        for species_type in cell.aminoacyl_trnas() {
            if let KbSpeciesKind::AminoacylTrna {
                trna, codons: decoded, ..
            } = &species_type.kind
            {
                for codon in decoded {
                    codons
                        .entry(codon.to_ascii_uppercase())
                        .or_insert_with(|| TrnaPair {
                            charged: species_type.id.clone(),
                            uncharged: trna.clone(),
                        });
                }
            }
        }
        CodonTable { codons }
    }

    pub fn get(&self, codon: &str) -> Option<&TrnaPair> {
        self.codons.get(codon)
    }
}

/// Catalysts of translation with their per-event coefficients
#[derive(Clone, Debug, Default)]
pub struct TranslationMachinery {
    pub ribosome: Vec<(String, i64)>,
    pub initiation_factors: Vec<(String, i64)>,
    /// Used once per codon
    pub elongation_factors: Vec<(String, i64)>,
    pub release_factors: Vec<(String, i64)>,
}
// endregion Polymerization

// region Degradation
/// Hydrolyze one molecule of `rna` into its nucleoside monophosphates
pub fn rna_degradation(
    rna: &str,
    rna_sequence: &str,
    metabolites: &MetaboliteIds,
) -> Result<Stoichiometry, StoichiometryError> {
    let length = polymer_length(rna, rna_sequence)?;
    let mut stoichiometry = Stoichiometry::new();
    stoichiometry
        .add(rna, -1)
        .add(&metabolites.h2o, -(length - 1));
    for (base, count) in sequence::nucleotide_composition(rna_sequence)? {
        let nmp = metabolites
            .nmp(base)
            .ok_or(StoichiometryError::UnknownMonomer(base))?;
        stoichiometry.add(nmp, count);
    }
    stoichiometry.add(&metabolites.h, length - 1);
    Ok(stoichiometry)
}

/// Hydrolyze the peptide bonds of one molecule of `protein`
pub fn protein_hydrolysis(
    protein: &str,
    protein_sequence: &str,
    metabolites: &MetaboliteIds,
    amino_acids: &IndexMap<char, String>,
) -> Result<Stoichiometry, StoichiometryError> {
    let length = polymer_length(protein, protein_sequence)?;
    let mut stoichiometry = Stoichiometry::new();
    stoichiometry
        .add(protein, -1)
        .add(&metabolites.h2o, -(length - 1));
    for (residue, count) in sequence::amino_acid_composition(protein_sequence)? {
        let amino_acid = amino_acids
            .get(&residue)
            .ok_or(StoichiometryError::UnknownMonomer(residue))?;
        stoichiometry.add(amino_acid, count);
    }
    Ok(stoichiometry)
}

/// Degrade one molecule of `protein`, driven by the hydrolysis of one ATP
pub fn protein_degradation(
    protein: &str,
    protein_sequence: &str,
    metabolites: &MetaboliteIds,
    amino_acids: &IndexMap<char, String>,
) -> Result<Stoichiometry, StoichiometryError> {
    let mut stoichiometry = protein_hydrolysis(protein, protein_sequence, metabolites, amino_acids)?;
    stoichiometry
        .add(&metabolites.atp, -1)
        .add(&metabolites.h2o, -1)
        .add(&metabolites.adp, 1)
        .add(&metabolites.pi, 1)
        .add(&metabolites.h, 1);
    Ok(stoichiometry)
}
// endregion Degradation

// region Complexation
/// Assemble one molecule of `complex` from its subunits
pub fn association(
    complex: &str,
    subunits: &[Subunit],
    policy: ZeroCoefficientPolicy,
) -> Stoichiometry {
    let mut stoichiometry = Stoichiometry::new();
    for subunit in subunits {
        if let Some(copies) = policy.copies(subunit.coefficient) {
            stoichiometry.add(&subunit.species_type, -copies);
        }
    }
    stoichiometry.add(complex, 1);
    stoichiometry
}

/// Dissociate a complex into its subunits while degrading one copy of `degraded`
pub fn dissociation(
    association: &Stoichiometry,
    degraded: &str,
    degraded_sequence: &str,
    metabolites: &MetaboliteIds,
    amino_acids: &IndexMap<char, String>,
) -> Result<Stoichiometry, StoichiometryError> {
    let mut stoichiometry = association.inverse();
    stoichiometry.merge(&protein_hydrolysis(
        degraded,
        degraded_sequence,
        metabolites,
        amino_acids,
    )?);
    stoichiometry.net.retain(|_, c| *c != 0);
    Ok(stoichiometry)
}

/// Compartments every subunit of a complex is found in, in the order of the first subunit
pub fn common_compartments<'a>(
    cell: &'a Cell,
    complex: &str,
    subunits: &[Subunit],
    policy: ZeroCoefficientPolicy,
) -> Result<Vec<&'a str>, StoichiometryError> {
    let mut common: Option<Vec<&str>> = None;
    for subunit in subunits {
        if policy.copies(subunit.coefficient).is_none() {
            continue;
        }
        let compartments = cell.compartments_of(&subunit.species_type);
        common = Some(match common {
            None => compartments,
            Some(current) => current
                .into_iter()
                .filter(|c| compartments.contains(c))
                .collect(),
        });
    }
    match common {
        Some(compartments) if !compartments.is_empty() => Ok(compartments),
        _ => Err(StoichiometryError::NoCommonCompartment(complex.to_string())),
    }
}
// endregion Complexation

fn polymer_length(id: &str, sequence: &str) -> Result<i64, StoichiometryError> {
    if sequence.is_empty() {
        return Err(StoichiometryError::EmptySequence(id.to_string()));
    }
    Ok(sequence.len() as i64)
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoichiometryError {
    #[error("Subunits of `{0}` share no compartment")]
    NoCommonCompartment(String),
    #[error("Sequence of `{0}` is empty")]
    EmptySequence(String),
    #[error("No species type is configured for monomer `{0}`")]
    UnknownMonomer(char),
    #[error(transparent)]
    Kb(#[from] KbError),
}
