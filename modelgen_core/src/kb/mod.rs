//! Knowledge base describing the cell a model is generated for
//!
//! The knowledge base is read only input. It provides the compartments, species types,
//! concentrations, genes and regulatory annotations that the submodel generators turn into
//! reactions and parameters.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::configuration::MetaboliteIds;
use crate::model::formula::Formula;

pub mod sequence;
#[cfg(test)]
pub(crate) mod fixtures;

// region Knowledge Base Types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
    pub cell: Cell,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cell {
    /// Scalar properties of the cell, e.g. `mean_doubling_time`
    #[serde(default)]
    pub properties: IndexMap<String, Property>,
    #[serde(default)]
    pub compartments: Vec<KbCompartment>,
    #[serde(default)]
    pub species_types: Vec<KbSpeciesType>,
    #[serde(default)]
    pub species: Vec<KbSpecies>,
    #[serde(default)]
    pub genes: Vec<Gene>,
    #[serde(default)]
    pub observables: Vec<KbObservable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub value: f64,
    #[serde(default)]
    pub units: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbCompartment {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Mean volume (l)
    pub volume: f64,
    /// Density (g l^-1)
    #[serde(default)]
    pub density: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbSpeciesType {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Half-life (s)
    #[serde(default)]
    pub half_life: Option<f64>,
    #[serde(default)]
    pub formula: Option<Formula>,
    #[serde(default)]
    pub charge: i32,
    #[serde(flatten)]
    pub kind: KbSpeciesKind,
}

/// What a species type is, along with the data specific to that kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KbSpeciesKind {
    Metabolite,
    /// Chromosome or plasmid
    Dna {
        sequence: String,
        #[serde(default)]
        circular: bool,
    },
    /// RNA transcribed from the exons of a gene
    Transcript { gene: String, exons: Vec<Locus> },
    /// Protein translated from the coding regions of a transcript's gene
    Protein {
        transcript: String,
        coding_regions: Vec<Locus>,
    },
    /// tRNA charged with an amino acid, decoding `codons`
    AminoacylTrna {
        trna: String,
        amino_acid: String,
        codons: Vec<String>,
    },
    Complex { subunits: Vec<Subunit> },
}

/// Span of a polymer, 1-based and inclusive at both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locus {
    pub start: usize,
    pub end: usize,
}

impl Locus {
    pub fn len(&self) -> usize {
        self.end + 1 - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subunit {
    pub species_type: String,
    pub coefficient: u32,
}

/// How subunits listed with a coefficient of zero take part in complexes
///
/// Knowledge bases use zero for subunits whose stoichiometry is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroCoefficientPolicy {
    /// Treat the subunit as present in a single copy
    #[default]
    SingleCopy,
    /// Leave the subunit out of the complex entirely
    Catalytic,
}

impl ZeroCoefficientPolicy {
    /// Number of copies of a subunit in its complex, `None` when it isn't part of it
    pub fn copies(&self, coefficient: u32) -> Option<i64> {
        match (self, coefficient) {
            (ZeroCoefficientPolicy::SingleCopy, 0) => Some(1),
            (ZeroCoefficientPolicy::Catalytic, 0) => None,
            (_, c) => Some(c as i64),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbSpecies {
    pub species_type: String,
    pub compartment: String,
    /// Mean copy number
    #[serde(default)]
    pub concentration: Option<f64>,
    #[serde(default)]
    pub std: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strand {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gene {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Id of the DNA species type the gene is on
    pub polymer: String,
    pub start: usize,
    pub end: usize,
    pub strand: Strand,
    #[serde(default)]
    pub regulatory_modules: Vec<RegulatoryModule>,
}

impl Gene {
    pub fn locus(&self) -> Locus {
        Locus {
            start: self.start,
            end: self.end,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegulatoryModule {
    #[serde(default)]
    pub id: Option<String>,
    pub transcription_factors: Vec<TranscriptionFactorRegulation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionFactorRegulation {
    /// Species type id of the protein or complex acting as transcription factor
    pub transcription_factor: String,
    pub direction: RegulatoryDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegulatoryDirection {
    Activation,
    Repression,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbObservable {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub species: Vec<KbObservableTerm>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbObservableTerm {
    pub species_type: String,
    pub compartment: String,
    #[serde(default = "unit_coefficient")]
    pub coefficient: f64,
}

fn unit_coefficient() -> f64 {
    1.
}

impl KbObservable {
    /// Species types of the observable with their coefficients as whole copy numbers
    pub fn copy_numbers(&self) -> Result<Vec<(&str, i64)>, KbError> {
        self.species
            .iter()
            .map(|term| {
                if term.coefficient.fract() == 0. && term.coefficient.is_finite() {
                    Ok((term.species_type.as_str(), term.coefficient as i64))
                } else {
                    Err(KbError::FractionalCoefficient {
                        observable: self.id.clone(),
                        species_type: term.species_type.clone(),
                        coefficient: term.coefficient,
                    })
                }
            })
            .collect()
    }
}
// endregion Knowledge Base Types

/// Ids of the species types polymers are built from, used to compute polymer formulas
pub struct Monomers<'a> {
    pub metabolites: &'a MetaboliteIds,
    pub amino_acids: &'a IndexMap<char, String>,
    pub zero_coefficients: ZeroCoefficientPolicy,
}

// region Lookups
impl Cell {
    pub fn property(&self, id: &str) -> Result<f64, KbError> {
        self.properties
            .get(id)
            .map(|p| p.value)
            .ok_or_else(|| KbError::MissingProperty(id.to_string()))
    }

    pub fn compartment(&self, id: &str) -> Result<&KbCompartment, KbError> {
        self.compartments
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| KbError::UnknownCompartment(id.to_string()))
    }

    pub fn species_type(&self, id: &str) -> Result<&KbSpeciesType, KbError> {
        self.species_types
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| KbError::UnknownSpeciesType(id.to_string()))
    }

    pub fn gene(&self, id: &str) -> Result<&Gene, KbError> {
        self.genes
            .iter()
            .find(|g| g.id == id)
            .ok_or_else(|| KbError::UnknownGene(id.to_string()))
    }

    pub fn observable(&self, id: &str) -> Result<&KbObservable, KbError> {
        self.observables
            .iter()
            .find(|o| o.id == id)
            .ok_or_else(|| KbError::UnknownObservable(id.to_string()))
    }

    pub fn transcripts(&self) -> impl Iterator<Item = &KbSpeciesType> {
        self.species_types
            .iter()
            .filter(|s| matches!(s.kind, KbSpeciesKind::Transcript { .. }))
    }

    pub fn proteins(&self) -> impl Iterator<Item = &KbSpeciesType> {
        self.species_types
            .iter()
            .filter(|s| matches!(s.kind, KbSpeciesKind::Protein { .. }))
    }

    pub fn complexes(&self) -> impl Iterator<Item = &KbSpeciesType> {
        self.species_types
            .iter()
            .filter(|s| matches!(s.kind, KbSpeciesKind::Complex { .. }))
    }

    pub fn aminoacyl_trnas(&self) -> impl Iterator<Item = &KbSpeciesType> {
        self.species_types
            .iter()
            .filter(|s| matches!(s.kind, KbSpeciesKind::AminoacylTrna { .. }))
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = &KbSpeciesType> {
        self.species_types
            .iter()
            .filter(|s| matches!(s.kind, KbSpeciesKind::Dna { .. }))
    }

    /// Compartments containing `species_type`, in knowledge base order
    pub fn compartments_of(&self, species_type: &str) -> Vec<&str> {
        let mut compartments: Vec<&str> = Vec::new();
        for species in self.species.iter().filter(|s| s.species_type == species_type) {
            if !compartments.contains(&species.compartment.as_str()) {
                compartments.push(&species.compartment);
            }
        }
        compartments
    }

    /// First compartment containing `species_type`
    pub fn primary_compartment(&self, species_type: &str) -> Result<&str, KbError> {
        self.compartments_of(species_type)
            .first()
            .copied()
            .ok_or_else(|| KbError::NotLocalized(species_type.to_string()))
    }

    pub fn species(&self, species_type: &str, compartment: &str) -> Option<&KbSpecies> {
        self.species
            .iter()
            .find(|s| s.species_type == species_type && s.compartment == compartment)
    }

    /// Mean copy number of `species_type` in `compartment`
    pub fn concentration(&self, species_type: &str, compartment: &str) -> Option<f64> {
        self.species(species_type, compartment)
            .and_then(|s| s.concentration)
    }

    pub fn half_life(&self, species_type: &str) -> Result<Option<f64>, KbError> {
        Ok(self.species_type(species_type)?.half_life)
    }

    /// Transcription factors regulating `gene`, over all of its regulatory modules
    pub fn transcription_factors(
        &self,
        gene: &str,
    ) -> Result<Vec<&TranscriptionFactorRegulation>, KbError> {
        Ok(self
            .gene(gene)?
            .regulatory_modules
            .iter()
            .flat_map(|m| m.transcription_factors.iter())
            .collect())
    }
}
// endregion Lookups

// region Sequences
impl Cell {
    /// Sequence of a DNA species type
    pub fn dna_sequence(&self, id: &str) -> Result<&str, KbError> {
        match &self.species_type(id)?.kind {
            KbSpeciesKind::Dna { sequence, .. } => Ok(sequence),
            _ => Err(KbError::UnexpectedKind {
                id: id.to_string(),
                expected: "dna",
            }),
        }
    }

    /// Total length of the DNA located in `compartment`
    pub fn genome_length(&self, compartment: &str) -> Result<usize, KbError> {
        let mut length = 0;
        for chromosome in self.chromosomes() {
            if self.compartments_of(&chromosome.id).contains(&compartment) {
                length += self.dna_sequence(&chromosome.id)?.len();
            }
        }
        Ok(length)
    }

    /// Concatenated sequence of `loci` of `polymer`, read 5' to 3' along `strand`
    pub fn loci_sequence(
        &self,
        polymer: &str,
        loci: &[Locus],
        strand: Strand,
    ) -> Result<String, KbError> {
        let dna = self.dna_sequence(polymer)?;
        let mut ordered: Vec<Locus> = loci.to_vec();
        ordered.sort_by_key(|l| l.start);
        let mut sequence = String::new();
        for locus in ordered {
            if locus.start == 0 || locus.is_empty() || locus.end > dna.len() {
                return Err(KbError::LocusOutOfRange {
                    polymer: polymer.to_string(),
                    start: locus.start,
                    end: locus.end,
                    length: dna.len(),
                });
            }
            sequence.push_str(&dna[locus.start - 1..locus.end]);
        }
        match strand {
            Strand::Positive => Ok(sequence),
            Strand::Negative => sequence::reverse_complement(&sequence),
        }
    }

    /// Coding strand sequence of a gene
    pub fn gene_sequence(&self, gene: &str) -> Result<String, KbError> {
        let gene = self.gene(gene)?;
        self.loci_sequence(&gene.polymer, &[gene.locus()], gene.strand)
    }

    fn transcript_parts(&self, id: &str) -> Result<(&Gene, &[Locus]), KbError> {
        match &self.species_type(id)?.kind {
            KbSpeciesKind::Transcript { gene, exons } => Ok((self.gene(gene)?, exons)),
            _ => Err(KbError::UnexpectedKind {
                id: id.to_string(),
                expected: "transcript",
            }),
        }
    }

    /// Gene a transcript is transcribed from
    pub fn transcript_gene(&self, id: &str) -> Result<&Gene, KbError> {
        Ok(self.transcript_parts(id)?.0)
    }

    /// RNA sequence of a transcript, its exons spliced together
    pub fn transcript_sequence(&self, id: &str) -> Result<String, KbError> {
        let (gene, exons) = self.transcript_parts(id)?;
        let dna = self.loci_sequence(&gene.polymer, exons, gene.strand)?;
        Ok(sequence::transcribe(&dna))
    }

    /// DNA coding sequence of a protein
    pub fn coding_sequence(&self, id: &str) -> Result<String, KbError> {
        match &self.species_type(id)?.kind {
            KbSpeciesKind::Protein {
                transcript,
                coding_regions,
            } => {
                let gene = self.transcript_gene(transcript)?;
                self.loci_sequence(&gene.polymer, coding_regions, gene.strand)
            }
            _ => Err(KbError::UnexpectedKind {
                id: id.to_string(),
                expected: "protein",
            }),
        }
    }

    /// Amino acid sequence of a protein
    pub fn protein_sequence(&self, id: &str) -> Result<String, KbError> {
        sequence::translate(&self.coding_sequence(id)?)
    }

    /// Subunits of a complex
    pub fn subunits(&self, id: &str) -> Result<&[Subunit], KbError> {
        match &self.species_type(id)?.kind {
            KbSpeciesKind::Complex { subunits } => Ok(subunits),
            _ => Err(KbError::UnexpectedKind {
                id: id.to_string(),
                expected: "complex",
            }),
        }
    }

    /// Empirical formula of a species type
    ///
    /// Metabolites and charged tRNAs use their listed formula. Proteins and transcripts are
    /// condensed from their monomers, and complexes are the sum of their subunits. `None` is
    /// returned when any formula needed is missing.
    pub fn empirical_formula(
        &self,
        id: &str,
        monomers: &Monomers,
    ) -> Result<Option<Formula>, KbError> {
        let species_type = self.species_type(id)?;
        if let Some(formula) = &species_type.formula {
            return Ok(Some(formula.clone()));
        }
        let water = self.listed_formula(&monomers.metabolites.h2o);
        match &species_type.kind {
            KbSpeciesKind::Protein { .. } => {
                let residues = sequence::amino_acid_composition(&self.protein_sequence(id)?)?;
                let mut ids = Vec::new();
                for (residue, count) in &residues {
                    let amino_acid = monomers
                        .amino_acids
                        .get(residue)
                        .ok_or(KbError::UnknownAminoAcid(*residue))?;
                    ids.push((amino_acid.as_str(), *count));
                }
                self.condensed_formula(&ids, water, "H2O")
            }
            KbSpeciesKind::Transcript { .. } => {
                let bases = sequence::nucleotide_composition(&self.transcript_sequence(id)?)?;
                let mut ids = Vec::new();
                for (base, count) in &bases {
                    let nmp = monomers
                        .metabolites
                        .nmp(*base)
                        .ok_or(KbError::InvalidNucleotide(*base))?;
                    ids.push((nmp, *count));
                }
                // phosphodiester bonds between charged monomers release hydroxide
                self.condensed_formula(&ids, water, "OH")
            }
            KbSpeciesKind::Complex { subunits } => {
                let mut total = Formula::new();
                for subunit in subunits {
                    let Some(copies) = monomers.zero_coefficients.copies(subunit.coefficient)
                    else {
                        continue;
                    };
                    match self.empirical_formula(&subunit.species_type, monomers)? {
                        Some(formula) => total += &(&formula * copies),
                        None => return Ok(None),
                    }
                }
                Ok(Some(total))
            }
            _ => Ok(None),
        }
    }

    /// Formula listed for `id`, `None` when the species type is absent or has none
    fn listed_formula(&self, id: &str) -> Option<&Formula> {
        self.species_type(id).ok().and_then(|s| s.formula.as_ref())
    }

    fn condensed_formula(
        &self,
        monomers: &[(&str, i64)],
        water: Option<&Formula>,
        released: &str,
    ) -> Result<Option<Formula>, KbError> {
        if water.is_none() {
            return Ok(None);
        }
        let mut total = Formula::new();
        let mut length = 0;
        for (id, count) in monomers {
            match self.listed_formula(id) {
                Some(formula) => total += &(formula * *count),
                None => return Ok(None),
            }
            length += count;
        }
        let released: Formula = released
            .parse()
            .map_err(|_| KbError::UnknownSpeciesType(released.to_string()))?;
        Ok(Some(total - &(&released * (length - 1).max(0))))
    }
}
// endregion Sequences

/// Errors from querying the knowledge base
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KbError {
    #[error("Knowledge base has no species type `{0}`")]
    UnknownSpeciesType(String),
    #[error("Knowledge base has no compartment `{0}`")]
    UnknownCompartment(String),
    #[error("Knowledge base has no gene `{0}`")]
    UnknownGene(String),
    #[error("Knowledge base has no observable `{0}`")]
    UnknownObservable(String),
    #[error("Knowledge base has no cell property `{0}`")]
    MissingProperty(String),
    #[error("Species type `{0}` is not located in any compartment")]
    NotLocalized(String),
    #[error("Species type `{id}` is not a {expected}")]
    UnexpectedKind { id: String, expected: &'static str },
    #[error("Locus {start}..{end} is outside of `{polymer}` (length {length})")]
    LocusOutOfRange {
        polymer: String,
        start: usize,
        end: usize,
        length: usize,
    },
    #[error("Invalid nucleotide `{0}`")]
    InvalidNucleotide(char),
    #[error("Invalid codon `{0}`")]
    InvalidCodon(String),
    #[error("Invalid amino acid `{0}`")]
    InvalidAminoAcid(char),
    #[error("No species type is configured for amino acid `{0}`")]
    UnknownAminoAcid(char),
    #[error("No charged tRNA decodes codon `{0}`")]
    MissingTrna(String),
    #[error("Observable `{observable}` counts {coefficient} copies of `{species_type}`, not a whole number")]
    FractionalCoefficient {
        observable: String,
        species_type: String,
        coefficient: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration;
    use crate::kb::fixtures;

    #[test]
    fn deserialize_species_kinds() {
        let kb = fixtures::complexation_kb();
        assert_eq!(kb.cell.proteins().count(), 3);
        assert_eq!(kb.cell.complexes().count(), 1);
        assert_eq!(kb.cell.transcripts().count(), 3);
        assert_eq!(
            kb.cell.subunits("complex1").unwrap()[1],
            Subunit {
                species_type: "prot2".to_string(),
                coefficient: 2
            }
        );
    }

    #[test]
    fn overlapping_transcripts_of_one_gene() {
        let kb = fixtures::complexation_kb();
        assert_eq!(kb.cell.gene_sequence("gene1").unwrap(), "GCGTGCGATGAT");
        assert_eq!(kb.cell.transcript_sequence("trans1").unwrap(), "GCGUGC");
        assert_eq!(kb.cell.transcript_sequence("trans2").unwrap(), "UGCGAU");
        assert_eq!(kb.cell.transcript_sequence("trans3").unwrap(), "GAUGAU");
        assert_eq!(kb.cell.protein_sequence("prot1").unwrap(), "AC");
        assert_eq!(kb.cell.protein_sequence("prot2").unwrap(), "CD");
        assert_eq!(kb.cell.protein_sequence("prot3").unwrap(), "DD");
    }

    #[test]
    fn negative_strand_is_reverse_complemented() {
        let kb = fixtures::gene_expression_kb();
        let forward = kb.cell.dna_sequence("chr1").unwrap();
        let gene = kb.cell.gene("gene2").unwrap();
        let span = &forward[gene.start - 1..gene.end];
        assert_eq!(
            kb.cell.gene_sequence("gene2").unwrap(),
            sequence::reverse_complement(span).unwrap()
        );
    }

    #[test]
    fn compartments_and_concentrations() {
        let kb = fixtures::complexation_kb();
        assert_eq!(kb.cell.compartments_of("prot3"), vec!["n", "m"]);
        assert_eq!(kb.cell.primary_compartment("prot1").unwrap(), "n");
        assert_eq!(kb.cell.concentration("prot3", "m"), Some(10.));
        assert_eq!(kb.cell.concentration("prot3", "c"), None);
        assert!(matches!(
            kb.cell.species_type("prot9"),
            Err(KbError::UnknownSpeciesType(_))
        ));
    }

    #[test]
    fn locus_out_of_range() {
        let kb = fixtures::complexation_kb();
        let err = kb
            .cell
            .loci_sequence("chr1", &[Locus { start: 10, end: 20 }], Strand::Positive)
            .unwrap_err();
        assert!(matches!(err, KbError::LocusOutOfRange { length: 12, .. }));
    }

    #[test]
    fn polymer_formulas() {
        let kb = fixtures::complexation_kb();
        let config = configuration::current();
        let amino_acids = fixtures::amino_acid_ids();
        let monomers = Monomers {
            metabolites: &config.metabolites,
            amino_acids: &amino_acids,
            zero_coefficients: ZeroCoefficientPolicy::SingleCopy,
        };
        // Ala + Cys - H2O
        let prot1 = kb.cell.empirical_formula("prot1", &monomers).unwrap().unwrap();
        assert_eq!(prot1, "C6H12N2O3S".parse::<Formula>().unwrap());
        let complex = kb.cell.empirical_formula("complex1", &monomers).unwrap().unwrap();
        let prot2 = kb.cell.empirical_formula("prot2", &monomers).unwrap().unwrap();
        let prot3 = kb.cell.empirical_formula("prot3", &monomers).unwrap().unwrap();
        assert_eq!(complex, prot1 + &(&prot2 * 2) + &prot3);
    }
}
