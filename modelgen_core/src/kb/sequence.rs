//! Nucleotide and protein sequence utilities
use indexmap::IndexMap;

use crate::kb::KbError;

/// Stop codons of the standard genetic code
pub const STOP_CODONS: [&str; 3] = ["TAA", "TAG", "TGA"];

/// Order in which amino acid compositions are reported
const AMINO_ACIDS: &str = "ACDEFGHIKLMNPQRSTVWY";

/// Reverse complement of a DNA sequence
pub fn reverse_complement(dna: &str) -> Result<String, KbError> {
    dna.chars()
        .rev()
        .map(|base| match base {
            'A' => Ok('T'),
            'T' => Ok('A'),
            'G' => Ok('C'),
            'C' => Ok('G'),
            'N' => Ok('N'),
            other => Err(KbError::InvalidNucleotide(other)),
        })
        .collect()
}

/// RNA transcribed from the coding strand `dna`
pub fn transcribe(dna: &str) -> String {
    dna.chars().map(|b| if b == 'T' { 'U' } else { b }).collect()
}

/// In frame codons of a coding sequence, stopping before the first stop codon
///
/// A trailing partial codon is ignored.
pub fn codons(coding: &str) -> impl Iterator<Item = &str> {
    (0..coding.len() / 3)
        .map(move |i| &coding[3 * i..3 * i + 3])
        .take_while(|codon| !STOP_CODONS.contains(codon))
}

/// Translate a DNA coding sequence with the standard genetic code
///
/// # Examples
/// ```rust
/// use modelgen_core::kb::sequence::translate;
/// assert_eq!(translate("ATGGCGTGCTAA").unwrap(), "MAC");
/// ```
pub fn translate(coding: &str) -> Result<String, KbError> {
    codons(coding).map(amino_acid).collect()
}

/// Amino acid encoded by `codon` in the standard genetic code
pub fn amino_acid(codon: &str) -> Result<char, KbError> {
    let residue = match codon {
        "TTT" | "TTC" => 'F',
        "TTA" | "TTG" | "CTT" | "CTC" | "CTA" | "CTG" => 'L',
        "ATT" | "ATC" | "ATA" => 'I',
        "ATG" => 'M',
        "GTT" | "GTC" | "GTA" | "GTG" => 'V',
        "TCT" | "TCC" | "TCA" | "TCG" | "AGT" | "AGC" => 'S',
        "CCT" | "CCC" | "CCA" | "CCG" => 'P',
        "ACT" | "ACC" | "ACA" | "ACG" => 'T',
        "GCT" | "GCC" | "GCA" | "GCG" => 'A',
        "TAT" | "TAC" => 'Y',
        "CAT" | "CAC" => 'H',
        "CAA" | "CAG" => 'Q',
        "AAT" | "AAC" => 'N',
        "AAA" | "AAG" => 'K',
        "GAT" | "GAC" => 'D',
        "GAA" | "GAG" => 'E',
        "TGT" | "TGC" => 'C',
        "TGG" => 'W',
        "CGT" | "CGC" | "CGA" | "CGG" | "AGA" | "AGG" => 'R',
        "GGT" | "GGC" | "GGA" | "GGG" => 'G',
        other => return Err(KbError::InvalidCodon(other.to_string())),
    };
    Ok(residue)
}

/// Count of each codon of a coding sequence, in order of first use
pub fn codon_usage(coding: &str) -> IndexMap<&str, i64> {
    let mut usage = IndexMap::new();
    for codon in codons(coding) {
        *usage.entry(codon).or_insert(0) += 1;
    }
    usage
}

/// Count of each base of an RNA sequence, in `ACGU` order, omitting absent bases
pub fn nucleotide_composition(rna: &str) -> Result<IndexMap<char, i64>, KbError> {
    let mut composition: IndexMap<char, i64> =
        ['A', 'C', 'G', 'U'].into_iter().map(|b| (b, 0)).collect();
    for base in rna.chars() {
        match composition.get_mut(&base) {
            Some(count) => *count += 1,
            None => return Err(KbError::InvalidNucleotide(base)),
        }
    }
    composition.retain(|_, count| *count > 0);
    Ok(composition)
}

/// Count of each residue of a protein sequence, in alphabetical order of the one letter
/// codes, omitting absent residues
pub fn amino_acid_composition(protein: &str) -> Result<IndexMap<char, i64>, KbError> {
    let mut composition: IndexMap<char, i64> = AMINO_ACIDS.chars().map(|a| (a, 0)).collect();
    for residue in protein.chars() {
        match composition.get_mut(&residue) {
            Some(count) => *count += 1,
            None => return Err(KbError::InvalidAminoAcid(residue)),
        }
    }
    composition.retain(|_, count| *count > 0);
    Ok(composition)
}
