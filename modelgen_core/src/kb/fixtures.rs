//! Small knowledge bases shared by unit tests
use indexmap::IndexMap;

use super::{KbSpeciesKind, KbSpeciesType, KnowledgeBase};

fn parse(json: &str) -> KnowledgeBase {
    serde_json::from_str(json).expect("fixture knowledge base should deserialize")
}

/// Amino acid ids used by [`complexation_kb`]
pub(crate) fn amino_acid_ids() -> IndexMap<char, String> {
    [('A', "Ala"), ('C', "Cys"), ('D', "Asp")]
        .into_iter()
        .map(|(code, id)| (code, id.to_string()))
        .collect()
}

/// Add metabolites without formulas or concentrations to `kb`
pub(crate) fn add_metabolites(kb: &mut KnowledgeBase, ids: &[&str]) {
    for id in ids {
        kb.cell.species_types.push(KbSpeciesType {
            id: id.to_string(),
            name: None,
            half_life: None,
            formula: None,
            charge: 0,
            kind: KbSpeciesKind::Metabolite,
        });
    }
}

/// One gene split into three overlapping transcripts, each translated into a protein, and a
/// complex assembled from those proteins
pub(crate) fn complexation_kb() -> KnowledgeBase {
    parse(
        r#"{
        "id": "complexation_kb",
        "version": "0.0.1",
        "cell": {
            "properties": {"mean_doubling_time": {"value": 28800, "units": "s"}},
            "compartments": [
                {"id": "n", "name": "nucleus", "volume": 5e-14, "density": 1100},
                {"id": "m", "name": "mitochondria", "volume": 2.5e-14}
            ],
            "species_types": [
                {"id": "chr1", "type": "dna", "sequence": "GCGTGCGATGAT"},
                {"id": "trans1", "type": "transcript", "gene": "gene1",
                    "exons": [{"start": 1, "end": 6}], "half_life": 300},
                {"id": "trans2", "type": "transcript", "gene": "gene1",
                    "exons": [{"start": 4, "end": 9}], "half_life": 300},
                {"id": "trans3", "type": "transcript", "gene": "gene1",
                    "exons": [{"start": 7, "end": 12}], "half_life": 300},
                {"id": "prot1", "type": "protein", "transcript": "trans1",
                    "coding_regions": [{"start": 1, "end": 6}], "half_life": 40000},
                {"id": "prot2", "type": "protein", "transcript": "trans2",
                    "coding_regions": [{"start": 4, "end": 9}], "half_life": 20000},
                {"id": "prot3", "type": "protein", "transcript": "trans3",
                    "coding_regions": [{"start": 7, "end": 12}], "half_life": 25000},
                {"id": "complex1", "type": "complex", "name": "complex 1", "subunits": [
                    {"species_type": "prot1", "coefficient": 1},
                    {"species_type": "prot2", "coefficient": 2},
                    {"species_type": "prot3", "coefficient": 0}
                ]},
                {"id": "Ala", "type": "metabolite", "formula": "C3H7NO2"},
                {"id": "Cys", "type": "metabolite", "formula": "C3H7NO2S"},
                {"id": "Asp", "type": "metabolite", "formula": "C4H7NO4"},
                {"id": "h2o", "type": "metabolite", "formula": "H2O"}
            ],
            "species": [
                {"species_type": "chr1", "compartment": "n", "concentration": 1},
                {"species_type": "prot1", "compartment": "n", "concentration": 10},
                {"species_type": "prot2", "compartment": "n", "concentration": 10},
                {"species_type": "prot3", "compartment": "n", "concentration": 10},
                {"species_type": "prot3", "compartment": "m", "concentration": 10},
                {"species_type": "complex1", "compartment": "n", "concentration": 5},
                {"species_type": "h2o", "compartment": "n", "concentration": 1e6},
                {"species_type": "Ala", "compartment": "n", "concentration": 1000},
                {"species_type": "Cys", "compartment": "n", "concentration": 1000},
                {"species_type": "Asp", "compartment": "n", "concentration": 1000}
            ],
            "genes": [
                {"id": "gene1", "polymer": "chr1", "start": 1, "end": 12, "strand": "positive"}
            ]
        }
    }"#,
    )
}

/// A 160 base chromosome carrying one gene on each strand, with the metabolites, machinery and
/// transcription factors needed to express and degrade them
///
/// `gene1` (1..30, positive) encodes `prot1` = MAC, `gene2` (41..70, negative) encodes
/// `prot2` = MCA. `gene1` is activated by `tf_act` and `gene2` repressed by `tf_rep`.
pub(crate) fn gene_expression_kb() -> KnowledgeBase {
    parse(
        r#"{
        "id": "gene_expression_kb",
        "cell": {
            "properties": {"mean_doubling_time": {"value": 28800, "units": "s"}},
            "compartments": [
                {"id": "c", "name": "cytosol", "volume": 1e-15, "density": 1100}
            ],
            "species_types": [
                {"id": "chr1", "type": "dna", "circular": true,
                    "sequence": "ATGGCGTGCTAAGCATGCATGCATGCATGCAAAAATTTTTTGAATTCCGGAATTCCGGTTACGCGCACATGCTAGCTAGCTAGCTAGCTAGCTAGCTAGCTAGCTAGCTAGCTAGCTAGCTAGCTAGCTAGCTAGCTAGCTAGCTAGCTAGCTAGCTAGC"},
                {"id": "trans1", "type": "transcript", "gene": "gene1",
                    "exons": [{"start": 1, "end": 30}], "half_life": 300},
                {"id": "trans2", "type": "transcript", "gene": "gene2",
                    "exons": [{"start": 41, "end": 70}], "half_life": 600},
                {"id": "prot1", "type": "protein", "transcript": "trans1",
                    "coding_regions": [{"start": 1, "end": 12}], "half_life": 36000},
                {"id": "prot2", "type": "protein", "transcript": "trans2",
                    "coding_regions": [{"start": 59, "end": 70}]},
                {"id": "met_trna", "type": "aminoacyl_trna", "trna": "trna_met",
                    "amino_acid": "met", "codons": ["ATG"], "formula": "C25H29NOS"},
                {"id": "ala_trna", "type": "aminoacyl_trna", "trna": "trna_ala",
                    "amino_acid": "ala", "codons": ["GCG", "GCA"], "formula": "C24H25NO"},
                {"id": "cys_trna", "type": "aminoacyl_trna", "trna": "trna_cys",
                    "amino_acid": "cys", "codons": ["TGC"], "formula": "C25H25NOS"},
                {"id": "trna_met", "type": "metabolite", "formula": "C20H20"},
                {"id": "trna_ala", "type": "metabolite", "formula": "C21H20"},
                {"id": "trna_cys", "type": "metabolite", "formula": "C22H20"},
                {"id": "rnapol", "type": "metabolite", "name": "RNA polymerase", "formula": "C200"},
                {"id": "rib", "type": "metabolite", "name": "ribosome", "formula": "C100H100"},
                {"id": "if1", "type": "metabolite", "formula": "C50"},
                {"id": "eftu", "type": "metabolite", "formula": "C60"},
                {"id": "rf1", "type": "metabolite", "formula": "C70"},
                {"id": "protease", "type": "metabolite", "formula": "C80"},
                {"id": "rnase", "type": "metabolite", "formula": "C90"},
                {"id": "tf_act", "type": "metabolite", "formula": "C30"},
                {"id": "tf_rep", "type": "metabolite", "formula": "C31"},
                {"id": "ala", "type": "metabolite", "formula": "C3H7NO2"},
                {"id": "cys", "type": "metabolite", "formula": "C3H7NO2S"},
                {"id": "met", "type": "metabolite", "formula": "C5H11NO2S"},
                {"id": "atp", "type": "metabolite", "formula": "C10H13N5O13P3"},
                {"id": "ctp", "type": "metabolite", "formula": "C9H13N3O14P3"},
                {"id": "gtp", "type": "metabolite", "formula": "C10H13N5O14P3"},
                {"id": "utp", "type": "metabolite", "formula": "C9H12N2O15P3"},
                {"id": "amp", "type": "metabolite", "formula": "C10H12N5O7P"},
                {"id": "cmp", "type": "metabolite", "formula": "C9H12N3O8P"},
                {"id": "gmp", "type": "metabolite", "formula": "C10H12N5O8P"},
                {"id": "ump", "type": "metabolite", "formula": "C9H11N2O9P"},
                {"id": "adp", "type": "metabolite", "formula": "C10H13N5O10P2"},
                {"id": "gdp", "type": "metabolite", "formula": "C10H13N5O11P2"},
                {"id": "ppi", "type": "metabolite", "formula": "HO7P2"},
                {"id": "pi", "type": "metabolite", "formula": "HO4P"},
                {"id": "h2o", "type": "metabolite", "formula": "H2O"},
                {"id": "h", "type": "metabolite", "formula": "H"}
            ],
            "species": [
                {"species_type": "chr1", "compartment": "c", "concentration": 1},
                {"species_type": "trans1", "compartment": "c", "concentration": 10},
                {"species_type": "trans2", "compartment": "c", "concentration": 5},
                {"species_type": "prot1", "compartment": "c", "concentration": 500},
                {"species_type": "prot2", "compartment": "c", "concentration": 200},
                {"species_type": "met_trna", "compartment": "c", "concentration": 100},
                {"species_type": "ala_trna", "compartment": "c", "concentration": 200},
                {"species_type": "cys_trna", "compartment": "c", "concentration": 50},
                {"species_type": "rnapol", "compartment": "c", "concentration": 100},
                {"species_type": "rib", "compartment": "c", "concentration": 1000},
                {"species_type": "if1", "compartment": "c", "concentration": 300},
                {"species_type": "eftu", "compartment": "c", "concentration": 3000},
                {"species_type": "rf1", "compartment": "c", "concentration": 200},
                {"species_type": "protease", "compartment": "c", "concentration": 40},
                {"species_type": "rnase", "compartment": "c", "concentration": 20},
                {"species_type": "tf_act", "compartment": "c", "concentration": 5},
                {"species_type": "tf_rep", "compartment": "c", "concentration": 3},
                {"species_type": "atp", "compartment": "c", "concentration": 3000000},
                {"species_type": "ctp", "compartment": "c", "concentration": 500000},
                {"species_type": "gtp", "compartment": "c", "concentration": 1000000},
                {"species_type": "utp", "compartment": "c", "concentration": 800000},
                {"species_type": "h2o", "compartment": "c", "concentration": 30000000000}
            ],
            "genes": [
                {"id": "gene1", "polymer": "chr1", "start": 1, "end": 30, "strand": "positive",
                    "regulatory_modules": [{"transcription_factors": [
                        {"transcription_factor": "tf_act", "direction": "activation"}
                    ]}]},
                {"id": "gene2", "polymer": "chr1", "start": 41, "end": 70, "strand": "negative",
                    "regulatory_modules": [{"transcription_factors": [
                        {"transcription_factor": "tf_rep", "direction": "repression"}
                    ]}]}
            ],
            "observables": [
                {"id": "ribosome", "species": [
                    {"species_type": "rib", "compartment": "c", "coefficient": 1}
                ]},
                {"id": "initiation_factors", "species": [
                    {"species_type": "if1", "compartment": "c"}
                ]},
                {"id": "elongation_factors", "species": [
                    {"species_type": "eftu", "compartment": "c"}
                ]},
                {"id": "release_factors", "species": [
                    {"species_type": "rf1", "compartment": "c"}
                ]},
                {"id": "degrade_protein", "species": [
                    {"species_type": "protease", "compartment": "c"}
                ]},
                {"id": "degrade_rna", "species": [
                    {"species_type": "rnase", "compartment": "c"}
                ]}
            ]
        }
    }"#,
    )
}
