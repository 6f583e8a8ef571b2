//! Process wide constants used while generating and calibrating submodels
use std::sync::{LazyLock, RwLock};

use indexmap::IndexMap;

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

/// Get a copy of the current configuration
///
/// A poisoned lock still holds a valid configuration, so it is read anyway.
pub fn current() -> Configuration {
    match CONFIGURATION.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

#[derive(Clone, Debug)]
pub struct Configuration {
    /// Avogadro constant (molecule mol^-1)
    pub avogadro: f64,
    /// Density used for compartments which don't specify one (g l^-1)
    pub default_density: f64,
    /// Rate constant of bimolecular protein-protein association (s^-1)
    pub association_rate_constant: f64,
    /// Dissociation constant of polymerase binding to a promoter (M)
    pub k_d_specific_polr: f64,
    /// Dissociation constant of polymerase binding to non-specific DNA (M)
    pub k_d_non_specific_polr: f64,
    /// Fraction of total polymerase that is free
    pub free_polymerase_fraction: f64,
    /// Fraction of total polymerase bound to non-specific sites
    pub non_specific_bound_polymerase_fraction: f64,
    /// Ids of the metabolite species types used in synthesized stoichiometries
    pub metabolites: MetaboliteIds,
    /// Map of one letter amino acid codes to amino acid species type ids
    pub amino_acids: IndexMap<char, String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            avogadro: 6.02214076e23,
            default_density: 1100.,
            association_rate_constant: 2e6,
            k_d_specific_polr: 1e-09,
            k_d_non_specific_polr: 1e-03,
            free_polymerase_fraction: 0.75,
            non_specific_bound_polymerase_fraction: 0.2475,
            metabolites: MetaboliteIds::default(),
            amino_acids: default_amino_acids(),
        }
    }
}

/// Species type ids of the small molecules participating in polymer synthesis and degradation
#[derive(Clone, Debug, PartialEq)]
pub struct MetaboliteIds {
    pub atp: String,
    pub ctp: String,
    pub gtp: String,
    pub utp: String,
    pub amp: String,
    pub cmp: String,
    pub gmp: String,
    pub ump: String,
    pub adp: String,
    pub gdp: String,
    pub ppi: String,
    pub pi: String,
    pub h2o: String,
    pub h: String,
}

impl Default for MetaboliteIds {
    fn default() -> Self {
        MetaboliteIds {
            atp: "atp".to_string(),
            ctp: "ctp".to_string(),
            gtp: "gtp".to_string(),
            utp: "utp".to_string(),
            amp: "amp".to_string(),
            cmp: "cmp".to_string(),
            gmp: "gmp".to_string(),
            ump: "ump".to_string(),
            adp: "adp".to_string(),
            gdp: "gdp".to_string(),
            ppi: "ppi".to_string(),
            pi: "pi".to_string(),
            h2o: "h2o".to_string(),
            h: "h".to_string(),
        }
    }
}

impl MetaboliteIds {
    /// Nucleoside triphosphate consumed when incorporating `base` into RNA
    pub fn ntp(&self, base: char) -> Option<&str> {
        match base {
            'A' => Some(&self.atp),
            'C' => Some(&self.ctp),
            'G' => Some(&self.gtp),
            'U' => Some(&self.utp),
            _ => None,
        }
    }

    /// Nucleoside monophosphate released when RNA containing `base` is hydrolyzed
    pub fn nmp(&self, base: char) -> Option<&str> {
        match base {
            'A' => Some(&self.amp),
            'C' => Some(&self.cmp),
            'G' => Some(&self.gmp),
            'U' => Some(&self.ump),
            _ => None,
        }
    }
}

fn default_amino_acids() -> IndexMap<char, String> {
    [
        ('A', "ala"),
        ('C', "cys"),
        ('D', "asp"),
        ('E', "glu"),
        ('F', "phe"),
        ('G', "gly"),
        ('H', "his"),
        ('I', "ile"),
        ('K', "lys"),
        ('L', "leu"),
        ('M', "met"),
        ('N', "asn"),
        ('P', "pro"),
        ('Q', "gln"),
        ('R', "arg"),
        ('S', "ser"),
        ('T', "thr"),
        ('V', "val"),
        ('W', "trp"),
        ('Y', "tyr"),
    ]
    .into_iter()
    .map(|(code, id)| (code, id.to_string()))
    .collect()
}
