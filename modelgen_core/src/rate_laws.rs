//! Parametric rate law templates
//!
//! Each template creates the parameters and functions its expression needs (interning them so
//! repeated generation reuses existing entities) and returns the expression resolved against
//! the model.
use indexmap::IndexSet;
use thiserror::Error;

use crate::expression::{Expr, Expression, ExpressionError, SymbolCategory};
use crate::model::observable::Function;
use crate::model::parameter::{Parameter, ParameterRole};
use crate::model::registry::RegistryError;
use crate::model::units::Unit;
use crate::model::{Model, ModelError};

/// Enzyme or other catalyst scaling a rate law
#[derive(Clone, Debug, PartialEq)]
pub enum Modifier {
    /// Total of the species in an observable
    Observable(String),
    Species(String),
}

impl Modifier {
    pub fn id(&self) -> &str {
        match self {
            Modifier::Observable(id) | Modifier::Species(id) => id,
        }
    }

    /// Species whose amount the modifier accounts for
    fn species<'a>(&'a self, model: &'a Model) -> Result<Vec<&'a str>, RateLawError> {
        Ok(match self {
            Modifier::Observable(id) => model.observables.require(id)?.species().collect(),
            Modifier::Species(id) => {
                model.species.require(id)?;
                vec![id.as_str()]
            }
        })
    }
}

/// Id of the catalytic constant of `reaction`
pub fn k_cat_id(reaction: &str) -> String {
    format!("k_cat_{}", reaction)
}

/// Id of the Michaelis constant of `species_type` in `reaction`
pub fn k_m_id(reaction: &str, species_type: &str) -> String {
    format!("K_m_{}_{}", reaction, species_type)
}

/// Michaelis-Menten-like rate law of a multi-substrate reaction
///
/// The rate is the catalytic constant times the amount of every modifier times a saturation
/// term for every reactant:
///
/// `k_cat_r * E1 * E2 * (S1 / (S1 + K_m_r_s1 * Avogadro * volume_c)) * ...`
///
/// Reactants accounted for by a modifier are left out unless listed in `modifier_reactants`.
/// Reactants whose species type is in `excluded` are also left out.
///
/// # Examples
/// ```rust
/// use modelgen_core::expression::Expression;
/// # use modelgen_core::model::Model;
/// # fn rate_law(model: &mut Model) -> Result<(), Box<dyn std::error::Error>> {
/// use modelgen_core::rate_laws::{michaelis_menten_like, Modifier};
///
/// let expression: Expression = michaelis_menten_like(
///     model,
///     "r1",
///     &[Modifier::Observable("e1".to_string())],
///     &[],
///     &["h2o"],
/// )?;
/// assert_eq!(
///     expression.to_string(),
///     "k_cat_r1 * e1 * (s1[c] / (s1[c] + K_m_r1_s1 * Avogadro * volume_c))"
/// );
/// # Ok(())
/// # }
/// ```
pub fn michaelis_menten_like(
    model: &mut Model,
    reaction: &str,
    modifiers: &[Modifier],
    modifier_reactants: &[&str],
    excluded: &[&str],
) -> Result<Expression, RateLawError> {
    let avogadro = model.intern_avogadro();
    let mut modifier_species: IndexSet<String> = IndexSet::new();
    for modifier in modifiers {
        modifier_species.extend(modifier.species(model)?.into_iter().map(str::to_string));
    }

    let k_cat = k_cat_id(reaction);
    let k_cat_units = Unit::per_second() * Unit::molecule().powi(-(modifiers.len() as i32));
    intern_parameter(model, &k_cat, Some(ParameterRole::CatalyticConstant), k_cat_units);

    let mut factors = vec![Expr::symbol(&k_cat)];
    factors.extend(modifiers.iter().map(|m| Expr::symbol(m.id())));

    let reactants: Vec<String> = model
        .reactions
        .require(reaction)?
        .reactants()
        .into_iter()
        .map(str::to_string)
        .collect();
    for species_id in reactants {
        if modifier_species.contains(&species_id) && !modifier_reactants.contains(&species_id.as_str())
        {
            continue;
        }
        let species = model.species.require(&species_id)?;
        if excluded.contains(&species.species_type.as_str()) {
            continue;
        }
        let species_type = species.species_type.clone();
        let volume = model
            .compartments
            .require(&species.compartment)?
            .volume_function
            .clone();
        let k_m = k_m_id(reaction, &species_type);
        intern_parameter(model, &k_m, Some(ParameterRole::MichaelisConstant), Unit::molar());
        let saturation = Expr::symbol(&species_id)
            + Expr::symbol(&k_m) * Expr::symbol(avogadro) * Expr::symbol(&volume);
        factors.push(Expr::group(
            Expr::symbol(&species_id) / Expr::group(saturation),
        ));
    }

    Ok(Expression::resolve(
        Expr::product(factors),
        &model.namespace(),
    )?)
}

/// Mass action rate law, the rate constant times every modifier and every reactant
///
/// The rate constant `rate_constant` is created if needed, and its units are set so that the
/// expression has the units of a reaction rate.
pub fn mass_action(
    model: &mut Model,
    reaction: &str,
    rate_constant: &str,
    role: Option<ParameterRole>,
    modifiers: &[Modifier],
) -> Result<Expression, RateLawError> {
    let reactants: Vec<String> = model
        .reactions
        .require(reaction)?
        .reactants()
        .into_iter()
        .map(str::to_string)
        .collect();
    let units = Unit::per_second() * Unit::molecule().powi(1 - reactants.len() as i32);
    intern_parameter(model, rate_constant, role, units).units = units;
    for modifier in modifiers {
        modifier.species(model)?;
    }

    let factors = std::iter::once(Expr::symbol(rate_constant))
        .chain(modifiers.iter().map(|m| Expr::symbol(m.id())))
        .chain(reactants.iter().map(|r| Expr::symbol(r)));
    Ok(Expression::resolve(
        Expr::product(factors),
        &model.namespace(),
    )?)
}

/// Direction in which a transcription factor regulates a reaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Regulation {
    Activation,
    Repression,
}

/// Regulatory factor of a transcription factor acting on `reaction`
///
/// An activator contributes `((1 + occ * f) / (1 + occ))`, between 1 and `f`, and a repressor
/// contributes `(1 / (1 + occ))`, between 0 and 1. `occ` is the occupancy function
/// `occupancy_<reaction>_<tf>` = `tf / (K * Avogadro * volume_c)`. The returned factor is
/// unresolved so several factors can be combined into a larger expression.
pub fn regulatory_factor(
    model: &mut Model,
    reaction: &str,
    transcription_factor: &str,
    regulation: Regulation,
) -> Result<Expr, RateLawError> {
    let avogadro = model.intern_avogadro();
    let species = model.species.require(transcription_factor)?;
    let species_type = species.species_type.clone();
    let volume = model
        .compartments
        .require(&species.compartment)?
        .volume_function
        .clone();

    let k_d = dissociation_constant_id(reaction, &species_type, regulation);
    intern_parameter(model, &k_d, Some(ParameterRole::DissociationConstant), Unit::molar());

    let occupancy = occupancy_id(reaction, &species_type);
    model.intern_function(&occupancy, |model| {
        let expr = Expr::symbol(transcription_factor)
            / Expr::group(Expr::symbol(&k_d) * Expr::symbol(avogadro) * Expr::symbol(&volume));
        let expression = Expression::resolve(expr, &model.namespace())?;
        Ok(Function::new(&occupancy, expression, Unit::dimensionless()))
    })?;

    let one = || Expr::number(1.);
    Ok(match regulation {
        Regulation::Activation => {
            let effect = activator_effect_id(reaction, &species_type);
            intern_parameter(model, &effect, None, Unit::dimensionless());
            Expr::group(
                Expr::group(one() + Expr::symbol(&occupancy) * Expr::symbol(&effect))
                    / Expr::group(one() + Expr::symbol(&occupancy)),
            )
        }
        Regulation::Repression => {
            Expr::group(one() / Expr::group(one() + Expr::symbol(&occupancy)))
        }
    })
}

/// Id of the function giving the fraction of sites occupied by a transcription factor
pub fn occupancy_id(reaction: &str, species_type: &str) -> String {
    format!("occupancy_{}_{}", reaction, species_type)
}

/// Id of the dissociation constant of a transcription factor from its site, `Ka_` for
/// activators and `Kr_` for repressors
pub fn dissociation_constant_id(
    reaction: &str,
    species_type: &str,
    regulation: Regulation,
) -> String {
    let prefix = match regulation {
        Regulation::Activation => "Ka",
        Regulation::Repression => "Kr",
    };
    format!("{}_{}_{}", prefix, reaction, species_type)
}

/// Id of the fold change in rate caused by a fully bound activator
pub fn activator_effect_id(reaction: &str, species_type: &str) -> String {
    format!("f_{}_{}", reaction, species_type)
}

/// Get or create a parameter without a value
pub(crate) fn intern_parameter<'a>(
    model: &'a mut Model,
    id: &str,
    role: Option<ParameterRole>,
    units: Unit,
) -> &'a mut Parameter {
    model
        .parameters
        .intern(id, || Parameter::new(id, role, units))
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RateLawError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Expression(#[from] ExpressionError),
}
