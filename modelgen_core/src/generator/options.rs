//! Flat option mappings passed to model components
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Options of one component, keyed by option name
pub type Options = IndexMap<String, OptionValue>;

/// Value of a single option
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<OptionValue>),
    Map(IndexMap<String, OptionValue>),
}

impl OptionValue {
    fn kind(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "boolean",
            OptionValue::Number(_) => "number",
            OptionValue::Text(_) => "string",
            OptionValue::List(_) => "list",
            OptionValue::Map(_) => "map",
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Number(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl<V: Into<OptionValue>> From<Vec<V>> for OptionValue {
    fn from(value: Vec<V>) -> Self {
        OptionValue::List(value.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<OptionValue>> FromIterator<(K, V)> for OptionValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        OptionValue::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Typed access to the options of one component
///
/// Keys which are never read are ignored.
pub struct OptionReader<'a> {
    component: &'static str,
    options: &'a Options,
}

impl<'a> OptionReader<'a> {
    pub fn new(component: &'static str, options: &'a Options) -> Self {
        OptionReader { component, options }
    }

    fn invalid(&self, key: &str, expected: &'static str, found: &OptionValue) -> ConfigurationError {
        ConfigurationError::InvalidOption {
            component: self.component,
            option: key.to_string(),
            expected,
            found: found.kind(),
        }
    }

    /// Fail with [`ConfigurationError::InvalidValue`] unless `valid`
    pub fn check(&self, key: &str, valid: bool, requirement: &str) -> Result<(), ConfigurationError> {
        if valid {
            Ok(())
        } else {
            Err(ConfigurationError::InvalidValue {
                component: self.component,
                option: key.to_string(),
                requirement: requirement.to_string(),
            })
        }
    }

    pub fn number(&self, key: &str, default: f64) -> Result<f64, ConfigurationError> {
        match self.options.get(key) {
            None => Ok(default),
            Some(OptionValue::Number(value)) => Ok(*value),
            Some(other) => Err(self.invalid(key, "number", other)),
        }
    }

    pub fn bool(&self, key: &str, default: bool) -> Result<bool, ConfigurationError> {
        match self.options.get(key) {
            None => Ok(default),
            Some(OptionValue::Bool(value)) => Ok(*value),
            Some(other) => Err(self.invalid(key, "boolean", other)),
        }
    }

    pub fn optional_text(&self, key: &str) -> Result<Option<String>, ConfigurationError> {
        match self.options.get(key) {
            None => Ok(None),
            Some(OptionValue::Text(value)) => Ok(Some(value.clone())),
            Some(other) => Err(self.invalid(key, "string", other)),
        }
    }

    pub fn text(&self, key: &str, default: &str) -> Result<String, ConfigurationError> {
        Ok(self
            .optional_text(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    pub fn text_list(&self, key: &str) -> Result<Vec<String>, ConfigurationError> {
        match self.options.get(key) {
            None => Ok(Vec::new()),
            Some(OptionValue::List(values)) => values
                .iter()
                .map(|v| match v {
                    OptionValue::Text(text) => Ok(text.clone()),
                    other => Err(self.invalid(key, "list of strings", other)),
                })
                .collect(),
            Some(other) => Err(self.invalid(key, "list of strings", other)),
        }
    }

    pub fn optional_text_map(
        &self,
        key: &str,
    ) -> Result<Option<IndexMap<String, String>>, ConfigurationError> {
        match self.options.get(key) {
            None => Ok(None),
            Some(OptionValue::Map(values)) => values
                .iter()
                .map(|(k, v)| match v {
                    OptionValue::Text(text) => Ok((k.clone(), text.clone())),
                    other => Err(self.invalid(key, "map of strings", other)),
                })
                .collect::<Result<_, _>>()
                .map(Some),
            Some(other) => Err(self.invalid(key, "map of strings", other)),
        }
    }

    pub fn text_map(&self, key: &str) -> Result<IndexMap<String, String>, ConfigurationError> {
        self.optional_text_map(key)?
            .ok_or_else(|| ConfigurationError::MissingOption {
                component: self.component,
                option: key.to_string(),
            })
    }

    /// Map of one letter amino acid codes to species type ids
    pub fn amino_acid_map(
        &self,
        key: &str,
    ) -> Result<Option<IndexMap<char, String>>, ConfigurationError> {
        let Some(map) = self.optional_text_map(key)? else {
            return Ok(None);
        };
        let mut amino_acids = IndexMap::new();
        for (code, id) in map {
            let mut chars = code.chars();
            match (chars.next(), chars.next()) {
                (Some(letter), None) => {
                    amino_acids.insert(letter.to_ascii_uppercase(), id);
                }
                _ => {
                    return Err(ConfigurationError::InvalidValue {
                        component: self.component,
                        option: key.to_string(),
                        requirement: format!("keys must be one letter codes, found `{}`", code),
                    })
                }
            }
        }
        Ok(Some(amino_acids))
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Option `{option}` of `{component}` is required")]
    MissingOption {
        component: &'static str,
        option: String,
    },
    #[error("Option `{option}` of `{component}` must be a {expected}, found a {found}")]
    InvalidOption {
        component: &'static str,
        option: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Option `{option}` of `{component}`: {requirement}")]
    InvalidValue {
        component: &'static str,
        option: String,
        requirement: String,
    },
}
