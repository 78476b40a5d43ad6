use indexmap::IndexMap;
use std::path::Path;
use thiserror::Error;

use crate::core::obsmode::ParameterDict;

#[derive(Error, Debug)]
pub enum ParamsError {
    #[error("Failed to read parameter file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse parameter file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Parameter '{0}' has no values")]
    EmptyValues(String),

    #[error("Parameter '{name}' has a non-finite value {value}")]
    NonFinite { name: String, value: f64 },

    #[error("Invalid parameter name '{0}'")]
    InvalidName(String),
}

/// Load a parameter dictionary from a JSON file
///
/// # Errors
///
/// Returns `ParamsError::ReadError` if the file cannot be read, or any error
/// from [`parse_parameter_dict`].
pub fn load_parameter_dict(path: &Path) -> Result<ParameterDict, ParamsError> {
    let content = std::fs::read_to_string(path)?;
    parse_parameter_dict(&content)
}

/// Parse a parameter dictionary such as
/// `{"mjd": [52334, 53919.99], "fr853n": [8158.0, 8531.5]}`.
///
/// The document must be an object whose values are non-empty arrays of
/// finite numbers. Nothing else is accepted.
///
/// # Errors
///
/// Returns `ParamsError::ParseError` if the JSON does not have that shape,
/// `ParamsError::EmptyValues`, `ParamsError::NonFinite` or
/// `ParamsError::InvalidName` for rejected entries.
pub fn parse_parameter_dict(text: &str) -> Result<ParameterDict, ParamsError> {
    let raw: IndexMap<String, Vec<f64>> = serde_json::from_str(text)?;

    for (name, values) in &raw {
        let valid_name = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid_name {
            return Err(ParamsError::InvalidName(name.clone()));
        }
        if values.is_empty() {
            return Err(ParamsError::EmptyValues(name.clone()));
        }
        if let Some(&value) = values.iter().find(|v| !v.is_finite()) {
            return Err(ParamsError::NonFinite {
                name: name.clone(),
                value,
            });
        }
    }

    Ok(ParameterDict(raw))
}
