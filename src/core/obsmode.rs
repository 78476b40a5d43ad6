//! Observation-mode strings for photometry tables.
//!
//! An obsmode is a comma-separated list of components such as
//! `acs,wfc1,f850lp`. Parameterized components carry a value after `#`,
//! e.g. `mjd#52334.0000`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Parameter name -> values spanned by that parameter, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterDict(pub IndexMap<String, Vec<f64>>);

impl ParameterDict {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.0.insert(name.into(), values);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Restrict to the named parameters, keeping declaration order of `names`
    #[must_use]
    pub fn select(&self, names: &[String]) -> Self {
        let mut out = Self::new();
        for name in names {
            if let Some(values) = self.0.get(name) {
                out.0.insert(name.clone(), values.clone());
            }
        }
        out
    }
}

/// Expand `basemode` over every combination of parameter values.
///
/// Parameters vary slowest-first in declaration order. An empty dictionary
/// yields just the base mode.
///
/// This is always the full cartesian product. With three or more parameters
/// the older photometry-table generator also emitted partial modes that skip
/// the leading parameters (e.g. `base,b#..,c#..` for `a, b, c`); those are
/// not produced here.
#[must_use]
pub fn generate_obsmodes(basemode: &str, params: &ParameterDict) -> Vec<String> {
    let mut modes = vec![basemode.to_string()];
    for (name, values) in &params.0 {
        modes = modes
            .iter()
            .flat_map(|prefix| {
                values
                    .iter()
                    .map(move |value| format!("{prefix},{name}#{value:.4}"))
            })
            .collect();
    }
    modes
}

/// Drop the `#value` part of each component, giving the table's OBSMODE column value
#[must_use]
pub fn interpret_obsmode(obsmode: &str) -> String {
    obsmode
        .split(',')
        .map(|component| component.split_once('#').map_or(component, |(name, _)| name))
        .collect::<Vec<_>>()
        .join(",")
}

/// A filter combination with its parameterized members split out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSpec {
    /// All filter names, `#` markers removed
    pub filters: String,
    /// Names that were marked with `#`
    pub parameterized: Vec<String>,
}

/// Parse a filter list such as `f555w,fr853n#`
#[must_use]
pub fn parse_filters(spec: &str) -> FilterSpec {
    let mut names = Vec::new();
    let mut parameterized = Vec::new();
    for raw in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if raw.contains('#') {
            let name = raw.replace('#', "");
            parameterized.push(name.clone());
            names.push(name);
        } else {
            names.push(raw.to_string());
        }
    }
    FilterSpec {
        filters: names.join(","),
        parameterized,
    }
}
