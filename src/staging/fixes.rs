use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::header::Header;
use crate::parsing::fits::{
    fits_edit, fits_open, fits_select_hdu, read_string_key, write_string_key, ParseError,
};
use crate::utils::validation::{normalize_keyword, ValidationError};

#[derive(Error, Debug)]
pub enum FixError {
    #[error("Failed to read directive file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse directive file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid keyword in directive file: {0}")]
    InvalidKeyword(#[from] ValidationError),

    #[error("Failed to update {path}: {source}")]
    Header {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// Replace `wrong` with `correct` in header extension `ext`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyFix {
    pub ext: u32,
    pub wrong: String,
    pub correct: String,
}

/// Directives keyed by upper-cased keyword, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyFixes(IndexMap<String, KeyFix>);

impl KeyFixes {
    /// Parse `{"PCTETAB": {"ext": 0, "wrong": "...", "correct": "..."}}`
    ///
    /// # Errors
    ///
    /// Returns `FixError::ParseError` for JSON of any other shape or
    /// `FixError::InvalidKeyword` if a key is not a FITS keyword.
    pub fn from_json(text: &str) -> Result<Self, FixError> {
        let raw: IndexMap<String, KeyFix> = serde_json::from_str(text)?;
        let mut fixes = IndexMap::with_capacity(raw.len());
        for (keyword, fix) in raw {
            fixes.insert(normalize_keyword(&keyword)?, fix);
        }
        Ok(Self(fixes))
    }

    /// # Errors
    ///
    /// Returns `FixError::ReadError` if the file cannot be read, or any
    /// error from [`KeyFixes::from_json`].
    pub fn load_from_file(path: &Path) -> Result<Self, FixError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    #[must_use]
    pub fn with(mut self, keyword: &str, fix: KeyFix) -> Self {
        self.0.insert(keyword.to_ascii_uppercase(), fix);
        self
    }

    #[must_use]
    pub fn get(&self, keyword: &str) -> Option<&KeyFix> {
        self.0.get(keyword)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &KeyFix)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Apply primary-header directives to an in-memory header, returning the
/// keywords changed. Directives for other extensions are left to
/// [`fix_fits_file`].
pub fn apply_fixes(header: &mut Header, fixes: &KeyFixes) -> Vec<String> {
    let mut updated = Vec::new();
    for (keyword, fix) in fixes.iter().filter(|(_, fix)| fix.ext == 0) {
        let matches = header
            .value(keyword)
            .is_some_and(|v| v.as_text().trim() == fix.wrong);
        if matches {
            header.set(keyword, fix.correct.as_str());
            updated.push(keyword.to_string());
        }
    }
    updated
}

/// A directive that matched, and the extension it matched in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedFix {
    pub keyword: String,
    pub ext: u32,
}

impl fmt::Display for AppliedFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ext == 0 {
            write!(f, "{}", self.keyword)
        } else {
            write!(f, "{}[{}]", self.keyword, self.ext)
        }
    }
}

/// Outcome of fixing one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FixReport {
    pub path: PathBuf,
    pub updated: Vec<AppliedFix>,
}

/// Apply directives to a FITS file in place, in every extension they name.
///
/// Corrected values too long for one card are written as long strings with
/// CONTINUE cards; existing comments are kept.
///
/// # Errors
///
/// Returns `FixError::Header` if the file cannot be opened for writing
/// (gzip-compressed files cannot), lacks a directive's extension, or a card
/// cannot be rewritten.
pub fn fix_fits_file(path: &Path, fixes: &KeyFixes) -> Result<FixReport, FixError> {
    let report = run_fixes(path, fixes, true)?;
    if !report.updated.is_empty() {
        info!(path = %path.display(), updated = ?report.updated, "Fixed header keywords");
    }
    Ok(report)
}

/// Report which directives [`fix_fits_file`] would apply, without writing
///
/// # Errors
///
/// Returns `FixError::Header` if the file or a directive's extension cannot
/// be read.
pub fn check_fits_file(path: &Path, fixes: &KeyFixes) -> Result<FixReport, FixError> {
    run_fixes(path, fixes, false)
}

fn run_fixes(path: &Path, fixes: &KeyFixes, write: bool) -> Result<FixReport, FixError> {
    let wrap = |source| FixError::Header {
        path: path.to_path_buf(),
        source,
    };

    let mut fits = if write { fits_edit(path) } else { fits_open(path) }.map_err(wrap)?;
    let mut report = FixReport {
        path: path.to_path_buf(),
        updated: Vec::new(),
    };

    for (keyword, fix) in fixes.iter() {
        fits_select_hdu(&mut fits, fix.ext as usize).map_err(wrap)?;
        let current = read_string_key(&mut fits, keyword).map_err(wrap)?;
        if current.as_deref().map(str::trim) != Some(fix.wrong.as_str()) {
            debug!(path = %path.display(), %keyword, ext = fix.ext, ?current, "Directive does not match");
            continue;
        }
        if write {
            write_string_key(&mut fits, keyword, &fix.correct).map_err(wrap)?;
        }
        report.updated.push(AppliedFix {
            keyword: keyword.to_string(),
            ext: fix.ext,
        });
    }

    Ok(report)
}
