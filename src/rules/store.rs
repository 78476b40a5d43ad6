use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::core::types::{Detector, Instrument, InstrumentDetectorKey};
use crate::rules::tables::{CORRECTION_REFS, MANDATORY_REFS};
use crate::utils::validation::{normalize_keyword, ValidationError};

#[derive(Error, Debug)]
pub enum RuleTableError {
    #[error("Failed to read rule table: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse rule table: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid keyword in {context}: {source}")]
    InvalidKeyword {
        context: String,
        #[source]
        source: ValidationError,
    },

    #[error("Duplicate mandatory rule for {0}")]
    DuplicateKey(InstrumentDetectorKey),

    #[error("Duplicate correction step {0}")]
    DuplicateStep(String),
}

/// Rule table format version for compatibility checking
pub const RULE_TABLE_VERSION: &str = "1.0.0";

/// Keywords always required for one instrument/detector pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MandatoryRule {
    pub instrument: Instrument,
    pub detector: Detector,
    pub keywords: Vec<String>,
}

impl MandatoryRule {
    #[must_use]
    pub fn key(&self) -> InstrumentDetectorKey {
        InstrumentDetectorKey::new(self.instrument, self.detector)
    }
}

/// Keywords required while one correction step is enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorrectionRule {
    pub step: String,
    pub keywords: Vec<String>,
}

/// Serializable rule table format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleTableData {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub mandatory: Vec<MandatoryRule>,
    pub corrections: Vec<CorrectionRule>,
}

/// The mandatory and correction-gated reference rules, immutable once built
#[derive(Debug, Clone)]
pub struct RuleTable {
    mandatory: Vec<MandatoryRule>,
    corrections: Vec<CorrectionRule>,

    /// Index: instrument/detector -> index in `mandatory`
    key_to_index: HashMap<InstrumentDetectorKey, usize>,
}

impl RuleTable {
    /// The rules compiled into the binary
    #[must_use]
    pub fn builtin() -> Self {
        let mandatory = MANDATORY_REFS
            .iter()
            .map(|(instrument, detector, keywords)| MandatoryRule {
                instrument: *instrument,
                detector: *detector,
                keywords: keywords.iter().map(ToString::to_string).collect(),
            })
            .collect();
        let corrections = CORRECTION_REFS
            .iter()
            .map(|(step, keywords)| CorrectionRule {
                step: (*step).to_string(),
                keywords: keywords.iter().map(ToString::to_string).collect(),
            })
            .collect();
        Self::index(mandatory, corrections)
    }

    /// Build a table from rules, normalizing and validating every keyword.
    ///
    /// # Errors
    ///
    /// Returns `RuleTableError::InvalidKeyword` for an illegal keyword,
    /// `RuleTableError::DuplicateKey` if an instrument/detector pair repeats, or
    /// `RuleTableError::DuplicateStep` if a correction step repeats.
    pub fn from_rules(
        mandatory: Vec<MandatoryRule>,
        corrections: Vec<CorrectionRule>,
    ) -> Result<Self, RuleTableError> {
        let mut seen_keys = HashSet::new();
        let mut checked_mandatory = Vec::with_capacity(mandatory.len());
        for rule in mandatory {
            let key = rule.key();
            if !seen_keys.insert(key) {
                return Err(RuleTableError::DuplicateKey(key));
            }
            let keywords = normalize_all(&rule.keywords, &key.to_string())?;
            checked_mandatory.push(MandatoryRule { keywords, ..rule });
        }

        let mut seen_steps = HashSet::new();
        let mut checked_corrections = Vec::with_capacity(corrections.len());
        for rule in corrections {
            let step = normalize_keyword(&rule.step).map_err(|source| {
                RuleTableError::InvalidKeyword {
                    context: "correction step".to_string(),
                    source,
                }
            })?;
            if !seen_steps.insert(step.clone()) {
                return Err(RuleTableError::DuplicateStep(step));
            }
            let keywords = normalize_all(&rule.keywords, &step)?;
            checked_corrections.push(CorrectionRule { step, keywords });
        }

        Ok(Self::index(checked_mandatory, checked_corrections))
    }

    fn index(mandatory: Vec<MandatoryRule>, corrections: Vec<CorrectionRule>) -> Self {
        let key_to_index = mandatory
            .iter()
            .enumerate()
            .map(|(i, rule)| (rule.key(), i))
            .collect();
        Self {
            mandatory,
            corrections,
            key_to_index,
        }
    }

    /// Load a rule table from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `RuleTableError::ReadError` if the file cannot be read, or any
    /// error from [`RuleTable::from_json`].
    pub fn load_from_file(path: &Path) -> Result<Self, RuleTableError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a rule table from a JSON string
    ///
    /// # Errors
    ///
    /// Returns `RuleTableError::ParseError` for malformed JSON or unknown fields,
    /// or any validation error from [`RuleTable::from_rules`].
    pub fn from_json(json: &str) -> Result<Self, RuleTableError> {
        let data: RuleTableData = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if data.version != RULE_TABLE_VERSION {
            warn!(
                expected = RULE_TABLE_VERSION,
                found = %data.version,
                "Rule table version mismatch"
            );
        }

        Self::from_rules(data.mandatory, data.corrections)
    }

    /// Export the table to JSON
    ///
    /// # Errors
    ///
    /// Returns `RuleTableError::ParseError` if serialization fails.
    pub fn to_json(&self) -> Result<String, RuleTableError> {
        let data = RuleTableData {
            version: RULE_TABLE_VERSION.to_string(),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            mandatory: self.mandatory.clone(),
            corrections: self.corrections.clone(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Mandatory keywords for an instrument/detector pair
    #[must_use]
    pub fn mandatory_for(&self, key: &InstrumentDetectorKey) -> Option<&[String]> {
        self.key_to_index
            .get(key)
            .map(|&idx| self.mandatory[idx].keywords.as_slice())
    }

    #[must_use]
    pub fn mandatory(&self) -> &[MandatoryRule] {
        &self.mandatory
    }

    /// Correction rules in evaluation order
    #[must_use]
    pub fn corrections(&self) -> &[CorrectionRule] {
        &self.corrections
    }

    #[must_use]
    pub fn correction(&self, step: &str) -> Option<&CorrectionRule> {
        self.corrections
            .iter()
            .find(|rule| rule.step.eq_ignore_ascii_case(step.trim()))
    }

    #[must_use]
    pub fn supports(&self, key: &InstrumentDetectorKey) -> bool {
        self.key_to_index.contains_key(key)
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize_all(keywords: &[String], context: &str) -> Result<Vec<String>, RuleTableError> {
    keywords
        .iter()
        .map(|k| {
            normalize_keyword(k).map_err(|source| RuleTableError::InvalidKeyword {
                context: context.to_string(),
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let table = RuleTable::builtin();
        let key = InstrumentDetectorKey::new(Instrument::Stis, Detector::NuvMama);
        assert_eq!(
            table.mandatory_for(&key).unwrap(),
            ["CCDTAB", "DISPTAB", "INANGTAB", "APDESTAB", "SPTRCTAB"]
        );
        let key = InstrumentDetectorKey::new(Instrument::Acs, Detector::Ir);
        assert!(table.mandatory_for(&key).is_none());
    }

    #[test]
    fn test_builtin_correction_order() {
        let table = RuleTable::builtin();
        let steps: Vec<&str> = table.corrections().iter().map(|r| r.step.as_str()).collect();
        assert_eq!(steps.first(), Some(&"DQICORR"));
        assert_eq!(steps.last(), Some(&"FLUXCORR"));
        assert_eq!(
            table.correction("pctecorr").unwrap().keywords,
            ["PCTETAB", "DRKCFILE"]
        );
    }

    #[test]
    fn test_json_roundtrip_preserves_rules() {
        let table = RuleTable::builtin();
        let json = table.to_json().unwrap();
        assert!(json.contains("\"version\""));
        assert!(json.contains("\"FUV-MAMA\""));

        let reloaded = RuleTable::from_json(&json).unwrap();
        assert_eq!(reloaded.mandatory(), table.mandatory());
        assert_eq!(reloaded.corrections(), table.corrections());
    }

    #[test]
    fn test_from_json_normalizes_keywords() {
        let json = r#"{
            "version": "1.0.0",
            "mandatory": [{"instrument": "ACS", "detector": "WFC", "keywords": ["ccdtab"]}],
            "corrections": [{"step": "biascorr", "keywords": ["biasfile"]}]
        }"#;
        let table = RuleTable::from_json(json).unwrap();
        assert_eq!(table.mandatory()[0].keywords, ["CCDTAB"]);
        assert_eq!(table.corrections()[0].step, "BIASCORR");
    }

    #[test]
    fn test_from_json_rejects_unknown_fields() {
        let json = r#"{"version": "1.0.0", "mandatory": [], "corrections": [], "extra": 1}"#;
        assert!(matches!(
            RuleTable::from_json(json),
            Err(RuleTableError::ParseError(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_unknown_detector() {
        let json = r#"{
            "version": "1.0.0",
            "mandatory": [{"instrument": "ACS", "detector": "BAR", "keywords": ["CCDTAB"]}],
            "corrections": []
        }"#;
        assert!(matches!(
            RuleTable::from_json(json),
            Err(RuleTableError::ParseError(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_bad_keyword() {
        let json = r#"{
            "version": "1.0.0",
            "mandatory": [],
            "corrections": [{"step": "DQICORR", "keywords": ["NOT A KEYWORD"]}]
        }"#;
        assert!(matches!(
            RuleTable::from_json(json),
            Err(RuleTableError::InvalidKeyword { .. })
        ));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let key = InstrumentDetectorKey::new(Instrument::Acs, Detector::Wfc);
        let rule = MandatoryRule {
            instrument: Instrument::Acs,
            detector: Detector::Wfc,
            keywords: vec!["CCDTAB".to_string()],
        };
        let err = RuleTable::from_rules(vec![rule.clone(), rule], vec![]).unwrap_err();
        assert!(matches!(err, RuleTableError::DuplicateKey(k) if k == key));
    }

    #[test]
    fn test_duplicate_step_rejected() {
        let rule = CorrectionRule {
            step: "DQICORR".to_string(),
            keywords: vec![],
        };
        let lower = CorrectionRule {
            step: "dqicorr".to_string(),
            keywords: vec![],
        };
        let err = RuleTable::from_rules(vec![], vec![rule, lower]).unwrap_err();
        assert!(matches!(err, RuleTableError::DuplicateStep(s) if s == "DQICORR"));
    }
}
