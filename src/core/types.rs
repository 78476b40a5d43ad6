use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// HST instrument whose calibration software is exercised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Instrument {
    #[serde(rename = "ACS")]
    Acs,
    #[serde(rename = "WFC3")]
    Wfc3,
    #[serde(rename = "STIS")]
    Stis,
}

impl Instrument {
    pub const ALL: [Self; 3] = [Self::Acs, Self::Wfc3, Self::Stis];

    /// Value of the `INSTRUME` keyword for this instrument
    #[must_use]
    pub fn keyword_value(self) -> &'static str {
        match self {
            Self::Acs => "ACS",
            Self::Wfc3 => "WFC3",
            Self::Stis => "STIS",
        }
    }

    /// Name of the calibration executable installed for this instrument
    #[must_use]
    pub fn executable_name(self) -> &'static str {
        match self {
            Self::Acs => "calacs.e",
            Self::Wfc3 => "calwf3.e",
            Self::Stis => "cs0.e",
        }
    }

    /// Environment variable naming the CRDS root for this instrument's references
    #[must_use]
    pub fn crds_env(self) -> &'static str {
        match self {
            Self::Acs => "jref",
            Self::Wfc3 => "iref",
            Self::Stis => "oref",
        }
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keyword_value())
    }
}

impl FromStr for Instrument {
    type Err = UnknownIdentity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|i| i.keyword_value().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownIdentity(wanted.to_string()))
    }
}

/// Detector named by the `DETECTOR` keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Detector {
    #[serde(rename = "WFC")]
    Wfc,
    #[serde(rename = "HRC")]
    Hrc,
    #[serde(rename = "SBC")]
    Sbc,
    #[serde(rename = "UVIS")]
    Uvis,
    #[serde(rename = "UVIS1")]
    Uvis1,
    #[serde(rename = "UVIS2")]
    Uvis2,
    #[serde(rename = "IR")]
    Ir,
    #[serde(rename = "CCD")]
    Ccd,
    #[serde(rename = "FUV-MAMA")]
    FuvMama,
    #[serde(rename = "NUV-MAMA")]
    NuvMama,
}

impl Detector {
    pub const ALL: [Self; 10] = [
        Self::Wfc,
        Self::Hrc,
        Self::Sbc,
        Self::Uvis,
        Self::Uvis1,
        Self::Uvis2,
        Self::Ir,
        Self::Ccd,
        Self::FuvMama,
        Self::NuvMama,
    ];

    #[must_use]
    pub fn keyword_value(self) -> &'static str {
        match self {
            Self::Wfc => "WFC",
            Self::Hrc => "HRC",
            Self::Sbc => "SBC",
            Self::Uvis => "UVIS",
            Self::Uvis1 => "UVIS1",
            Self::Uvis2 => "UVIS2",
            Self::Ir => "IR",
            Self::Ccd => "CCD",
            Self::FuvMama => "FUV-MAMA",
            Self::NuvMama => "NUV-MAMA",
        }
    }
}

impl std::fmt::Display for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keyword_value())
    }
}

impl FromStr for Detector {
    type Err = UnknownIdentity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.keyword_value().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownIdentity(wanted.to_string()))
    }
}

/// An `INSTRUME`/`DETECTOR` value that names no known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown instrument or detector '{0}'")]
pub struct UnknownIdentity(pub String);

/// Lookup key into the mandatory reference table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstrumentDetectorKey {
    pub instrument: Instrument,
    pub detector: Detector,
}

impl InstrumentDetectorKey {
    #[must_use]
    pub fn new(instrument: Instrument, detector: Detector) -> Self {
        Self {
            instrument,
            detector,
        }
    }

    /// Parse raw header strings into a key.
    ///
    /// # Errors
    ///
    /// Returns `UnknownIdentity` naming whichever of the two values is not a known variant.
    pub fn parse(instrument: &str, detector: &str) -> Result<Self, UnknownIdentity> {
        Ok(Self::new(instrument.parse()?, detector.parse()?))
    }
}

impl std::fmt::Display for InstrumentDetectorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.instrument, self.detector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_parse_case_insensitive() {
        assert_eq!("acs".parse::<Instrument>().unwrap(), Instrument::Acs);
        assert_eq!(" WFC3 ".parse::<Instrument>().unwrap(), Instrument::Wfc3);
        assert_eq!("Stis".parse::<Instrument>().unwrap(), Instrument::Stis);
    }

    #[test]
    fn test_instrument_parse_unknown() {
        let err = "FOO".parse::<Instrument>().unwrap_err();
        assert_eq!(err, UnknownIdentity("FOO".to_string()));
    }

    #[test]
    fn test_detector_parse_hyphenated() {
        assert_eq!("fuv-mama".parse::<Detector>().unwrap(), Detector::FuvMama);
        assert_eq!("NUV-MAMA".parse::<Detector>().unwrap(), Detector::NuvMama);
        assert!("NUVMAMA".parse::<Detector>().is_err());
    }

    #[test]
    fn test_key_display() {
        let key = InstrumentDetectorKey::new(Instrument::Stis, Detector::FuvMama);
        assert_eq!(key.to_string(), "STIS/FUV-MAMA");
    }

    #[test]
    fn test_key_parse_reports_offender() {
        let err = InstrumentDetectorKey::parse("ACS", "BAR").unwrap_err();
        assert_eq!(err.0, "BAR");
    }

    #[test]
    fn test_executable_names() {
        assert_eq!(Instrument::Acs.executable_name(), "calacs.e");
        assert_eq!(Instrument::Wfc3.executable_name(), "calwf3.e");
        assert_eq!(Instrument::Stis.executable_name(), "cs0.e");
    }

    #[test]
    fn test_serde_uses_keyword_values() {
        let key = InstrumentDetectorKey::new(Instrument::Wfc3, Detector::Uvis2);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"{"instrument":"WFC3","detector":"UVIS2"}"#);
    }
}
