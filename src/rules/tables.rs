//! Built-in reference rules.
//!
//! Add entries here when calibration software starts requiring a new
//! reference keyword. Order is significant: it is the order in which
//! resolved files are reported.

use crate::core::types::{Detector, Instrument};

/// Keywords required for an instrument/detector regardless of any `*CORR` switch
pub const MANDATORY_REFS: &[(Instrument, Detector, &[&str])] = &[
    (Instrument::Acs, Detector::Wfc, &["CCDTAB"]),
    (Instrument::Acs, Detector::Hrc, &["CCDTAB"]),
    (Instrument::Acs, Detector::Sbc, &["CCDTAB"]),
    (Instrument::Wfc3, Detector::Uvis, &["CCDTAB"]),
    (Instrument::Wfc3, Detector::Uvis1, &["CCDTAB"]),
    (Instrument::Wfc3, Detector::Uvis2, &["CCDTAB"]),
    (Instrument::Wfc3, Detector::Ir, &["CCDTAB"]),
    (Instrument::Stis, Detector::Ccd, &["CCDTAB"]),
    (Instrument::Stis, Detector::FuvMama, STIS_MAMA_REFS),
    (Instrument::Stis, Detector::NuvMama, STIS_MAMA_REFS),
];

const STIS_MAMA_REFS: &[&str] = &["CCDTAB", "DISPTAB", "INANGTAB", "APDESTAB", "SPTRCTAB"];

/// Keywords required only while the named correction step is enabled
pub const CORRECTION_REFS: &[(&str, &[&str])] = &[
    ("DQICORR", &["BPIXTAB"]),
    ("ATODCORR", &["ATODTAB"]),
    ("BLEVCORR", &["OSCNTAB"]),
    ("SINKCORR", &["SNKCFILE"]),
    ("BIASCORR", &["BIASFILE"]),
    ("PCTECORR", &["PCTETAB", "DRKCFILE"]),
    ("FLSHCORR", &["FLSHFILE"]),
    ("CRCORR", &["CRREJTAB"]),
    ("SHADCORR", &["SHADFILE"]),
    ("DARKCORR", &["DARKFILE", "TDCTAB"]),
    ("FLATCORR", &["PFLTFILE", "DFLTFILE", "LFLTFILE"]),
    ("PHOTCORR", &["IMPHTTAB"]),
    ("LFLGCORR", &["MLINTAB"]),
    ("GLINCORR", &["MLINTAB"]),
    ("NLINCORR", &["NLINFILE"]),
    ("ZSIGCORR", &["DARKFILE", "NLINFILE"]),
    ("WAVECORR", &["LAMPTAB", "WCPTAB", "SDCTAB"]),
    ("SGEOCORR", &["SDSTFILE"]),
    ("X1DCORR", &["XTRACTAB", "SDCTAB"]),
    (
        "SC2DCORR",
        &["CDSTAB", "ECHSCTAB", "EXSTAB", "RIPTAB", "HALOTAB", "TELTAB", "SRWTAB"],
    ),
    ("BACKCORR", &["XTRACTAB"]),
    ("FLUXCORR", &["APERTAB", "PHOTTAB", "PCTAB", "TDSTAB"]),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::is_valid_keyword;
    use std::collections::HashSet;

    #[test]
    fn test_all_keywords_valid() {
        for (_, _, keywords) in MANDATORY_REFS {
            assert!(keywords.iter().all(|k| is_valid_keyword(k)));
        }
        for (step, keywords) in CORRECTION_REFS {
            assert!(is_valid_keyword(step), "{step}");
            assert!(keywords.iter().all(|k| is_valid_keyword(k)));
        }
    }

    #[test]
    fn test_mandatory_keys_unique() {
        let keys: HashSet<_> = MANDATORY_REFS.iter().map(|(i, d, _)| (*i, *d)).collect();
        assert_eq!(keys.len(), MANDATORY_REFS.len());
    }

    #[test]
    fn test_steps_unique() {
        let steps: HashSet<_> = CORRECTION_REFS.iter().map(|(s, _)| *s).collect();
        assert_eq!(steps.len(), CORRECTION_REFS.len());
    }

    #[test]
    fn test_every_detector_has_rule() {
        for detector in Detector::ALL {
            assert!(
                MANDATORY_REFS.iter().any(|(_, d, _)| *d == detector),
                "{detector} has no mandatory rule"
            );
        }
    }
}
